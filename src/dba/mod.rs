pub mod algorithm;
pub mod codec;
pub mod fcfs;
pub mod learned;
pub mod priority;

pub use algorithm::{AlgorithmKind, DbaAlgorithm};
pub use codec::ObservationCodec;
pub use fcfs::FcfsDba;
pub use learned::LearnedDba;
pub use priority::PriorityDba;
