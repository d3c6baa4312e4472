pub mod packet;
pub mod queue;
pub mod set;
pub mod terminal;

pub use packet::{Packet, ServiceClass};
pub use queue::ClassQueue;
pub use set::{PollReport, TerminalReport, TerminalSet};
pub use terminal::{GrantOutcome, Terminal};

/// Terminal identifier. Lexicographic ordering of ids fixes the observation
/// vector layout, so ids are plain strings kept in ordered maps.
pub type TerminalId = String;
