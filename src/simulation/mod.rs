pub mod runner;
pub mod simulator;

pub use runner::{spawn, SimEvent, SimulationHandle};
pub use simulator::Simulator;
