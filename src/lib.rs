pub mod config;
pub mod dba;
pub mod error;
pub mod metrics;
pub mod olt;
pub mod policy;
pub mod reward;
pub mod simulation;
pub mod terminal;
pub mod traffic;

// Re-export key types
pub use config::Config;
pub use dba::{AlgorithmKind, DbaAlgorithm};
pub use error::DbaError;
pub use metrics::{MetricsCollector, MetricsSummary};
pub use olt::{CycleTelemetry, Olt};
pub use policy::{Compatibility, PolicyPackage, TopologyMetadata};
pub use simulation::Simulator;
pub use terminal::{Terminal, TerminalSet};
pub use traffic::TrafficGenerator;
