use thiserror::Error;

/// Errors produced by the DBA engine and its collaborators.
///
/// Decision-path errors (`CapacityExceeded`, `InferenceFailure`) are always
/// recovered locally: the OLT emits a valid allocation every cycle and
/// overflowing packets are dropped, never propagated. Only algorithm
/// selection, package loading and topology validation surface to the caller.
#[derive(Debug, Error)]
pub enum DbaError {
    /// A queue would overflow its configured capacity. The arriving packet
    /// is dropped; existing packets are never evicted.
    #[error("queue {class} on terminal {terminal} full: {occupied} + {incoming} > {capacity} bytes")]
    CapacityExceeded {
        terminal: String,
        class: &'static str,
        occupied: u64,
        incoming: u64,
        capacity: u64,
    },

    /// An algorithm name that does not match any known strategy.
    #[error("unknown DBA algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The policy call errored or returned a malformed shape. The learned
    /// strategy falls back to proportional allocation for the cycle.
    #[error("policy inference failed: {0}")]
    InferenceFailure(String),

    /// The validator refused to attach a policy package to the live topology.
    #[error("incompatible policy package: {0}")]
    IncompatiblePolicy(String),

    /// A terminal add/remove was attempted while a polling cycle was active.
    #[error("terminal set may only change while the polling loop is idle (phase: {0})")]
    TopologyLocked(&'static str),

    #[error("failed to read policy package: {0}")]
    PackageIo(#[from] std::io::Error),

    #[error("failed to parse policy package: {0}")]
    PackageFormat(#[from] serde_json::Error),
}
