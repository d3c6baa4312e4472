use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub olt: OltConfig,

    /// Terminals present at startup
    pub terminals: Vec<TerminalConfig>,
}

/// OLT-side channel parameters. Part of the topology metadata persisted
/// with trained policies, so it serializes too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OltConfig {
    #[serde(default = "default_olt_name")]
    pub name: String,

    /// Upstream line rate in bits per second
    pub line_rate_bps: u64,

    /// Polling cycle interval in simulated seconds. 125 us is the usual
    /// GPON figure; configurable, not guaranteed.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,

    /// Grantable bytes per cycle. Zero means "derive from line rate and
    /// poll interval".
    #[serde(default)]
    pub grant_budget_bytes: u64,
}

fn default_olt_name() -> String {
    "OLT".to_string()
}

fn default_poll_interval() -> f64 {
    0.000_125
}

impl OltConfig {
    /// Derive the per-cycle grant budget from the line rate when it was
    /// not set explicitly.
    pub fn compute_grant_budget(&mut self) {
        if self.grant_budget_bytes == 0 {
            self.grant_budget_bytes =
                ((self.line_rate_bps as f64 / 8.0) * self.poll_interval) as u64;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerminalConfig {
    pub id: String,

    /// Buffer capacity per traffic class, in bytes
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity_bytes: u64,
}

fn default_queue_capacity() -> u64 {
    50_000
}
