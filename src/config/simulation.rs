use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Number of polling cycles to run
    #[serde(default = "default_cycles")]
    pub cycles: u64,

    /// Log progress every N cycles
    #[serde(default = "default_log_interval")]
    pub log_interval: u64,
}

fn default_cycles() -> u64 {
    10_000
}

fn default_log_interval() -> u64 {
    1_000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cycles: default_cycles(),
            log_interval: default_log_interval(),
        }
    }
}
