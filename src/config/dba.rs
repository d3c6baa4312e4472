use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DbaConfig {
    /// Allocation strategy: "fcfs", "priority" or "learned"
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Waiting time (seconds) after which a terminal's share is boosted
    /// by the priority strategy
    #[serde(default = "default_starvation_threshold")]
    pub starvation_threshold: f64,

    /// Ceiling on the starvation boost multiplier
    #[serde(default = "default_max_priority_boost")]
    pub max_priority_boost: f64,
}

fn default_algorithm() -> String {
    "fcfs".to_string()
}

fn default_starvation_threshold() -> f64 {
    0.1
}

fn default_max_priority_boost() -> f64 {
    4.0
}

impl Default for DbaConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            starvation_threshold: default_starvation_threshold(),
            max_priority_boost: default_max_priority_boost(),
        }
    }
}
