pub mod dba;
pub mod network;
pub mod simulation;
pub mod traffic;

pub use dba::DbaConfig;
pub use network::{NetworkConfig, OltConfig, TerminalConfig};
pub use simulation::SimulationConfig;
pub use traffic::{ClassProfiles, TrafficConfig, TrafficProfile};

use crate::reward::RewardWeights;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level configuration that aggregates all sub-configs
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    #[serde(default)]
    pub dba: DbaConfig,
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub reward: RewardWeights,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        // Compute derived fields
        config.network.olt.compute_grant_budget();

        Ok(config)
    }

    /// Get a default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        let mut olt = OltConfig {
            name: "Test OLT".to_string(),
            line_rate_bps: 10_000_000_000,
            poll_interval: 0.000_125,
            grant_budget_bytes: 0,
        };
        olt.compute_grant_budget();

        let terminals = (0..4)
            .map(|i| TerminalConfig {
                id: format!("onu-{}", i),
                queue_capacity_bytes: 50_000,
            })
            .collect();

        Config {
            network: NetworkConfig { olt, terminals },
            dba: DbaConfig::default(),
            traffic: TrafficConfig::test_default(),
            simulation: SimulationConfig::default(),
            reward: RewardWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_budget_derivation() {
        let mut olt = OltConfig {
            name: "OLT".to_string(),
            line_rate_bps: 10_000_000_000,
            poll_interval: 0.000_125,
            grant_budget_bytes: 0,
        };
        olt.compute_grant_budget();

        // 10 Gbit/s over 125 us = 156_250 bytes per cycle
        assert_eq!(olt.grant_budget_bytes, 156_250);
    }

    #[test]
    fn test_explicit_budget_not_overwritten() {
        let mut olt = OltConfig {
            name: "OLT".to_string(),
            line_rate_bps: 10_000_000_000,
            poll_interval: 0.000_125,
            grant_budget_bytes: 100_000,
        };
        olt.compute_grant_budget();
        assert_eq!(olt.grant_budget_bytes, 100_000);
    }

    #[test]
    fn test_config_creation() {
        let config = Config::test_default();
        assert_eq!(config.network.terminals.len(), 4);
        assert!(config.network.olt.grant_budget_bytes > 0);
        assert_eq!(config.dba.algorithm, "fcfs");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
            [network.olt]
            name = "OLT-1"
            line_rate_bps = 1000000000

            [[network.terminals]]
            id = "onu-0"
            queue_capacity_bytes = 10000

            [dba]
            algorithm = "priority"

            [traffic]
            seed = 7

            [traffic.default_profile.be]
            type = "deterministic"
            bytes_per_cycle = 3000
        "#;

        let mut config: Config = toml::from_str(toml_str).unwrap();
        config.network.olt.compute_grant_budget();

        assert_eq!(config.network.olt.poll_interval, 0.000_125);
        assert_eq!(config.dba.algorithm, "priority");
        assert_eq!(config.traffic.seed, 7);
        assert!(config.network.olt.grant_budget_bytes > 0);
    }
}
