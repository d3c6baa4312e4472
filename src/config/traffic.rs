use crate::terminal::ServiceClass;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct TrafficConfig {
    /// Random seed for reproducibility
    pub seed: u64,

    /// Per-class profiles applied to every terminal
    #[serde(default)]
    pub default_profile: ClassProfiles,

    /// Per-terminal profile overrides, keyed by terminal id
    #[serde(default)]
    pub overrides: BTreeMap<String, ClassProfiles>,
}

/// Traffic profile per service class
pub type ClassProfiles = BTreeMap<ServiceClass, TrafficProfile>;

/// Offered-load model for one class on one terminal, per polling cycle
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TrafficProfile {
    /// Constant load every cycle
    #[serde(rename = "deterministic")]
    Deterministic {
        bytes_per_cycle: u64,
        #[serde(default)]
        packet_size_bytes: Option<u64>,
    },

    /// Poisson-distributed byte count per cycle
    #[serde(rename = "poisson")]
    Poisson {
        lambda_bytes_per_cycle: f64,
        #[serde(default)]
        packet_size_bytes: Option<u64>,
    },

    /// Bursty on/off source: `on_bytes_per_cycle` with probability `p_on`,
    /// otherwise silent
    #[serde(rename = "onoff")]
    OnOff {
        p_on: f64,
        on_bytes_per_cycle: u64,
        #[serde(default)]
        packet_size_bytes: Option<u64>,
    },
}

impl TrafficProfile {
    /// Configured packet size, falling back to the class default
    /// (small voice-like frames for EF, MTU-sized otherwise).
    pub fn packet_size(&self, class: ServiceClass) -> u64 {
        let configured = match self {
            TrafficProfile::Deterministic {
                packet_size_bytes, ..
            }
            | TrafficProfile::Poisson {
                packet_size_bytes, ..
            }
            | TrafficProfile::OnOff {
                packet_size_bytes, ..
            } => *packet_size_bytes,
        };
        configured.unwrap_or(match class {
            ServiceClass::Ef => 200,
            ServiceClass::Af | ServiceClass::Be => 1500,
        })
    }
}

impl TrafficConfig {
    /// Profile for a terminal/class pair: per-terminal override first,
    /// then the shared default.
    pub fn profile_for(&self, terminal_id: &str, class: ServiceClass) -> Option<&TrafficProfile> {
        self.overrides
            .get(terminal_id)
            .and_then(|p| p.get(&class))
            .or_else(|| self.default_profile.get(&class))
    }

    #[cfg(test)]
    pub fn test_default() -> Self {
        let mut default_profile = ClassProfiles::new();
        default_profile.insert(
            ServiceClass::Be,
            TrafficProfile::Deterministic {
                bytes_per_cycle: 3_000,
                packet_size_bytes: None,
            },
        );
        Self {
            seed: 42,
            default_profile,
            overrides: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_size_defaults() {
        let profile = TrafficProfile::Deterministic {
            bytes_per_cycle: 1000,
            packet_size_bytes: None,
        };
        assert_eq!(profile.packet_size(ServiceClass::Ef), 200);
        assert_eq!(profile.packet_size(ServiceClass::Be), 1500);

        let sized = TrafficProfile::Poisson {
            lambda_bytes_per_cycle: 500.0,
            packet_size_bytes: Some(300),
        };
        assert_eq!(sized.packet_size(ServiceClass::Af), 300);
    }

    #[test]
    fn test_override_shadows_default() {
        let mut config = TrafficConfig::test_default();
        let mut onu0 = ClassProfiles::new();
        onu0.insert(
            ServiceClass::Be,
            TrafficProfile::OnOff {
                p_on: 0.5,
                on_bytes_per_cycle: 9_000,
                packet_size_bytes: None,
            },
        );
        config.overrides.insert("onu-0".to_string(), onu0);

        assert!(matches!(
            config.profile_for("onu-0", ServiceClass::Be),
            Some(TrafficProfile::OnOff { .. })
        ));
        assert!(matches!(
            config.profile_for("onu-1", ServiceClass::Be),
            Some(TrafficProfile::Deterministic { .. })
        ));
        assert!(config.profile_for("onu-1", ServiceClass::Ef).is_none());
    }
}
