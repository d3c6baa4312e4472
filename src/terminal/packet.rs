use serde::{Deserialize, Serialize};

/// A queued upstream packet waiting for a grant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packet {
    /// Packet size in bytes
    pub size_bytes: u64,

    /// Arrival time (simulated seconds)
    pub arrival_time: f64,
}

impl Packet {
    pub fn new(size_bytes: u64, arrival_time: f64) -> Self {
        Self {
            size_bytes,
            arrival_time,
        }
    }

    /// Time this packet has spent queued as of `now`
    pub fn age(&self, now: f64) -> f64 {
        (now - self.arrival_time).max(0.0)
    }
}

/// Upstream traffic class (TCONT priority). Grants drain classes in
/// priority order, EF first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceClass {
    /// Expedited forwarding (highest priority)
    #[serde(rename = "ef")]
    Ef,
    /// Assured forwarding
    #[serde(rename = "af")]
    Af,
    /// Best effort (lowest priority)
    #[serde(rename = "be")]
    Be,
}

impl ServiceClass {
    /// All classes in priority order, highest first.
    pub const ALL: [ServiceClass; 3] = [ServiceClass::Ef, ServiceClass::Af, ServiceClass::Be];

    pub fn name(&self) -> &'static str {
        match self {
            ServiceClass::Ef => "EF",
            ServiceClass::Af => "AF",
            ServiceClass::Be => "BE",
        }
    }
}

impl std::fmt::Display for ServiceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
