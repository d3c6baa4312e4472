use super::network::PolicyNetwork;
use crate::error::DbaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Descriptive half of a policy package: everything the validator needs
/// to judge whether the weights fit the live topology. Fields other than
/// the kind are optional so packages from older exporters still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyMetadata {
    /// Strategy family the weights implement (informational)
    pub algorithm_kind: String,

    /// Hash of the topology the policy was trained against
    #[serde(default)]
    pub topology_hash: String,

    /// Terminal count at training time; 0 means unrecorded
    #[serde(default)]
    pub terminal_count: usize,

    /// Observation vector length at training time; 0 means unrecorded
    #[serde(default)]
    pub observation_size: usize,

    /// Action vector length at training time; 0 means unrecorded
    #[serde(default)]
    pub action_size: usize,
}

/// A trained policy as shipped on disk: metadata plus an opaque weight
/// blob. The blob stays untyped until an inference backend is asked to
/// instantiate it, so validation never depends on the weight format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyPackage {
    pub metadata: PolicyMetadata,
    policy: serde_json::Value,
}

impl PolicyPackage {
    pub fn new(metadata: PolicyMetadata, network: &PolicyNetwork) -> Result<Self, DbaError> {
        Ok(Self {
            metadata,
            policy: serde_json::to_value(network)?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DbaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DbaError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DbaError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Decode the weight blob into a runnable network.
    pub fn instantiate(&self) -> Result<PolicyNetwork, DbaError> {
        Ok(serde_json::from_value(self.policy.clone())?)
    }
}
