use super::package::PolicyMetadata;
use crate::config::{NetworkConfig, OltConfig};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Fingerprint of the live deployment a policy is being attached to.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyMetadata {
    pub topology_hash: String,
    pub terminal_count: usize,
    pub observation_space_size: usize,
    pub action_space_size: usize,
    pub olt_config: OltConfig,
}

/// Canonical topology description fed into the hash. Field order is
/// fixed by the struct, terminal order by id, so the same deployment
/// always hashes identically.
#[derive(Serialize)]
struct CanonicalTopology<'a> {
    olt: &'a OltConfig,
    terminals: Vec<CanonicalTerminal<'a>>,
}

#[derive(Serialize)]
struct CanonicalTerminal<'a> {
    id: &'a str,
    queue_capacity_bytes: u64,
}

impl TopologyMetadata {
    pub fn from_network(config: &NetworkConfig) -> Self {
        let n = config.terminals.len();
        Self {
            topology_hash: topology_hash(config),
            terminal_count: n,
            observation_space_size: 3 * n + 1,
            action_space_size: n,
            olt_config: config.olt.clone(),
        }
    }
}

fn topology_hash(config: &NetworkConfig) -> String {
    let mut terminals: Vec<CanonicalTerminal<'_>> = config
        .terminals
        .iter()
        .map(|t| CanonicalTerminal {
            id: &t.id,
            queue_capacity_bytes: t.queue_capacity_bytes,
        })
        .collect();
    terminals.sort_by_key(|t| t.id);

    let canonical = CanonicalTopology {
        olt: &config.olt,
        terminals,
    };
    // serde_json keeps struct field order, so the encoding is canonical
    let encoded = serde_json::to_string(&canonical).unwrap_or_default();
    let digest = Sha256::digest(encoded.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Verdict of a policy-vs-topology check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    CompatibleWithWarning(String),
    Incompatible(String),
}

impl Compatibility {
    pub fn is_compatible(&self) -> bool {
        !matches!(self, Compatibility::Incompatible(_))
    }
}

/// Judge whether a trained policy fits the live topology.
///
/// An exact topology-hash match settles it immediately. Otherwise the
/// structural fields are compared: a package that never recorded its
/// terminal count is accepted with a warning, while a recorded count or
/// vector-shape mismatch is rejected.
pub fn validate(metadata: &PolicyMetadata, topology: &TopologyMetadata) -> Compatibility {
    if !metadata.topology_hash.is_empty() && metadata.topology_hash == topology.topology_hash {
        return Compatibility::Compatible;
    }

    if metadata.terminal_count == 0 {
        return Compatibility::CompatibleWithWarning(
            "package does not record a terminal count; structural check skipped".to_string(),
        );
    }

    if metadata.terminal_count != topology.terminal_count {
        return Compatibility::Incompatible(format!(
            "policy trained on {} terminals, deployment has {}",
            metadata.terminal_count, topology.terminal_count
        ));
    }

    if metadata.observation_size != 0
        && metadata.observation_size != topology.observation_space_size
    {
        return Compatibility::Incompatible(format!(
            "observation size {} does not match the deployment's {}",
            metadata.observation_size, topology.observation_space_size
        ));
    }

    if metadata.action_size != 0 && metadata.action_size != topology.action_space_size {
        return Compatibility::Incompatible(format!(
            "action size {} does not match the deployment's {}",
            metadata.action_size, topology.action_space_size
        ));
    }

    Compatibility::Compatible
}
