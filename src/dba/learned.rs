use super::algorithm::{proportional_split, DbaAlgorithm};
use super::codec::ObservationCodec;
use crate::error::DbaError;
use crate::policy::PolicyNetwork;
use crate::terminal::{PollReport, TerminalId};
use std::collections::BTreeMap;

/// Strategy backed by a trained policy. Encodes the polled state,
/// runs the network, and decodes its output into grants. Any inference
/// problem, including having no policy attached at all, degrades to the
/// demand-proportional baseline for that cycle.
pub struct LearnedDba {
    policy: Option<PolicyNetwork>,
    codec: ObservationCodec,
    fallback_warned: bool,
}

impl LearnedDba {
    /// A learned strategy with no weights yet; allocates like the
    /// baseline until a policy is attached.
    pub fn unloaded(terminal_count: usize) -> Self {
        Self {
            policy: None,
            codec: ObservationCodec::new(terminal_count),
            fallback_warned: false,
        }
    }

    pub fn with_policy(policy: PolicyNetwork, trained_terminal_count: usize) -> Self {
        Self {
            policy: Some(policy),
            codec: ObservationCodec::new(trained_terminal_count),
            fallback_warned: false,
        }
    }

    pub fn has_policy(&self) -> bool {
        self.policy.is_some()
    }

    fn try_allocate(
        &mut self,
        report: &PollReport,
        total_bandwidth: u64,
    ) -> Result<BTreeMap<TerminalId, u64>, DbaError> {
        let policy = self
            .policy
            .as_ref()
            .ok_or_else(|| DbaError::InferenceFailure("no policy attached".to_string()))?;

        let observation = self.codec.encode(report, total_bandwidth);
        let raw = policy.infer(&observation)?;
        if raw.len() < report.len() {
            return Err(DbaError::InferenceFailure(format!(
                "policy produced {} outputs for {} terminals",
                raw.len(),
                report.len()
            )));
        }
        Ok(self.codec.decode(&raw, &report.requests(), total_bandwidth))
    }
}

impl DbaAlgorithm for LearnedDba {
    fn allocate(
        &mut self,
        report: &PollReport,
        total_bandwidth: u64,
    ) -> BTreeMap<TerminalId, u64> {
        match self.try_allocate(report, total_bandwidth) {
            Ok(grants) => grants,
            Err(err) => {
                if !self.fallback_warned {
                    log::warn!("inference unavailable ({}), using proportional fallback", err);
                    self.fallback_warned = true;
                }
                proportional_split(&report.requests(), total_bandwidth)
            }
        }
    }

    fn name(&self) -> &str {
        "learned"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Activation, Layer};
    use crate::terminal::TerminalReport;

    fn report(entries: &[(&str, u64)]) -> PollReport {
        let mut r = PollReport::default();
        for &(id, requested) in entries {
            r.terminals.insert(
                id.to_string(),
                TerminalReport {
                    requested_bytes: requested,
                    ..Default::default()
                },
            );
        }
        r
    }

    /// Two terminals, constant output [1, 1]: a uniform policy.
    fn uniform_policy() -> PolicyNetwork {
        PolicyNetwork {
            layers: vec![Layer {
                weights: vec![vec![0.0; 7]; 2],
                biases: vec![1.0, 1.0],
                activation: Activation::Linear,
            }],
        }
    }

    #[test]
    fn test_uniform_policy_splits_evenly() {
        let mut dba = LearnedDba::with_policy(uniform_policy(), 2);
        let grants = dba.allocate(&report(&[("a", 100), ("b", 100)]), 100);
        assert_eq!(grants["a"], 50);
        assert_eq!(grants["b"], 50);
    }

    #[test]
    fn test_grants_respect_requests_and_budget() {
        let mut dba = LearnedDba::with_policy(uniform_policy(), 2);
        let grants = dba.allocate(&report(&[("a", 10), ("b", 500)]), 100);
        assert_eq!(grants["a"], 10);
        assert_eq!(grants["b"], 50);
        assert!(grants.values().sum::<u64>() <= 100);
    }

    #[test]
    fn test_no_policy_falls_back_to_proportional() {
        let mut dba = LearnedDba::unloaded(2);
        assert!(!dba.has_policy());
        let grants = dba.allocate(&report(&[("a", 80), ("b", 80)]), 100);
        assert_eq!(grants["a"], 50);
        assert_eq!(grants["b"], 50);
    }

    #[test]
    fn test_broken_policy_falls_back() {
        // Output width 1 cannot cover 2 terminals
        let narrow = PolicyNetwork {
            layers: vec![Layer {
                weights: vec![vec![0.0; 7]],
                biases: vec![1.0],
                activation: Activation::Linear,
            }],
        };
        let mut dba = LearnedDba::with_policy(narrow, 2);
        let grants = dba.allocate(&report(&[("a", 40), ("b", 60)]), 100);
        // proportional fallback grants everything under light load
        assert_eq!(grants["a"], 40);
        assert_eq!(grants["b"], 60);
    }
}
