use super::algorithm::DbaAlgorithm;
use crate::config::DbaConfig;
use crate::terminal::{PollReport, TerminalId};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Demand-proportional allocation with a starvation boost: a terminal
/// whose oldest packet has waited past the configured threshold gets its
/// weight multiplied, linearly in the excess wait, up to a ceiling.
#[derive(Debug)]
pub struct PriorityDba {
    starvation_threshold: f64,
    max_boost: f64,
}

impl PriorityDba {
    pub fn new(config: &DbaConfig) -> Self {
        Self {
            starvation_threshold: config.starvation_threshold,
            max_boost: config.max_priority_boost,
        }
    }

    /// Multiplier in [1, max_boost]; 1 while the oldest wait is within
    /// the threshold, then grows linearly with the excess.
    fn boost(&self, oldest_wait: f64) -> f64 {
        if self.starvation_threshold <= 0.0 {
            return 1.0;
        }
        let excess = (oldest_wait - self.starvation_threshold).max(0.0);
        (1.0 + excess / self.starvation_threshold).min(self.max_boost)
    }
}

impl DbaAlgorithm for PriorityDba {
    fn allocate(
        &mut self,
        report: &PollReport,
        total_bandwidth: u64,
    ) -> BTreeMap<TerminalId, u64> {
        if report.total_requested() <= total_bandwidth {
            return report.requests();
        }

        let weights: BTreeMap<&TerminalId, f64> = report
            .terminals
            .iter()
            .map(|(id, t)| (id, t.requested_bytes as f64 * self.boost(t.oldest_wait)))
            .collect();
        let total_weight: f64 = weights.values().sum();

        if let Some(worst) = report
            .terminals
            .values()
            .map(|t| OrderedFloat(t.oldest_wait))
            .max()
        {
            if worst.0 > self.starvation_threshold {
                log::debug!(
                    "starvation boost active, oldest wait {:.1} ms",
                    worst.0 * 1e3
                );
            }
        }

        report
            .terminals
            .iter()
            .map(|(id, t)| {
                let share = total_bandwidth as f64 * weights[id] / total_weight;
                (id.clone(), (share as u64).min(t.requested_bytes))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "priority"
    }
}
