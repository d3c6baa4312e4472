use crate::terminal::{PollReport, TerminalId};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Named weights for the multi-objective reward. Conceptually they sum
/// to 1.0; the formula itself never changes, only the weights.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub utilization: f64,
    pub satisfaction: f64,
    pub fairness: f64,
    pub delay: f64,
    pub buffer: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            utilization: 0.25,
            satisfaction: 0.30,
            fairness: 0.20,
            delay: 0.15,
            buffer: 0.10,
        }
    }
}

impl RewardWeights {
    /// Preset that optimizes for low queueing delay
    pub fn latency_focused() -> Self {
        Self {
            utilization: 0.05,
            satisfaction: 0.10,
            fairness: 0.05,
            delay: 0.70,
            buffer: 0.10,
        }
    }

    /// Preset that optimizes for channel usage
    pub fn throughput_focused() -> Self {
        Self {
            utilization: 0.50,
            satisfaction: 0.40,
            fairness: 0.05,
            delay: 0.025,
            buffer: 0.025,
        }
    }

    /// Preset that optimizes for equity across terminals
    pub fn fairness_focused() -> Self {
        Self {
            utilization: 0.10,
            satisfaction: 0.20,
            fairness: 0.60,
            delay: 0.05,
            buffer: 0.05,
        }
    }
}

/// Per-component breakdown of one cycle's reward, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardComponents {
    pub utilization: f64,
    pub avg_satisfaction: f64,
    pub fairness: f64,
    pub delay_penalty: f64,
    pub buffer_penalty: f64,
}

impl RewardComponents {
    pub fn weighted_sum(&self, weights: &RewardWeights) -> f64 {
        weights.utilization * self.utilization
            + weights.satisfaction * self.avg_satisfaction
            + weights.fairness * self.fairness
            + weights.delay * self.delay_penalty
            + weights.buffer * self.buffer_penalty
    }
}

/// Score one decision cycle. Pure function; consulted only by training
/// and evaluation code, never on the inference path.
pub fn evaluate(
    report: &PollReport,
    allocations: &BTreeMap<TerminalId, u64>,
    total_bandwidth: u64,
    weights: &RewardWeights,
) -> f64 {
    components(report, allocations, total_bandwidth).weighted_sum(weights)
}

/// Individual reward components for one cycle, exposed for analysis.
pub fn components(
    report: &PollReport,
    allocations: &BTreeMap<TerminalId, u64>,
    total_bandwidth: u64,
) -> RewardComponents {
    let total_allocated: u64 = allocations.values().sum();
    let utilization = if total_bandwidth == 0 {
        0.0
    } else {
        (total_allocated as f64 / total_bandwidth as f64).min(1.0)
    };

    // A terminal asking for less than 0.1% of the channel counts as
    // fully satisfied regardless of its grant.
    let negligible = 0.001 * total_bandwidth as f64;
    let satisfactions: Vec<f64> = report
        .terminals
        .iter()
        .map(|(id, term)| {
            let requested = term.requested_bytes as f64;
            if requested > negligible {
                let allocated = allocations.get(id).copied().unwrap_or(0) as f64;
                (allocated / requested).min(1.0)
            } else {
                1.0
            }
        })
        .collect();

    let avg_satisfaction = mean(&satisfactions).unwrap_or(1.0);

    let fairness = if satisfactions.len() > 1 {
        1.0 - stddev(&satisfactions).min(1.0)
    } else {
        1.0
    };

    let delays: Vec<f64> = report.terminals.values().map(|t| t.mean_delay).collect();
    let delay_penalty = (1.0 - 10.0 * mean(&delays).unwrap_or(0.0)).max(0.0);

    let buffers: Vec<f64> = report
        .terminals
        .values()
        .map(|t| t.buffer_fraction)
        .collect();
    let buffer_penalty = (1.0 - mean(&buffers).unwrap_or(0.0)).max(0.0);

    RewardComponents {
        utilization,
        avg_satisfaction,
        fairness,
        delay_penalty,
        buffer_penalty,
    }
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

fn stddev(samples: &[f64]) -> f64 {
    match mean(samples) {
        Some(m) => {
            let var = samples.iter().map(|x| (x - m) * (x - m)).sum::<f64>()
                / samples.len() as f64;
            var.sqrt()
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::TerminalReport;

    fn report(entries: &[(&str, u64, f64, f64)]) -> PollReport {
        let mut r = PollReport::default();
        for &(id, requested, delay, buffer) in entries {
            r.terminals.insert(
                id.to_string(),
                TerminalReport {
                    requested_bytes: requested,
                    mean_delay: delay,
                    oldest_wait: delay,
                    buffer_fraction: buffer,
                },
            );
        }
        r
    }

    fn allocs(entries: &[(&str, u64)]) -> BTreeMap<TerminalId, u64> {
        entries
            .iter()
            .map(|&(id, b)| (id.to_string(), b))
            .collect()
    }

    #[test]
    fn test_all_requests_zero() {
        // Scenario: nothing requested, nothing allocated
        let r = report(&[("a", 0, 0.0, 0.0), ("b", 0, 0.0, 0.0)]);
        let c = components(&r, &allocs(&[]), 100);

        assert_eq!(c.avg_satisfaction, 1.0);
        assert_eq!(c.utilization, 0.0);
        assert_eq!(c.fairness, 1.0);
        assert_eq!(c.delay_penalty, 1.0);
        assert_eq!(c.buffer_penalty, 1.0);
    }

    #[test]
    fn test_full_satisfaction() {
        let r = report(&[("a", 40, 0.0, 0.1), ("b", 60, 0.0, 0.2)]);
        let a = allocs(&[("a", 40), ("b", 60)]);
        let c = components(&r, &a, 100);

        assert_eq!(c.utilization, 1.0);
        assert_eq!(c.avg_satisfaction, 1.0);
        assert_eq!(c.fairness, 1.0);
    }

    #[test]
    fn test_reward_in_unit_range() {
        let cases = [
            (report(&[("a", 80, 0.05, 0.9), ("b", 80, 0.2, 1.0)]), allocs(&[("a", 50), ("b", 50)])),
            (report(&[("a", 1000, 0.0, 0.0)]), allocs(&[("a", 0)])),
            (report(&[]), allocs(&[])),
        ];
        for (r, a) in &cases {
            let reward = evaluate(r, a, 100, &RewardWeights::default());
            assert!((0.0..=1.0).contains(&reward), "reward {} out of range", reward);
        }
    }

    #[test]
    fn test_delay_penalty_saturates() {
        // 100 ms mean delay zeroes the delay component
        let r = report(&[("a", 50, 0.1, 0.0)]);
        let c = components(&r, &allocs(&[("a", 50)]), 100);
        assert!(c.delay_penalty.abs() < 1e-12);

        let r = report(&[("a", 50, 0.5, 0.0)]);
        let c = components(&r, &allocs(&[("a", 50)]), 100);
        assert_eq!(c.delay_penalty, 0.0);
    }

    #[test]
    fn test_unfair_split_lowers_fairness() {
        let r = report(&[("a", 50, 0.0, 0.0), ("b", 50, 0.0, 0.0)]);
        let skewed = allocs(&[("a", 50), ("b", 0)]);
        let even = allocs(&[("a", 25), ("b", 25)]);

        let c_skewed = components(&r, &skewed, 100);
        let c_even = components(&r, &even, 100);
        assert!(c_skewed.fairness < c_even.fairness);
        assert_eq!(c_even.fairness, 1.0);
    }

    #[test]
    fn test_weight_presets_change_score_not_formula() {
        let r = report(&[("a", 80, 0.08, 0.8), ("b", 20, 0.0, 0.1)]);
        let a = allocs(&[("a", 80), ("b", 20)]);

        let balanced = evaluate(&r, &a, 100, &RewardWeights::default());
        let latency = evaluate(&r, &a, 100, &RewardWeights::latency_focused());

        // High delays hurt the latency preset more
        assert!(latency < balanced);
    }
}
