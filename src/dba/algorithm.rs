use crate::error::DbaError;
use crate::terminal::{PollReport, TerminalId};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A grant decision strategy. Implementations receive the polled state of
/// every registered terminal and return a per-terminal byte grant for the
/// coming cycle.
///
/// Every implementation upholds two guarantees: the grants sum to at most
/// `total_bandwidth`, and no terminal is granted more than it requested.
pub trait DbaAlgorithm: Send {
    fn allocate(
        &mut self,
        report: &PollReport,
        total_bandwidth: u64,
    ) -> BTreeMap<TerminalId, u64>;

    /// Short human-readable strategy name for logs and summaries
    fn name(&self) -> &str;
}

/// The strategies the OLT knows how to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Fcfs,
    Priority,
    Learned,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 3] =
        [AlgorithmKind::Fcfs, AlgorithmKind::Priority, AlgorithmKind::Learned];

    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::Fcfs => "fcfs",
            AlgorithmKind::Priority => "priority",
            AlgorithmKind::Learned => "learned",
        }
    }
}

impl FromStr for AlgorithmKind {
    type Err = DbaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fcfs" => Ok(AlgorithmKind::Fcfs),
            "priority" => Ok(AlgorithmKind::Priority),
            "learned" => Ok(AlgorithmKind::Learned),
            other => Err(DbaError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Demand-proportional split shared by the request-driven strategies.
///
/// When aggregate demand fits inside the budget every request is granted
/// in full; otherwise each terminal receives `floor(request * budget /
/// total_demand)` bytes. Integer arithmetic throughout, so the result is
/// bit-identical across runs.
pub(crate) fn proportional_split(
    requests: &BTreeMap<TerminalId, u64>,
    total_bandwidth: u64,
) -> BTreeMap<TerminalId, u64> {
    let total_demand: u64 = requests.values().sum();
    if total_demand <= total_bandwidth {
        return requests.clone();
    }
    requests
        .iter()
        .map(|(id, &req)| {
            let share =
                (req as u128 * total_bandwidth as u128 / total_demand as u128) as u64;
            (id.clone(), share)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests(entries: &[(&str, u64)]) -> BTreeMap<TerminalId, u64> {
        entries.iter().map(|&(id, b)| (id.to_string(), b)).collect()
    }

    #[test]
    fn test_algorithm_kind_round_trip() {
        for kind in AlgorithmKind::ALL {
            assert_eq!(kind.name().parse::<AlgorithmKind>().unwrap(), kind);
        }
        assert!(matches!(
            "round-robin".parse::<AlgorithmKind>(),
            Err(DbaError::UnknownAlgorithm(name)) if name == "round-robin"
        ));
    }

    #[test]
    fn test_split_grants_all_when_demand_fits() {
        let reqs = requests(&[("a", 40), ("b", 60)]);
        let grants = proportional_split(&reqs, 100);
        assert_eq!(grants, requests(&[("a", 40), ("b", 60)]));
    }

    #[test]
    fn test_split_scales_under_contention() {
        let reqs = requests(&[("a", 80), ("b", 80)]);
        let grants = proportional_split(&reqs, 100);
        assert_eq!(grants, requests(&[("a", 50), ("b", 50)]));
    }

    #[test]
    fn test_split_never_exceeds_budget_or_demand() {
        let reqs = requests(&[("a", 7), ("b", 13), ("c", 91)]);
        let grants = proportional_split(&reqs, 50);
        assert!(grants.values().sum::<u64>() <= 50);
        for (id, &grant) in &grants {
            assert!(grant <= reqs[id]);
        }
    }
}
