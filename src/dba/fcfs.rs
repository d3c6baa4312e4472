use super::algorithm::{proportional_split, DbaAlgorithm};
use crate::terminal::{PollReport, TerminalId};
use std::collections::BTreeMap;

/// Baseline strategy: demand-proportional, history-free. Each cycle is
/// decided purely from that cycle's requests.
#[derive(Debug, Default)]
pub struct FcfsDba;

impl DbaAlgorithm for FcfsDba {
    fn allocate(
        &mut self,
        report: &PollReport,
        total_bandwidth: u64,
    ) -> BTreeMap<TerminalId, u64> {
        proportional_split(&report.requests(), total_bandwidth)
    }

    fn name(&self) -> &str {
        "fcfs"
    }
}
