use super::terminal::Terminal;
use super::TerminalId;
use std::collections::BTreeMap;

/// Per-terminal state sampled at a poll boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TerminalReport {
    /// Queued bytes summed across all classes
    pub requested_bytes: u64,

    /// Mean age of queued packets (seconds)
    pub mean_delay: f64,

    /// Age of the oldest queued packet (seconds)
    pub oldest_wait: f64,

    /// Buffer occupancy fraction in [0, 1]
    pub buffer_fraction: f64,
}

/// Backlog report for one polling cycle, keyed by terminal id in
/// lexicographic order. Read-only input to the allocation strategies,
/// the codec and the reward evaluator.
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    pub terminals: BTreeMap<TerminalId, TerminalReport>,
}

impl PollReport {
    /// Requested bytes per terminal (the allocation request map).
    pub fn requests(&self) -> BTreeMap<TerminalId, u64> {
        self.terminals
            .iter()
            .map(|(id, r)| (id.clone(), r.requested_bytes))
            .collect()
    }

    pub fn total_requested(&self) -> u64 {
        self.terminals.values().map(|r| r.requested_bytes).sum()
    }

    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }
}

/// The live set of terminals, keyed by id. `BTreeMap` keeps iteration in
/// lexicographic id order, which fixes the observation vector layout.
#[derive(Debug, Default)]
pub struct TerminalSet {
    terminals: BTreeMap<TerminalId, Terminal>,
}

impl TerminalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, terminal: Terminal) {
        self.terminals.insert(terminal.id().to_string(), terminal);
    }

    pub fn remove(&mut self, id: &str) -> Option<Terminal> {
        self.terminals.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Terminal> {
        self.terminals.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Terminal> {
        self.terminals.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.terminals.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TerminalId, &Terminal)> {
        self.terminals.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&TerminalId, &mut Terminal)> {
        self.terminals.iter_mut()
    }

    /// Sum queued bytes per terminal. Idempotent and side-effect-free;
    /// called once per cycle at the poll boundary.
    pub fn collect_reports(&self) -> BTreeMap<TerminalId, u64> {
        self.terminals
            .iter()
            .map(|(id, t)| (id.clone(), t.requested_bytes()))
            .collect()
    }

    /// Full backlog snapshot (requests, delays, occupancy) as of `now`.
    pub fn poll_report(&self, now: f64) -> PollReport {
        PollReport {
            terminals: self
                .terminals
                .iter()
                .map(|(id, t)| {
                    (
                        id.clone(),
                        TerminalReport {
                            requested_bytes: t.requested_bytes(),
                            mean_delay: t.mean_queue_delay(now),
                            oldest_wait: t.oldest_wait(now),
                            buffer_fraction: t.occupancy_fraction(),
                        },
                    )
                })
                .collect(),
        }
    }
}
