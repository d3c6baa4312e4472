use crate::config::{DbaConfig, OltConfig};
use crate::dba::{AlgorithmKind, DbaAlgorithm, FcfsDba, LearnedDba, PriorityDba};
use crate::error::DbaError;
use crate::policy::{validate, Compatibility, PolicyPackage, TopologyMetadata};
use crate::terminal::{TerminalId, TerminalSet};
use std::collections::BTreeMap;

/// Where the OLT is within a polling cycle. The machine only rests in
/// `Idle`; the other phases exist inside `poll_cycle` and are the points
/// at which reconfiguration is forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    AwaitingPoll,
    Deciding,
    Granting,
}

/// Snapshot of one completed cycle, for metrics and operator display.
#[derive(Debug, Clone)]
pub struct CycleTelemetry {
    pub cycle: u64,
    pub time: f64,
    pub requests: BTreeMap<TerminalId, u64>,
    pub allocations: BTreeMap<TerminalId, u64>,
    /// Mean queue delay per terminal at the poll boundary (seconds)
    pub delays: BTreeMap<TerminalId, f64>,
    /// Buffer occupancy fraction per terminal at the poll boundary
    pub buffers: BTreeMap<TerminalId, f64>,
    pub bytes_served: u64,
    pub utilization: f64,
}

/// Everything a cycle produced: the telemetry snapshot plus the waiting
/// time of each packet transmitted this cycle.
#[derive(Debug)]
pub struct CycleOutcome {
    pub telemetry: CycleTelemetry,
    pub served_delays: Vec<f64>,
}

/// The OLT side of the protocol: drives the poll/decide/grant cycle and
/// owns the active allocation strategy.
pub struct Olt {
    config: OltConfig,
    dba_config: DbaConfig,
    algorithm: Box<dyn DbaAlgorithm>,
    phase: CyclePhase,
    cycle: u64,
    sim_time: f64,
    last_allocation: BTreeMap<TerminalId, u64>,
}

impl Olt {
    pub fn new(
        config: OltConfig,
        dba_config: DbaConfig,
        terminal_count: usize,
    ) -> Result<Self, DbaError> {
        let kind: AlgorithmKind = dba_config.algorithm.parse()?;
        let mut olt = Self {
            config,
            dba_config,
            algorithm: Box::new(FcfsDba),
            phase: CyclePhase::Idle,
            cycle: 0,
            sim_time: 0.0,
            last_allocation: BTreeMap::new(),
        };
        olt.algorithm = olt.build_algorithm(kind, terminal_count);
        Ok(olt)
    }

    fn build_algorithm(
        &self,
        kind: AlgorithmKind,
        terminal_count: usize,
    ) -> Box<dyn DbaAlgorithm> {
        match kind {
            AlgorithmKind::Fcfs => Box::new(FcfsDba),
            AlgorithmKind::Priority => Box::new(PriorityDba::new(&self.dba_config)),
            AlgorithmKind::Learned => Box::new(LearnedDba::unloaded(terminal_count)),
        }
    }

    /// Names of the strategies this OLT can run.
    pub fn list_algorithms() -> Vec<&'static str> {
        AlgorithmKind::ALL.iter().map(|k| k.name()).collect()
    }

    /// Swap the active strategy. Only legal between cycles; switching to
    /// `learned` without an attached policy runs the proportional
    /// fallback until one arrives.
    pub fn set_algorithm(&mut self, name: &str, terminal_count: usize) -> Result<(), DbaError> {
        if self.phase != CyclePhase::Idle {
            return Err(DbaError::TopologyLocked("algorithm change"));
        }
        let kind: AlgorithmKind = name.parse()?;
        self.algorithm = self.build_algorithm(kind, terminal_count);
        log::info!("switched allocation strategy to {}", kind);
        Ok(())
    }

    /// Validate a policy package against the live topology and, if it
    /// passes, activate it as the learned strategy. All-or-nothing: on
    /// any failure the current strategy keeps running untouched.
    pub fn attach_policy(
        &mut self,
        package: &PolicyPackage,
        topology: &TopologyMetadata,
    ) -> Result<Compatibility, DbaError> {
        if self.phase != CyclePhase::Idle {
            return Err(DbaError::TopologyLocked("policy attach"));
        }

        let verdict = validate(&package.metadata, topology);
        match &verdict {
            Compatibility::Incompatible(reason) => {
                return Err(DbaError::IncompatiblePolicy(reason.clone()));
            }
            Compatibility::CompatibleWithWarning(warning) => {
                log::warn!("attaching policy anyway: {}", warning);
            }
            Compatibility::Compatible => {}
        }

        let network = package.instantiate()?;
        let trained_count = if package.metadata.terminal_count > 0 {
            package.metadata.terminal_count
        } else {
            topology.terminal_count
        };
        self.algorithm = Box::new(LearnedDba::with_policy(network, trained_count));
        log::info!(
            "attached policy trained on {} terminals ({})",
            trained_count,
            package.metadata.algorithm_kind
        );
        Ok(verdict)
    }

    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == CyclePhase::Idle
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn grant_budget(&self) -> u64 {
        self.config.grant_budget_bytes
    }

    /// Grants issued in the most recent cycle.
    pub fn last_allocation(&self) -> &BTreeMap<TerminalId, u64> {
        &self.last_allocation
    }

    /// Run one full polling cycle: advance time to the next poll
    /// boundary, collect reports, decide grants, and apply them.
    pub fn poll_cycle(&mut self, terminals: &mut TerminalSet) -> CycleOutcome {
        let budget = self.config.grant_budget_bytes;

        self.phase = CyclePhase::AwaitingPoll;
        self.sim_time += self.config.poll_interval;
        let report = terminals.poll_report(self.sim_time);

        self.phase = CyclePhase::Deciding;
        let allocations = self.algorithm.allocate(&report, budget);

        self.phase = CyclePhase::Granting;
        let mut bytes_served = 0;
        let mut served_delays = Vec::new();
        for (id, &grant) in &allocations {
            if grant == 0 {
                continue;
            }
            if let Some(terminal) = terminals.get_mut(id) {
                let outcome = terminal.apply_grant(grant);
                bytes_served += outcome.bytes_used;
                served_delays
                    .extend(outcome.served.iter().map(|p| p.age(self.sim_time)));
            }
        }

        let telemetry = CycleTelemetry {
            cycle: self.cycle,
            time: self.sim_time,
            requests: report.requests(),
            allocations: allocations.clone(),
            delays: report
                .terminals
                .iter()
                .map(|(id, t)| (id.clone(), t.mean_delay))
                .collect(),
            buffers: report
                .terminals
                .iter()
                .map(|(id, t)| (id.clone(), t.buffer_fraction))
                .collect(),
            bytes_served,
            utilization: if budget == 0 {
                0.0
            } else {
                bytes_served as f64 / budget as f64
            },
        };

        self.last_allocation = allocations;
        self.cycle += 1;
        self.phase = CyclePhase::Idle;

        CycleOutcome {
            telemetry,
            served_delays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerminalConfig;
    use crate::policy::{PolicyMetadata, PolicyNetwork};
    use crate::terminal::{Packet, ServiceClass, Terminal};

    fn olt_config(budget: u64) -> OltConfig {
        OltConfig {
            name: "OLT".to_string(),
            line_rate_bps: 10_000_000_000,
            poll_interval: 0.000_125,
            grant_budget_bytes: budget,
        }
    }

    fn terminals(entries: &[(&str, u64)]) -> TerminalSet {
        let mut set = TerminalSet::new();
        for &(id, queued) in entries {
            let mut t = Terminal::new(id, 1_000_000);
            if queued > 0 {
                // queue as 100-byte packets so any grant divides evenly
                for _ in 0..queued / 100 {
                    t.enqueue(ServiceClass::Be, Packet::new(100, 0.0)).unwrap();
                }
            }
            set.insert(t);
        }
        set
    }

    fn topology(terminal_count: usize) -> TopologyMetadata {
        let network = crate::config::NetworkConfig {
            olt: olt_config(156_250),
            terminals: (0..terminal_count)
                .map(|i| TerminalConfig {
                    id: format!("onu-{}", i),
                    queue_capacity_bytes: 50_000,
                })
                .collect(),
        };
        TopologyMetadata::from_network(&network)
    }

    #[test]
    fn test_cycle_advances_time_and_returns_to_idle() {
        let mut olt = Olt::new(olt_config(10_000), DbaConfig::default(), 2).unwrap();
        let mut set = terminals(&[("a", 4_000), ("b", 6_000)]);

        assert!(olt.is_idle());
        let outcome = olt.poll_cycle(&mut set);
        assert!(olt.is_idle());
        assert_eq!(olt.cycle(), 1);
        assert!((olt.sim_time() - 0.000_125).abs() < 1e-12);

        assert_eq!(outcome.telemetry.bytes_served, 10_000);
        assert_eq!(outcome.telemetry.utilization, 1.0);
        assert_eq!(outcome.served_delays.len(), 100);
    }

    #[test]
    fn test_light_load_grants_everything() {
        let mut olt = Olt::new(olt_config(100_000), DbaConfig::default(), 2).unwrap();
        let mut set = terminals(&[("a", 4_000), ("b", 6_000)]);

        let outcome = olt.poll_cycle(&mut set);
        assert_eq!(outcome.telemetry.allocations["a"], 4_000);
        assert_eq!(outcome.telemetry.allocations["b"], 6_000);
        assert_eq!(set.get("a").unwrap().requested_bytes(), 0);
    }

    #[test]
    fn test_contention_splits_proportionally() {
        let mut olt = Olt::new(olt_config(10_000), DbaConfig::default(), 2).unwrap();
        let mut set = terminals(&[("a", 8_000), ("b", 8_000)]);

        let outcome = olt.poll_cycle(&mut set);
        assert_eq!(outcome.telemetry.allocations["a"], 5_000);
        assert_eq!(outcome.telemetry.allocations["b"], 5_000);
        assert_eq!(olt.last_allocation()["a"], 5_000);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let config = DbaConfig {
            algorithm: "magic".to_string(),
            ..DbaConfig::default()
        };
        assert!(matches!(
            Olt::new(olt_config(10_000), config, 2),
            Err(DbaError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_set_algorithm_switches_strategy() {
        let mut olt = Olt::new(olt_config(10_000), DbaConfig::default(), 2).unwrap();
        assert_eq!(olt.algorithm_name(), "fcfs");

        olt.set_algorithm("priority", 2).unwrap();
        assert_eq!(olt.algorithm_name(), "priority");

        olt.set_algorithm("learned", 2).unwrap();
        assert_eq!(olt.algorithm_name(), "learned");

        assert!(olt.set_algorithm("magic", 2).is_err());
        assert_eq!(olt.algorithm_name(), "learned");
    }

    #[test]
    fn test_attach_compatible_policy() {
        let mut olt = Olt::new(olt_config(10_000), DbaConfig::default(), 4).unwrap();
        let package = PolicyPackage::new(
            PolicyMetadata {
                algorithm_kind: "learned".to_string(),
                topology_hash: String::new(),
                terminal_count: 4,
                observation_size: 13,
                action_size: 4,
            },
            &PolicyNetwork::averaging(13, 4),
        )
        .unwrap();

        let verdict = olt.attach_policy(&package, &topology(4)).unwrap();
        assert_eq!(verdict, Compatibility::Compatible);
        assert_eq!(olt.algorithm_name(), "learned");
    }

    #[test]
    fn test_attach_incompatible_policy_keeps_current_strategy() {
        let mut olt = Olt::new(olt_config(10_000), DbaConfig::default(), 8).unwrap();
        let package = PolicyPackage::new(
            PolicyMetadata {
                algorithm_kind: "learned".to_string(),
                topology_hash: String::new(),
                terminal_count: 4,
                observation_size: 13,
                action_size: 4,
            },
            &PolicyNetwork::averaging(13, 4),
        )
        .unwrap();

        let err = olt.attach_policy(&package, &topology(8)).unwrap_err();
        assert!(matches!(err, DbaError::IncompatiblePolicy(_)));
        assert_eq!(olt.algorithm_name(), "fcfs");
    }

    #[test]
    fn test_empty_terminal_set_cycle() {
        let mut olt = Olt::new(olt_config(10_000), DbaConfig::default(), 0).unwrap();
        let mut set = TerminalSet::new();
        let outcome = olt.poll_cycle(&mut set);
        assert!(outcome.telemetry.allocations.is_empty());
        assert_eq!(outcome.telemetry.utilization, 0.0);
    }
}
