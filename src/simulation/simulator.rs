use crate::config::Config;
use crate::error::DbaError;
use crate::metrics::{MetricsCollector, MetricsSummary};
use crate::olt::{CycleOutcome, Olt};
use crate::policy::{Compatibility, PolicyPackage, TopologyMetadata};
use crate::reward;
use crate::terminal::{Terminal, TerminalSet};
use crate::traffic::TrafficGenerator;

/// Ties the pieces together: a terminal set fed by the traffic
/// generator, an OLT running the allocation strategy, and a metrics
/// collector watching the cycles go by.
pub struct Simulator {
    config: Config,
    terminals: TerminalSet,
    generator: TrafficGenerator,
    olt: Olt,
    metrics: MetricsCollector,
}

impl Simulator {
    pub fn new(config: Config) -> Result<Self, DbaError> {
        let mut terminals = TerminalSet::new();
        for t in &config.network.terminals {
            terminals.insert(Terminal::new(t.id.clone(), t.queue_capacity_bytes));
        }

        let generator = TrafficGenerator::new(config.traffic.clone());
        let olt = Olt::new(
            config.network.olt.clone(),
            config.dba.clone(),
            terminals.len(),
        )?;

        Ok(Self {
            config,
            terminals,
            generator,
            olt,
            metrics: MetricsCollector::new(0.0),
        })
    }

    /// One polling cycle: new arrivals, then poll/decide/grant.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let dropped = self
            .generator
            .generate_cycle(&mut self.terminals, self.olt.sim_time());
        self.metrics.record_drops(dropped);

        let outcome = self.olt.poll_cycle(&mut self.terminals);
        self.metrics.record_cycle(&outcome);
        outcome
    }

    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.run_cycle();
        }
    }

    /// Reward score of the most recent cycle under the configured
    /// weights. Diagnostic only; strategies never see it.
    pub fn last_cycle_reward(&self) -> f64 {
        let report = self.terminals.poll_report(self.olt.sim_time());
        reward::evaluate(
            &report,
            self.olt.last_allocation(),
            self.olt.grant_budget(),
            &self.config.reward,
        )
    }

    /// Register a terminal. Refused while a cycle is in flight.
    pub fn add_terminal(&mut self, id: &str, queue_capacity_bytes: u64) -> Result<(), DbaError> {
        if !self.olt.is_idle() {
            return Err(DbaError::TopologyLocked("terminal add"));
        }
        self.terminals
            .insert(Terminal::new(id, queue_capacity_bytes));
        Ok(())
    }

    /// Deregister a terminal; its queued traffic is discarded.
    pub fn remove_terminal(&mut self, id: &str) -> Result<(), DbaError> {
        if !self.olt.is_idle() {
            return Err(DbaError::TopologyLocked("terminal remove"));
        }
        self.terminals.remove(id);
        self.generator.forget_terminal(id);
        Ok(())
    }

    pub fn set_algorithm(&mut self, name: &str) -> Result<(), DbaError> {
        self.olt.set_algorithm(name, self.terminals.len())
    }

    pub fn attach_policy(&mut self, package: &PolicyPackage) -> Result<Compatibility, DbaError> {
        let topology = self.topology_metadata();
        self.olt.attach_policy(package, &topology)
    }

    /// Fingerprint of the live deployment, for policy validation.
    pub fn topology_metadata(&self) -> TopologyMetadata {
        TopologyMetadata::from_network(&self.config.network)
    }

    pub fn algorithm_name(&self) -> &str {
        self.olt.algorithm_name()
    }

    pub fn current_time(&self) -> f64 {
        self.olt.sim_time()
    }

    pub fn cycles_run(&self) -> u64 {
        self.olt.cycle()
    }

    pub fn metrics_summary(&self) -> MetricsSummary {
        self.metrics.compute_summary(self.olt.sim_time())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
