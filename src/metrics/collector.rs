use super::summary::MetricsSummary;
use crate::olt::CycleOutcome;

pub struct MetricsCollector {
    // Per-packet queueing delays (in seconds)
    delay_samples: Vec<f64>,

    // Per-cycle channel utilization in [0, 1]
    utilization_samples: Vec<f64>,

    // Byte counters
    total_bytes_requested: u64,
    total_bytes_granted: u64,
    total_bytes_served: u64,

    // Packet counters
    packets_served: u64,
    packets_dropped: u64,

    cycles: u64,
    start_time: f64,
}

impl MetricsCollector {
    pub fn new(start_time: f64) -> Self {
        Self {
            delay_samples: Vec::new(),
            utilization_samples: Vec::new(),
            total_bytes_requested: 0,
            total_bytes_granted: 0,
            total_bytes_served: 0,
            packets_served: 0,
            packets_dropped: 0,
            cycles: 0,
            start_time,
        }
    }

    /// Record one completed polling cycle
    pub fn record_cycle(&mut self, outcome: &CycleOutcome) {
        let t = &outcome.telemetry;
        self.total_bytes_requested += t.requests.values().sum::<u64>();
        self.total_bytes_granted += t.allocations.values().sum::<u64>();
        self.total_bytes_served += t.bytes_served;
        self.utilization_samples.push(t.utilization);

        self.packets_served += outcome.served_delays.len() as u64;
        self.delay_samples.extend_from_slice(&outcome.served_delays);

        self.cycles += 1;
    }

    /// Record packets dropped on buffer overflow
    pub fn record_drops(&mut self, dropped: u64) {
        self.packets_dropped += dropped;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Compute final summary statistics
    pub fn compute_summary(&self, current_time: f64) -> MetricsSummary {
        let elapsed = current_time - self.start_time;
        let offered = self.packets_served + self.packets_dropped;

        MetricsSummary {
            // Delay (convert to milliseconds)
            delay_mean: mean(&self.delay_samples) * 1000.0,
            delay_p50: percentile(&self.delay_samples, 0.5) * 1000.0,
            delay_p90: percentile(&self.delay_samples, 0.9) * 1000.0,
            delay_p99: percentile(&self.delay_samples, 0.99) * 1000.0,

            avg_utilization: mean(&self.utilization_samples),
            throughput_bytes_per_sec: if elapsed > 0.0 {
                self.total_bytes_served as f64 / elapsed
            } else {
                0.0
            },

            total_bytes_requested: self.total_bytes_requested,
            total_bytes_granted: self.total_bytes_granted,
            total_bytes_served: self.total_bytes_served,

            packets_served: self.packets_served,
            packets_dropped: self.packets_dropped,
            loss_rate: if offered > 0 {
                self.packets_dropped as f64 / offered as f64
            } else {
                0.0
            },

            cycles: self.cycles,
        }
    }
}

/// Calculate percentile of samples (nearest-rank on the sorted data)
fn percentile(samples: &[f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = samples.iter().filter(|x| x.is_finite()).copied().collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((sorted.len() as f64 - 1.0) * p) as usize;
    sorted[idx]
}

/// Calculate mean of samples
fn mean(samples: &[f64]) -> f64 {
    let valid: Vec<f64> = samples.iter().filter(|x| x.is_finite()).copied().collect();
    if valid.is_empty() {
        return 0.0;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}
