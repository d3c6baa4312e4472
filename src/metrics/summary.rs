use serde::Serialize;

/// Summary of all metrics from one simulation run
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    // Queueing delay (in milliseconds)
    pub delay_mean: f64,
    pub delay_p50: f64,
    pub delay_p90: f64,
    pub delay_p99: f64,

    // Channel usage
    pub avg_utilization: f64,
    pub throughput_bytes_per_sec: f64,

    // Byte totals over the run
    pub total_bytes_requested: u64,
    pub total_bytes_granted: u64,
    pub total_bytes_served: u64,

    // Packet accounting
    pub packets_served: u64,
    pub packets_dropped: u64,
    pub loss_rate: f64,

    pub cycles: u64,
}

impl MetricsSummary {
    pub fn print(&self) {
        println!("\n=== Final Metrics ===\n");

        println!("Queueing Delay (ms):");
        println!(
            "  mean={:.3}, p50={:.3}, p90={:.3}, p99={:.3}",
            self.delay_mean, self.delay_p50, self.delay_p90, self.delay_p99
        );

        println!("\nChannel:");
        println!("  Avg utilization:   {:.1}%", self.avg_utilization * 100.0);
        println!(
            "  Throughput:        {:.2} Mbit/s",
            self.throughput_bytes_per_sec * 8.0 / 1e6
        );

        println!("\nTraffic:");
        println!("  Bytes requested:   {}", self.total_bytes_requested);
        println!("  Bytes granted:     {}", self.total_bytes_granted);
        println!("  Bytes served:      {}", self.total_bytes_served);
        println!(
            "  Packets served:    {} ({} dropped, {:.2}% loss)",
            self.packets_served,
            self.packets_dropped,
            self.loss_rate * 100.0
        );

        println!("\nCycles: {}", self.cycles);
    }
}
