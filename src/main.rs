use clap::Parser;
use pondba::simulation::{spawn, SimEvent};
use pondba::{Config, MetricsSummary, PolicyPackage, Simulator};
use std::path::PathBuf;
use std::time::Instant;

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Parser, Debug)]
#[command(author, version, about = "PON Dynamic Bandwidth Allocation Simulator", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured allocation strategy (fcfs, priority, learned)
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Override the configured number of polling cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Policy package to attach to the learned strategy
    #[arg(short, long)]
    policy: Option<PathBuf>,

    /// Minimal output (final metrics only)
    #[arg(short, long)]
    quiet: bool,

    /// Show per-interval progress during the run
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Save metrics to JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum VerbosityLevel {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    fn verbosity_level(&self) -> VerbosityLevel {
        if self.verbose {
            VerbosityLevel::Verbose
        } else if self.quiet {
            VerbosityLevel::Quiet
        } else {
            VerbosityLevel::Normal
        }
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let verbosity = args.verbosity_level();
    let use_color = !args.no_color;

    // Header
    if verbosity >= VerbosityLevel::Normal {
        if use_color {
            println!("{}", "PON DBA Simulator".bright_cyan().bold());
        } else {
            println!("PON DBA Simulator");
        }
        println!("Loading configuration from: {:?}\n", args.config);
    }

    // Load configuration
    let mut config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(algorithm) = &args.algorithm {
        config.dba.algorithm = algorithm.clone();
    }
    let cycles = args.cycles.unwrap_or(config.simulation.cycles);
    let log_interval = config.simulation.log_interval;

    // Print configuration summary
    if verbosity >= VerbosityLevel::Normal {
        if use_color {
            println!("{}", "Configuration:".green().bold());
        } else {
            println!("Configuration:");
        }
        println!("  OLT: {}", config.network.olt.name);
        println!("  Terminals: {}", config.network.terminals.len());
        println!(
            "  Line rate: {:.1} Gbit/s",
            config.network.olt.line_rate_bps as f64 / 1e9
        );
        println!(
            "  Poll interval: {:.0} us",
            config.network.olt.poll_interval * 1e6
        );
        println!("  Strategy: {}", config.dba.algorithm);
        println!("  Cycles: {}", cycles);
        println!();
    }

    // Attaching a policy means validating it against the topology
    // first, so build the simulator in the foreground in that case.
    let start_time = Instant::now();
    let summary = if let Some(policy_path) = &args.policy {
        let package = match PolicyPackage::from_file(policy_path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error loading policy package: {}", e);
                std::process::exit(1);
            }
        };
        let mut simulator = match Simulator::new(config) {
            Ok(sim) => sim,
            Err(e) => {
                eprintln!("Error creating simulator: {}", e);
                std::process::exit(1);
            }
        };
        match simulator.attach_policy(&package) {
            Ok(verdict) => {
                if verbosity >= VerbosityLevel::Normal {
                    println!("Policy attached ({:?})\n", verdict);
                }
            }
            Err(e) => {
                eprintln!("Error attaching policy: {}", e);
                std::process::exit(1);
            }
        }
        run_foreground(simulator, cycles, log_interval, verbosity)
    } else {
        let handle = match spawn(config, cycles, log_interval) {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("Error creating simulator: {}", e);
                std::process::exit(1);
            }
        };

        let mut summary = None;
        for event in &handle.events {
            match event {
                SimEvent::Progress {
                    cycle,
                    time,
                    utilization,
                    reward,
                } => {
                    if verbosity >= VerbosityLevel::Verbose {
                        println!(
                            "[{:.4}s] cycle {} | utilization {:.1}% | reward {:.3}",
                            time,
                            cycle,
                            utilization * 100.0,
                            reward
                        );
                    }
                }
                SimEvent::Finished(s) => summary = Some(s),
            }
        }
        match summary {
            Some(s) => s,
            None => {
                eprintln!("Simulation ended without a summary");
                std::process::exit(1);
            }
        }
    };

    let elapsed = start_time.elapsed();
    print_final_metrics(&summary, elapsed, verbosity, use_color);

    // Save to JSON if requested
    if let Some(output_path) = args.output {
        match save_metrics_json(&summary, &output_path) {
            Ok(_) => {
                if verbosity >= VerbosityLevel::Normal {
                    println!("\nMetrics saved to: {:?}", output_path);
                }
            }
            Err(e) => {
                eprintln!("Error saving metrics to JSON: {}", e);
            }
        }
    }
}

/// Policy-attached runs keep the simulator on the main thread.
fn run_foreground(
    mut simulator: Simulator,
    cycles: u64,
    log_interval: u64,
    verbosity: VerbosityLevel,
) -> MetricsSummary {
    for cycle in 0..cycles {
        let outcome = simulator.run_cycle();
        if verbosity >= VerbosityLevel::Verbose
            && log_interval > 0
            && (cycle + 1) % log_interval == 0
        {
            println!(
                "[{:.4}s] cycle {} | utilization {:.1}% | reward {:.3}",
                outcome.telemetry.time,
                cycle + 1,
                outcome.telemetry.utilization * 100.0,
                simulator.last_cycle_reward()
            );
        }
    }
    simulator.metrics_summary()
}

#[derive(Tabled)]
struct DelayRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "p50")]
    p50: String,
    #[tabled(rename = "p90")]
    p90: String,
    #[tabled(rename = "p99")]
    p99: String,
}

fn print_final_metrics(
    summary: &MetricsSummary,
    real_time: std::time::Duration,
    verbosity: VerbosityLevel,
    use_color: bool,
) {
    if verbosity == VerbosityLevel::Quiet {
        println!(
            "Simulated {} cycles in {:.2}s real time",
            summary.cycles,
            real_time.as_secs_f64()
        );
        println!(
            "Delay: {:.3}ms (p50: {:.3}ms, p99: {:.3}ms)",
            summary.delay_mean, summary.delay_p50, summary.delay_p99
        );
        println!("Utilization: {:.1}%", summary.avg_utilization * 100.0);
        return;
    }

    if use_color {
        println!(
            "\n{} ({} cycles, {:.2}s real)",
            "Simulation Complete".bright_green().bold(),
            summary.cycles,
            real_time.as_secs_f64()
        );
        println!("{}", "━".repeat(80).bright_black());
        println!("\n{}", "QUEUEING DELAY".yellow().bold());
    } else {
        println!(
            "\nSimulation Complete ({} cycles, {:.2}s real)",
            summary.cycles,
            real_time.as_secs_f64()
        );
        println!("{}", "━".repeat(80));
        println!("\nQUEUEING DELAY");
    }

    let delay_rows = vec![DelayRow {
        metric: "Packet delay (ms)".to_string(),
        mean: format!("{:.3}", summary.delay_mean),
        p50: format!("{:.3}", summary.delay_p50),
        p90: format!("{:.3}", summary.delay_p90),
        p99: format!("{:.3}", summary.delay_p99),
    }];
    let delay_table = Table::new(&delay_rows).with(Style::rounded()).to_string();
    println!("{}", delay_table);

    if use_color {
        println!("\n{}", "CHANNEL".yellow().bold());
    } else {
        println!("\nCHANNEL");
    }
    println!(
        "  • Utilization: {:.1}% avg",
        summary.avg_utilization * 100.0
    );
    println!(
        "  • Throughput:  {:.2} Mbit/s",
        summary.throughput_bytes_per_sec * 8.0 / 1e6
    );

    if use_color {
        println!("\n{}", "TRAFFIC".yellow().bold());
    } else {
        println!("\nTRAFFIC");
    }
    println!(
        "  • Bytes: {} requested, {} granted, {} served",
        summary.total_bytes_requested, summary.total_bytes_granted, summary.total_bytes_served
    );
    println!(
        "  • Packets: {} served, {} dropped ({:.2}% loss)",
        summary.packets_served,
        summary.packets_dropped,
        summary.loss_rate * 100.0
    );
}

fn save_metrics_json(
    summary: &MetricsSummary,
    path: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    Ok(())
}
