use super::simulator::Simulator;
use crate::config::Config;
use crate::error::DbaError;
use crate::metrics::MetricsSummary;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Progress stream from a background run.
#[derive(Debug)]
pub enum SimEvent {
    Progress {
        cycle: u64,
        time: f64,
        utilization: f64,
        reward: f64,
    },
    Finished(MetricsSummary),
}

/// Handle to a simulation running on its own thread. Dropping the
/// handle without calling `join` detaches the run.
pub struct SimulationHandle {
    pub events: Receiver<SimEvent>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<Simulator>>,
}

impl SimulationHandle {
    /// Ask the worker to stop after the cycle in flight. The stop flag
    /// is only checked between cycles, so no decision is interrupted
    /// halfway.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the run to end and take back the simulator.
    pub fn join(mut self) -> Result<Simulator, DbaError> {
        match self.thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| DbaError::InferenceFailure("simulation thread panicked".to_string())),
            None => Err(DbaError::InferenceFailure(
                "simulation already joined".to_string(),
            )),
        }
    }
}

/// Run `cycles` polling cycles on a worker thread, emitting a progress
/// event every `progress_every` cycles and a final summary.
pub fn spawn(
    config: Config,
    cycles: u64,
    progress_every: u64,
) -> Result<SimulationHandle, DbaError> {
    let mut simulator = Simulator::new(config)?;
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let thread = thread::spawn(move || {
        for cycle in 0..cycles {
            if stop_flag.load(Ordering::Relaxed) {
                log::info!("stop requested at cycle {}", cycle);
                break;
            }
            let outcome = simulator.run_cycle();

            if progress_every > 0 && (cycle + 1) % progress_every == 0 {
                // Receiver may be gone; the run itself continues
                let _ = tx.send(SimEvent::Progress {
                    cycle: cycle + 1,
                    time: outcome.telemetry.time,
                    utilization: outcome.telemetry.utilization,
                    reward: simulator.last_cycle_reward(),
                });
            }
        }
        let _ = tx.send(SimEvent::Finished(simulator.metrics_summary()));
        simulator
    });

    Ok(SimulationHandle {
        events: rx,
        stop,
        thread: Some(thread),
    })
}
