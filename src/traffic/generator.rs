use crate::config::{TrafficConfig, TrafficProfile};
use crate::error::DbaError;
use crate::terminal::{Packet, ServiceClass, TerminalId, TerminalSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use std::collections::BTreeMap;

/// Synthesizes upstream arrivals each cycle from the configured
/// per-class profiles. Sampled byte counts accumulate per terminal and
/// class; whole packets are emitted once enough bytes are pending, so
/// fractional loads carry over instead of being lost.
///
/// Terminals and classes are visited in a fixed order, so a given seed
/// reproduces the exact same arrival sequence.
pub struct TrafficGenerator {
    config: TrafficConfig,
    rng: StdRng,
    pending: BTreeMap<(TerminalId, ServiceClass), u64>,
    packets_dropped: u64,
}

impl TrafficGenerator {
    pub fn new(config: TrafficConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            pending: BTreeMap::new(),
            packets_dropped: 0,
        }
    }

    /// Offer one cycle of traffic to every terminal. Packets that
    /// overflow a class buffer are dropped and counted. Returns the
    /// number of packets dropped this cycle.
    pub fn generate_cycle(&mut self, terminals: &mut TerminalSet, now: f64) -> u64 {
        let mut dropped = 0;
        let ids: Vec<TerminalId> = terminals.ids().map(str::to_string).collect();

        for id in ids {
            for class in ServiceClass::ALL {
                let Some(profile) = self.config.profile_for(&id, class) else {
                    continue;
                };
                let bytes = sample_bytes(profile, &mut self.rng);
                let packet_size = profile.packet_size(class);
                if packet_size == 0 {
                    continue;
                }

                let pending = self.pending.entry((id.clone(), class)).or_insert(0);
                *pending += bytes;
                let packets = *pending / packet_size;
                *pending %= packet_size;

                let Some(terminal) = terminals.get_mut(&id) else {
                    continue;
                };
                for _ in 0..packets {
                    match terminal.enqueue(class, Packet::new(packet_size, now)) {
                        Ok(()) => {}
                        Err(DbaError::CapacityExceeded { .. }) => {
                            dropped += 1;
                        }
                        Err(err) => {
                            log::error!("unexpected enqueue failure: {}", err);
                        }
                    }
                }
            }
        }

        self.packets_dropped += dropped;
        dropped
    }

    /// Packets dropped on overflow since construction.
    pub fn packets_dropped(&self) -> u64 {
        self.packets_dropped
    }

    /// Forget carried-over bytes for a departed terminal.
    pub fn forget_terminal(&mut self, id: &str) {
        self.pending.retain(|(tid, _), _| tid != id);
    }
}

fn sample_bytes(profile: &TrafficProfile, rng: &mut StdRng) -> u64 {
    match profile {
        TrafficProfile::Deterministic { bytes_per_cycle, .. } => *bytes_per_cycle,
        TrafficProfile::Poisson {
            lambda_bytes_per_cycle,
            ..
        } => {
            if *lambda_bytes_per_cycle <= 0.0 {
                return 0;
            }
            match Poisson::new(*lambda_bytes_per_cycle) {
                Ok(dist) => dist.sample(rng) as u64,
                Err(_) => 0,
            }
        }
        TrafficProfile::OnOff {
            p_on,
            on_bytes_per_cycle,
            ..
        } => {
            if rng.gen_bool(p_on.clamp(0.0, 1.0)) {
                *on_bytes_per_cycle
            } else {
                0
            }
        }
    }
}
