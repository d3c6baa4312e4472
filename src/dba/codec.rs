use crate::terminal::{PollReport, TerminalId};
use std::collections::BTreeMap;

/// Saturation point for the delay feature (seconds); waits at or beyond
/// this encode as 1.0.
const DELAY_SATURATION: f64 = 0.1;

/// Translates polled terminal state into the fixed-size observation
/// vector a policy was trained on, and policy outputs back into byte
/// grants.
///
/// The vector layout is `[requests | delays | buffers | utilization]`:
/// three blocks of `trained_terminal_count` entries each, terminals in
/// lexicographic id order, plus one aggregate-demand scalar. Live
/// terminals beyond the trained count are ignored; missing ones are
/// zero-padded.
#[derive(Debug)]
pub struct ObservationCodec {
    trained_terminal_count: usize,
    mismatch_warned: bool,
}

impl ObservationCodec {
    pub fn new(trained_terminal_count: usize) -> Self {
        Self {
            trained_terminal_count,
            mismatch_warned: false,
        }
    }

    /// Length of the encoded vector: 3n + 1.
    pub fn observation_size(&self) -> usize {
        3 * self.trained_terminal_count + 1
    }

    pub fn trained_terminal_count(&self) -> usize {
        self.trained_terminal_count
    }

    pub fn encode(&mut self, report: &PollReport, total_bandwidth: u64) -> Vec<f64> {
        let n = self.trained_terminal_count;
        if report.len() != n && !self.mismatch_warned {
            log::warn!(
                "terminal count {} differs from the policy's trained count {}; \
                 padding/truncating the observation",
                report.len(),
                n
            );
            self.mismatch_warned = true;
        }

        let bw = total_bandwidth as f64;
        let mut requests = vec![0.0; n];
        let mut delays = vec![0.0; n];
        let mut buffers = vec![0.0; n];
        for (i, term) in report.terminals.values().take(n).enumerate() {
            requests[i] = if bw > 0.0 {
                (term.requested_bytes as f64 / bw).min(1.0)
            } else {
                0.0
            };
            delays[i] = (term.mean_delay / DELAY_SATURATION).clamp(0.0, 1.0);
            buffers[i] = term.buffer_fraction.clamp(0.0, 1.0);
        }
        let total_utilization = if bw > 0.0 {
            (report.total_requested() as f64 / bw).min(1.0)
        } else {
            0.0
        };

        let mut obs = Vec::with_capacity(self.observation_size());
        obs.extend(requests);
        obs.extend(delays);
        obs.extend(buffers);
        obs.push(total_utilization);
        obs
    }

    /// Turn raw policy outputs into grants: clamp negatives to zero,
    /// normalize to shares, and cap each grant at the terminal's own
    /// request. A degenerate all-zero output falls back to a uniform
    /// split.
    pub fn decode(
        &self,
        raw: &[f64],
        requests: &BTreeMap<TerminalId, u64>,
        total_bandwidth: u64,
    ) -> BTreeMap<TerminalId, u64> {
        let live = requests.len();
        if live == 0 {
            return BTreeMap::new();
        }

        let mut weights: Vec<f64> = raw.iter().take(live).map(|&w| w.max(0.0)).collect();
        weights.resize(live, 0.0);
        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 {
            weights = vec![1.0 / live as f64; live];
        } else {
            for w in &mut weights {
                *w /= sum;
            }
        }

        requests
            .iter()
            .zip(weights)
            .map(|((id, &req), w)| {
                let share = (total_bandwidth as f64 * w) as u64;
                (id.clone(), share.min(req))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::TerminalReport;

    fn report(entries: &[(&str, u64, f64, f64)]) -> PollReport {
        let mut r = PollReport::default();
        for &(id, requested, delay, buffer) in entries {
            r.terminals.insert(
                id.to_string(),
                TerminalReport {
                    requested_bytes: requested,
                    mean_delay: delay,
                    oldest_wait: delay,
                    buffer_fraction: buffer,
                },
            );
        }
        r
    }

    fn requests(entries: &[(&str, u64)]) -> BTreeMap<TerminalId, u64> {
        entries.iter().map(|&(id, b)| (id.to_string(), b)).collect()
    }

    #[test]
    fn test_encode_layout_and_normalization() {
        let mut codec = ObservationCodec::new(2);
        let r = report(&[("a", 50, 0.05, 0.25), ("b", 200, 0.2, 1.0)]);
        let obs = codec.encode(&r, 100);

        assert_eq!(obs.len(), 7);
        assert_eq!(&obs[0..2], &[0.5, 1.0]); // requests, demand clipped
        assert_eq!(&obs[2..4], &[0.5, 1.0]); // delays, saturated at 100 ms
        assert_eq!(&obs[4..6], &[0.25, 1.0]); // buffers
        assert_eq!(obs[6], 1.0); // aggregate demand
    }

    #[test]
    fn test_encode_pads_missing_terminals() {
        // Trained on 6 terminals, 4 live: every block ends in zeros.
        let mut codec = ObservationCodec::new(6);
        let r = report(&[
            ("a", 10, 0.01, 0.1),
            ("b", 10, 0.01, 0.1),
            ("c", 10, 0.01, 0.1),
            ("d", 10, 0.01, 0.1),
        ]);
        let obs = codec.encode(&r, 100);

        assert_eq!(obs.len(), 19);
        for block in 0..3 {
            assert_eq!(obs[block * 6 + 4], 0.0);
            assert_eq!(obs[block * 6 + 5], 0.0);
        }
    }

    #[test]
    fn test_encode_truncates_extra_terminals() {
        let mut codec = ObservationCodec::new(1);
        let r = report(&[("a", 30, 0.0, 0.0), ("b", 70, 0.0, 0.0)]);
        let obs = codec.encode(&r, 100);

        assert_eq!(obs.len(), 4);
        assert_eq!(obs[0], 0.3); // only "a" fits in the block
        assert_eq!(obs[3], 1.0); // aggregate still sees all demand
    }

    #[test]
    fn test_decode_proportional_to_weights() {
        let codec = ObservationCodec::new(2);
        let grants = codec.decode(&[0.25, 0.75], &requests(&[("a", 100), ("b", 100)]), 100);
        assert_eq!(grants["a"], 25);
        assert_eq!(grants["b"], 75);
    }

    #[test]
    fn test_decode_caps_at_request() {
        let codec = ObservationCodec::new(2);
        let grants = codec.decode(&[0.9, 0.1], &requests(&[("a", 20), ("b", 100)]), 100);
        assert_eq!(grants["a"], 20);
        assert_eq!(grants["b"], 10);
    }

    #[test]
    fn test_decode_uniform_fallback_on_degenerate_output() {
        let codec = ObservationCodec::new(2);
        for raw in [&[0.0, 0.0][..], &[-1.0, -2.0][..]] {
            let grants = codec.decode(raw, &requests(&[("a", 100), ("b", 100)]), 100);
            assert_eq!(grants["a"], 50);
            assert_eq!(grants["b"], 50);
        }
    }

    #[test]
    fn test_decode_sum_within_budget() {
        let codec = ObservationCodec::new(3);
        let reqs = requests(&[("a", 40), ("b", 90), ("c", 10)]);
        let grants = codec.decode(&[0.5, 0.4, 0.1], &reqs, 100);
        assert!(grants.values().sum::<u64>() <= 100);
        for (id, &g) in &grants {
            assert!(g <= reqs[id]);
        }
    }
}
