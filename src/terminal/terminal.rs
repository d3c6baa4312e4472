use super::packet::{Packet, ServiceClass};
use super::queue::ClassQueue;
use super::TerminalId;
use crate::error::DbaError;

/// Result of applying one cycle's grant to a terminal.
#[derive(Debug, Default)]
pub struct GrantOutcome {
    /// Bytes actually consumed (≤ granted; whole packets only)
    pub bytes_used: u64,

    /// Packets transmitted this cycle, in service order
    pub served: Vec<Packet>,
}

/// A simulated ONU: one bounded FIFO buffer per traffic class.
#[derive(Debug, Clone)]
pub struct Terminal {
    id: TerminalId,
    queues: [ClassQueue; 3],
}

impl Terminal {
    /// Create a terminal with the same per-class capacity for every class.
    pub fn new(id: impl Into<TerminalId>, capacity_bytes_per_class: u64) -> Self {
        let id = id.into();
        Self {
            id,
            queues: ServiceClass::ALL
                .map(|class| ClassQueue::new(class, capacity_bytes_per_class)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn queue(&self, class: ServiceClass) -> &ClassQueue {
        &self.queues[Self::index(class)]
    }

    fn index(class: ServiceClass) -> usize {
        match class {
            ServiceClass::Ef => 0,
            ServiceClass::Af => 1,
            ServiceClass::Be => 2,
        }
    }

    /// Enqueue an arriving packet into the given class queue. On overflow
    /// the packet is dropped and `CapacityExceeded` returned.
    pub fn enqueue(&mut self, class: ServiceClass, packet: Packet) -> Result<(), DbaError> {
        let id = self.id.clone();
        self.queues[Self::index(class)].enqueue(&id, packet)
    }

    /// Total queued bytes across all classes (the terminal's report).
    pub fn requested_bytes(&self) -> u64 {
        self.queues.iter().map(|q| q.occupied_bytes()).sum()
    }

    /// Total buffer capacity across all classes.
    pub fn capacity_bytes(&self) -> u64 {
        self.queues.iter().map(|q| q.capacity_bytes()).sum()
    }

    /// Buffer occupancy across all classes as a 0-1 fraction.
    pub fn occupancy_fraction(&self) -> f64 {
        let capacity = self.capacity_bytes();
        if capacity == 0 {
            return 0.0;
        }
        self.requested_bytes() as f64 / capacity as f64
    }

    /// Mean age of all queued packets as of `now`, 0.0 when empty.
    pub fn mean_queue_delay(&self, now: f64) -> f64 {
        let mut total = 0.0;
        let mut count = 0usize;
        for queue in &self.queues {
            for pkt in queue.packets() {
                total += pkt.age(now);
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }

    /// Age of the oldest queued packet, 0.0 when empty. Drives the
    /// starvation boost in the priority strategy.
    pub fn oldest_wait(&self, now: f64) -> f64 {
        self.queues
            .iter()
            .filter_map(|q| q.oldest_arrival())
            .map(|arrival| (now - arrival).max(0.0))
            .fold(0.0, f64::max)
    }

    /// Apply a grant of `bytes`: dequeue whole packets, classes in priority
    /// order EF -> AF -> BE, FIFO within each class, stopping at the first
    /// packet that does not fit the remaining budget. At most one packet's
    /// worth of the grant can go unused per cycle.
    pub fn apply_grant(&mut self, bytes: u64) -> GrantOutcome {
        let mut outcome = GrantOutcome::default();
        let mut remaining = bytes;

        for queue in &mut self.queues {
            if remaining == 0 {
                break;
            }
            let used = queue.drain_grant(remaining, &mut outcome.served);
            remaining -= used;
            outcome.bytes_used += used;
            if !queue.is_empty() {
                // Head of this queue did not fit; lower classes must not
                // jump ahead of it.
                break;
            }
        }

        outcome
    }
}
