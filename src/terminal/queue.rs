use super::packet::{Packet, ServiceClass};
use crate::error::DbaError;
use std::collections::VecDeque;

/// FIFO buffer for a single traffic class on one terminal.
///
/// Occupancy is tracked in bytes against a fixed capacity; an arriving
/// packet that would overflow is dropped (existing packets are never
/// evicted).
#[derive(Debug, Clone)]
pub struct ClassQueue {
    class: ServiceClass,
    capacity_bytes: u64,
    occupied_bytes: u64,
    packets: VecDeque<Packet>,
}

impl ClassQueue {
    pub fn new(class: ServiceClass, capacity_bytes: u64) -> Self {
        Self {
            class,
            capacity_bytes,
            occupied_bytes: 0,
            packets: VecDeque::new(),
        }
    }

    pub fn class(&self) -> ServiceClass {
        self.class
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub fn occupied_bytes(&self) -> u64 {
        self.occupied_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter()
    }

    /// Arrival time of the oldest queued packet, if any.
    pub fn oldest_arrival(&self) -> Option<f64> {
        self.packets.front().map(|p| p.arrival_time)
    }

    /// Enqueue a packet, failing with `CapacityExceeded` when it would
    /// overflow the buffer.
    pub fn enqueue(&mut self, terminal: &str, packet: Packet) -> Result<(), DbaError> {
        if self.occupied_bytes + packet.size_bytes > self.capacity_bytes {
            return Err(DbaError::CapacityExceeded {
                terminal: terminal.to_string(),
                class: self.class.name(),
                occupied: self.occupied_bytes,
                incoming: packet.size_bytes,
                capacity: self.capacity_bytes,
            });
        }
        self.occupied_bytes += packet.size_bytes;
        self.packets.push_back(packet);
        Ok(())
    }

    /// Dequeue whole packets in FIFO order while they fit in `budget`
    /// bytes. Stops at the first packet that does not fit; packets are
    /// never fragmented. Drained packets are appended to `served`.
    /// Returns the bytes consumed.
    pub fn drain_grant(&mut self, budget: u64, served: &mut Vec<Packet>) -> u64 {
        let mut used = 0;
        while self
            .packets
            .front()
            .is_some_and(|front| front.size_bytes <= budget - used)
        {
            if let Some(pkt) = self.packets.pop_front() {
                used += pkt.size_bytes;
                self.occupied_bytes -= pkt.size_bytes;
                served.push(pkt);
            }
        }
        used
    }

    /// Buffer occupancy as a 0-1 fraction.
    pub fn occupancy_fraction(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        self.occupied_bytes as f64 / self.capacity_bytes as f64
    }
}
