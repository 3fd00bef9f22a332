//! # Drop-Tail FIFO
//!
//! The reference physical-queue collaborator: a bounded FIFO that rejects
//! arrivals at capacity and otherwise preserves arrival order. The admission
//! engine works against any [`PhysicalQueue`]; this one backs the tests and
//! the replay harness.

use std::collections::VecDeque;

use crate::config::{QueueMode, RioConfig};
use crate::traits::{Packet, PhysicalQueue, QueueLimit};

/// Bounded FIFO with either a packet-count or byte-occupancy capacity.
#[derive(Debug, Clone)]
pub struct DropTailQueue<T> {
    items: VecDeque<T>,
    bytes: u64,
    limit: QueueLimit,
}

impl<T: Packet> DropTailQueue<T> {
    /// Capacity bounded by packet count.
    pub fn packets(limit: u32) -> Self {
        DropTailQueue {
            items: VecDeque::new(),
            bytes: 0,
            limit: QueueLimit::Packets(limit),
        }
    }

    /// Capacity bounded by byte occupancy.
    pub fn bytes(limit: u64) -> Self {
        DropTailQueue {
            items: VecDeque::new(),
            bytes: 0,
            limit: QueueLimit::Bytes(limit),
        }
    }

    /// A queue whose unit and capacity match the engine configuration. A
    /// packet-mode limit beyond `u32::MAX` saturates rather than truncating.
    pub fn for_config(cfg: &RioConfig) -> Self {
        match cfg.mode {
            QueueMode::Packets => {
                Self::packets(u32::try_from(cfg.queue_limit).unwrap_or(u32::MAX))
            }
            QueueMode::Bytes => Self::bytes(cfg.queue_limit),
        }
    }

    fn has_room_for(&self, size: u32) -> bool {
        match self.limit {
            QueueLimit::Packets(cap) => (self.items.len() as u32) < cap,
            QueueLimit::Bytes(cap) => self.bytes + size as u64 <= cap,
        }
    }
}

impl<T: Packet> PhysicalQueue<T> for DropTailQueue<T> {
    fn enqueue(&mut self, item: T) -> bool {
        if !self.has_room_for(item.size()) {
            return false;
        }
        self.bytes += item.size() as u64;
        self.items.push_back(item);
        true
    }

    fn dequeue(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        self.bytes -= item.size() as u64;
        Some(item)
    }

    fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn occupancy_packets(&self) -> u32 {
        self.items.len() as u32
    }

    fn occupancy_bytes(&self) -> u64 {
        self.bytes
    }

    fn limit(&self) -> QueueLimit {
        self.limit
    }
}
