//! # In-Occupancy Ledger
//!
//! The physical FIFO is shared; only a virtual sub-count distinguishes how
//! much of its contents arrived as In traffic. The ledger is credited when an
//! In packet is actually admitted and debited when an In-classified packet is
//! dequeued — never on drops, which by then own no queue space.
//!
//! Invariant: `0 ≤ in-occupancy ≤ total occupancy` in both units, at all
//! times.

use crate::config::QueueMode;

/// Running In-subset packet and byte counters over the shared FIFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct InLedger {
    packets: u32,
    bytes: u64,
}

impl InLedger {
    /// An admitted In packet now occupies queue space.
    pub fn credit(&mut self, size: u32) {
        self.packets += 1;
        self.bytes += size as u64;
    }

    /// A dequeued In packet released its queue space.
    pub fn debit(&mut self, size: u32) {
        debug_assert!(self.packets > 0, "ledger debit with no In packets queued");
        debug_assert!(self.bytes >= size as u64, "ledger debit below zero bytes");
        self.packets = self.packets.saturating_sub(1);
        self.bytes = self.bytes.saturating_sub(size as u64);
    }

    pub fn packets(&self) -> u32 {
        self.packets
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Occupancy in the engine's configured unit.
    pub fn occupancy(&self, mode: QueueMode) -> u64 {
        match mode {
            QueueMode::Packets => self.packets as u64,
            QueueMode::Bytes => self.bytes,
        }
    }

    pub fn reset(&mut self) {
        *self = InLedger::default();
    }
}
