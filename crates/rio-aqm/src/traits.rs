//! # Collaborator Seams
//!
//! The admission engine owns only its own state. Everything else — packet
//! storage, classification, randomness, time — is injected through the traits
//! in this module. All collaborators are invoked synchronously inline; the
//! engine is single-writer and not safe for concurrent use without external
//! locking.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

// ─── Traffic Class ──────────────────────────────────────────────────────────

/// The two priority classes sharing one physical queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficClass {
    /// In-profile traffic, admitted under the (looser) In thresholds.
    In,
    /// Out-of-profile traffic, admitted under the combined-queue thresholds.
    Out,
}

// ─── Packet Capability ──────────────────────────────────────────────────────

/// Minimum capability the engine needs from a queued item.
pub trait Packet {
    /// Size in bytes.
    fn size(&self) -> u32;

    /// Attempt to apply an ECN congestion mark.
    ///
    /// Returns `true` if the packet accepted the mark (ECN-capable),
    /// `false` if it must be dropped instead.
    fn mark(&mut self) -> bool;
}

// ─── Physical Queue ─────────────────────────────────────────────────────────

/// Capacity of a physical queue, in the unit it is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueLimit {
    /// Bounded by packet count.
    Packets(u32),
    /// Bounded by total byte occupancy.
    Bytes(u64),
}

/// The bounded FIFO the engine governs admission to.
///
/// The engine never reorders: items leave in arrival order. Occupancy
/// accessors must be O(1).
pub trait PhysicalQueue<T> {
    /// Append an item. Returns `false` if the queue is at capacity.
    fn enqueue(&mut self, item: T) -> bool;

    /// Pop the oldest item, or `None` if empty.
    fn dequeue(&mut self) -> Option<T>;

    /// Borrow the oldest item without removing it.
    fn peek(&self) -> Option<&T>;

    /// Whether the queue holds no items.
    fn is_empty(&self) -> bool;

    /// Current occupancy in packets.
    fn occupancy_packets(&self) -> u32;

    /// Current occupancy in bytes.
    fn occupancy_bytes(&self) -> u64;

    /// Configured capacity, used for fail-fast mode/capacity validation.
    fn limit(&self) -> QueueLimit;
}

// ─── Classifier ─────────────────────────────────────────────────────────────

/// Maps a packet to its traffic class.
///
/// Must be deterministic and stable: the same packet yields the same class at
/// enqueue and at dequeue, otherwise the In-occupancy ledger drifts.
pub trait Classifier<T> {
    fn class_of(&self, item: &T) -> TrafficClass;
}

// ─── Random Source ──────────────────────────────────────────────────────────

/// Uniform random source for the probabilistic drop draw.
///
/// The only place randomness enters the engine; seed the source for
/// reproducible runs.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;
}

// ─── Clock ──────────────────────────────────────────────────────────────────

/// Supplies "now" as virtual time since an arbitrary epoch.
///
/// The engine only ever subtracts timestamps, so the epoch does not matter.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Hand-driven clock for tests and discrete-event replay.
///
/// Clones share the same underlying instant, so a harness can keep one handle
/// and advance time while the engine holds another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    t: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `step`.
    pub fn advance(&self, step: Duration) {
        self.t.set(self.t.get() + step);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, t: Duration) {
        self.t.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.t.get()
    }
}

// ─── Admission Outcome ──────────────────────────────────────────────────────

/// Why a packet was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Lost the probabilistic early-drop draw between minTh and maxTh.
    Unforced,
    /// Average exceeded maxTh, or total occupancy reached the queue limit.
    Forced,
    /// The physical queue itself rejected the admitted packet.
    QueueLimit,
}

/// Final verdict for one arriving packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Admitted unchanged.
    Admitted,
    /// ECN-marked and admitted in place of a drop.
    Marked,
    /// Rejected; the packet was consumed.
    Dropped(DropReason),
}

impl EnqueueOutcome {
    /// Whether the packet made it into the physical queue.
    pub fn is_admitted(&self) -> bool {
        matches!(self, EnqueueOutcome::Admitted | EnqueueOutcome::Marked)
    }
}

// ─── Admission Policy ────────────────────────────────────────────────────────

/// The queue-discipline surface exposed to the scheduler.
///
/// Calls must be serialized by the caller: at most one enqueue or dequeue in
/// flight against an instance at a time.
pub trait AdmissionPolicy<T> {
    /// Decide the fate of an arriving packet and mutate the queue accordingly.
    fn enqueue(&mut self, item: T) -> EnqueueOutcome;

    /// Pop the oldest queued packet, updating idle tracking.
    fn dequeue(&mut self) -> Option<T>;

    /// Observe the oldest queued packet without mutating any state.
    fn peek(&self) -> Option<&T>;
}
