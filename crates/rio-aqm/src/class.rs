//! # Per-Class State
//!
//! Mutable admission state for one traffic class. The engine keeps two
//! instances: one for the In subset, one for the Out class whose average
//! tracks the whole physical queue.

use crate::curve::DropCurve;

/// EWMA average, hysteresis counters, and the derived drop curve for one
/// class.
///
/// The class walks a small state machine driven by its average: quiescent
/// below minTh, one transition arrival when minTh is first crossed, then
/// engaged (probabilistic dropping) until the average falls back below minTh.
#[derive(Debug, Clone)]
pub struct ClassState {
    /// Smoothed queue-length average, in the engine's mode units.
    pub avg: f64,
    /// Packets admitted since the last drop for this class.
    pub count: u32,
    /// Bytes admitted since the last drop for this class.
    pub count_bytes: u64,
    /// Hysteresis flag: the average has crossed minTh and the transition
    /// arrival has been consumed.
    pub engaged: bool,
    /// Last computed (amplified) drop probability, for inspection.
    pub prob: f64,
    /// Precomputed threshold mapping.
    pub curve: DropCurve,
}

impl ClassState {
    pub fn new(curve: DropCurve) -> Self {
        ClassState {
            avg: 0.0,
            count: 0,
            count_bytes: 0,
            engaged: false,
            prob: 0.0,
            curve,
        }
    }

    /// Record an arrival in the hysteresis tally.
    pub fn tally(&mut self, size: u32) {
        self.count += 1;
        self.count_bytes += size as u64;
    }

    /// The average just crossed minTh from below: restart the tally at this
    /// packet and raise the hysteresis flag. The crossing packet itself is
    /// admitted.
    pub fn engage(&mut self, size: u32) {
        self.count = 1;
        self.count_bytes = size as u64;
        self.engaged = true;
    }

    /// The average fell back below minTh: clear the flag and the probability
    /// tracker.
    pub fn relax(&mut self) {
        self.prob = 0.0;
        self.engaged = false;
    }

    /// A drop or mark verdict was issued: restart the inter-drop tally.
    pub fn reset_tally(&mut self) {
        self.count = 0;
        self.count_bytes = 0;
    }

    /// Whether the current average sits in this class's forced-drop region.
    pub fn forced(&self) -> bool {
        self.curve.forced(self.avg)
    }
}
