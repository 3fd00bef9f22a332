//! # Admission Statistics
//!
//! Monotonically non-decreasing counters for every admission outcome.
//! Serializable for JSON export from replay reports.

use serde::Serialize;

/// Outcome counters for one engine instance.
///
/// Reset only by re-initializing the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RioStats {
    /// Drops from exceeding maxTh or the hard queue limit.
    pub forced_drop: u64,
    /// Drops from the probabilistic early-drop draw.
    pub unforced_drop: u64,
    /// Admitted packets the physical queue itself rejected.
    pub qlim_drop: u64,
    /// ECN marks issued in place of forced drops.
    pub forced_mark: u64,
    /// ECN marks issued in place of unforced drops.
    pub unforced_mark: u64,
}

impl RioStats {
    /// All packets rejected, regardless of reason.
    pub fn total_drops(&self) -> u64 {
        self.forced_drop + self.unforced_drop + self.qlim_drop
    }

    /// All packets marked instead of dropped.
    pub fn total_marks(&self) -> u64 {
        self.forced_mark + self.unforced_mark
    }
}
