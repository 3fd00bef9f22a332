//! # Configuration
//!
//! Explicit, eagerly-validated configuration for the RIO engine. Replaces the
//! original attribute/reflection surface: everything is set on a plain struct
//! before `RioQueue` is constructed, and validation runs once, rejecting a bad
//! configuration before any packet is processed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Enumerations ───────────────────────────────────────────────────────────

/// Unit in which queue occupancy, thresholds, and the queue limit are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueMode {
    Packets,
    Bytes,
}

/// How packets are assigned to the In/Out classes.
///
/// The engine itself always delegates to its [`Classifier`] collaborator;
/// this setting tells the surrounding harness which classifier to wire up.
///
/// [`Classifier`]: crate::traits::Classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityMethod {
    /// Trust an explicit priority tag carried in the packet header.
    HeaderField,
    /// Derive the class from the packet's flow identity.
    FlowIdentity,
}

/// Queue-weight (`qW`) selection for the EWMA estimator.
///
/// Replaces the original's sentinel encoding (0 / −1 / −2) with explicit
/// variants. Derivations use `ptc`, the link's packet-per-second service rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum QueueWeight {
    /// Use the given weight as-is. Must lie in (0, 1].
    Fixed(f64),
    /// `1 − exp(−1/ptc)`: time constant one order of magnitude above the
    /// link capacity per default 100 ms RTT.
    LinkCapacity,
    /// Derive from the bandwidth-delay product, assuming RTT is three times
    /// the link propagation plus transmission delay, floored at 100 ms.
    BandwidthDelay,
    /// `1 − exp(−10/ptc)`: a 10× slower time constant.
    SlowLinkCapacity,
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Configuration rejected at initialization. Never produced at runtime.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{class} thresholds out of order: minTh {min} > maxTh {max}")]
    ThresholdOrder {
        class: &'static str,
        min: f64,
        max: f64,
    },
    #[error("lInterm must be positive, got {0}")]
    NonPositiveLInterm(f64),
    #[error("mean packet size must be non-zero")]
    ZeroMeanPktSize,
    #[error("queue limit must be non-zero")]
    ZeroQueueLimit,
    #[error("fixed queue weight must lie in (0, 1], got {0}")]
    WeightOutOfRange(f64),
    #[error("link bandwidth must be non-zero")]
    ZeroBandwidth,
    #[error("physical queue is {queue:?} but the engine mode is {mode:?}")]
    QueueModeMismatch {
        queue: crate::traits::QueueLimit,
        mode: QueueMode,
    },
    #[error("physical queue capacity {capacity} is below the queue limit {limit}")]
    QueueTooSmall { capacity: u64, limit: u64 },
}

// ─── Configuration ──────────────────────────────────────────────────────────

/// Tunable parameters for a [`RioQueue`](crate::engine::RioQueue).
///
/// Immutable once the engine is initialized, except through an explicit
/// re-`initialize`. Defaults mirror the classic simulator attribute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RioConfig {
    /// Unit for occupancy, thresholds, and `queue_limit`.
    pub mode: QueueMode,
    /// Average packet size in bytes, used for byte-mode scaling and for
    /// deriving the link's packet service rate.
    pub mean_pkt_size: u32,
    /// Hard capacity in `mode` units. Arrivals at or above this occupancy are
    /// forced drops regardless of the averages.
    pub queue_limit: u64,
    /// In-class minimum average threshold. `0` together with a zero max
    /// selects the legacy default at initialization.
    pub min_th_in: f64,
    /// In-class maximum average threshold.
    pub max_th_in: f64,
    /// Out-class (combined-queue) minimum average threshold.
    pub min_th_out: f64,
    /// Out-class maximum average threshold.
    pub max_th_out: f64,
    /// EWMA weight selection.
    pub queue_weight: QueueWeight,
    /// Enforce minimum spacing between unforced drops.
    pub wait: bool,
    /// Ramp the In drop probability from maxP to 1 between maxTh and 2·maxTh
    /// instead of jumping straight to 1.
    pub gentle_in: bool,
    /// Same, for the Out class.
    pub gentle_out: bool,
    /// Reciprocal of the In-class maximum drop probability.
    pub l_interm_in: f64,
    /// Reciprocal of the Out-class maximum drop probability.
    pub l_interm_out: f64,
    /// Link bandwidth in bits per second. Only used to derive the queue
    /// weight and the idle-compensation rate.
    pub link_bandwidth_bps: u64,
    /// Link propagation delay. Only used by [`QueueWeight::BandwidthDelay`].
    pub link_delay: Duration,
    /// Mark ECN-capable packets instead of dropping them.
    pub use_ecn: bool,
    /// Always drop (never mark) on forced outcomes.
    pub use_hard_drop: bool,
    /// Legacy simulator parity: zero the hysteresis counters after a forced
    /// drop.
    pub ns1_compat: bool,
    /// Classifier selection hint for the harness.
    pub priority_method: PriorityMethod,
}

impl Default for RioConfig {
    fn default() -> Self {
        RioConfig {
            mode: QueueMode::Packets,
            mean_pkt_size: 500,
            queue_limit: 25,
            min_th_in: 15.0,
            max_th_in: 30.0,
            min_th_out: 5.0,
            max_th_out: 15.0,
            queue_weight: QueueWeight::Fixed(0.002),
            wait: true,
            gentle_in: true,
            gentle_out: true,
            l_interm_in: 50.0,
            l_interm_out: 50.0,
            link_bandwidth_bps: 1_500_000,
            link_delay: Duration::from_millis(20),
            use_ecn: false,
            use_hard_drop: true,
            ns1_compat: false,
            priority_method: PriorityMethod::FlowIdentity,
        }
    }
}

impl RioConfig {
    /// Fail-fast validation, run once before any packet is processed.
    ///
    /// Threshold violations are rejected, never silently clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_th_in > self.max_th_in {
            return Err(ConfigError::ThresholdOrder {
                class: "In",
                min: self.min_th_in,
                max: self.max_th_in,
            });
        }
        if self.min_th_out > self.max_th_out {
            return Err(ConfigError::ThresholdOrder {
                class: "Out",
                min: self.min_th_out,
                max: self.max_th_out,
            });
        }
        if self.l_interm_in <= 0.0 {
            return Err(ConfigError::NonPositiveLInterm(self.l_interm_in));
        }
        if self.l_interm_out <= 0.0 {
            return Err(ConfigError::NonPositiveLInterm(self.l_interm_out));
        }
        if self.mean_pkt_size == 0 {
            return Err(ConfigError::ZeroMeanPktSize);
        }
        if self.queue_limit == 0 {
            return Err(ConfigError::ZeroQueueLimit);
        }
        if let QueueWeight::Fixed(w) = self.queue_weight {
            if w <= 0.0 || w > 1.0 {
                return Err(ConfigError::WeightOutOfRange(w));
            }
        }
        if self.link_bandwidth_bps == 0 {
            return Err(ConfigError::ZeroBandwidth);
        }
        Ok(())
    }

    /// Link service rate in packets per second (`ptc`), assuming mean-sized
    /// packets.
    pub fn packet_time_constant(&self) -> f64 {
        self.link_bandwidth_bps as f64 / (8.0 * self.mean_pkt_size as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert_eq!(RioConfig::default().validate(), Ok(()));
    }

    #[test]
    fn threshold_order_rejected() {
        let cfg = RioConfig {
            min_th_in: 30.0,
            max_th_in: 15.0,
            ..RioConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ThresholdOrder { class: "In", .. })
        ));
    }

    #[test]
    fn zero_thresholds_pass_validation() {
        // min == max == 0 selects the legacy defaults at initialization and
        // must not trip the ordering check.
        let cfg = RioConfig {
            min_th_out: 0.0,
            max_th_out: 0.0,
            ..RioConfig::default()
        };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn non_positive_l_interm_rejected() {
        let cfg = RioConfig {
            l_interm_out: 0.0,
            ..RioConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NonPositiveLInterm(0.0)));
    }

    #[test]
    fn fixed_weight_bounds() {
        let cfg = RioConfig {
            queue_weight: QueueWeight::Fixed(1.5),
            ..RioConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::WeightOutOfRange(1.5)));

        let cfg = RioConfig {
            queue_weight: QueueWeight::Fixed(1.0),
            ..RioConfig::default()
        };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn ptc_matches_bandwidth() {
        let cfg = RioConfig::default();
        // 1.5 Mbit/s over 500-byte packets = 375 pkt/s.
        assert!((cfg.packet_time_constant() - 375.0).abs() < 1e-9);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = RioConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
