//! # Drop-Probability Curve
//!
//! Two pure stages turn a smoothed average into a drop probability:
//!
//! 1. [`DropCurve::base_probability`] — the linear threshold mapping, with an
//!    optional "gentle" ramp from maxP to 1 between maxTh and 2·maxTh.
//! 2. [`amplify`] — the RED count correction: the longer since the last drop,
//!    the harder the next draw, so the long-run drop rate matches the base
//!    probability even under bursty arrivals.

// ─── Drop Curve ─────────────────────────────────────────────────────────────

/// Precomputed linear coefficients for one traffic class.
///
/// Derived once from the thresholds at initialization and deliberately not
/// recomputed afterwards: a later bandwidth or threshold change only takes
/// effect at the next engine initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropCurve {
    /// Minimum average threshold; below it the base probability is 0.
    pub min_th: f64,
    /// Maximum average threshold; at it the base probability reaches maxP.
    pub max_th: f64,
    /// Ramp to 1 over (maxTh, 2·maxTh] instead of jumping.
    pub gentle: bool,
    /// Maximum drop probability (1 / lInterm).
    pub max_p: f64,
    v_a: f64,
    v_b: f64,
    v_c: f64,
    v_d: f64,
}

impl DropCurve {
    /// Derive the coefficients for a threshold pair.
    ///
    /// A degenerate `max_th == min_th` span is floored to 1 so the slope
    /// stays finite.
    pub fn derive(min_th: f64, max_th: f64, gentle: bool, l_interm: f64) -> Self {
        let mut span = max_th - min_th;
        if span == 0.0 {
            span = 1.0;
        }
        let max_p = 1.0 / l_interm;
        // A zero maxTh with gentle set would blow up the ramp slope; the
        // whole region is forced anyway, so flat coefficients suffice.
        let (v_c, v_d) = if gentle && max_th > 0.0 {
            ((1.0 - max_p) / max_th, 2.0 * max_p - 1.0)
        } else {
            (0.0, 0.0)
        };
        DropCurve {
            min_th,
            max_th,
            gentle,
            max_p,
            v_a: 1.0 / span,
            v_b: -min_th / span,
            v_c,
            v_d,
        }
    }

    /// Base drop probability for a smoothed average, in `[0, 1]`.
    pub fn base_probability(&self, avg: f64) -> f64 {
        let p = if self.gentle && avg >= self.max_th {
            // maxP at maxTh, rising linearly to 1 at 2·maxTh.
            self.v_c * avg + self.v_d
        } else if !self.gentle && avg >= self.max_th {
            1.0
        } else {
            // 0 at minTh, rising linearly to maxP at maxTh.
            (self.v_a * avg + self.v_b) * self.max_p
        };
        p.clamp(0.0, 1.0)
    }

    /// Whether `avg` is in the forced-drop region: at or above maxTh, or at
    /// or above 2·maxTh when gentle.
    pub fn forced(&self, avg: f64) -> bool {
        if self.gentle {
            avg >= 2.0 * self.max_th
        } else {
            avg >= self.max_th
        }
    }
}

// ─── Count Hysteresis ───────────────────────────────────────────────────────

/// Amplify a base probability by the traffic admitted since the last drop.
///
/// `count`/`count_bytes` tally arrivals since the last unforced drop; in byte
/// mode they are normalized to mean-packet equivalents. With `wait` set,
/// drops are spaced at least one expected inter-drop gap apart.
#[allow(clippy::too_many_arguments)]
pub fn amplify(
    p: f64,
    count: u32,
    count_bytes: u64,
    mean_pkt_size: u32,
    wait: bool,
    arriving_size: u32,
    byte_mode: bool,
) -> f64 {
    let n = if byte_mode {
        (count_bytes / mean_pkt_size as u64) as f64
    } else {
        count as f64
    };

    let mut p = if wait {
        if n * p < 1.0 {
            0.0
        } else if n * p < 2.0 {
            p / (2.0 - n * p)
        } else {
            1.0
        }
    } else if n * p < 1.0 {
        p / (1.0 - n * p)
    } else {
        1.0
    };

    if byte_mode && p < 1.0 {
        p = p * arriving_size as f64 / mean_pkt_size as f64;
    }

    p.min(1.0)
}
