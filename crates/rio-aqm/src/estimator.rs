//! # Queue-Average Estimator
//!
//! EWMA smoothing of instantaneous occupancy into a trend estimate, with
//! idle-period compensation: while the queue sat empty the average should
//! have decayed as if the link had kept serving mean-sized packets, so the
//! update is applied as that many virtual arrivals at once.

use std::time::Duration;

/// One EWMA update.
///
/// `arrivals` is normally 1; after an idle period it is `1 +` the virtual
/// arrivals from [`idle_arrivals`]. Pure and total over non-negative finite
/// inputs, including arrival counts from a fast link idling for a long time.
pub fn ewma(prev_avg: f64, occupancy: f64, arrivals: u64, weight: f64) -> f64 {
    prev_avg * (1.0 - weight).powf(arrivals as f64) + weight * occupancy
}

/// Virtual arrivals synthesized for an idle interval.
///
/// `ptc` is the link service rate in packets per second; the product is the
/// number of mean-sized packets the link could have drained while idle.
/// The cast saturates, so an absurd idle cannot wrap.
pub fn idle_arrivals(ptc: f64, idle: Duration) -> u64 {
    (ptc * idle.as_secs_f64()).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_arrival_blends_toward_occupancy() {
        let avg = ewma(10.0, 20.0, 1, 0.5);
        assert!((avg - 15.0).abs() < 1e-12, "got {avg}");
    }

    #[test]
    fn zero_weight_freezes_average() {
        assert_eq!(ewma(7.0, 100.0, 1, 0.0), 7.0);
    }

    #[test]
    fn full_weight_tracks_occupancy_exactly() {
        assert_eq!(ewma(7.0, 100.0, 1, 1.0), 100.0);
    }

    #[test]
    fn virtual_arrivals_decay_the_average() {
        // Ten virtual arrivals at zero occupancy shrink the average by
        // (1-w)^10.
        let avg = ewma(10.0, 0.0, 10, 0.1);
        assert!((avg - 10.0 * 0.9f64.powi(10)).abs() < 1e-12);
    }

    #[test]
    fn more_arrivals_never_raise_a_decaying_average() {
        let few = ewma(10.0, 0.0, 2, 0.1);
        let many = ewma(10.0, 0.0, 20, 0.1);
        assert!(many < few);
    }

    #[test]
    fn idle_arrivals_scale_with_duration() {
        // 375 pkt/s idle for 2 s ≈ 750 virtual arrivals.
        assert_eq!(idle_arrivals(375.0, Duration::from_secs(2)), 750);
        assert_eq!(idle_arrivals(375.0, Duration::ZERO), 0);
    }

    #[test]
    fn extreme_arrival_counts_still_decay() {
        // Arrival counts beyond i32 territory must decay the average toward
        // zero, not blow it up.
        let avg = ewma(10.0, 0.0, 3_000_000_000, 0.1);
        assert!(avg.is_finite(), "average exploded: {avg}");
        assert!(avg < 1e-9, "expected near-total decay, got {avg}");
    }

    #[test]
    fn idle_arrivals_survive_long_fast_link_idles() {
        // 250k pkt/s idle for 20M seconds: far past u32 range.
        let m = idle_arrivals(250_000.0, Duration::from_secs(20_000_000));
        assert_eq!(m, 5_000_000_000_000);
    }

    #[test]
    fn idle_arrivals_round_to_nearest() {
        assert_eq!(idle_arrivals(10.0, Duration::from_millis(149)), 1);
        assert_eq!(idle_arrivals(10.0, Duration::from_millis(151)), 2);
    }
}
