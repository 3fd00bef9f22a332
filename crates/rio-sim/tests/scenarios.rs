//! End-to-end admission scenarios driven through the replay harness.

use std::time::Duration;

use rio_aqm::{
    DropTailQueue, ManualClock, QueueMode, QueueWeight, RioConfig, RioQueue, TrafficClass,
    UniformSource,
};
use rio_sim::{init_tracing, replay, HeaderClassifier, ReplayConfig, SimPacket};

/// The congested all-Out workload shared by several scenarios: tight Out
/// thresholds, a roomy hard limit, and no service draining the queue.
fn congested_cfg() -> RioConfig {
    RioConfig {
        queue_limit: 300,
        min_th_in: 10.0,
        max_th_in: 30.0,
        min_th_out: 3.0,
        max_th_out: 9.0,
        queue_weight: QueueWeight::Fixed(0.002),
        l_interm_in: 10.0,
        l_interm_out: 10.0,
        ..RioConfig::default()
    }
}

fn all_out_schedule() -> ReplayConfig {
    ReplayConfig {
        seed: 7,
        packets: 300,
        ..ReplayConfig::default()
    }
}

#[test]
fn small_queue_fills_and_drains_in_order() {
    init_tracing();
    // Zero thresholds select the legacy defaults, which sit far above a
    // queue limit of 8, so admission is limit-only.
    let cfg = RioConfig {
        queue_limit: 8,
        min_th_in: 0.0,
        max_th_in: 0.0,
        min_th_out: 0.0,
        max_th_out: 0.0,
        ..RioConfig::default()
    };
    let queue = DropTailQueue::for_config(&cfg);
    let mut engine = RioQueue::new(
        cfg,
        queue,
        HeaderClassifier,
        UniformSource::seeded(1),
        ManualClock::new(),
    )
    .unwrap();

    for i in 0..8u64 {
        let outcome = engine.enqueue(SimPacket::new(i, 500, 1, TrafficClass::Out));
        assert!(outcome.is_admitted(), "packet {i} rejected");
        assert_eq!(engine.occupancy(), i + 1);
    }

    for i in 0..8u64 {
        let served = engine.dequeue().expect("queue drained early");
        assert_eq!(served.uid, i, "service order differs from arrival order");
    }
    assert!(engine.dequeue().is_none());
    assert_eq!(engine.occupancy(), 0);
}

#[test]
fn small_byte_queue_tracks_byte_occupancy() {
    init_tracing();
    let cfg = RioConfig {
        mode: QueueMode::Bytes,
        queue_limit: 4000,
        min_th_in: 0.0,
        max_th_in: 0.0,
        min_th_out: 0.0,
        max_th_out: 0.0,
        ..RioConfig::default()
    };
    let queue = DropTailQueue::for_config(&cfg);
    let mut engine = RioQueue::new(
        cfg,
        queue,
        HeaderClassifier,
        UniformSource::seeded(1),
        ManualClock::new(),
    )
    .unwrap();

    for i in 0..8u64 {
        assert!(engine
            .enqueue(SimPacket::new(i, 500, 1, TrafficClass::Out))
            .is_admitted());
        assert_eq!(engine.occupancy(), (i + 1) * 500);
    }
    let first = engine.dequeue().expect("non-empty queue");
    assert_eq!(first.uid, 0);
    assert_eq!(engine.occupancy(), 7 * 500);
}

#[test]
fn out_heavy_load_penalizes_the_out_class() {
    init_tracing();
    let report = replay(congested_cfg(), &all_out_schedule()).unwrap();

    assert!(
        report.stats.total_drops() > 0,
        "sustained congestion produced no drops: {:?}",
        report.stats
    );
    assert!(
        report.out_drops > report.in_drops,
        "Out drops {} should exceed In drops {}",
        report.out_drops,
        report.in_drops
    );
    assert_eq!(report.in_drops, 0, "no In traffic was offered");
}

#[test]
fn faster_average_and_tighter_in_ceiling_drop_more() {
    init_tracing();
    let base = replay(congested_cfg(), &all_out_schedule()).unwrap();

    let aggressive = RioConfig {
        max_th_in: 20.0,
        queue_weight: QueueWeight::Fixed(0.02),
        ..congested_cfg()
    };
    let sharper = replay(aggressive, &all_out_schedule()).unwrap();

    assert!(
        sharper.stats.total_drops() > base.stats.total_drops(),
        "faster estimator should drop strictly more: {} vs {}",
        sharper.stats.total_drops(),
        base.stats.total_drops()
    );
}

#[test]
fn tightening_max_threshold_never_reduces_drops() {
    init_tracing();
    let base = replay(congested_cfg(), &all_out_schedule()).unwrap();

    let tight = RioConfig {
        max_th_out: 5.0,
        ..congested_cfg()
    };
    let tightened = replay(tight, &all_out_schedule()).unwrap();

    assert!(
        tightened.stats.total_drops() >= base.stats.total_drops(),
        "maxTh 5 dropped {} but maxTh 9 dropped {}",
        tightened.stats.total_drops(),
        base.stats.total_drops()
    );
}

#[test]
fn byte_mode_congestion_also_sheds_load() {
    init_tracing();
    let cfg = RioConfig {
        mode: QueueMode::Bytes,
        queue_limit: 150_000,
        min_th_in: 5_000.0,
        max_th_in: 15_000.0,
        min_th_out: 1_500.0,
        max_th_out: 4_500.0,
        queue_weight: QueueWeight::Fixed(0.002),
        l_interm_in: 10.0,
        l_interm_out: 10.0,
        ..RioConfig::default()
    };
    let report = replay(cfg, &all_out_schedule()).unwrap();

    assert!(
        report.stats.total_drops() > 0,
        "byte-mode congestion produced no drops"
    );
    assert!(report.final_occupancy < 150_000);
}

#[test]
fn in_profile_traffic_is_protected_under_mixed_load() {
    init_tracing();
    let schedule = ReplayConfig {
        in_every: Some(3),
        ..all_out_schedule()
    };
    let report = replay(congested_cfg(), &schedule).unwrap();

    assert!(report.stats.total_drops() > 0, "no congestion reached");
    assert!(
        report.out_drops > report.in_drops,
        "In class not protected: {} In vs {} Out drops",
        report.in_drops,
        report.out_drops
    );
    assert!(
        report.final_in_occupancy <= report.final_occupancy,
        "In subset exceeds the whole queue"
    );
}

#[test]
fn ecn_marks_replace_drops_for_capable_traffic() {
    init_tracing();
    let cfg = RioConfig {
        use_ecn: true,
        use_hard_drop: false,
        ..congested_cfg()
    };
    let schedule = ReplayConfig {
        ecn_capable: true,
        ..all_out_schedule()
    };
    let report = replay(cfg, &schedule).unwrap();

    assert_eq!(report.admitted, 300, "capable packets must be marked, not dropped");
    assert_eq!(report.stats.total_drops(), 0);
    assert!(report.marked > 0, "congestion produced no marks");
    assert_eq!(report.marked as u64, report.stats.total_marks());
}

#[test]
fn interleaved_service_keeps_fifo_order() {
    init_tracing();
    let schedule = ReplayConfig {
        service_every: Some(2),
        arrival_step: Duration::from_millis(5),
        ..all_out_schedule()
    };
    let report = replay(congested_cfg(), &schedule).unwrap();

    let mut sorted = report.dequeued_uids.clone();
    sorted.sort_unstable();
    assert_eq!(
        report.dequeued_uids, sorted,
        "service order must follow admission order"
    );
    assert!(!report.dequeued_uids.is_empty());
}
