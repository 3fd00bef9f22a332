//! # Admission Engine
//!
//! `RioQueue` orchestrates the estimator, the per-class drop curves, and the
//! hysteresis counters into one admission decision per arriving packet. It
//! owns no packets beyond the injected physical queue and exposes the
//! [`AdmissionPolicy`] surface to the scheduler.
//!
//! ## Per-class state machine
//!
//! ```text
//!   Quiescent ──avg ≥ minTh──▶ Transitioning ──next packet──▶ Engaged
//!       ▲                                                        │
//!       └───────────────avg < minTh──────────────────────────────┘
//!
//!   Engaged: probabilistic early drop between minTh and maxTh.
//!   Saturated (avg ≥ maxTh, or 2·maxTh when gentle, or the queue limit):
//!   forced outcomes, entered from any state.
//! ```
//!
//! Single-threaded and synchronous: the caller serializes all enqueue and
//! dequeue events; every call is O(1) beyond the physical queue's own work.

use std::marker::PhantomData;
use std::time::Duration;

use tracing::{debug, trace};

use crate::class::ClassState;
use crate::config::{ConfigError, QueueMode, QueueWeight, RioConfig};
use crate::curve::{amplify, DropCurve};
use crate::estimator::{ewma, idle_arrivals};
use crate::ledger::InLedger;
use crate::stats::RioStats;
use crate::traits::{
    AdmissionPolicy, Classifier, Clock, DropReason, EnqueueOutcome, Packet, PhysicalQueue,
    QueueLimit, RandomSource, TrafficClass,
};

// ─── Drop Type ──────────────────────────────────────────────────────────────

/// Internal outcome of the per-class decision stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropType {
    None,
    Unforced,
    Forced,
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// The RIO admission engine over one physical FIFO.
///
/// Generic over the packet type and the four injected collaborators; see
/// [`crate::traits`]. Construction validates the configuration and the
/// physical queue's capacity eagerly and fails before any packet is
/// processed.
pub struct RioQueue<T, Q, C, R, K> {
    cfg: RioConfig,
    queue: Q,
    classifier: C,
    rng: R,
    clock: K,

    /// In-subset state; its average tracks only In-classified occupancy.
    in_state: ClassState,
    /// Out-class state; its average tracks the whole physical queue.
    out_state: ClassState,

    /// Link service rate in packets per second.
    ptc: f64,
    /// Effective EWMA weight after derivation.
    q_w: f64,

    idle: bool,
    idle_in: bool,
    idle_start: Duration,

    ledger: InLedger,
    stats: RioStats,

    _item: PhantomData<T>,
}

impl<T, Q, C, R, K> RioQueue<T, Q, C, R, K>
where
    T: Packet,
    Q: PhysicalQueue<T>,
    C: Classifier<T>,
    R: RandomSource,
    K: Clock,
{
    /// Build an engine over the given collaborators.
    ///
    /// Fails fast on an invalid configuration or a physical queue whose unit
    /// or capacity cannot honor `queue_limit`.
    pub fn new(
        cfg: RioConfig,
        queue: Q,
        classifier: C,
        rng: R,
        clock: K,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        check_queue(&cfg, &queue)?;
        let placeholder = DropCurve::derive(0.0, 1.0, false, 1.0);
        let mut engine = RioQueue {
            cfg,
            queue,
            classifier,
            rng,
            clock,
            in_state: ClassState::new(placeholder),
            out_state: ClassState::new(placeholder),
            ptc: 0.0,
            q_w: 0.0,
            idle: true,
            idle_in: true,
            idle_start: Duration::ZERO,
            ledger: InLedger::default(),
            stats: RioStats::default(),
            _item: PhantomData,
        };
        engine.parameterize();
        Ok(engine)
    }

    /// Re-derive all coefficients and reset every average, counter, and
    /// statistic. Idempotent: two calls with the same configuration produce
    /// identical starting state.
    pub fn initialize(&mut self, cfg: RioConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        check_queue(&cfg, &self.queue)?;
        self.cfg = cfg;
        self.parameterize();
        Ok(())
    }

    /// Derive `ptc`, the queue weight, default thresholds, and the per-class
    /// curves; zero all mutable state.
    ///
    /// This is the only point where the link bandwidth feeds the
    /// coefficients: a later bandwidth change does not retune a running
    /// engine (long-standing documented behavior).
    fn parameterize(&mut self) {
        self.ptc = self.cfg.packet_time_constant();

        let scale = match self.cfg.mode {
            QueueMode::Packets => 1.0,
            QueueMode::Bytes => self.cfg.mean_pkt_size as f64,
        };
        let (min_in, max_in) = if self.cfg.min_th_in == 0.0 && self.cfg.max_th_in == 0.0 {
            (15.0 * scale, 30.0 * scale)
        } else {
            (self.cfg.min_th_in, self.cfg.max_th_in)
        };
        let (min_out, max_out) = if self.cfg.min_th_out == 0.0 && self.cfg.max_th_out == 0.0 {
            (5.0 * scale, 15.0 * scale)
        } else {
            (self.cfg.min_th_out, self.cfg.max_th_out)
        };

        self.in_state = ClassState::new(DropCurve::derive(
            min_in,
            max_in,
            self.cfg.gentle_in,
            self.cfg.l_interm_in,
        ));
        self.out_state = ClassState::new(DropCurve::derive(
            min_out,
            max_out,
            self.cfg.gentle_out,
            self.cfg.l_interm_out,
        ));

        self.q_w = match self.cfg.queue_weight {
            QueueWeight::Fixed(w) => w,
            QueueWeight::LinkCapacity => 1.0 - (-1.0 / self.ptc).exp(),
            QueueWeight::BandwidthDelay => {
                let rtt = (3.0 * (self.cfg.link_delay.as_secs_f64() + 1.0 / self.ptc)).max(0.1);
                1.0 - (-1.0 / (10.0 * rtt * self.ptc)).exp()
            }
            QueueWeight::SlowLinkCapacity => 1.0 - (-10.0 / self.ptc).exp(),
        };

        self.idle = true;
        self.idle_in = true;
        self.idle_start = Duration::ZERO;
        self.ledger.reset();
        self.stats = RioStats::default();

        debug!(
            ptc = self.ptc,
            q_w = self.q_w,
            min_in,
            max_in,
            min_out,
            max_out,
            "derived RIO parameters"
        );
    }

    // ─── Admission ──────────────────────────────────────────────────────

    /// Decide the fate of one arriving packet.
    pub fn enqueue(&mut self, item: T) -> EnqueueOutcome {
        let class = self.classifier.class_of(&item);
        let size = item.size();
        let now = self.clock.now();
        let q_len = self.queue_size();

        // The combined average serves the Out class and tracks the whole
        // queue regardless of the arrival's class. Occupancy is sampled
        // before this packet is admitted.
        let mut arrivals: u64 = 1;
        if self.idle {
            self.idle = false;
            arrivals =
                arrivals.saturating_add(idle_arrivals(self.ptc, now.saturating_sub(self.idle_start)));
        }
        self.out_state.avg = ewma(self.out_state.avg, q_len as f64, arrivals, self.q_w);

        let drop_type = match class {
            TrafficClass::In => {
                let q_len_in = self.ledger.occupancy(self.cfg.mode);
                let mut arrivals_in: u64 = 1;
                if self.idle_in {
                    self.idle_in = false;
                    arrivals_in = arrivals_in
                        .saturating_add(idle_arrivals(self.ptc, now.saturating_sub(self.idle_start)));
                }
                self.in_state.avg =
                    ewma(self.in_state.avg, q_len_in as f64, arrivals_in, self.q_w);
                self.in_state.tally(size);
                self.verdict(TrafficClass::In, q_len_in, size, q_len)
            }
            TrafficClass::Out => {
                self.out_state.tally(size);
                self.verdict(TrafficClass::Out, q_len, size, q_len)
            }
        };

        self.apply(drop_type, class, size, item)
    }

    /// Per-class decision: NONE, UNFORCED, or FORCED, with the hard
    /// queue-limit override applied last.
    fn verdict(
        &mut self,
        class: TrafficClass,
        class_q_len: u64,
        size: u32,
        total_q_len: u64,
    ) -> DropType {
        let (above_min, forced, engaged) = {
            let s = self.state_ref(class);
            (s.avg >= s.curve.min_th, s.forced(), s.engaged)
        };

        let mut drop_type = if above_min && class_q_len > 1 {
            if forced {
                DropType::Forced
            } else if !engaged {
                // First packet across minTh: consume it as the transition,
                // restart the inter-drop tally at this arrival.
                self.state_mut(class).engage(size);
                DropType::None
            } else if self.probe_early(class, size) {
                DropType::Unforced
            } else {
                DropType::None
            }
        } else {
            self.state_mut(class).relax();
            DropType::None
        };

        // Hard capacity override: checked last, wins over any probabilistic
        // outcome.
        if total_q_len >= self.cfg.queue_limit {
            drop_type = DropType::Forced;
        }
        drop_type
    }

    /// The probabilistic early-drop draw for an engaged class. Symmetric for
    /// In and Out. Resets the class tally on a drop verdict.
    fn probe_early(&mut self, class: TrafficClass, arriving: u32) -> bool {
        let byte_mode = self.cfg.mode == QueueMode::Bytes;
        let p = {
            let s = self.state_ref(class);
            let base = s.curve.base_probability(s.avg);
            amplify(
                base,
                s.count,
                s.count_bytes,
                self.cfg.mean_pkt_size,
                self.cfg.wait,
                arriving,
                byte_mode,
            )
        };
        let u = self.rng.next_uniform();
        let s = self.state_mut(class);
        s.prob = p;
        if u <= p {
            s.reset_tally();
            true
        } else {
            false
        }
    }

    /// Turn the drop type into the final outcome: resolve ECN mark-vs-drop,
    /// bump statistics, and hand admitted packets to the physical queue.
    fn apply(
        &mut self,
        drop_type: DropType,
        class: TrafficClass,
        size: u32,
        mut item: T,
    ) -> EnqueueOutcome {
        let avg = self.state_ref(class).avg;
        let mut marked = false;

        match drop_type {
            DropType::Unforced => {
                if !self.cfg.use_ecn || !item.mark() {
                    debug!(?class, avg, "dropping packet on probabilistic verdict");
                    self.stats.unforced_drop += 1;
                    return EnqueueOutcome::Dropped(DropReason::Unforced);
                }
                debug!(?class, avg, "marking packet on probabilistic verdict");
                self.stats.unforced_mark += 1;
                marked = true;
            }
            DropType::Forced => {
                if self.cfg.use_hard_drop || !self.cfg.use_ecn || !item.mark() {
                    debug!(?class, avg, "dropping packet on forced verdict");
                    self.stats.forced_drop += 1;
                    if self.cfg.ns1_compat {
                        self.state_mut(class).reset_tally();
                    }
                    return EnqueueOutcome::Dropped(DropReason::Forced);
                }
                debug!(?class, avg, "marking packet on forced verdict");
                self.stats.forced_mark += 1;
                marked = true;
            }
            DropType::None => {}
        }

        if self.queue.enqueue(item) {
            if class == TrafficClass::In {
                self.ledger.credit(size);
            }
            trace!(?class, size, occupancy = self.queue_size(), "admitted");
            if marked {
                EnqueueOutcome::Marked
            } else {
                EnqueueOutcome::Admitted
            }
        } else {
            // Capacity race with the physical queue's own bookkeeping.
            self.stats.qlim_drop += 1;
            EnqueueOutcome::Dropped(DropReason::QueueLimit)
        }
    }

    // ─── Dequeue / Peek ─────────────────────────────────────────────────

    /// Pop the oldest packet. An empty queue starts the idle period for both
    /// classes; a popped In packet releases its ledger space.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.queue.is_empty() {
            trace!("queue empty on dequeue");
            self.idle = true;
            self.idle_in = true;
            self.idle_start = self.clock.now();
            return None;
        }
        self.idle = false;
        let item = self.queue.dequeue()?;
        if self.classifier.class_of(&item) == TrafficClass::In {
            self.idle_in = false;
            self.ledger.debit(item.size());
        }
        Some(item)
    }

    /// Observe the head of the queue. No state is touched.
    pub fn peek(&self) -> Option<&T> {
        self.queue.peek()
    }

    // ─── Inspection ─────────────────────────────────────────────────────

    /// Outcome counters since the last initialization.
    pub fn stats(&self) -> RioStats {
        self.stats
    }

    /// Total occupancy in the configured unit.
    pub fn occupancy(&self) -> u64 {
        self.queue_size()
    }

    /// In-subset occupancy in the configured unit.
    pub fn in_occupancy(&self) -> u64 {
        self.ledger.occupancy(self.cfg.mode)
    }

    /// `(in_average, combined_average)` in the configured unit.
    pub fn averages(&self) -> (f64, f64) {
        (self.in_state.avg, self.out_state.avg)
    }

    /// Replace the four thresholds, validated immediately.
    ///
    /// The derived curve coefficients pick the new values up at the next
    /// [`initialize`](Self::initialize), not before.
    pub fn set_thresholds(
        &mut self,
        min_th_in: f64,
        max_th_in: f64,
        min_th_out: f64,
        max_th_out: f64,
    ) -> Result<(), ConfigError> {
        if min_th_in > max_th_in {
            return Err(ConfigError::ThresholdOrder {
                class: "In",
                min: min_th_in,
                max: max_th_in,
            });
        }
        if min_th_out > max_th_out {
            return Err(ConfigError::ThresholdOrder {
                class: "Out",
                min: min_th_out,
                max: max_th_out,
            });
        }
        self.cfg.min_th_in = min_th_in;
        self.cfg.max_th_in = max_th_in;
        self.cfg.min_th_out = min_th_out;
        self.cfg.max_th_out = max_th_out;
        Ok(())
    }

    fn queue_size(&self) -> u64 {
        // Exhaustive over the mode enum: an unknown unit is unrepresentable.
        match self.cfg.mode {
            QueueMode::Packets => self.queue.occupancy_packets() as u64,
            QueueMode::Bytes => self.queue.occupancy_bytes(),
        }
    }

    fn state_ref(&self, class: TrafficClass) -> &ClassState {
        match class {
            TrafficClass::In => &self.in_state,
            TrafficClass::Out => &self.out_state,
        }
    }

    fn state_mut(&mut self, class: TrafficClass) -> &mut ClassState {
        match class {
            TrafficClass::In => &mut self.in_state,
            TrafficClass::Out => &mut self.out_state,
        }
    }
}

fn check_queue<T, Q: PhysicalQueue<T>>(cfg: &RioConfig, queue: &Q) -> Result<(), ConfigError> {
    let capacity = match (cfg.mode, queue.limit()) {
        (QueueMode::Packets, QueueLimit::Packets(cap)) => cap as u64,
        (QueueMode::Bytes, QueueLimit::Bytes(cap)) => cap,
        (mode, limit) => {
            return Err(ConfigError::QueueModeMismatch { queue: limit, mode });
        }
    };
    if capacity < cfg.queue_limit {
        return Err(ConfigError::QueueTooSmall {
            capacity,
            limit: cfg.queue_limit,
        });
    }
    Ok(())
}

impl<T, Q, C, R, K> AdmissionPolicy<T> for RioQueue<T, Q, C, R, K>
where
    T: Packet,
    Q: PhysicalQueue<T>,
    C: Classifier<T>,
    R: RandomSource,
    K: Clock,
{
    fn enqueue(&mut self, item: T) -> EnqueueOutcome {
        RioQueue::enqueue(self, item)
    }

    fn dequeue(&mut self) -> Option<T> {
        RioQueue::dequeue(self)
    }

    fn peek(&self) -> Option<&T> {
        RioQueue::peek(self)
    }
}
