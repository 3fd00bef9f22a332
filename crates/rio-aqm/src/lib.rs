//! # rio-aqm
//!
//! RIO (RED with In/Out) active queue management.
//!
//! An admission controller for a single physical FIFO shared by two traffic
//! classes ("In" = in-profile, "Out" = out-of-profile). Every arriving packet
//! is accepted, probabilistically dropped, probabilistically marked, or
//! forcibly dropped/marked based on EWMA-smoothed queue occupancy kept
//! separately for the In subset and for the queue as a whole.
//!
//! ## Crate structure
//!
//! - [`traits`] — Collaborator seams: packet, physical queue, classifier,
//!   random source, clock, admission policy
//! - [`config`] — Validated configuration and queue-weight derivation modes
//! - [`estimator`] — EWMA queue-average update with idle compensation
//! - [`curve`] — Linear/gentle drop-probability curve and count hysteresis
//! - [`class`] — Per-traffic-class mutable state
//! - [`ledger`] — Tagged In-subset occupancy over the shared FIFO
//! - [`fifo`] — Bounded drop-tail queue, the default physical collaborator
//! - [`rng`] — Seeded uniform source and a scripted source for tests
//! - [`stats`] — Admission outcome counters
//! - [`engine`] — The `RioQueue` admission engine

pub mod class;
pub mod config;
pub mod curve;
pub mod engine;
pub mod estimator;
pub mod fifo;
pub mod ledger;
pub mod rng;
pub mod stats;
pub mod traits;

pub use config::{ConfigError, PriorityMethod, QueueMode, QueueWeight, RioConfig};
pub use engine::RioQueue;
pub use fifo::DropTailQueue;
pub use rng::UniformSource;
pub use stats::RioStats;
pub use traits::{
    AdmissionPolicy, Classifier, Clock, DropReason, EnqueueOutcome, ManualClock, Packet,
    PhysicalQueue, QueueLimit, RandomSource, TrafficClass,
};
