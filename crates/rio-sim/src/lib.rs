//! Deterministic replay toolkit for the RIO admission engine.
//!
//! Provides a simulated packet type, classifiers for both priority methods,
//! and a seeded arrival/service schedule driver producing serializable
//! reports for scenario testing.

pub mod harness;
pub mod packet;

pub use harness::{replay, ReplayConfig, ReplayReport};
pub use packet::{FlowClassifier, HeaderClassifier, SimClassifier, SimPacket};

/// Install a `tracing` subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
