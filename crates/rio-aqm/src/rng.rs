//! # Random Sources
//!
//! Reproducible uniform sources for the probabilistic drop draw. The engine
//! only sees the [`RandomSource`] trait; tests can substitute a scripted
//! sequence to force either side of the draw.

use rand::rngs::StdRng;
use rand::RngExt as _;
use rand::SeedableRng;

use crate::traits::RandomSource;

// ─── Seeded Uniform ─────────────────────────────────────────────────────────

/// `StdRng`-backed uniform source. Seed it for deterministic replays.
#[derive(Debug)]
pub struct UniformSource {
    rng: StdRng,
}

impl UniformSource {
    /// Deterministic stream for the given seed.
    pub fn seeded(seed: u64) -> Self {
        UniformSource {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for UniformSource {
    fn next_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

// ─── Scripted Source ────────────────────────────────────────────────────────

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// Lets tests decide drop verdicts: a draw of `0.0` loses to any positive
/// probability, a draw just below `1.0` survives almost all of them.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "scripted source needs at least one draw");
        ScriptedSource { draws, next: 0 }
    }

    /// Every draw loses: any positive probability drops.
    pub fn always_drop() -> Self {
        Self::new(vec![0.0])
    }

    /// Every draw survives anything short of certainty.
    pub fn never_drop() -> Self {
        Self::new(vec![1.0 - f64::EPSILON])
    }
}

impl RandomSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        let u = self.draws[self.next % self.draws.len()];
        self.next += 1;
        u
    }
}
