//! Random draw sources for disruption triggering.
//!
//! The engine only ever asks for one uniform value per catalog entry per
//! cycle, through [`UniformSource`]. Any `rand::Rng` is a source; runs that
//! must be reproducible use [`SimRng`], and tests that need exact firing
//! patterns use [`ScriptedDraws`].

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::DEFAULT_SEED;

/// A source of uniform draws in [0.0, 1.0).
pub trait UniformSource {
    fn next_draw(&mut self) -> f64;
}

impl<R: Rng + ?Sized> UniformSource for R {
    fn next_draw(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Seeded ChaCha8 generator, identical output across platforms.
#[derive(Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self::from_seed_u64(DEFAULT_SEED)
    }
}

impl SimRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl UniformSource for SimRng {
    fn next_draw(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed sequence of draws.
///
/// Once the script runs out every draw is `1.0`, which never satisfies
/// `draw < probability`, so nothing fires.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraws {
    draws: VecDeque<f64>,
    consumed: usize,
}

impl ScriptedDraws {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            consumed: 0,
        }
    }

    /// Draws that always fire (`0.0`) for `n` calls.
    pub fn always(n: usize) -> Self {
        Self::new(std::iter::repeat(0.0).take(n))
    }

    /// Number of draws taken so far, scripted or not.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl UniformSource for ScriptedDraws {
    fn next_draw(&mut self) -> f64 {
        self.consumed += 1;
        self.draws.pop_front().unwrap_or(1.0)
    }
}
