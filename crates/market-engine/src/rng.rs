//! Deterministic Park-Miller linear-congruential generator.
//!
//! Every random decision in the simulation flows through one instance of
//! this generator, so a fixed seed plus a fixed command sequence replays
//! byte-identically. Cryptographic quality is a non-goal.

use rand::Rng;
use serde::{Deserialize, Serialize};

const MODULUS: u64 = 2_147_483_647;
const MULTIPLIER: u64 = 16_807;

/// Seeded LCG over the multiplicative group mod 2^31 - 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a generator from a seed. Seeds of 0 collapse the generator,
    /// so they are coerced to 1.
    pub fn new(seed: u32) -> Self {
        let state = u64::from(seed) % MODULUS;
        SeededRng {
            state: if state == 0 { 1 } else { state },
        }
    }

    /// Create a generator from OS entropy. Never used on deterministic paths.
    pub fn from_entropy() -> Self {
        SeededRng::new(rand::thread_rng().gen_range(1..MODULUS as u32))
    }

    /// Next sample in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER) % MODULUS;
        (self.state - 1) as f64 / (MODULUS - 1) as f64
    }

    /// Uniform sample in [lo, hi).
    pub fn next_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Uniform integer in [min, max] inclusive.
    pub fn next_int(&mut self, min: u32, max: u32) -> u32 {
        let span = (max - min + 1) as f64;
        min + (self.next_f64() * span) as u32
    }

    /// Uniform index into a slice of the given length. Length must be > 0.
    pub fn next_index(&mut self, len: usize) -> usize {
        (self.next_f64() * len as f64) as usize
    }
}
