//! Random Number Generator.

use crate::common::*;

const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

/// PCG32 pseudo-random number generator. Each sequence index selects an
/// independent stream, so workers seeded by task index produce the same values
/// no matter which thread runs them.
#[derive(Clone, Debug)]
pub struct RNG {
    state: u64,
    inc: u64,
}

impl Default for RNG {
    fn default() -> Self {
        Self {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl RNG {
    /// Create a new `RNG` seeded with the given sequence.
    ///
    /// * `sequence_index` - The stream to select.
    pub fn new(sequence_index: u64) -> Self {
        let mut rng = Self { state: 0, inc: 0 };
        rng.set_sequence(sequence_index);
        rng
    }

    /// Create a new `RNG` for a stream derived from a base seed and an index,
    /// e.g. a render seed and a photon batch number.
    ///
    /// * `seed`  - Base seed.
    /// * `index` - Sub-stream index.
    pub fn with_seed(seed: u64, index: u64) -> Self {
        Self::new(seed.wrapping_mul(0x9e3779b97f4a7c15) ^ index)
    }

    /// Reinitialize the generator to the start of a sequence.
    ///
    /// * `init_seq` - The stream to select.
    pub fn set_sequence(&mut self, init_seq: u64) {
        self.state = 0;
        self.inc = (init_seq << 1) | 1;
        self.uniform_u32();
        self.state = self.state.wrapping_add(PCG32_DEFAULT_STATE);
        self.uniform_u32();
    }

    /// Returns a uniformly distributed u32 value.
    #[inline]
    pub fn uniform_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xor_shifted.rotate_right(rot)
    }

    /// Returns a uniformly distributed value in `[0, bound)`.
    ///
    /// * `bound` - Exclusive upper bound; must be non-zero.
    pub fn bounded_u32(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0);
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.uniform_u32();
            if r >= threshold {
                return r % bound;
            }
        }
    }

    /// Returns a uniformly distributed value over the half open interval [0.0, 1.0).
    #[inline]
    pub fn uniform_float(&mut self) -> Float {
        min(self.uniform_u32() as Float * hexf32!("0x1.0p-32"), ONE_MINUS_EPSILON)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
