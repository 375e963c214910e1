//! The random source the engine draws through.
//!
//! Generators never talk to an RNG directly; they go through
//! [`RandomSource`], a small object-safe trait that is blanket-implemented
//! for every [`rand::RngCore`]. That keeps a draw a pure function of the
//! source: replaying the same seeded generator replays the same value,
//! which is what lets a property engine rewind and shrink a failing draw
//! by minimizing its seed.

use rand::Rng;

/// An abstract source of randomness for value generation.
///
/// All ranges are inclusive on both ends. `float_in` requires a finite
/// span (`hi - lo` must not overflow to infinity); callers splitting the
/// full double range do so before reaching the source.
pub trait RandomSource {
    /// Uniform integer in `[lo, hi]`.
    fn int_in(&mut self, lo: i64, hi: i64) -> i64;

    /// Uniform size in `[lo, hi]`.
    fn size_in(&mut self, lo: usize, hi: usize) -> usize;

    /// Uniform float in `[lo, hi]`.
    fn float_in(&mut self, lo: f64, hi: f64) -> f64;

    /// A fair coin.
    fn flip(&mut self) -> bool;

    /// Fill `buf` with random bytes.
    fn fill(&mut self, buf: &mut [u8]);
}

impl<R: rand::RngCore> RandomSource for R {
    fn int_in(&mut self, lo: i64, hi: i64) -> i64 {
        self.gen_range(lo..=hi)
    }

    fn size_in(&mut self, lo: usize, hi: usize) -> usize {
        self.gen_range(lo..=hi)
    }

    fn float_in(&mut self, lo: f64, hi: f64) -> f64 {
        if lo == hi {
            lo
        } else {
            self.gen_range(lo..=hi)
        }
    }

    fn flip(&mut self) -> bool {
        self.gen()
    }

    fn fill(&mut self, buf: &mut [u8]) {
        rand::RngCore::fill_bytes(self, buf)
    }
}
