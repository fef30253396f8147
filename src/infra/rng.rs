//! Реализации `RandomSource`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::engine::RandomSource;

/// Боевой источник случайности, засеянный системной энтропией.
pub struct SystemRng {
    inner: StdRng,
}

impl SystemRng {
    pub fn new() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }
}

impl Default for SystemRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRng {
    fn roll_die(&mut self) -> u8 {
        self.inner.gen_range(1..=6)
    }

    fn pick(&mut self, n: usize) -> usize {
        self.inner.gen_range(0..n)
    }

    fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }
}

/// Детерминированный источник для тестов и воспроизведения партий:
/// одинаковое зерно — одинаковая игра.
pub struct DeterministicRng {
    inner: StdRng,
}

impl DeterministicRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for DeterministicRng {
    fn roll_die(&mut self) -> u8 {
        self.inner.gen_range(1..=6)
    }

    fn pick(&mut self, n: usize) -> usize {
        self.inner.gen_range(0..n)
    }

    fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }
}
