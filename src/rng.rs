//! Seeded, explicitly-threaded RNG handle.
//!
//! spec.md §9 ("Process-wide RNG") prescribes an RNG handle carried through
//! the population rather than a thread-local `rand::thread_rng()`, since the
//! latter can't be seeded for the structural-determinism property test
//! (spec.md §8, property 3). Every core operation that draws randomness
//! takes `&mut Rng` explicitly so call order — and therefore the resulting
//! sequence of draws — stays whatever order the single-threaded evolutionary
//! loop runs in.

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Wraps [`SmallRng`] with the handful of draw shapes the evolutionary
/// operators need: uniform reals, integers in a range, and `N(mean, std_dev)`
/// normal samples for weight/bias perturbation (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct Rng(SmallRng);

impl Rng {
    /// Seed a fresh RNG. Two `Rng`s built `from_seed`-ing the same value and
    /// driven through the same call sequence produce byte-identical draws.
    pub fn from_seed(seed: u64) -> Self {
        Rng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from OS entropy, for callers that don't need reproducibility.
    pub fn from_entropy() -> Self {
        Rng(SmallRng::from_os_rng())
    }

    /// Uniform `f32` in `[low, high)`.
    pub fn uniform(&mut self, low: f32, high: f32) -> f32 {
        self.0.random_range(low..high)
    }

    /// Uniform `usize` in `[low, high)`.
    pub fn range(&mut self, low: usize, high: usize) -> usize {
        self.0.random_range(low..high)
    }

    /// `true` with the given probability.
    pub fn chance(&mut self, probability: f32) -> bool {
        self.0.random::<f32>() < probability
    }

    /// Sample `N(mean, std_dev)`.
    pub fn normal(&mut self, mean: f32, std_dev: f32) -> f32 {
        Normal::new(mean, std_dev)
            .expect("std_dev must be finite and non-negative")
            .sample(&mut self.0)
    }
}
