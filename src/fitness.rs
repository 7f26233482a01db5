//! The fitness-evaluation contract (spec.md §6, "set_fitness_callback").
//!
//! The teacher expresses this as `environment.rs::Environment`, a trait with
//! an `evaluate(&mut self, &mut Individual)` method; spec.md instead treats
//! it as an evaluation closure supplied once per run, so this module narrows
//! that trait down to a `Fn` alias rather than reintroducing a trait object
//! the spec never asks for.

use crate::error::Result;
use crate::genome::Genome;

/// A fitness function: given a genome, returns its scalar fitness or an
/// error that aborts the in-progress generation (spec.md §4.8, §7).
///
/// Implemented for any closure matching the signature so callers can pass a
/// plain `|genome| { ... }` to
/// [`crate::population::Population::set_fitness_callback`].
pub trait FitnessFn: Fn(&mut Genome) -> Result<f32> {}
impl<F: Fn(&mut Genome) -> Result<f32>> FitnessFn for F {}

/// Wraps a caller-supplied closure so [`crate::population::Population`] can
/// hold it as a single boxed value rather than a generic type parameter.
pub struct FitnessCallback(Box<dyn Fn(&mut Genome) -> Result<f32>>);

impl FitnessCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: FitnessFn + 'static,
    {
        FitnessCallback(Box::new(f))
    }

    pub fn call(&self, genome: &mut Genome) -> Result<f32> {
        (self.0)(genome)
    }
}

impl std::fmt::Debug for FitnessCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FitnessCallback(..)")
    }
}

/// Convenience wrapper so a simple numeric scoring function (no error path)
/// can still be passed to `set_fitness_callback`.
pub fn infallible<F>(f: F) -> impl Fn(&mut Genome) -> Result<f32>
where
    F: Fn(&mut Genome) -> f32,
{
    move |genome| Ok(f(genome))
}
