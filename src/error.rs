//! Crate-wide error type.
//!
//! The evolutionary loop is synchronous and single-threaded (spec.md §5), so
//! every fallible core operation reports through this one enum rather than
//! a per-module error. Mutation rejection and innovation lookups are *not*
//! represented here: they are silent no-ops by design (spec.md §7/§8).

use thiserror::Error;

/// Errors surfaced by the public API.
///
/// Each variant corresponds to one row of spec.md §7's error taxonomy that
/// is recoverable/typed rather than a process-fatal allocation failure.
#[derive(Error, miette::Diagnostic, Debug, Clone, PartialEq)]
pub enum NeatError {
    /// Raised by [`crate::config::NeatConfig::validate`] at population
    /// creation time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The caller passed a vector of the wrong length to
    /// [`crate::genome::Genome::activate`].
    #[error("activation expected {expected} inputs, got {actual}")]
    InvalidInputArity { expected: usize, actual: usize },

    /// Propagated verbatim from the embedder's fitness callback. Receiving
    /// this aborts the in-progress generation without mutating population
    /// state (spec.md §4.8).
    #[error("fitness callback failed: {0}")]
    FitnessCallback(String),

    /// Reproduction could not refill the population to its configured
    /// target size after the retry budget in
    /// [`crate::population::Population::evolve_one_generation`] was
    /// exhausted. Indicates a configuration pathology (e.g. stagnation
    /// limits that cull every species), not a transient runtime condition.
    #[error("population collapsed to zero genomes after reproduction")]
    EmptyPopulation,
}

pub type Result<T> = std::result::Result<T, NeatError>;
