//! Evolution configuration (spec.md §6 "Configuration surface").
//!
//! Field names and default values are grounded in the teacher's
//! `context.rs::NeatConfig` struct, extended with the knobs spec.md names
//! that the teacher's version dropped (species/global elitism, stagnation
//! vs. max-stagnation, interspecies mating rate, the recurrent-mode flag)
//! and with defaults cross-checked against
//! `examples/original_source/include/config.h`.

use crate::activation::Activation;
use crate::error::{NeatError, Result};

#[cfg(feature = "persist")]
use serde::{Deserialize, Serialize};

/// All coefficients and gates the evolutionary loop consults.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize))]
pub struct NeatConfig {
    // -- General --
    /// Target genome count per generation.
    pub population_size: usize,
    /// Activation kind assigned to freshly-created output and hidden nodes.
    pub default_activation: Activation,
    /// When `false` (the default), structural mutations preserve the
    /// feed-forward invariant (spec.md §3, §9 "recurrent-mode flag").
    pub allow_recurrent: bool,

    // -- Compatibility / speciation (spec.md §4.4, §4.5) --
    pub compatibility_threshold: f32,
    /// Adaptive adjustment step applied to `compatibility_threshold` when
    /// the species count drifts from `target_species_count`.
    pub compatibility_change: f32,
    pub target_species_count: usize,
    pub excess_coefficient: f32,
    pub disjoint_coefficient: f32,
    pub weight_coefficient: f32,
    /// Genomes below this connection count are normalised by `1` instead of
    /// genome size in the compatibility formula (spec.md §4.4).
    pub small_genome_threshold: usize,

    // -- Mutation (spec.md §4.2) --
    /// Gates both "perturb a connection weight" and "perturb a node bias"
    /// (spec.md §4.2 item 1: "For every node, with the same rate, perturb
    /// its bias").
    pub weight_mutate_rate: f32,
    /// Standard deviation of the `N(0, sigma)` perturbation applied to
    /// weights and biases.
    pub weight_mutate_power: f32,
    /// Probability of replacing (vs. perturbing) a weight/bias when the
    /// `weight_mutate_rate` gate fires.
    pub weight_replace_rate: f32,
    pub add_connection_prob: f32,
    pub add_node_prob: f32,
    pub toggle_connection_prob: f32,
    pub activation_mutate_rate: f32,

    // -- Reproduction (spec.md §4.6) --
    pub crossover_rate: f32,
    /// Probability the second crossover parent is drawn from a different
    /// species ("interspecies crossover").
    pub interspecies_mating_rate: f32,
    /// Probability a gene disabled in either parent is inherited disabled
    /// in the child (spec.md §4.6).
    pub disable_inherit_prob: f32,
    /// Top fraction of each species eligible to reproduce.
    pub survival_threshold: f32,
    /// Top-k genomes copied verbatim per species.
    pub elitism: usize,
    /// Extra top-k genomes copied verbatim for the whole population,
    /// regardless of species (spec.md §6 "species_elitism").
    pub species_elitism: usize,
    /// Minimum species size before elitism applies (small species skip it).
    pub elitism_min_species_size: usize,

    // -- Stagnation (spec.md §4.5, §4.6) --
    /// Generations without improvement before a species is considered
    /// stagnant.
    pub stagnation_threshold: usize,
    /// Bounded retry budget for topping the next generation up to
    /// `population_size` (spec.md §4.8).
    pub reproduction_retry_budget: usize,
}

impl Default for NeatConfig {
    fn default() -> Self {
        NeatConfig {
            population_size: 150,
            default_activation: Activation::Sigmoid,
            allow_recurrent: false,

            compatibility_threshold: 3.0,
            compatibility_change: 0.3,
            target_species_count: 15,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_coefficient: 0.4,
            small_genome_threshold: 20,

            weight_mutate_rate: 0.8,
            weight_mutate_power: 0.5,
            weight_replace_rate: 0.1,
            add_connection_prob: 0.05,
            add_node_prob: 0.03,
            toggle_connection_prob: 0.1,
            activation_mutate_rate: 0.1,

            crossover_rate: 0.75,
            interspecies_mating_rate: 0.05,
            disable_inherit_prob: 0.75,
            survival_threshold: 0.2,
            elitism: 1,
            species_elitism: 0,
            elitism_min_species_size: 5,

            stagnation_threshold: 15,
            reproduction_retry_budget: 3,
        }
    }
}

impl NeatConfig {
    /// Surfaced at population creation (spec.md §7 "Invalid configuration").
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.population_size == 0 {
            problems.push("population_size must be > 0");
        }
        if self.compatibility_threshold <= 0.0 {
            problems.push("compatibility_threshold must be > 0");
        }
        if self.small_genome_threshold == 0 {
            problems.push("small_genome_threshold must be > 0");
        }

        for (name, prob) in [
            ("weight_mutate_rate", self.weight_mutate_rate),
            ("weight_replace_rate", self.weight_replace_rate),
            ("add_connection_prob", self.add_connection_prob),
            ("add_node_prob", self.add_node_prob),
            ("toggle_connection_prob", self.toggle_connection_prob),
            ("activation_mutate_rate", self.activation_mutate_rate),
            ("crossover_rate", self.crossover_rate),
            ("interspecies_mating_rate", self.interspecies_mating_rate),
            ("survival_threshold", self.survival_threshold),
            ("disable_inherit_prob", self.disable_inherit_prob),
        ] {
            if !(0.0..=1.0).contains(&prob) {
                problems.push(name);
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(NeatError::InvalidConfiguration(problems.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(NeatConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_population_is_rejected() {
        let config = NeatConfig {
            population_size: 0,
            ..NeatConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let config = NeatConfig {
            crossover_rate: 1.5,
            ..NeatConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
