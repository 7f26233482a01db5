//! Species bookkeeping (spec.md §3 "Species", §4.5).
//!
//! Grounded in the teacher's two divergent `Specie` drafts
//! (`species.rs`/`specie.rs`): first-fit assignment against a representative
//! comes from `species.rs::match_genome`; the age/best-fitness/stagnation
//! fields come from `specie.rs`. The staleness-increment and zero-division
//! bugs the original C carries in the equivalent logic
//! (`neat_remove_stale_species`, `neat_remove_weak_species`) are fixed here
//! per spec.md §9's explicit prescription, not reproduced.

use crate::genome::Genome;

/// One species: a representative genome (for compatibility tests against
/// newcomers) plus its current membership and multi-generation fitness
/// history.
#[derive(Debug, Clone)]
pub struct Species {
    pub id: usize,
    pub representative: Genome,
    pub members: Vec<usize>,
    pub best_fitness_ever: f32,
    pub age: usize,
    pub staleness: usize,
    mean_fitness_history: Vec<f32>,
}

impl Species {
    pub fn new(id: usize, representative: Genome) -> Self {
        let best_fitness_ever = representative.fitness;
        Species {
            id,
            representative,
            members: Vec::new(),
            best_fitness_ever,
            age: 0,
            staleness: 0,
            mean_fitness_history: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean raw fitness of the current membership, looked up via `genomes`
    /// (the population's flat genome vector, indexed by `members`).
    pub fn mean_fitness(&self, genomes: &[Genome]) -> f32 {
        if self.members.is_empty() {
            return 0.0;
        }
        let total: f32 = self.members.iter().map(|&i| genomes[i].fitness).sum();
        total / self.members.len() as f32
    }

    /// Advance one generation's bookkeeping: age, stagnation tracking, and
    /// representative refresh (spec.md §4.5 "Species update"). Must be
    /// called for every species, every generation, regardless of whether it
    /// improved — the original C's bug skipped the call on improvement,
    /// silently exempting the best species from ever going stale.
    pub fn update(&mut self, genomes: &[Genome]) {
        self.age += 1;
        let mean = self.mean_fitness(genomes);
        self.mean_fitness_history.push(mean);

        let best_this_gen = self
            .members
            .iter()
            .map(|&i| genomes[i].fitness)
            .fold(f32::NEG_INFINITY, f32::max);

        if best_this_gen > self.best_fitness_ever {
            self.best_fitness_ever = best_this_gen;
            self.staleness = 0;
        } else {
            self.staleness += 1;
        }

        if let Some(&champion_idx) = self
            .members
            .iter()
            .max_by(|&&a, &&b| genomes[a].fitness.total_cmp(&genomes[b].fitness))
        {
            self.representative = genomes[champion_idx].clone();
        }
    }

    pub fn is_stagnant(&self, threshold: usize) -> bool {
        self.staleness >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeatConfig;
    use crate::innovation::InnovationRecord;
    use crate::rng::Rng;

    fn sample_genome(fitness: f32) -> Genome {
        let config = NeatConfig::default();
        let mut rng = Rng::from_seed(1);
        let mut reg = InnovationRecord::new(0);
        let mut g = Genome::bootstrap(2, 1, &config, &mut rng, &mut reg);
        g.fitness = fitness;
        g
    }

    #[test]
    fn stagnation_counts_unconditionally() {
        let rep = sample_genome(1.0);
        let mut species = Species::new(0, rep);
        let genomes = vec![sample_genome(1.0), sample_genome(0.5)];
        species.members = vec![0, 1];

        for _ in 0..5 {
            species.update(&genomes);
        }
        assert_eq!(species.age, 5);
        assert!(species.staleness >= 4);
    }

    #[test]
    fn improvement_resets_staleness() {
        let rep = sample_genome(1.0);
        let mut species = Species::new(0, rep);
        let flat = vec![sample_genome(1.0)];
        species.members = vec![0];
        species.update(&flat);
        species.staleness = 10;

        let improved = vec![sample_genome(5.0)];
        species.update(&improved);
        assert_eq!(species.staleness, 0);
    }

    #[test]
    fn mean_fitness_of_empty_species_is_zero() {
        let species = Species::new(0, sample_genome(1.0));
        assert_eq!(species.mean_fitness(&[]), 0.0);
    }
}
