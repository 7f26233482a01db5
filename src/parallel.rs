//! Optional parallel fitness evaluation (`parallel` feature), spec.md §5
//! "The only permissible concurrency boundary is the fitness evaluation
//! phase".
//!
//! No teacher file threads anything; grounded in the sibling pack repo
//! `SilvanCodes-novel-set-neat`'s `rayon` dependency, used for exactly this
//! shape of embarrassingly-parallel per-genome work. The RNG and innovation
//! registry are never touched here, matching spec.md §5's "workers do not
//! touch the registry" clause.

use rayon::prelude::*;

use crate::error::Result;
use crate::genome::Genome;

/// Evaluate `callback` over every genome in `genomes`, partitioned across
/// rayon's thread pool. Each genome is visited by exactly one worker; no
/// shared mutable state crosses workers (spec.md §5).
pub fn evaluate_parallel<F>(genomes: &mut [Genome], callback: F) -> Result<()>
where
    F: Fn(&mut Genome) -> Result<f32> + Sync,
{
    let results: Vec<Result<f32>> = genomes.par_iter_mut().map(|genome| callback(genome)).collect();
    for (genome, result) in genomes.iter_mut().zip(results) {
        genome.fitness = result?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeatConfig;
    use crate::innovation::InnovationRecord;
    use crate::rng::Rng;

    #[test]
    fn parallel_evaluation_matches_sequential() {
        let config = NeatConfig::default();
        let mut rng = Rng::from_seed(1);
        let mut reg = InnovationRecord::new(0);
        let mut genomes: Vec<Genome> = (0..8)
            .map(|_| Genome::bootstrap(2, 1, &config, &mut rng, &mut reg))
            .collect();

        evaluate_parallel(&mut genomes, |g| {
            let out = g.activate(&[1.0, 0.0])?;
            Ok(out[0])
        })
        .unwrap();

        assert!(genomes.iter().all(|g| g.fitness.is_finite()));
    }
}
