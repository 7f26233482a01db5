//! Evolves a feed-forward network that reproduces XOR.

use neat_core::genome::Genome;
use neat_core::{NeatConfig, Population};

fn xor_fitness(genome: &mut Genome) -> neat_core::Result<f32> {
    let cases = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let mut error = 0.0;
    for (inputs, expected) in cases {
        let output = genome.activate(&inputs)?;
        error += (output[0] - expected).powi(2);
    }
    Ok(4.0 - error)
}

fn main() {
    let config = NeatConfig::default();
    let mut population = Population::new(2, 1, 150, config).expect("valid configuration");
    population.set_fitness_callback(xor_fitness);

    for generation in 0..150 {
        population
            .evolve_one_generation()
            .expect("generation did not collapse");
        let best = population.best_genome().expect("at least one genome evaluated");
        log::info!(
            "generation {generation}: species={} best_fitness={:.4}",
            population.species().len(),
            best.fitness
        );
        if best.fitness > 3.9 {
            log::info!("solved after {generation} generations");
            break;
        }
    }

    let mut champion = population.best_genome().expect("champion exists").clone();
    for (inputs, expected) in [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ] {
        let output = champion.activate(&inputs).unwrap();
        println!("{inputs:?} -> {:.3} (expected {expected})", output[0]);
    }
}
