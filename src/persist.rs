//! Optional save/load (`persist` feature), spec.md §6 "Persisted state
//! layout".
//!
//! No teacher file does this; grounded in the sibling pack repo
//! `SilvanCodes-novel-set-neat`'s `serde`+`bincode` combination, which is the
//! same pairing SPEC_FULL.md §10 calls for. The on-disk record mirrors
//! spec.md's described layout exactly: configuration, then genomes (each
//! with its nodes and connections), then species assignments.

use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::error::{NeatError, Result};
use crate::genome::Genome;
use crate::population::Population;

#[derive(Serialize, Deserialize)]
struct PersistedSpecies {
    id: usize,
    representative: Genome,
    members: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
struct PersistedState {
    config: NeatConfig,
    input_arity: usize,
    output_arity: usize,
    generation: usize,
    genomes: Vec<Genome>,
    species: Vec<PersistedSpecies>,
}

/// Serialize a population's configuration, genomes, and species assignments
/// to a byte buffer. The fitness callback is not persisted — the caller
/// must call [`crate::population::Population::set_fitness_callback`] again
/// after [`load`].
pub fn save(population: &Population) -> Result<Vec<u8>> {
    let state = PersistedState {
        config: population.config().clone(),
        input_arity: population.input_arity(),
        output_arity: population.output_arity(),
        generation: population.generation(),
        genomes: population.genomes().to_vec(),
        species: population
            .species()
            .iter()
            .map(|s| PersistedSpecies {
                id: s.id,
                representative: s.representative.clone(),
                members: s.members.clone(),
            })
            .collect(),
    };

    bincode::serde::encode_to_vec(&state, bincode::config::standard())
        .map_err(|e| NeatError::InvalidConfiguration(format!("encode failed: {e}")))
}

/// Reconstruct a population from bytes written by [`save`]. The resulting
/// population has no fitness callback set; [`Population::evolve_one_generation`]
/// will return an error until one is attached.
pub fn load(bytes: &[u8]) -> Result<Population> {
    let (state, _): (PersistedState, usize) =
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| NeatError::InvalidConfiguration(format!("decode failed: {e}")))?;

    Population::from_parts(
        state.input_arity,
        state.output_arity,
        state.generation,
        state.config,
        state.genomes,
        state
            .species
            .into_iter()
            .map(|s| (s.id, s.representative, s.members))
            .collect(),
    )
}
