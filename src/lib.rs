//! A NEAT (NeuroEvolution of Augmenting Topologies) engine: genomes that
//! encode feed-forward networks as nodes and innovation-tagged connections,
//! mutated structurally and by weight, grouped into species by compatibility
//! distance, and evolved generation over generation under fitness sharing.
//!
//! The evolutionary loop is the library's only mandatory piece — activation,
//! mutation, speciation, and reproduction. Persistence (`persist`), graph
//! export (`viz`), and multi-threaded fitness evaluation (`parallel`) are
//! opt-in via Cargo features.

pub mod activation;
pub mod config;
pub mod connection;
pub mod error;
pub mod fitness;
pub mod genome;
pub mod innovation;
pub mod node;
pub mod population;
pub mod rng;
pub mod species;

#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(feature = "persist")]
pub mod persist;

#[cfg(feature = "viz")]
pub mod viz;

pub use activation::Activation;
pub use config::NeatConfig;
pub use error::{NeatError, Result};
pub use genome::Genome;
pub use population::Population;
pub use rng::Rng;
