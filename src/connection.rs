//! Connection genes (spec.md §3 "Connection (gene)").

#[cfg(feature = "persist")]
use serde::{Deserialize, Serialize};

/// A single weighted, directed edge between two nodes, tagged with its
/// innovation id.
///
/// Invariant (spec.md §3): `in_node != out_node`; no two connections in one
/// genome share `(in_node, out_node)` — enforced by
/// [`crate::genome::Genome`]'s `connection_set`, not by this type itself.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize))]
pub struct ConnectionGene {
    pub innovation: usize,
    pub in_node: usize,
    pub out_node: usize,
    pub weight: f32,
    pub enabled: bool,
}

impl ConnectionGene {
    pub fn new(innovation: usize, in_node: usize, out_node: usize, weight: f32) -> Self {
        ConnectionGene {
            innovation,
            in_node,
            out_node,
            weight,
            enabled: true,
        }
    }

    pub fn endpoints(&self) -> (usize, usize) {
        (self.in_node, self.out_node)
    }
}
