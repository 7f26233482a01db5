//! Node genes (spec.md §3 "Node").

use crate::activation::Activation;

#[cfg(feature = "persist")]
use serde::{Deserialize, Serialize};

/// What a node represents in the network.
///
/// Distinct from [`Placement`]: a bias node's *role* is `Bias` but it is
/// placed (and ordered) like an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize))]
pub enum Role {
    Input,
    Hidden,
    Output,
    Bias,
}

/// Where a node sits in feed-forward ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize))]
pub enum Placement {
    Input,
    Hidden,
    Output,
}

/// A single node gene.
///
/// Invariant (spec.md §3): input and bias nodes never change activation
/// kind; a bias node always yields `1.0`; input values are set from outside
/// the genome, never computed by the activator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize))]
pub struct NodeGene {
    pub id: usize,
    pub role: Role,
    pub placement: Placement,
    pub activation: Activation,
    pub bias: f32,

    /// Current activation value, set by [`crate::genome::Genome::activate`].
    pub value: f32,
    pub active: bool,
}

impl NodeGene {
    pub fn new(id: usize, role: Role, placement: Placement, activation: Activation) -> Self {
        NodeGene {
            id,
            role,
            placement,
            activation,
            bias: 0.0,
            value: 0.0,
            active: true,
        }
    }

    pub fn input(id: usize) -> Self {
        Self::new(id, Role::Input, Placement::Input, Activation::Linear)
    }

    pub fn bias_node(id: usize) -> Self {
        Self::new(id, Role::Bias, Placement::Input, Activation::Linear)
    }

    pub fn output(id: usize, activation: Activation) -> Self {
        Self::new(id, Role::Output, Placement::Output, activation)
    }

    pub fn hidden(id: usize, activation: Activation) -> Self {
        Self::new(id, Role::Hidden, Placement::Hidden, activation)
    }

    /// Whether this node's activation kind may be mutated (spec.md §3, §4.2
    /// item 5: input and bias nodes are exempt).
    pub fn mutable_activation(&self) -> bool {
        !matches!(self.role, Role::Input | Role::Bias)
    }
}
