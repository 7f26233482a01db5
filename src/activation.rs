//! The fixed, closed set of node activation functions (spec.md §2, §9
//! "Dynamic dispatch over activation kinds becomes a closed enumeration").
//!
//! The ten variants and their formulas match
//! `examples/original_source/include/config.h`'s `neat_activation_type_t`
//! and `neat_*` scalar functions one-for-one; the teacher's own
//! `ActivationFunction` only carried five of these and is extended here to
//! the full set spec.md requires.

#[cfg(feature = "persist")]
use serde::{Deserialize, Serialize};

/// One of the ten scalar non-linearities a node may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize))]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    Linear,
    Step,
    Softsign,
    Sin,
    Gaussian,
    Abs,
}

/// The full closed set, in a stable order — used by the activation-change
/// mutation (spec.md §4.2 item 5) to pick a uniformly random kind.
pub const ALL: [Activation; 10] = [
    Activation::Sigmoid,
    Activation::Tanh,
    Activation::Relu,
    Activation::LeakyRelu,
    Activation::Linear,
    Activation::Step,
    Activation::Softsign,
    Activation::Sin,
    Activation::Gaussian,
    Activation::Abs,
];

impl Activation {
    /// Evaluate `f(x)`.
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => if x > 0.0 { x } else { 0.01 * x },
            Activation::Linear => x,
            Activation::Step => if x > 0.0 { 1.0 } else { 0.0 },
            Activation::Softsign => x / (1.0 + x.abs()),
            Activation::Sin => x.sin(),
            Activation::Gaussian => (-x * x).exp(),
            Activation::Abs => x.abs(),
        }
    }

    /// Pick a uniformly random activation kind, for the activation-change
    /// mutation.
    pub fn random(rng: &mut crate::rng::Rng) -> Activation {
        ALL[rng.range(0, ALL.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_bounds() {
        assert!(Activation::Sigmoid.apply(0.0) - 0.5 < 1e-6);
        assert!(Activation::Sigmoid.apply(100.0) > 0.99);
        assert!(Activation::Sigmoid.apply(-100.0) < 0.01);
    }

    #[test]
    fn step_is_binary() {
        assert_eq!(Activation::Step.apply(1.0), 1.0);
        assert_eq!(Activation::Step.apply(-1.0), 0.0);
    }

    #[test]
    fn gaussian_peaks_at_zero() {
        assert_eq!(Activation::Gaussian.apply(0.0), 1.0);
        assert!(Activation::Gaussian.apply(3.0) < 1.0);
    }

    #[test]
    fn all_set_has_ten_distinct_kinds() {
        let set: std::collections::HashSet<_> = ALL.iter().collect();
        assert_eq!(set.len(), 10);
    }
}
