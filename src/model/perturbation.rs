//! Policies for breaking ties between node heights at construction.
//!
//! When an input tree has a node that is not strictly older than all of its
//! children (e.g. after resolving a polytomy, or with tip dates), the node
//! is lifted to a height chosen by a [HeightPerturbation]. Randomness is only
//! ever drawn from the policy's own, explicitly seeded generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used when a tree model is built without an explicit policy.
pub const DEFAULT_PERTURBATION_SEED: u64 = 0x7ee5_eed;

/// Smallest branch length introduced by [SeededJitter] by default.
pub const DEFAULT_MIN_LENGTH: f64 = 1e-6;

/// Maximal random extra length added by [SeededJitter] by default.
pub const DEFAULT_JITTER: f64 = 1e-3;

// =#========================================================================#=
// HEIGHT PERTURBATION (Trait)
// =#========================================================================#=
/// Chooses a new height for a node that is not older than its oldest child.
///
/// Implemented for any `FnMut(f64) -> f64` closure, which receives the
/// highest child height.
pub trait HeightPerturbation {
    /// Returns the new height of a node whose oldest child has height `max_child_height`.
    ///
    /// The result must be strictly greater than `max_child_height`.
    fn perturb(&mut self, max_child_height: f64) -> f64;
}

impl<F: FnMut(f64) -> f64> HeightPerturbation for F {
    fn perturb(&mut self, max_child_height: f64) -> f64 {
        self(max_child_height)
    }
}

// =#========================================================================#=
// SEEDED JITTER
// =#========================================================================#=
/// Lifts a node to `max_child + min_length + u * jitter` with `u ~ U[0, 1)`
/// drawn from a seeded [StdRng].
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: StdRng,
    min_length: f64,
    jitter: f64,
}

impl SeededJitter {
    /// Creates a policy with default lengths and the given seed.
    pub fn new(seed: u64) -> Self {
        SeededJitter {
            rng: StdRng::seed_from_u64(seed),
            min_length: DEFAULT_MIN_LENGTH,
            jitter: DEFAULT_JITTER,
        }
    }

    /// Sets the smallest branch length introduced.
    pub fn with_min_length(mut self, min_length: f64) -> Self {
        self.min_length = min_length;
        self
    }

    /// Sets the maximal random extra length.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }
}

impl Default for SeededJitter {
    fn default() -> Self {
        Self::new(DEFAULT_PERTURBATION_SEED)
    }
}

impl HeightPerturbation for SeededJitter {
    fn perturb(&mut self, max_child_height: f64) -> f64 {
        let u: f64 = self.rng.gen_range(0.0..1.0);
        max_child_height + self.min_length + u * self.jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_heights() {
        let mut first = SeededJitter::new(42);
        let mut second = SeededJitter::new(42);
        for h in [0.0, 1.0, 3.5] {
            let a = first.perturb(h);
            assert_eq!(a, second.perturb(h));
            assert!(a > h);
            assert!(a < h + DEFAULT_MIN_LENGTH + DEFAULT_JITTER);
        }
    }

    #[test]
    fn test_closure_policy() {
        let mut fixed = |h: f64| h + 0.5;
        assert_eq!(fixed.perturb(2.0), 2.5);
    }
}
