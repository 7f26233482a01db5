//! The innovation registry (spec.md §3 "Innovation record" / "Innovation
//! registry (process-lifetime)", §4.3).
//!
//! Assigns globally-consistent innovation ids to structural mutations so
//! that two genomes independently discovering "the same" new connection or
//! node split end up with identical historical markings, which is what lets
//! crossover align genes by innovation id instead of by structural
//! comparison. Consolidates the teacher's `state.rs::InnovationRecord`
//! (HashMap-keyed connection memoisation) with the node-split memoisation
//! the original C `neat_get_innovation` performs via its
//! `is_new_node`/`node_id` fields — the teacher's Rust port only carried the
//! connection half.

use std::collections::HashMap;

/// One per-generation record of a node-split mutation: the synthesised
/// hidden node id plus the two new connections' innovation ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitInnovation {
    pub new_node_id: usize,
    pub in_connection_innovation: usize,
    pub out_connection_innovation: usize,
}

/// Process-lifetime counters plus a per-generation memoisation table.
///
/// spec.md §4.3 leaves the memoisation table's lifetime as an implementation
/// choice as long as it's documented and tested; this crate clears it every
/// generation (spec.md §9, "Design prescribes... per-generation clearing").
/// Counters themselves (`next_innovation`, `next_node_id`, `next_species_id`)
/// never reset and never decrease.
#[derive(Debug, Clone)]
pub struct InnovationRecord {
    next_innovation: usize,
    next_node_id: usize,
    next_species_id: usize,

    connection_innovations: HashMap<(usize, usize), usize>,
    split_innovations: HashMap<(usize, usize), SplitInnovation>,
}

impl InnovationRecord {
    /// `first_free_node_id` should be one past the highest node id already
    /// in use by the bootstrap genome template (inputs + bias + outputs),
    /// since those ids are assigned directly by genome construction rather
    /// than through this registry.
    pub fn new(first_free_node_id: usize) -> Self {
        InnovationRecord {
            next_innovation: 0,
            next_node_id: first_free_node_id,
            next_species_id: 0,
            connection_innovations: HashMap::new(),
            split_innovations: HashMap::new(),
        }
    }

    /// Returns the innovation id for a new connection `in_node -> out_node`,
    /// assigning a fresh one on first sight this generation and returning
    /// the memoised id on subsequent sightings (spec.md §3 invariant:
    /// "a structurally identical mutation observed twice returns the same
    /// innovation id").
    pub fn get_or_assign_connection(&mut self, in_node: usize, out_node: usize) -> usize {
        if let Some(&id) = self.connection_innovations.get(&(in_node, out_node)) {
            return id;
        }
        let id = self.next_innovation;
        self.next_innovation += 1;
        self.connection_innovations.insert((in_node, out_node), id);
        id
    }

    /// Returns the (node id, in-connection innovation, out-connection
    /// innovation) triple for splitting the connection `in_node -> out_node`.
    /// Identical splits within one generation — even across different
    /// genomes — yield identical results (spec.md §8 property 1 and the
    /// node-split-consistency scenario).
    pub fn get_or_assign_split(&mut self, in_node: usize, out_node: usize) -> SplitInnovation {
        if let Some(&split) = self.split_innovations.get(&(in_node, out_node)) {
            return split;
        }
        let new_node_id = self.next_node_id;
        self.next_node_id += 1;

        let in_connection_innovation = self.get_or_assign_connection(in_node, new_node_id);
        let out_connection_innovation = self.get_or_assign_connection(new_node_id, out_node);

        let split = SplitInnovation {
            new_node_id,
            in_connection_innovation,
            out_connection_innovation,
        };
        self.split_innovations.insert((in_node, out_node), split);
        split
    }

    pub fn new_species_id(&mut self) -> usize {
        let id = self.next_species_id;
        self.next_species_id += 1;
        id
    }

    /// Advance the species-id counter so freshly-assigned ids resume past
    /// `next`, used by [`crate::persist::load`] when reconstructing a
    /// population whose species ids were allocated by a different registry
    /// instance. A no-op if `next` is not past the current counter.
    pub fn skip_species_ids_to(&mut self, next: usize) {
        self.next_species_id = self.next_species_id.max(next);
    }

    /// Reserve a fresh node id outside the split-memoisation path, used only
    /// while constructing the very first bootstrap genome template.
    pub fn reserve_node_id(&mut self) -> usize {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Clear this generation's memoisation table. Called once per
    /// generation by [`crate::population::Population::evolve_one_generation`]
    /// after reproduction (spec.md §4.6). Counters are untouched.
    pub fn advance_generation(&mut self) {
        self.connection_innovations.clear();
        self.split_innovations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_connection_mutation_is_memoised() {
        let mut reg = InnovationRecord::new(10);
        let a = reg.get_or_assign_connection(1, 2);
        let b = reg.get_or_assign_connection(1, 2);
        assert_eq!(a, b);
        let c = reg.get_or_assign_connection(2, 1);
        assert_ne!(a, c);
    }

    #[test]
    fn identical_split_is_memoised() {
        let mut reg = InnovationRecord::new(10);
        let s1 = reg.get_or_assign_split(1, 2);
        let s2 = reg.get_or_assign_split(1, 2);
        assert_eq!(s1, s2);
    }

    #[test]
    fn generation_boundary_resets_memoisation_but_not_counters() {
        let mut reg = InnovationRecord::new(10);
        let first = reg.get_or_assign_connection(1, 2);
        reg.advance_generation();
        let second = reg.get_or_assign_connection(1, 2);
        assert_ne!(first, second, "memo cleared, so the same edge gets a fresh id next generation");
        assert!(second > first);
    }

    #[test]
    fn counters_never_decrease() {
        let mut reg = InnovationRecord::new(0);
        let mut last = 0;
        for i in 0..5 {
            let id = reg.get_or_assign_connection(i, i + 1);
            assert!(id >= last);
            last = id;
        }
    }

    #[test]
    fn species_ids_are_monotonic_and_resumable() {
        let mut reg = InnovationRecord::new(0);
        assert_eq!(reg.new_species_id(), 0);
        assert_eq!(reg.new_species_id(), 1);

        reg.skip_species_ids_to(5);
        assert_eq!(reg.new_species_id(), 5);

        // Skipping to an already-passed id is a no-op.
        reg.skip_species_ids_to(1);
        assert_eq!(reg.new_species_id(), 6);
    }
}
