//! Window counting for merge training.
//!
//! The [`WindowIndex`] maps every eligible window pattern (the exact node
//! ids it covers) to the set of slots where it currently starts. Counts are
//! the sizes of those sets, so updating after a merge only touches the
//! slots around each replaced occurrence.

use ahash::AHashMap;
use graphtok_core::{MergeCandidate, NodeArena, NodeId, SlotId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Reverse index from window patterns to their start slots.
pub struct WindowIndex {
    /// Pattern id -> operands
    patterns: Vec<Box<[NodeId]>>,
    /// Operands -> pattern id
    ids: AHashMap<Box<[NodeId]>, u32>,
    /// Pattern id -> start slots, in corpus order
    occurrences: Vec<BTreeSet<SlotId>>,
    /// Pattern id -> leaf bytes of the would-be merged node
    ties: Vec<Arc<[u8]>>,
    /// Slot -> patterns with an occurrence starting there
    starts: Vec<Vec<u32>>,
    /// Live occurrences across all patterns
    total: u64,
}

impl WindowIndex {
    /// Create an empty index for a chain of `slots` slots.
    pub fn new(slots: usize) -> Self {
        Self {
            patterns: Vec::new(),
            ids: AHashMap::new(),
            occurrences: Vec::new(),
            ties: Vec::new(),
            starts: vec![Vec::new(); slots],
            total: 0,
        }
    }

    /// Record an occurrence of `nodes` starting at `slot`.
    ///
    /// Returns the pattern id.
    pub fn add(&mut self, slot: SlotId, nodes: &[NodeId], arena: &NodeArena) -> u32 {
        let id = match self.ids.get(nodes) {
            Some(&id) => id,
            None => {
                let id = self.patterns.len() as u32;
                let mut tie = Vec::new();
                for &node in nodes {
                    arena.write_bytes(node, &mut tie);
                }

                let key: Box<[NodeId]> = nodes.into();
                self.ids.insert(key.clone(), id);
                self.patterns.push(key);
                self.occurrences.push(BTreeSet::new());
                self.ties.push(tie.into());
                id
            }
        };

        if self.occurrences[id as usize].insert(slot) {
            self.starts[slot as usize].push(id);
            self.total += 1;
        }
        id
    }

    /// Drop every occurrence starting at `slot`, pushing the affected
    /// pattern ids onto `changed`.
    pub fn clear_slot(&mut self, slot: SlotId, changed: &mut Vec<u32>) {
        for id in self.starts[slot as usize].drain(..) {
            if self.occurrences[id as usize].remove(&slot) {
                self.total -= 1;
            }
            changed.push(id);
        }
    }

    /// Whether `pattern` currently starts at `slot`.
    #[inline]
    pub fn contains(&self, pattern: u32, slot: SlotId) -> bool {
        self.occurrences[pattern as usize].contains(&slot)
    }

    /// Operands of a pattern.
    #[inline]
    pub fn pattern(&self, id: u32) -> &[NodeId] {
        &self.patterns[id as usize]
    }

    /// Current number of occurrences of a pattern.
    #[inline]
    pub fn count(&self, id: u32) -> u64 {
        self.occurrences[id as usize].len() as u64
    }

    /// Earliest slot where the pattern currently starts.
    #[inline]
    pub fn first(&self, id: u32) -> Option<SlotId> {
        self.occurrences[id as usize].first().copied()
    }

    /// Start slots of a pattern in corpus order.
    pub fn occurrences(&self, id: u32) -> impl Iterator<Item = SlotId> + '_ {
        self.occurrences[id as usize].iter().copied()
    }

    /// Queue entry reflecting the pattern's current state.
    pub fn candidate(&self, id: u32) -> Option<MergeCandidate> {
        let first = self.first(id)?;
        Some(MergeCandidate::new(
            id,
            self.patterns[id as usize].len(),
            self.count(id),
            first,
            self.ties[id as usize].clone(),
        ))
    }

    /// Number of distinct patterns seen so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Live occurrences across all patterns.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(text: &str) -> Vec<NodeId> {
        text.chars().map(NodeId::from_char).collect()
    }

    #[test]
    fn test_add_counts_occurrences() {
        let arena = NodeArena::new();
        let mut index = WindowIndex::new(8);

        let ab = index.add(0, &nodes("ab"), &arena);
        assert_eq!(index.add(3, &nodes("ab"), &arena), ab);
        let bc = index.add(1, &nodes("bc"), &arena);

        assert_ne!(ab, bc);
        assert_eq!(index.count(ab), 2);
        assert_eq!(index.first(ab), Some(0));
        assert_eq!(index.occurrences(ab).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(index.total(), 3);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_duplicate_occurrence_is_ignored() {
        let arena = NodeArena::new();
        let mut index = WindowIndex::new(4);

        let ab = index.add(2, &nodes("ab"), &arena);
        index.add(2, &nodes("ab"), &arena);
        assert_eq!(index.count(ab), 1);
        assert_eq!(index.total(), 1);
    }

    #[test]
    fn test_clear_slot() {
        let arena = NodeArena::new();
        let mut index = WindowIndex::new(4);

        let ab = index.add(0, &nodes("ab"), &arena);
        let abc = index.add(0, &nodes("abc"), &arena);
        index.add(2, &nodes("ab"), &arena);

        let mut changed = Vec::new();
        index.clear_slot(0, &mut changed);

        assert_eq!(changed, vec![ab, abc]);
        assert_eq!(index.count(ab), 1);
        assert_eq!(index.count(abc), 0);
        assert!(!index.contains(ab, 0));
        assert!(index.contains(ab, 2));
        assert_eq!(index.first(ab), Some(2));
        assert!(index.candidate(abc).is_none());
        assert_eq!(index.total(), 1);
    }

    #[test]
    fn test_candidate_carries_gain_and_bytes() {
        let arena = NodeArena::new();
        let mut index = WindowIndex::new(8);

        let abc = index.add(4, &nodes("abc"), &arena);
        index.add(1, &nodes("abc"), &arena);

        let candidate = index.candidate(abc).unwrap();
        assert_eq!(candidate.count, 2);
        assert_eq!(candidate.gain, 4);
        assert_eq!(candidate.first, 1);
        assert_eq!(&candidate.tie[..], b"abc");
    }
}
