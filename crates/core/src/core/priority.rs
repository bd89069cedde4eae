//! Priority queue for merge candidates.
//!
//! Candidates are keyed by a pattern id handed out by the caller (the
//! trainer's window index). Updating a pattern pushes a fresh entry and
//! leaves the old one in the heap; stale entries are skipped on pop.

use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use std::cmp::Ordering;
use std::sync::Arc;

/// A merge candidate during training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// Pattern id assigned by the caller
    pub pattern: u32,
    /// Number of non-overlapping occurrences
    pub count: u64,
    /// Nodes saved by merging every occurrence: `(arity - 1) * count`
    pub gain: u64,
    /// Slot of the earliest occurrence
    pub first: u32,
    /// Leaf bytes of the merged result, used as the last tie-break
    pub tie: Arc<[u8]>,
}

impl MergeCandidate {
    /// Create a candidate for a pattern of `arity` operands.
    pub fn new(pattern: u32, arity: usize, count: u64, first: u32, tie: Arc<[u8]>) -> Self {
        Self {
            pattern,
            count,
            gain: (arity as u64).saturating_sub(1) * count,
            first,
            tie,
        }
    }

    #[inline]
    fn stamp(&self) -> (u64, u32) {
        (self.count, self.first)
    }
}

// Higher gain wins, then the earlier occurrence, then the smaller bytes.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .cmp(&other.gain)
            .then_with(|| other.first.cmp(&self.first))
            .then_with(|| other.tie.cmp(&self.tie))
            .then_with(|| other.pattern.cmp(&self.pattern))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lazily updated max-heap of merge candidates.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
pub struct WindowQueue {
    heap: OctonaryHeap<MergeCandidate>,
    /// Latest `(count, first)` per pattern; anything else in the heap is stale
    current: AHashMap<u32, (u64, u32)>,
}

impl WindowQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
            current: AHashMap::new(),
        }
    }

    /// Create a new queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
            current: AHashMap::with_capacity(capacity),
        }
    }

    /// Push a candidate, superseding any earlier entry for its pattern.
    pub fn push(&mut self, candidate: MergeCandidate) {
        self.current.insert(candidate.pattern, candidate.stamp());
        self.heap.push(candidate);
    }

    /// Forget a pattern; its entries become stale.
    pub fn remove(&mut self, pattern: u32) {
        self.current.remove(&pattern);
    }

    /// Pop the best candidate that is still current.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        while let Some(candidate) = self.heap.pop() {
            if self.current.get(&candidate.pattern) == Some(&candidate.stamp()) {
                self.current.remove(&candidate.pattern);
                return Some(candidate);
            }
        }
        None
    }

    /// Number of (potentially stale) entries.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.current.clear();
    }

    /// Latest count pushed for a pattern.
    pub fn get_count(&self, pattern: u32) -> Option<u64> {
        self.current.get(&pattern).map(|&(count, _)| count)
    }
}

impl Default for WindowQueue {
    fn default() -> Self {
        Self::new()
    }
}
