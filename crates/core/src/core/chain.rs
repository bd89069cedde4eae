//! Mutable linked representation of node sequences.
//!
//! A [`Chain`] stores one slot per initial node. Merging a window keeps the
//! node in the window's first slot and unlinks the rest, so slot ids never
//! move and their order is always the original text order. Both the trainer
//! and the inference applier work on chains.

use crate::core::node::{NodeArena, NodeId};
use crate::core::sequence::{Joint, NodesSequence};
use crate::error::Result;
use crate::settings::GraphSettings;
use crate::units::Units;
use unicode_segmentation::UnicodeSegmentation;

/// Index of a slot in a [`Chain`].
pub type SlotId = u32;

/// Sentinel for a missing neighbour.
const NONE: SlotId = u32::MAX;

/// `len` consecutive live slots starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub start: SlotId,
    pub len: u32,
}

/// Doubly linked slots with boundary tags and eligibility state.
#[derive(Debug, Clone)]
pub struct Chain {
    nodes: Vec<NodeId>,
    next: Vec<SlotId>,
    prev: Vec<SlotId>,
    /// Joint on the right edge of each slot; the end of a run is disconnected
    joint_after: Vec<Joint>,
    alive: Vec<bool>,
    /// Whether the slot's node spans exactly one unit
    minimal: Vec<bool>,
    settings: GraphSettings,
    units: Option<Units>,
}

impl Chain {
    /// Create an empty chain for the given settings and units.
    pub fn new(settings: GraphSettings, units: Option<Units>) -> Self {
        Self {
            nodes: Vec::new(),
            next: Vec::new(),
            prev: Vec::new(),
            joint_after: Vec::new(),
            alive: Vec::new(),
            minimal: Vec::new(),
            settings,
            units,
        }
    }

    /// Build a chain holding a single sequence.
    pub fn from_sequence(
        sequence: &NodesSequence,
        settings: GraphSettings,
        arena: &NodeArena,
    ) -> Self {
        let mut chain = Self::with_capacity(settings, sequence.units(), sequence.len());
        chain.extend(sequence, arena);
        chain
    }

    /// Create an empty chain with room for `capacity` slots.
    pub fn with_capacity(settings: GraphSettings, units: Option<Units>, capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            next: Vec::with_capacity(capacity),
            prev: Vec::with_capacity(capacity),
            joint_after: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            minimal: Vec::with_capacity(capacity),
            settings,
            units,
        }
    }

    /// Append a sequence as a new run, disconnected from what came before.
    pub fn extend(&mut self, sequence: &NodesSequence, arena: &NodeArena) {
        if sequence.is_empty() {
            return;
        }

        let first = self.nodes.len();
        if first > 0 {
            let last = (first - 1) as SlotId;
            self.next[first - 1] = first as SlotId;
            self.joint_after[first - 1] = Joint::Disconnected;
            self.prev.push(last);
        } else {
            self.prev.push(NONE);
        }

        let nodes = sequence.nodes();
        let joints = sequence.joints();
        for (i, &node) in nodes.iter().enumerate() {
            let slot = first + i;
            if i > 0 {
                self.prev.push((slot - 1) as SlotId);
            }
            self.nodes.push(node);
            self.alive.push(true);
            match joints.get(i) {
                Some(&joint) => {
                    self.next.push((slot + 1) as SlotId);
                    self.joint_after.push(joint);
                }
                None => {
                    self.next.push(NONE);
                    self.joint_after.push(Joint::Disconnected);
                }
            }
        }

        for slot in first..self.nodes.len() {
            let minimal = self.compute_minimal(slot, arena);
            self.minimal.push(minimal);
        }
    }

    /// Total number of slots, live or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the chain has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The settings this chain enforces.
    #[inline]
    pub fn settings(&self) -> GraphSettings {
        self.settings
    }

    /// Node currently held by a slot.
    #[inline]
    pub fn node(&self, slot: SlotId) -> NodeId {
        self.nodes[slot as usize]
    }

    /// Whether a slot still holds a node.
    #[inline]
    pub fn is_alive(&self, slot: SlotId) -> bool {
        self.alive[slot as usize]
    }

    /// Whether any live neighbours are linked by a mergeable joint.
    pub fn has_mergeable_joint(&self) -> bool {
        (0..self.nodes.len())
            .any(|slot| self.alive[slot] && self.joint_after[slot].is_mergeable())
    }

    #[inline]
    fn joint_before(&self, slot: usize) -> Joint {
        match self.prev[slot] {
            NONE => Joint::Disconnected,
            p => self.joint_after[p as usize],
        }
    }

    /// A node spans exactly one unit when it is a leaf, or when it is a
    /// whole grapheme cluster merged back together.
    fn compute_minimal(&self, slot: usize, arena: &NodeArena) -> bool {
        let node = self.nodes[slot];
        if node.is_leaf() {
            return true;
        }
        if self.units != Some(Units::Utf8Clusters)
            || self.joint_before(slot) == Joint::Cluster
            || self.joint_after[slot] == Joint::Cluster
        {
            return false;
        }

        let bytes = arena.to_bytes(node);
        std::str::from_utf8(&bytes)
            .map(|text| text.graphemes(true).count() == 1)
            .unwrap_or(false)
    }

    /// Push every eligible window starting at `start` onto `out`.
    ///
    /// A window never crosses a disconnected joint. Its inner joints are
    /// either all [`Joint::Cluster`] (merging inside one unit) or all
    /// [`Joint::Connected`] (merging whole units, in which case neither
    /// outer edge may cut through a cluster). With minimal merges only, a
    /// cluster window must cover its whole cluster.
    pub fn windows_from(&self, start: SlotId, arena: &NodeArena, out: &mut Vec<Window>) {
        let s = start as usize;
        if !self.alive[s] {
            return;
        }

        let only_minimal = self.settings.only_minimal_merges();
        if only_minimal && !self.minimal[s] {
            return;
        }

        let left_edge = self.joint_before(s);
        let max_arity = self.settings.max_arity();
        let mut kind: Option<Joint> = None;
        let mut leaves = arena.leaf_count(self.nodes[s]);
        let mut len = 1u32;
        let mut cur = s;

        while len < max_arity {
            let joint = self.joint_after[cur];
            if !joint.is_mergeable() {
                break;
            }
            match kind {
                None => kind = Some(joint),
                Some(k) if k != joint => break,
                _ => {}
            }
            if left_edge == Joint::Cluster && (joint == Joint::Connected || only_minimal) {
                break;
            }

            let next = self.next[cur];
            if next == NONE {
                break;
            }
            let next = next as usize;
            if only_minimal && !self.minimal[next] {
                break;
            }

            leaves += arena.leaf_count(self.nodes[next]);
            if !self.settings.allows_leaves(leaves) {
                break;
            }
            if joint == Joint::Connected && self.joint_after[next] == Joint::Cluster {
                break;
            }

            len += 1;
            cur = next;
            if only_minimal && joint == Joint::Cluster && self.joint_after[next] == Joint::Cluster {
                continue;
            }
            out.push(Window { start, len });
        }
    }

    /// Whether `window` is currently eligible.
    pub fn is_eligible(&self, window: Window, arena: &NodeArena) -> bool {
        let mut windows = Vec::new();
        self.windows_from(window.start, arena, &mut windows);
        windows.contains(&window)
    }

    /// Push the nodes covered by `window` onto `out`.
    pub fn window_nodes(&self, window: Window, out: &mut Vec<NodeId>) {
        let mut slot = window.start;
        for _ in 0..window.len {
            out.push(self.nodes[slot as usize]);
            slot = self.next[slot as usize];
        }
    }

    /// Push the slots covered by `window` onto `out`.
    pub fn window_slots(&self, window: Window, out: &mut Vec<SlotId>) {
        let mut slot = window.start;
        for _ in 0..window.len {
            out.push(slot);
            slot = self.next[slot as usize];
        }
    }

    /// Push the live slots before `slot` whose windows could reach it.
    ///
    /// Walks back at most `max_arity - 1` slots and stops at disconnected
    /// joints.
    pub fn predecessors(&self, slot: SlotId, out: &mut Vec<SlotId>) {
        let mut cur = slot;
        for _ in 1..self.settings.max_arity() {
            let p = self.prev[cur as usize];
            if p == NONE || !self.joint_after[p as usize].is_mergeable() {
                break;
            }
            out.push(p);
            cur = p;
        }
    }

    /// Replace the nodes of `window` by `merged`.
    ///
    /// The merged node takes the first slot; the other slots die.
    pub fn merge(&mut self, window: Window, merged: NodeId, arena: &NodeArena) {
        let start = window.start as usize;
        let mut last = start;
        for _ in 1..window.len {
            let next = self.next[last] as usize;
            self.alive[next] = false;
            last = next;
        }

        let after = self.next[last];
        self.nodes[start] = merged;
        self.joint_after[start] = self.joint_after[last];
        self.next[start] = after;
        if after != NONE {
            self.prev[after as usize] = window.start;
        }
        self.minimal[start] = self.compute_minimal(start, arena);
    }

    /// Live slots in order.
    pub fn live_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        (0..self.nodes.len() as SlotId).filter(move |&slot| self.alive[slot as usize])
    }

    /// Rebuild a flat sequence from the live slots, taking units and
    /// segmentation from `template`.
    pub fn to_sequence(&self, template: &NodesSequence) -> Result<NodesSequence> {
        let mut nodes = Vec::new();
        let mut joints = Vec::new();

        for slot in self.live_slots() {
            if !nodes.is_empty() {
                let p = self.prev[slot as usize];
                joints.push(self.joint_after[p as usize]);
            }
            nodes.push(self.nodes[slot as usize]);
        }

        NodesSequence::from_parts(nodes, joints, template.units(), template.segmentation())
    }
}
