//! Node sequences and boundary tags.
//!
//! A [`NodesSequence`] is stored flat: the nodes in order plus one [`Joint`]
//! between each pair of neighbours. Nesting (a grapheme cluster inside a
//! word inside a corpus) is expressed by the joint kinds rather than by
//! nested vectors, so traversal is always iterative.

use crate::core::node::{Leaf, NodeArena, NodeId};
use crate::error::{Result, TokenizerError};
use crate::units::Units;
use serde::{Deserialize, Serialize};

/// Boundary tag between two consecutive nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    /// Both nodes belong to the same unit (e.g. bytes of one grapheme cluster)
    Cluster,
    /// Boundary between units that merges may bridge
    Connected,
    /// Boundary that no merge may ever bridge
    Disconnected,
}

impl Joint {
    /// Whether a merge may cross this joint at all.
    #[inline]
    pub fn is_mergeable(self) -> bool {
        self != Joint::Disconnected
    }
}

/// How word boundaries were tagged when a sequence was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segmentation {
    /// Plain decomposition, no word segmentation applied
    #[default]
    Unsegmented,
    /// Words were joined by connected boundaries
    Connected,
    /// Words were separated by disconnected boundaries
    Disconnected,
}

impl Segmentation {
    /// Whether two segmentations may be mixed in one corpus or run.
    pub fn is_compatible(self, other: Segmentation) -> bool {
        self == other || self == Segmentation::Unsegmented || other == Segmentation::Unsegmented
    }

    fn combine(self, other: Segmentation) -> Segmentation {
        if self == Segmentation::Unsegmented {
            other
        } else {
            self
        }
    }
}

/// An ordered sequence of nodes with a boundary tag between neighbours.
///
/// Invariant: `joints.len() + 1 == nodes.len()`, or both are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodesSequence {
    nodes: Vec<NodeId>,
    joints: Vec<Joint>,
    units: Option<Units>,
    segmentation: Segmentation,
}

impl NodesSequence {
    /// Create an empty sequence whose leaves come from `units`.
    pub fn new(units: Units) -> Self {
        Self {
            units: Some(units),
            ..Self::default()
        }
    }

    /// Create an empty sequence with capacity for `capacity` nodes.
    pub fn with_capacity(units: Units, capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            joints: Vec::with_capacity(capacity.saturating_sub(1)),
            units: Some(units),
            segmentation: Segmentation::Unsegmented,
        }
    }

    /// Build a sequence from raw parts.
    ///
    /// Fails if the number of joints does not match the number of nodes.
    pub fn from_parts(
        nodes: Vec<NodeId>,
        joints: Vec<Joint>,
        units: Option<Units>,
        segmentation: Segmentation,
    ) -> Result<Self> {
        if joints.len() + 1 != nodes.len() && !(nodes.is_empty() && joints.is_empty()) {
            return Err(TokenizerError::InvalidInput(format!(
                "{} nodes need {} joints, got {}",
                nodes.len(),
                nodes.len().saturating_sub(1),
                joints.len()
            )));
        }

        Ok(Self {
            nodes,
            joints,
            units,
            segmentation,
        })
    }

    /// Concatenate independent sequences (e.g. the texts of a corpus).
    ///
    /// Consecutive sequences are separated by disconnected joints.
    pub fn concat(sequences: impl IntoIterator<Item = NodesSequence>) -> Result<Self> {
        let mut out = Self::default();
        for sequence in sequences {
            out.append(sequence, Joint::Disconnected)?;
        }
        Ok(out)
    }

    /// Push a node; `joint` links it to the previous node and is ignored
    /// for the first one.
    #[inline]
    pub fn push(&mut self, node: NodeId, joint: Joint) {
        if !self.nodes.is_empty() {
            self.joints.push(joint);
        }
        self.nodes.push(node);
    }

    /// Append another sequence, linked to this one by `joint`.
    ///
    /// Fails when the two sequences were decomposed into different units or
    /// segmented with incompatible boundary modes.
    pub fn append(&mut self, other: NodesSequence, joint: Joint) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }

        match (self.units, other.units) {
            (Some(a), Some(b)) if a != b => {
                return Err(TokenizerError::InvalidInput(format!(
                    "cannot join {} units with {} units",
                    a, b
                )));
            }
            (None, Some(b)) => self.units = Some(b),
            _ => {}
        }

        if !self.segmentation.is_compatible(other.segmentation) {
            return Err(TokenizerError::InvalidInput(format!(
                "cannot join {:?} and {:?} segmentations",
                self.segmentation, other.segmentation
            )));
        }
        self.segmentation = self.segmentation.combine(other.segmentation);

        if !self.nodes.is_empty() {
            self.joints.push(joint);
        }
        self.nodes.extend(other.nodes);
        self.joints.extend(other.joints);
        Ok(())
    }

    /// Tag every joint of this sequence as disconnected.
    pub fn disconnect_all(&mut self) {
        self.joints.fill(Joint::Disconnected);
    }

    /// Set the segmentation mode this sequence was built with.
    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// The nodes in order.
    #[inline]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The joints between neighbouring nodes.
    #[inline]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// The decomposer the leaves came from, if known.
    #[inline]
    pub fn units(&self) -> Option<Units> {
        self.units
    }

    /// The segmentation mode.
    #[inline]
    pub fn segmentation(&self) -> Segmentation {
        self.segmentation
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the sequence has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nested view: one slice per unit, split wherever a joint is not
    /// [`Joint::Cluster`].
    pub fn groups(&self) -> Vec<&[NodeId]> {
        self.spans(|joint| joint != Joint::Cluster)
    }

    /// Word view: one slice per run of mergeable joints.
    pub fn words(&self) -> Vec<&[NodeId]> {
        self.spans(|joint| joint == Joint::Disconnected)
    }

    fn spans(&self, cut: impl Fn(Joint) -> bool) -> Vec<&[NodeId]> {
        let mut spans = Vec::new();
        if self.nodes.is_empty() {
            return spans;
        }

        let mut start = 0;
        for (i, &joint) in self.joints.iter().enumerate() {
            if cut(joint) {
                spans.push(&self.nodes[start..=i]);
                start = i + 1;
            }
        }
        spans.push(&self.nodes[start..]);
        spans
    }

    /// All leaves in order.
    pub fn leaves(&self, arena: &NodeArena) -> Vec<Leaf> {
        self.nodes.iter().flat_map(|&node| arena.leaves(node)).collect()
    }

    /// Concatenated leaf bytes; reproduces the decomposed input exactly.
    pub fn to_bytes(&self, arena: &NodeArena) -> Vec<u8> {
        let mut out = Vec::new();
        for &node in &self.nodes {
            arena.write_bytes(node, &mut out);
        }
        out
    }

    /// Bytes of each node, one entry per token.
    pub fn token_bytes(&self, arena: &NodeArena) -> Vec<Vec<u8>> {
        self.nodes.iter().map(|&node| arena.to_bytes(node)).collect()
    }

    /// Each node rendered as (lossy) UTF-8 text.
    pub fn token_strings(&self, arena: &NodeArena) -> Vec<String> {
        self.token_bytes(arena)
            .into_iter()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .collect()
    }
}
