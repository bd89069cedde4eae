//! Node identifiers and the composite node arena.
//!
//! Leaves never need storage: their [`NodeId`] encodes the leaf value
//! directly. Composite nodes (merge results) live in a [`NodeArena`] that
//! hash-conses them by their children, so two merges of the same children
//! always yield the same id.

use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of byte leaves.
const BYTE_LEAVES: u32 = 256;

/// First id used for Unicode scalar leaves.
const CHAR_BASE: u32 = BYTE_LEAVES;

/// First id used for composite nodes.
pub const MERGED_BASE: u32 = CHAR_BASE + 0x11_0000;

/// Handle to a node: a byte leaf, a scalar leaf or a composite node.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Leaf node for a single byte.
    #[inline]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte as u32)
    }

    /// Leaf node for a single Unicode scalar value.
    #[inline]
    pub const fn from_char(ch: char) -> Self {
        Self(CHAR_BASE + ch as u32)
    }

    /// Creates an id from its raw value.
    #[inline]
    pub const fn from_u32(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Whether this id is a leaf (byte or scalar).
    #[inline]
    pub const fn is_leaf(self) -> bool {
        self.0 < MERGED_BASE
    }

    /// Decodes the leaf value, or `None` for composite nodes.
    pub fn leaf(self) -> Option<Leaf> {
        if self.0 < BYTE_LEAVES {
            Some(Leaf::Byte(self.0 as u8))
        } else if self.0 < MERGED_BASE {
            char::from_u32(self.0 - CHAR_BASE).map(Leaf::Char)
        } else {
            None
        }
    }

    #[inline]
    fn merged_index(self) -> Option<usize> {
        self.0.checked_sub(MERGED_BASE).map(|i| i as usize)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.leaf() {
            Some(leaf) => write!(f, "{}", leaf),
            None => write!(f, "#{}", self.0 - MERGED_BASE),
        }
    }
}

/// Raw value of a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leaf {
    /// One byte of UTF-8 encoded text
    Byte(u8),
    /// One Unicode scalar value
    Char(char),
}

impl Leaf {
    /// The node id of this leaf.
    #[inline]
    pub fn id(self) -> NodeId {
        match self {
            Leaf::Byte(b) => NodeId::from_byte(b),
            Leaf::Char(c) => NodeId::from_char(c),
        }
    }

    /// Appends the leaf's bytes (UTF-8 for scalars).
    #[inline]
    pub fn write_bytes(self, out: &mut Vec<u8>) {
        match self {
            Leaf::Byte(b) => out.push(b),
            Leaf::Char(c) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Byte(b) => write!(f, "\\x{:02x}", b),
            Leaf::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Hash-consed storage for composite nodes.
///
/// Composite ids are allocated densely from [`MERGED_BASE`] in interning
/// order, which makes them reproducible when the same merges are replayed.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    /// Children of each composite node
    children: Vec<Box<[NodeId]>>,
    /// Number of leaves below each composite node
    leaf_counts: Vec<u32>,
    /// Children -> composite id
    index: AHashMap<Box<[NodeId]>, NodeId>,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a composite node made of `children`.
    ///
    /// Returns the existing id if the same children were interned before.
    pub fn intern(&mut self, children: &[NodeId]) -> Result<NodeId> {
        if children.len() < 2 {
            return Err(TokenizerError::InvalidMerge(format!(
                "a merge needs at least two operands, got {}",
                children.len()
            )));
        }
        if let Some(&id) = self.index.get(children) {
            return Ok(id);
        }

        let mut leaves = 0u32;
        for &child in children {
            if !self.contains(child) {
                return Err(TokenizerError::InvalidMerge(format!(
                    "operand {} is not a known node",
                    child.as_u32()
                )));
            }
            leaves += self.leaf_count(child);
        }

        let id = NodeId(MERGED_BASE + self.children.len() as u32);
        let key: Box<[NodeId]> = children.into();
        self.children.push(key.clone());
        self.leaf_counts.push(leaves);
        self.index.insert(key, id);
        Ok(id)
    }

    /// Look up a composite node without creating it.
    #[inline]
    pub fn get(&self, children: &[NodeId]) -> Option<NodeId> {
        self.index.get(children).copied()
    }

    /// Whether `id` is a leaf or a composite stored in this arena.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        match id.merged_index() {
            Some(i) => i < self.children.len(),
            None => id.leaf().is_some(),
        }
    }

    /// Children of a node; empty for leaves and unknown ids.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        id.merged_index()
            .and_then(|i| self.children.get(i))
            .map(|c| &c[..])
            .unwrap_or(&[])
    }

    /// Number of leaves the node decomposes into.
    #[inline]
    pub fn leaf_count(&self, id: NodeId) -> u32 {
        match id.merged_index() {
            Some(i) => self.leaf_counts.get(i).copied().unwrap_or(0),
            None => 1,
        }
    }

    /// Leaves of a node in order.
    ///
    /// Walks the children with an explicit stack so deeply nested merges do
    /// not recurse.
    pub fn leaves(&self, id: NodeId) -> Vec<Leaf> {
        let mut out = Vec::with_capacity(self.leaf_count(id) as usize);
        let mut stack = vec![id];

        while let Some(node) = stack.pop() {
            match node.leaf() {
                Some(leaf) => out.push(leaf),
                None => stack.extend(self.children(node).iter().rev()),
            }
        }

        out
    }

    /// Appends the bytes a node stands for.
    pub fn write_bytes(&self, id: NodeId, out: &mut Vec<u8>) {
        for leaf in self.leaves(id) {
            leaf.write_bytes(out);
        }
    }

    /// The bytes a node stands for.
    pub fn to_bytes(&self, id: NodeId) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_bytes(id, &mut out);
        out
    }

    /// Number of composite nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Check if no composite node has been interned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
