//! Merge rule management.
//!
//! A [`MergeTable`] is the output of training: the learned rules in rank
//! order together with the arena of composite nodes they created and the
//! context (settings, units, segmentation) they were learned under.

use crate::core::node::{NodeArena, NodeId};
use crate::core::sequence::Segmentation;
use crate::error::{Result, TokenizerError};
use crate::settings::GraphSettings;
use crate::units::Units;
use ahash::AHashMap;

/// One learned merge: `operands -> merged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRule {
    /// Position in the table (lower rank = learned earlier = applied first)
    pub rank: u32,
    /// Nodes merged by this rule, in order
    pub operands: Box<[NodeId]>,
    /// Composite node produced by this rule
    pub merged: NodeId,
    /// Occurrences when the rule was selected
    pub count: u64,
}

impl MergeRule {
    /// Number of operands.
    #[inline]
    pub fn arity(&self) -> usize {
        self.operands.len()
    }
}

/// Ordered collection of merge rules with fast lookup by operands.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    rules: Vec<MergeRule>,
    /// Operands -> rank
    ranks: AHashMap<Box<[NodeId]>, u32>,
    arena: NodeArena,
    settings: GraphSettings,
    units: Option<Units>,
    segmentation: Segmentation,
}

impl MergeTable {
    /// Create an empty table for the given training context.
    pub fn new(settings: GraphSettings, units: Option<Units>, segmentation: Segmentation) -> Self {
        Self {
            rules: Vec::new(),
            ranks: AHashMap::new(),
            arena: NodeArena::new(),
            settings,
            units,
            segmentation,
        }
    }

    /// Append a rule with the next rank and return the merged node.
    ///
    /// Operands must be leaves or nodes created by earlier rules, and no
    /// rule for the same operands may exist yet.
    pub fn push_rule(&mut self, operands: &[NodeId], count: u64) -> Result<NodeId> {
        if self.ranks.contains_key(operands) {
            return Err(TokenizerError::InvalidMerge(format!(
                "duplicate rule for operands {:?}",
                operands
            )));
        }
        if operands.len() > self.settings.max_arity() as usize {
            return Err(TokenizerError::InvalidMerge(format!(
                "{} operands exceed the maximum arity of {}",
                operands.len(),
                self.settings.max_arity()
            )));
        }

        let leaves: u32 = operands.iter().map(|&node| self.arena.leaf_count(node)).sum();
        if !self.settings.allows_leaves(leaves) {
            return Err(TokenizerError::InvalidMerge(format!(
                "merged node spans {} leaves, above the maximum merge size",
                leaves
            )));
        }

        let merged = self.arena.intern(operands)?;
        let rank = self.rules.len() as u32;
        let key: Box<[NodeId]> = operands.into();
        self.ranks.insert(key.clone(), rank);
        self.rules.push(MergeRule {
            rank,
            operands: key,
            merged,
            count,
        });
        Ok(merged)
    }

    /// Rank of the rule merging exactly `operands`.
    #[inline]
    pub fn rank_of(&self, operands: &[NodeId]) -> Option<u32> {
        self.ranks.get(operands).copied()
    }

    /// Rule at `rank`.
    #[inline]
    pub fn get(&self, rank: u32) -> Option<&MergeRule> {
        self.rules.get(rank as usize)
    }

    /// All rules in rank order.
    #[inline]
    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Arena holding every composite node of the table.
    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Settings the table was trained with.
    #[inline]
    pub fn settings(&self) -> GraphSettings {
        self.settings
    }

    /// Units the table was trained on, if recorded.
    #[inline]
    pub fn units(&self) -> Option<Units> {
        self.units
    }

    /// Segmentation mode of the training corpus.
    #[inline]
    pub fn segmentation(&self) -> Segmentation {
        self.segmentation
    }

    /// Largest number of leaves in any merged node.
    pub fn max_leaves(&self) -> u32 {
        self.rules
            .iter()
            .map(|rule| self.arena.leaf_count(rule.merged))
            .max()
            .unwrap_or(1)
    }

    /// Rules rendered as text, e.g. `(["l", "o"], "lo")`.
    ///
    /// Bytes that are not valid UTF-8 on their own are replaced lossily.
    pub fn readable(&self) -> Vec<(Vec<String>, String)> {
        let render =
            |node: NodeId| String::from_utf8_lossy(&self.arena.to_bytes(node)).into_owned();

        self.rules
            .iter()
            .map(|rule| {
                let operands = rule.operands.iter().map(|&node| render(node)).collect();
                (operands, render(rule.merged))
            })
            .collect()
    }
}
