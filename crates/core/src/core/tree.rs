//! Tree-shaped inputs.
//!
//! A [`Tree`] is a template node with ordered children, as produced by
//! ideographic description sequences. The only merge a template offers is
//! its root followed by all of its children, and only once every child has
//! collapsed into a single node. Merging it replaces the whole subtree with
//! the merged node, so trees shrink bottom-up.

use crate::core::merges::MergeTable;
use crate::core::node::{NodeArena, NodeId};
use crate::core::sequence::{Joint, NodesSequence, Segmentation};
use crate::error::{Result, TokenizerError};
use crate::units::Units;

/// A node, or a template root with its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tree {
    Node(NodeId),
    Template { root: NodeId, children: Vec<Tree> },
}

impl Tree {
    /// The node this tree collapsed into, if any.
    #[inline]
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Tree::Node(node) => Some(*node),
            Tree::Template { .. } => None,
        }
    }

    /// Operands of every template whose children are all single nodes, in
    /// prefix order.
    pub fn candidates(&self, out: &mut Vec<Vec<NodeId>>) {
        if let Tree::Template { root, children } = self {
            let operands: Option<Vec<NodeId>> = std::iter::once(Some(*root))
                .chain(children.iter().map(Tree::as_node))
                .collect();
            match operands {
                Some(operands) => out.push(operands),
                None => {
                    for child in children {
                        child.candidates(out);
                    }
                }
            }
        }
    }

    /// Replace every template matching `operands` with `merged`.
    ///
    /// Returns the number of replaced subtrees.
    pub fn merge(&mut self, operands: &[NodeId], merged: NodeId) -> u64 {
        let Tree::Template { root, children } = self else {
            return 0;
        };

        let matches = operands.len() == children.len() + 1
            && operands[0] == *root
            && children
                .iter()
                .zip(&operands[1..])
                .all(|(child, &op)| child.as_node() == Some(op));
        if matches {
            *self = Tree::Node(merged);
            return 1;
        }

        children
            .iter_mut()
            .map(|child| child.merge(operands, merged))
            .sum()
    }

    /// Nodes in prefix order: each root before its children.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        match self {
            Tree::Node(node) => out.push(*node),
            Tree::Template { root, children } => {
                out.push(*root);
                for child in children {
                    child.collect_nodes(out);
                }
            }
        }
    }

    /// Flatten into a character-level sequence in prefix order.
    ///
    /// Every joint is disconnected: the pieces of a tree only merge through
    /// [`MergeTable::apply_tree`].
    pub fn to_sequence(&self) -> Result<NodesSequence> {
        let nodes = self.nodes();
        let joints = vec![Joint::Disconnected; nodes.len().saturating_sub(1)];
        NodesSequence::from_parts(
            nodes,
            joints,
            Some(Units::Characters),
            Segmentation::Disconnected,
        )
    }

    /// Bytes of all nodes in prefix order.
    pub fn to_bytes(&self, arena: &NodeArena) -> Vec<u8> {
        let mut out = Vec::new();
        for node in self.nodes() {
            arena.write_bytes(node, &mut out);
        }
        out
    }
}

impl MergeTable {
    /// Collapse `tree` with the rules of this table, earliest rule first.
    pub fn apply_tree(&self, tree: &Tree) -> Result<Tree> {
        if let Some(node) = tree.nodes().into_iter().find(|&n| !self.arena().contains(n)) {
            return Err(TokenizerError::IncompatibleTable(format!(
                "node {} was not created by this table",
                node
            )));
        }

        let mut tree = tree.clone();
        let mut candidates = Vec::new();
        loop {
            candidates.clear();
            tree.candidates(&mut candidates);

            let best = candidates
                .iter()
                .filter_map(|operands| self.rank_of(operands))
                .min();
            let Some(rule) = best.and_then(|rank| self.get(rank)) else {
                return Ok(tree);
            };
            tree.merge(&rule.operands, rule.merged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GraphSettings;

    fn c(ch: char) -> NodeId {
        NodeId::from_char(ch)
    }

    fn leaf(ch: char) -> Tree {
        Tree::Node(c(ch))
    }

    fn template(root: char, children: Vec<Tree>) -> Tree {
        Tree::Template {
            root: c(root),
            children,
        }
    }

    // ⿱十⿱乛头
    fn sample() -> Tree {
        template('⿱', vec![leaf('十'), template('⿱', vec![leaf('乛'), leaf('头')])])
    }

    #[test]
    fn test_only_collapsed_templates_are_candidates() {
        let mut out = Vec::new();
        sample().candidates(&mut out);
        assert_eq!(out, vec![vec![c('⿱'), c('乛'), c('头')]]);
    }

    #[test]
    fn test_merge_collapses_bottom_up() {
        let mut table = MergeTable::new(
            GraphSettings::bne(8).unwrap(),
            Some(Units::Characters),
            Segmentation::Disconnected,
        );
        let mut tree = sample();

        let inner = table.push_rule(&[c('⿱'), c('乛'), c('头')], 1).unwrap();
        assert_eq!(tree.merge(&[c('⿱'), c('乛'), c('头')], inner), 1);

        let mut out = Vec::new();
        tree.candidates(&mut out);
        assert_eq!(out, vec![vec![c('⿱'), c('十'), inner]]);

        let whole = table.push_rule(&out[0], 1).unwrap();
        assert_eq!(tree.merge(&out[0], whole), 1);
        assert_eq!(tree, Tree::Node(whole));
        assert_eq!(tree.to_bytes(table.arena()), "⿱十⿱乛头".as_bytes());
    }

    #[test]
    fn test_apply_tree_uses_rank_order() {
        let mut table = MergeTable::new(
            GraphSettings::bne(8).unwrap(),
            Some(Units::Characters),
            Segmentation::Disconnected,
        );
        let inner = table.push_rule(&[c('⿱'), c('乛'), c('头')], 1).unwrap();
        let whole = table.push_rule(&[c('⿱'), c('十'), inner], 1).unwrap();

        assert_eq!(table.apply_tree(&sample()).unwrap(), Tree::Node(whole));

        // unknown children stop the collapse at the known subtree
        let other = template(
            '⿰',
            vec![leaf('木'), template('⿱', vec![leaf('乛'), leaf('头')])],
        );
        assert_eq!(
            table.apply_tree(&other).unwrap(),
            template('⿰', vec![leaf('木'), Tree::Node(inner)])
        );
    }

    #[test]
    fn test_to_sequence_is_prefix_order() {
        let seq = sample().to_sequence().unwrap();
        let arena = NodeArena::new();

        assert_eq!(seq.to_bytes(&arena), "⿱十⿱乛头".as_bytes());
        assert!(seq.joints().iter().all(|&j| j == Joint::Disconnected));
        assert_eq!(seq.units(), Some(Units::Characters));
    }

    #[test]
    fn test_apply_tree_rejects_foreign_nodes() {
        let table = MergeTable::default();
        let tree = Tree::Node(NodeId::from_u32(crate::core::node::MERGED_BASE + 3));
        assert!(matches!(
            table.apply_tree(&tree),
            Err(TokenizerError::IncompatibleTable(_))
        ));
    }
}
