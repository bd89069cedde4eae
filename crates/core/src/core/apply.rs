//! Applying a learned merge table to new sequences.

use crate::core::chain::{Chain, SlotId, Window};
use crate::core::merges::MergeTable;
use crate::core::node::NodeId;
use crate::core::sequence::{NodesSequence, Segmentation};
use crate::error::{Result, TokenizerError};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Rewrite `input` with the rules of `table`.
///
/// Free-function form of [`MergeTable::apply`].
pub fn apply(input: &NodesSequence, table: &MergeTable) -> Result<NodesSequence> {
    table.apply(input)
}

impl MergeTable {
    /// Check that `input` can be tokenized with this table.
    pub fn check_compatible(&self, input: &NodesSequence) -> Result<()> {
        if let (Some(table), Some(seq)) = (self.units(), input.units()) {
            if table != seq {
                return Err(TokenizerError::IncompatibleTable(format!(
                    "table was trained on {} units, input uses {}",
                    table, seq
                )));
            }
        }

        let segmented = |s: Segmentation| s != Segmentation::Unsegmented;
        if segmented(self.segmentation())
            && segmented(input.segmentation())
            && self.segmentation() != input.segmentation()
        {
            return Err(TokenizerError::IncompatibleTable(format!(
                "table was trained on a {:?} segmentation, input is {:?}",
                self.segmentation(),
                input.segmentation()
            )));
        }

        if let Some(node) = input.nodes().iter().find(|&&node| !self.arena().contains(node)) {
            return Err(TokenizerError::IncompatibleTable(format!(
                "node {} was not created by this table",
                node
            )));
        }

        Ok(())
    }

    /// Rewrite `input` by repeatedly applying the earliest-learned rule
    /// that matches anywhere, leftmost occurrence first, until none does.
    ///
    /// Boundaries and merge settings are enforced exactly as in training.
    /// Leaves the table has never seen pass through unchanged.
    pub fn apply(&self, input: &NodesSequence) -> Result<NodesSequence> {
        self.check_compatible(input)?;
        if self.is_empty() || input.len() < 2 {
            return Ok(input.clone());
        }

        let arena = self.arena();
        let mut chain = Chain::from_sequence(input, self.settings(), arena);
        let mut heap: BinaryHeap<Reverse<(u32, SlotId, u32)>> = BinaryHeap::new();
        let mut windows = Vec::new();
        let mut operands = Vec::new();

        for slot in chain.live_slots() {
            chain.windows_from(slot, arena, &mut windows);
        }
        self.push_matches(&chain, &mut windows, &mut operands, &mut heap);

        let mut touched = Vec::new();
        while let Some(Reverse((rank, start, len))) = heap.pop() {
            let window = Window { start, len };
            if !chain.is_alive(start) || !chain.is_eligible(window, arena) {
                continue;
            }

            operands.clear();
            chain.window_nodes(window, &mut operands);
            if self.rank_of(&operands) != Some(rank) {
                continue;
            }
            let merged = match self.get(rank) {
                Some(rule) => rule.merged,
                None => continue,
            };

            chain.merge(window, merged, arena);

            touched.clear();
            chain.predecessors(start, &mut touched);
            touched.push(start);
            for &slot in &touched {
                chain.windows_from(slot, arena, &mut windows);
            }
            self.push_matches(&chain, &mut windows, &mut operands, &mut heap);
        }

        chain.to_sequence(input)
    }

    /// Move every window matching a rule from `windows` onto the heap.
    fn push_matches(
        &self,
        chain: &Chain,
        windows: &mut Vec<Window>,
        operands: &mut Vec<NodeId>,
        heap: &mut BinaryHeap<Reverse<(u32, SlotId, u32)>>,
    ) {
        for window in windows.drain(..) {
            operands.clear();
            chain.window_nodes(window, operands);
            if let Some(rank) = self.rank_of(operands) {
                heap.push(Reverse((rank, window.start, window.len)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::Joint;
    use crate::settings::GraphSettings;
    use crate::units::{characters, utf8, utf8_clusters, Units};

    fn c(ch: char) -> NodeId {
        NodeId::from_char(ch)
    }

    fn bpe_table() -> MergeTable {
        let mut table = MergeTable::new(
            GraphSettings::bpe(),
            Some(Units::Characters),
            Segmentation::Unsegmented,
        );
        let lo = table.push_rule(&[c('l'), c('o')], 3).unwrap();
        table.push_rule(&[lo, c('w')], 2).unwrap();
        table.push_rule(&[c('e'), c('r')], 1).unwrap();
        table
    }

    #[test]
    fn test_empty_table_is_identity() {
        let table = MergeTable::default();
        let input = characters("hello world");
        assert_eq!(table.apply(&input).unwrap(), input);
    }

    #[test]
    fn test_applies_rules_in_rank_order() {
        let table = bpe_table();
        let out = table.apply(&characters("lower")).unwrap();
        assert_eq!(out.token_strings(table.arena()), vec!["low", "er"]);
        assert_eq!(out.to_bytes(table.arena()), b"lower".to_vec());
        assert_eq!(out.joints().len(), 1);
    }

    #[test]
    fn test_unknown_leaves_pass_through() {
        let table = bpe_table();
        let out = table.apply(&characters("xlo€")).unwrap();
        assert_eq!(out.token_strings(table.arena()), vec!["x", "lo", "€"]);
    }

    #[test]
    fn test_disconnected_joints_are_respected() {
        let table = bpe_table();
        let mut input = characters("l");
        input.append(characters("ow"), Joint::Disconnected).unwrap();

        let out = table.apply(&input).unwrap();
        assert_eq!(out.token_strings(table.arena()), vec!["l", "o", "w"]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let table = bpe_table();
        let once = table.apply(&characters("lowerlowlo")).unwrap();
        let twice = table.apply(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_leftmost_occurrence_wins_overlaps() {
        let mut table = MergeTable::new(GraphSettings::bpe(), None, Segmentation::Unsegmented);
        table.push_rule(&[c('a'), c('a')], 1).unwrap();

        let out = table.apply(&characters("aaa")).unwrap();
        assert_eq!(out.token_strings(table.arena()), vec!["aa", "a"]);
    }

    #[test]
    fn test_bne_ngram_rules() {
        let mut table =
            MergeTable::new(GraphSettings::bne(3).unwrap(), None, Segmentation::Unsegmented);
        table.push_rule(&[c('a'), c('a'), c('a')], 1).unwrap();
        table.push_rule(&[c('a'), c('a')], 1).unwrap();

        let out = table.apply(&characters("aaaaa")).unwrap();
        assert_eq!(out.token_strings(table.arena()), vec!["aaa", "aa"]);
    }

    #[test]
    fn test_rejects_mismatched_units() {
        let table = bpe_table();
        assert!(matches!(
            table.apply(&utf8("low")),
            Err(TokenizerError::IncompatibleTable(_))
        ));
    }

    #[test]
    fn test_rejects_mismatched_segmentation() {
        let table = MergeTable::new(GraphSettings::bpe(), None, Segmentation::Disconnected);
        let input = characters("ab").with_segmentation(Segmentation::Connected);
        assert!(matches!(
            table.apply(&input),
            Err(TokenizerError::IncompatibleTable(_))
        ));
    }

    #[test]
    fn test_rejects_foreign_composites() {
        let table = bpe_table();
        let mut other = MergeTable::new(GraphSettings::bpe(), None, Segmentation::Unsegmented);
        for pair in [['q', 'r'], ['s', 't'], ['u', 'v'], ['x', 'y']] {
            other.push_rule(&[c(pair[0]), c(pair[1])], 1).unwrap();
        }
        let foreign = other.apply(&characters("xy")).unwrap();

        assert!(matches!(
            table.apply(&foreign),
            Err(TokenizerError::IncompatibleTable(_))
        ));
    }

    #[test]
    fn test_cluster_bytes_merge_before_clusters() {
        let input = utf8_clusters("שש");
        let shin_bytes = [NodeId::from_byte(0xd7), NodeId::from_byte(0xa9)];

        let mut table = MergeTable::new(
            GraphSettings::bne(4).unwrap(),
            Some(Units::Utf8Clusters),
            Segmentation::Unsegmented,
        );
        // pairs that straddle two clusters never apply
        table
            .push_rule(&[NodeId::from_byte(0xa9), NodeId::from_byte(0xd7)], 1)
            .unwrap();
        let shin = table.push_rule(&shin_bytes, 2).unwrap();
        table.push_rule(&[shin, shin], 1).unwrap();

        let out = table.apply(&input).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.token_strings(table.arena()), vec!["שש"]);
    }
}
