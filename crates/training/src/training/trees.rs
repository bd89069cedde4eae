//! Merge training over tree-shaped inputs.
//!
//! Each step recounts the collapsible templates of every tree, merges the
//! one with the highest gain everywhere, and stops on the same limits as
//! sequence training. Ties break by first occurrence in corpus order.

use super::trainer::{MergeTrainer, StopReason, TrainerArtifacts};
use ahash::{AHashMap, AHashSet};
use graphtok_core::{
    GraphSettings, MergeTable, NodeArena, NodeId, Result, Segmentation, TokenizerError, Tree,
    Units,
};
use log::{debug, info};
use rayon::prelude::*;

/// Occurrence count and first position of one candidate.
struct Tally {
    count: u64,
    first: usize,
}

impl MergeTrainer {
    /// Train on a corpus of trees, such as parsed description sequences.
    ///
    /// Templates merge their root with all children at once, so the table
    /// settings must allow that arity: use [`GraphSettings::bne`] with a
    /// bound at least as large as the biggest merged subtree.
    pub fn train_trees(&self, trees: &[Tree]) -> Result<TrainerArtifacts> {
        let config = self.config();
        config.validate()?;

        let settings = config.settings;
        let mut table =
            MergeTable::new(settings, Some(Units::Characters), Segmentation::Disconnected);
        let mut trees = trees.to_vec();

        let leaves: AHashSet<NodeId> = trees.iter().flat_map(Tree::nodes).collect();
        if let Some(node) = leaves.iter().find(|node| !node.is_leaf()) {
            return Err(TokenizerError::InvalidInput(format!(
                "training trees must contain only leaves, found {}",
                node
            )));
        }
        let base_vocab = leaves.len();

        if self.count_candidates(&trees).is_empty() {
            return Err(TokenizerError::EmptyCorpus(format!(
                "{} trees without a single template",
                trees.len()
            )));
        }
        info!(
            "Training on {} trees ({} distinct leaves) with {:?}, limit {:?}",
            trees.len(),
            base_vocab,
            settings,
            config.limit
        );

        let stop_reason = loop {
            if self.target_reached(table.len(), base_vocab) {
                break StopReason::TargetReached;
            }

            let counts = self.count_candidates(&trees);
            let best = counts
                .iter()
                .filter(|(operands, _)| fits(settings, operands, table.arena()))
                .max_by(|(a_ops, a), (b_ops, b)| {
                    gain(a_ops, a)
                        .cmp(&gain(b_ops, b))
                        .then_with(|| b.first.cmp(&a.first))
                        .then_with(|| b_ops.cmp(a_ops))
                });

            let (operands, tally) = match best {
                Some(best) if best.1.count >= config.min_frequency => best,
                Some(_) => break StopReason::BelowMinFrequency,
                None => break StopReason::Exhausted,
            };

            let merged = table.push_rule(operands, tally.count)?;
            let applied: u64 = trees
                .iter_mut()
                .map(|tree| tree.merge(operands, merged))
                .sum();

            debug!(
                "Merge {}: {:?} -> {:?} (count {}, applied {})",
                table.len() - 1,
                operands,
                String::from_utf8_lossy(&table.arena().to_bytes(merged)),
                tally.count,
                applied
            );
        };

        info!("Tree training finished with {} merges ({:?})", table.len(), stop_reason);

        Ok(TrainerArtifacts {
            table,
            stop_reason,
            base_vocab,
        })
    }

    fn count_candidates(&self, trees: &[Tree]) -> AHashMap<Vec<NodeId>, Tally> {
        let per_tree: Vec<Vec<Vec<NodeId>>> = if self.config().parallel {
            trees.par_iter().map(candidates).collect()
        } else {
            trees.iter().map(candidates).collect()
        };

        let mut counts: AHashMap<Vec<NodeId>, Tally> = AHashMap::new();
        let mut position = 0;
        for operands in per_tree.into_iter().flatten() {
            counts
                .entry(operands)
                .or_insert(Tally {
                    count: 0,
                    first: position,
                })
                .count += 1;
            position += 1;
        }
        counts
    }
}

fn candidates(tree: &Tree) -> Vec<Vec<NodeId>> {
    let mut out = Vec::new();
    tree.candidates(&mut out);
    out
}

fn gain(operands: &[NodeId], tally: &Tally) -> u64 {
    (operands.len() as u64 - 1) * tally.count
}

/// Whether the table settings accept merging `operands`.
fn fits(settings: GraphSettings, operands: &[NodeId], arena: &NodeArena) -> bool {
    let leaves: u32 = operands.iter().map(|&node| arena.leaf_count(node)).sum();
    operands.len() as u32 <= settings.max_arity() && settings.allows_leaves(leaves)
}
