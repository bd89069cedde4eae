//! Merge trainer implementation.
//!
//! Learns an ordered merge table from a corpus sequence. Each step pops the
//! candidate window pattern with the highest compression gain, applies it at
//! every occurrence left to right, and refreshes the index only around the
//! replaced slots.

use super::counter::WindowIndex;
use ahash::AHashSet;
use graphtok_core::{
    Chain, GraphSettings, MergeTable, NodeArena, NodeId, NodesSequence, Result, SlotId,
    TokenizerError, Window, WindowQueue,
};
use log::{debug, info};
use rayon::prelude::*;

/// When training stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeLimit {
    /// Stop after this many merges
    MaxMerges(usize),
    /// Stop once distinct leaves plus merges reach this size
    VocabSize(usize),
}

/// Configuration for merge training.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Merge eligibility settings
    pub settings: GraphSettings,
    /// Target number of merges or vocabulary size
    pub limit: MergeLimit,
    /// Minimum frequency for a window to be merged
    pub min_frequency: u64,
    /// Whether to enumerate the initial windows in parallel
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            settings: GraphSettings::default(),
            limit: MergeLimit::VocabSize(30_000),
            min_frequency: 1,
            parallel: true,
        }
    }
}

impl TrainingConfig {
    /// Set the merge settings.
    pub fn with_settings(mut self, settings: GraphSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Stop after `n` merges.
    pub fn max_merges(mut self, n: usize) -> Self {
        self.limit = MergeLimit::MaxMerges(n);
        self
    }

    /// Stop at a vocabulary of `n` entries.
    pub fn vocab_size(mut self, n: usize) -> Self {
        self.limit = MergeLimit::VocabSize(n);
        self
    }

    /// Ignore windows seen fewer than `n` times.
    pub fn min_frequency(mut self, n: u64) -> Self {
        self.min_frequency = n;
        self
    }

    /// Toggle parallel window enumeration.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the targets are usable.
    pub fn validate(&self) -> Result<()> {
        match self.limit {
            MergeLimit::MaxMerges(0) => Err(TokenizerError::InvalidConfig(
                "max merges must be positive".to_string(),
            )),
            MergeLimit::VocabSize(0) => Err(TokenizerError::InvalidConfig(
                "vocabulary size must be positive".to_string(),
            )),
            _ if self.min_frequency == 0 => Err(TokenizerError::InvalidConfig(
                "min frequency must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Why training ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The merge or vocabulary target was reached
    TargetReached,
    /// No eligible window is left
    Exhausted,
    /// Windows remain but all are rarer than `min_frequency`
    BelowMinFrequency,
}

/// Output of a training run.
#[derive(Debug, Clone)]
pub struct TrainerArtifacts {
    /// Learned merge table
    pub table: MergeTable,
    /// Why training stopped
    pub stop_reason: StopReason,
    /// Distinct leaves in the corpus
    pub base_vocab: usize,
}

impl TrainerArtifacts {
    /// Leaves plus learned merges.
    pub fn vocab_size(&self) -> usize {
        self.base_vocab + self.table.len()
    }
}

/// Merge trainer.
///
/// Trains a merge table from a node sequence by repeatedly merging the
/// window pattern with the highest gain `(arity - 1) * count`.
pub struct MergeTrainer {
    config: TrainingConfig,
}

impl MergeTrainer {
    /// Create a new trainer with the given configuration.
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Create a trainer with default configuration and a merge target.
    pub fn with_max_merges(n: usize) -> Self {
        Self::new(TrainingConfig::default().max_merges(n))
    }

    /// The configuration in use.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on several independent texts.
    ///
    /// The texts are joined with disconnected joints, so no merge spans two
    /// of them.
    pub fn train_sequences(&self, sequences: &[NodesSequence]) -> Result<TrainerArtifacts> {
        let corpus = NodesSequence::concat(sequences.iter().cloned())?;
        self.train(&corpus)
    }

    /// Train on a corpus sequence.
    ///
    /// Fails with [`TokenizerError::EmptyCorpus`] when no joint can be
    /// merged at all. Running out of candidates before the target is
    /// reached is not an error.
    pub fn train(&self, corpus: &NodesSequence) -> Result<TrainerArtifacts> {
        self.config.validate()?;

        if let Some(node) = corpus.nodes().iter().find(|node| !node.is_leaf()) {
            return Err(TokenizerError::InvalidInput(format!(
                "training corpus must contain only leaves, found {}",
                node
            )));
        }

        let settings = self.config.settings;
        let mut table = MergeTable::new(settings, corpus.units(), corpus.segmentation());
        let mut chain = Chain::from_sequence(corpus, settings, table.arena());
        if !chain.has_mergeable_joint() {
            return Err(TokenizerError::EmptyCorpus(format!(
                "{} nodes without a single mergeable boundary",
                corpus.len()
            )));
        }

        let base_vocab = corpus.nodes().iter().collect::<AHashSet<_>>().len();
        info!(
            "Training on {} nodes ({} distinct leaves) with {:?}, limit {:?}",
            corpus.len(),
            base_vocab,
            settings,
            self.config.limit
        );

        let mut index = WindowIndex::new(chain.len());
        let mut nodes = Vec::new();
        for window in self.initial_windows(&chain, table.arena()) {
            nodes.clear();
            chain.window_nodes(window, &mut nodes);
            index.add(window.start, &nodes, table.arena());
        }
        debug!("Indexed {} window patterns", index.len());

        let mut queue = WindowQueue::with_capacity(index.len());
        for id in 0..index.len() as u32 {
            self.enqueue(&index, &mut queue, id);
        }

        let mut changed = Vec::new();
        let stop_reason = loop {
            if self.target_reached(table.len(), base_vocab) {
                break StopReason::TargetReached;
            }

            let candidate = match queue.pop() {
                Some(candidate) => candidate,
                None if index.total() > 0 => break StopReason::BelowMinFrequency,
                None => break StopReason::Exhausted,
            };

            let operands: Box<[NodeId]> = index.pattern(candidate.pattern).into();
            let merged = table.push_rule(&operands, candidate.count)?;

            changed.clear();
            let applied = merge_occurrences(
                &mut chain,
                &mut index,
                table.arena(),
                candidate.pattern,
                operands.len() as u32,
                merged,
                &mut changed,
            );

            changed.sort_unstable();
            changed.dedup();
            for &id in &changed {
                self.enqueue(&index, &mut queue, id);
            }

            debug!(
                "Merge {}: {:?} -> {:?} (count {}, applied {})",
                table.len() - 1,
                operands,
                String::from_utf8_lossy(&table.arena().to_bytes(merged)),
                candidate.count,
                applied
            );
            if table.len() % 1000 == 0 {
                info!("Learned {} merges", table.len());
            }
        };

        info!("Training finished with {} merges ({:?})", table.len(), stop_reason);

        Ok(TrainerArtifacts {
            table,
            stop_reason,
            base_vocab,
        })
    }

    /// Every eligible window in slot order.
    fn initial_windows(&self, chain: &Chain, arena: &NodeArena) -> Vec<Window> {
        let slots: Vec<SlotId> = chain.live_slots().collect();

        if self.config.parallel {
            slots
                .par_iter()
                .flat_map_iter(|&slot| {
                    let mut windows = Vec::new();
                    chain.windows_from(slot, arena, &mut windows);
                    windows
                })
                .collect()
        } else {
            let mut windows = Vec::new();
            for slot in slots {
                chain.windows_from(slot, arena, &mut windows);
            }
            windows
        }
    }

    pub(super) fn target_reached(&self, merges: usize, base_vocab: usize) -> bool {
        match self.config.limit {
            MergeLimit::MaxMerges(n) => merges >= n,
            MergeLimit::VocabSize(n) => base_vocab + merges >= n,
        }
    }

    fn enqueue(&self, index: &WindowIndex, queue: &mut WindowQueue, id: u32) {
        match index.candidate(id) {
            Some(candidate) if candidate.count >= self.config.min_frequency => {
                queue.push(candidate)
            }
            _ => queue.remove(id),
        }
    }
}

/// Merge every current occurrence of `pattern`, leftmost first.
///
/// Occurrences overlapping an earlier replacement are gone from the index
/// by the time they are reached and are skipped. Returns the number of
/// replacements.
fn merge_occurrences(
    chain: &mut Chain,
    index: &mut WindowIndex,
    arena: &NodeArena,
    pattern: u32,
    arity: u32,
    merged: NodeId,
    changed: &mut Vec<u32>,
) -> u64 {
    let slots: Vec<SlotId> = index.occurrences(pattern).collect();
    let mut touched = Vec::new();
    let mut windows = Vec::new();
    let mut nodes = Vec::new();
    let mut applied = 0;

    for slot in slots {
        if !index.contains(pattern, slot) {
            continue;
        }
        let window = Window {
            start: slot,
            len: arity,
        };

        touched.clear();
        chain.predecessors(slot, &mut touched);
        let keep = touched.len() + 1;
        chain.window_slots(window, &mut touched);
        for &s in &touched {
            index.clear_slot(s, changed);
        }

        chain.merge(window, merged, arena);
        applied += 1;

        // predecessors and the merged slot
        touched.truncate(keep);
        windows.clear();
        for &s in &touched {
            chain.windows_from(s, arena, &mut windows);
        }
        for &w in &windows {
            nodes.clear();
            chain.window_nodes(w, &mut nodes);
            changed.push(index.add(w.start, &nodes, arena));
        }
    }

    applied
}

/// Train a merge table on `corpus`.
///
/// Shorthand for a [`MergeTrainer`] with default frequency settings.
pub fn train(
    corpus: &NodesSequence,
    limit: MergeLimit,
    settings: GraphSettings,
) -> Result<MergeTable> {
    let config = TrainingConfig {
        settings,
        limit,
        ..TrainingConfig::default()
    };
    MergeTrainer::new(config).train(corpus).map(|artifacts| artifacts.table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphtok_core::{characters, utf8_clusters, Joint, Segmentation, Units};

    fn words(text: &str) -> Vec<NodesSequence> {
        text.split(' ').map(characters).collect()
    }

    fn trainer(settings: GraphSettings, merges: usize) -> MergeTrainer {
        MergeTrainer::new(
            TrainingConfig::default()
                .with_settings(settings)
                .max_merges(merges)
                .parallel(false),
        )
    }

    #[test]
    fn test_bne_trigrams_on_aaaa() {
        let settings = GraphSettings::bne(3).unwrap();
        let artifacts = trainer(settings, 10)
            .train_sequences(&[characters("aaaa")])
            .unwrap();
        let table = &artifacts.table;

        assert!(table.rules().iter().all(|rule| table.arena().leaf_count(rule.merged) <= 3));

        let tokens = table.apply(&characters("aaaa")).unwrap();
        let counts: Vec<u32> = tokens
            .nodes()
            .iter()
            .map(|&node| table.arena().leaf_count(node))
            .collect();
        assert_eq!(counts.iter().sum::<u32>(), 4);
        assert!(counts.iter().all(|&c| c <= 3));
    }

    #[test]
    fn test_bpe_learns_most_frequent_pair_first() {
        let settings = GraphSettings::bpe_bounded(2).unwrap();
        let artifacts = trainer(settings, 5)
            .train_sequences(&words("hello low lower lot slow"))
            .unwrap();

        let first = &artifacts.table.rules()[0];
        assert_eq!(
            &first.operands[..],
            &[NodeId::from_char('l'), NodeId::from_char('o')]
        );
        assert_eq!(first.count, 5);
    }

    #[test]
    fn test_bpe_grows_recursively() {
        let artifacts = trainer(GraphSettings::bpe(), 2)
            .train_sequences(&words("low low low lower"))
            .unwrap();

        let readable = artifacts.table.readable();
        assert_eq!(readable[0].1, "lo");
        assert_eq!(readable[1].1, "low");
        assert_eq!(artifacts.stop_reason, StopReason::TargetReached);
    }

    #[test]
    fn test_rules_never_span_words() {
        let corpus = words("the cat sat on the mat with the hat");
        let artifacts = trainer(GraphSettings::bpe(), 100)
            .train_sequences(&corpus)
            .unwrap();
        let table = &artifacts.table;
        let vocab: Vec<&str> = "the cat sat on the mat with the hat".split(' ').collect();

        for rule in table.rules() {
            let text = String::from_utf8(table.arena().to_bytes(rule.merged)).unwrap();
            assert!(vocab.iter().any(|word| word.contains(&text)), "{}", text);
        }
        assert_eq!(artifacts.stop_reason, StopReason::Exhausted);
    }

    #[test]
    fn test_bne_operands_are_leaves() {
        let settings = GraphSettings::bne(4).unwrap();
        let artifacts = trainer(settings, 50)
            .train_sequences(&words("banana bandana cabana"))
            .unwrap();

        assert!(!artifacts.table.is_empty());
        for rule in artifacts.table.rules() {
            assert!(rule.operands.iter().all(|node| node.is_leaf()));
            assert!(rule.arity() <= 4);
        }
    }

    #[test]
    fn test_arity_bound_on_tokens() {
        let settings = GraphSettings::bpe_bounded(3).unwrap();
        let text = "abababababab";
        let table = trainer(settings, 20)
            .train_sequences(&[characters(text)])
            .unwrap()
            .table;

        let tokens = table.apply(&characters(text)).unwrap();
        assert!(tokens
            .nodes()
            .iter()
            .all(|&node| table.arena().leaf_count(node) <= 3));
        assert_eq!(tokens.to_bytes(table.arena()), text.as_bytes().to_vec());
    }

    #[test]
    fn test_inference_is_idempotent() {
        let corpus = words("lower newer wider lowest newest widest");
        let table = trainer(GraphSettings::bpe(), 30)
            .train_sequences(&corpus)
            .unwrap()
            .table;

        let input = NodesSequence::concat(words("slowest renewer")).unwrap();
        let once = table.apply(&input).unwrap();
        assert_eq!(table.apply(&once).unwrap(), once);
        assert_eq!(once.to_bytes(table.arena()), b"slowestrenewer".to_vec());
    }

    #[test]
    fn test_cluster_bytes_merge_first() {
        let artifacts = trainer(GraphSettings::bpe(), 1)
            .train_sequences(&[utf8_clusters("ששש")])
            .unwrap();

        let rule = &artifacts.table.rules()[0];
        assert_eq!(
            &rule.operands[..],
            &[NodeId::from_byte(0xd7), NodeId::from_byte(0xa9)]
        );
        assert_eq!(rule.count, 3);
        assert_eq!(artifacts.table.units(), Some(Units::Utf8Clusters));
    }

    #[test]
    fn test_bne_builds_whole_cjk_clusters_then_ngrams() {
        let corpus = vec![utf8_clusters("中丰串临"); 5];
        let artifacts = trainer(GraphSettings::bne(6).unwrap(), 50)
            .train_sequences(&corpus)
            .unwrap();
        let table = &artifacts.table;

        // every rule produces whole grapheme clusters
        for rule in table.rules() {
            let bytes = table.arena().to_bytes(rule.merged);
            assert!(std::str::from_utf8(&bytes).is_ok(), "partial cluster {:?}", bytes);
        }
        assert!(table
            .rules()
            .iter()
            .any(|rule| table.arena().leaf_count(rule.merged) == 6));

        let tokens = table.apply(&utf8_clusters("中丰串临")).unwrap();
        assert!(tokens.len() <= 2);
        for token in tokens.token_bytes(table.arena()) {
            assert!(std::str::from_utf8(&token).is_ok());
        }
    }

    #[test]
    fn test_empty_corpus() {
        let result = trainer(GraphSettings::bpe(), 10).train_sequences(&words("a b c"));
        assert!(matches!(result, Err(TokenizerError::EmptyCorpus(_))));

        let result = trainer(GraphSettings::bpe(), 10).train(&NodesSequence::default());
        assert!(matches!(result, Err(TokenizerError::EmptyCorpus(_))));
    }

    #[test]
    fn test_invalid_targets() {
        let zero = TrainingConfig::default().max_merges(0).parallel(false);
        assert!(matches!(
            MergeTrainer::new(zero).train(&characters("abab")),
            Err(TokenizerError::InvalidConfig(_))
        ));

        let zero_vocab = TrainingConfig::default().vocab_size(0);
        assert!(zero_vocab.validate().is_err());
        assert!(TrainingConfig::default().min_frequency(0).validate().is_err());
    }

    #[test]
    fn test_min_frequency_stops_training() {
        let config = TrainingConfig::default()
            .with_settings(GraphSettings::bpe())
            .max_merges(100)
            .min_frequency(3)
            .parallel(false);
        let artifacts = MergeTrainer::new(config)
            .train_sequences(&words("ab ab ab cd"))
            .unwrap();

        assert_eq!(artifacts.table.len(), 1);
        assert_eq!(artifacts.stop_reason, StopReason::BelowMinFrequency);
    }

    #[test]
    fn test_vocab_size_limit() {
        let config = TrainingConfig::default()
            .with_settings(GraphSettings::bpe())
            .vocab_size(6)
            .parallel(false);
        // leaves: a b c d
        let artifacts = MergeTrainer::new(config)
            .train_sequences(&words("abcd abcd"))
            .unwrap();

        assert_eq!(artifacts.base_vocab, 4);
        assert_eq!(artifacts.table.len(), 2);
        assert_eq!(artifacts.vocab_size(), 6);
        assert_eq!(artifacts.stop_reason, StopReason::TargetReached);
    }

    #[test]
    fn test_ties_break_by_first_occurrence() {
        // every pair occurs once; the leftmost wins
        let table = trainer(GraphSettings::bpe(), 1)
            .train_sequences(&[characters("zyx")])
            .unwrap()
            .table;
        assert_eq!(table.readable()[0].1, "zy");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let corpus = words("she sells sea shells by the sea shore");
        let sequential = trainer(GraphSettings::bne(3).unwrap(), 40)
            .train_sequences(&corpus)
            .unwrap();
        let parallel = MergeTrainer::new(
            TrainingConfig::default()
                .with_settings(GraphSettings::bne(3).unwrap())
                .max_merges(40)
                .parallel(true),
        )
        .train_sequences(&corpus)
        .unwrap();

        assert_eq!(sequential.table.rules(), parallel.table.rules());
    }

    #[test]
    fn test_rejects_composite_input() {
        let mut arena = NodeArena::new();
        let ab = arena
            .intern(&[NodeId::from_char('a'), NodeId::from_char('b')])
            .unwrap();
        let mut corpus = NodesSequence::new(Units::Characters);
        corpus.push(ab, Joint::Connected);
        corpus.push(NodeId::from_char('c'), Joint::Connected);

        assert!(matches!(
            trainer(GraphSettings::bpe(), 1).train(&corpus),
            Err(TokenizerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_free_function_keeps_context() {
        let corpus = characters("abab").with_segmentation(Segmentation::Disconnected);
        let table = train(&corpus, MergeLimit::MaxMerges(1), GraphSettings::bpe()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.segmentation(), Segmentation::Disconnected);
        assert_eq!(table.units(), Some(Units::Characters));
    }
}
