//! Main tokenizer implementation.
//!
//! This module provides the high-level [`Tokenizer`] that ties word
//! segmentation, merge training and inference together.

use crate::io::{MergeTableLoader, MergeTableSaver};
use crate::pre_tokenizer::{Splitter, WordSegmenter};
use graphtok_core::{
    GraphSettings, MergeTable, NodesSequence, Result, Segmentation, TokenizerError, Units,
};
use graphtok_training::{MergeLimit, MergeTrainer, StopReason, TrainingConfig};
use log::info;
use rayon::prelude::*;
use std::path::Path;

/// Configuration for building a tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Decomposer applied to every word
    pub units: Units,
    /// Whether merges may bridge word boundaries
    pub connected: bool,
    /// Merge eligibility settings
    pub settings: GraphSettings,
    /// Target number of merges or vocabulary size
    pub limit: MergeLimit,
    /// Minimum frequency for merges during training
    pub min_frequency: u64,
    /// Use rayon for segmentation and window enumeration
    pub parallel: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            units: Units::Utf8Clusters,
            connected: false,
            settings: GraphSettings::default(),
            limit: MergeLimit::VocabSize(30_000),
            min_frequency: 1,
            parallel: true,
        }
    }
}

impl TokenizerConfig {
    fn training(&self) -> TrainingConfig {
        TrainingConfig {
            settings: self.settings,
            limit: self.limit,
            min_frequency: self.min_frequency,
            parallel: self.parallel,
        }
    }
}

/// Builder for creating a tokenizer.
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    config: TokenizerConfig,
    splitter: Splitter,
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decomposer.
    pub fn units(mut self, units: Units) -> Self {
        self.config.units = units;
        self
    }

    /// Allow or forbid merges across word boundaries.
    pub fn connected(mut self, connected: bool) -> Self {
        self.config.connected = connected;
        self
    }

    /// Set the merge settings.
    pub fn settings(mut self, settings: GraphSettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Stop training after `n` merges.
    pub fn max_merges(mut self, n: usize) -> Self {
        self.config.limit = MergeLimit::MaxMerges(n);
        self
    }

    /// Stop training at a vocabulary of `n` entries.
    pub fn vocab_size(mut self, n: usize) -> Self {
        self.config.limit = MergeLimit::VocabSize(n);
        self
    }

    /// Set the minimum frequency for merges.
    pub fn min_frequency(mut self, freq: u64) -> Self {
        self.config.min_frequency = freq;
        self
    }

    /// Toggle parallel processing.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Set the pre-tokenization splitter.
    pub fn splitter(mut self, splitter: Splitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Build the tokenizer.
    pub fn build(self) -> Result<Tokenizer> {
        self.config.training().validate()?;
        Ok(Tokenizer::with_splitter(self.config, self.splitter))
    }
}

/// Main tokenizer struct.
///
/// Holds a merge table, empty until [`Tokenizer::train`] or
/// [`Tokenizer::load`], and the segmenter that turns text into the
/// sequences the table was trained on.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    segmenter: WordSegmenter,
    table: MergeTable,
}

impl Tokenizer {
    /// Create an untrained tokenizer with the default splitter.
    pub fn new(config: TokenizerConfig) -> Self {
        Self::with_splitter(config, Splitter::default())
    }

    fn with_splitter(config: TokenizerConfig, splitter: Splitter) -> Self {
        let segmenter = WordSegmenter::with_splitter(splitter, config.units, config.connected);
        let table = MergeTable::new(config.settings, Some(config.units), segmenter.segmentation());
        Self {
            config,
            segmenter,
            table,
        }
    }

    /// Wrap a trained table, taking units, segmentation and settings from it.
    pub fn from_table(table: MergeTable) -> Self {
        Self::from_table_with_splitter(table, Splitter::default())
    }

    /// Wrap a trained table that was segmented with `splitter`.
    pub fn from_table_with_splitter(table: MergeTable, splitter: Splitter) -> Self {
        let config = TokenizerConfig {
            units: table.units().unwrap_or_default(),
            connected: table.segmentation() == Segmentation::Connected,
            settings: table.settings(),
            ..TokenizerConfig::default()
        };
        let segmenter = WordSegmenter::with_splitter(splitter, config.units, config.connected);
        Self {
            config,
            segmenter,
            table,
        }
    }

    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    /// Train the tokenizer on a corpus of independent texts.
    ///
    /// Replaces any previously learned table.
    pub fn train(&mut self, texts: &[&str]) -> Result<StopReason> {
        let sequences: Vec<NodesSequence> = if self.config.parallel {
            texts.par_iter().map(|text| self.segmenter.segment(text)).collect()
        } else {
            texts.iter().map(|text| self.segmenter.segment(text)).collect()
        };

        let trainer = MergeTrainer::new(self.config.training());
        let artifacts = trainer.train_sequences(&sequences)?;
        info!(
            "Learned {} merges from {} texts ({:?}), vocabulary {}",
            artifacts.table.len(),
            texts.len(),
            artifacts.stop_reason,
            artifacts.vocab_size()
        );

        self.table = artifacts.table;
        Ok(artifacts.stop_reason)
    }

    /// Segment `text` and apply the learned merges.
    pub fn encode(&self, text: &str) -> Result<NodesSequence> {
        self.table.apply(&self.segmenter.segment(text))
    }

    /// Encode a batch of texts (parallelized).
    pub fn encode_batch(&self, texts: &[&str]) -> Result<Vec<NodesSequence>> {
        texts
            .par_iter()
            .map(|text| self.encode(text))
            .collect::<std::result::Result<Vec<_>, _>>()
    }

    /// Token bytes of `text`, in order.
    pub fn tokens(&self, text: &str) -> Result<Vec<Vec<u8>>> {
        Ok(self.encode(text)?.token_bytes(self.table.arena()))
    }

    /// Tokens of `text` rendered as strings; bytes of a partial character
    /// are replaced lossily.
    pub fn token_strings(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.encode(text)?.token_strings(self.table.arena()))
    }

    /// Decode an encoded sequence back to text.
    pub fn decode(&self, encoded: &NodesSequence) -> Result<String> {
        self.table.check_compatible(encoded)?;
        String::from_utf8(encoded.to_bytes(self.table.arena()))
            .map_err(|e| TokenizerError::InvalidInput(format!("decoded bytes: {}", e)))
    }

    /// The learned merge table.
    pub fn table(&self) -> &MergeTable {
        &self.table
    }

    /// The configuration in use.
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Save the merge table and split pattern to a directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        MergeTableSaver::new(&self.table)
            .with_split(self.segmenter.splitter().pattern())
            .save(path)
    }

    /// Load a tokenizer from a directory written by [`Tokenizer::save`].
    ///
    /// Files without a split pattern get the default splitter.
    pub fn load(path: &Path) -> Result<Self> {
        let data = MergeTableLoader::read(path)?;
        let splitter = Splitter::new(data.split.clone().unwrap_or_default())?;
        let table = MergeTableLoader::from_serialized(data)?;
        Ok(Self::from_table_with_splitter(table, splitter))
    }
}
