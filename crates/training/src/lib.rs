//! Graphtok-training - merge learning over node graphs
//!
//! This crate provides the training algorithm that learns an ordered
//! [`MergeTable`](graphtok_core::MergeTable) from a decomposed corpus.
//!
//! # Features
//!
//! - BPE, BNE and boundless merge selection driven by `GraphSettings`
//! - Incremental window counting with a reverse index of occurrences
//! - Deterministic tie-breaking and optional parallel window enumeration
//! - Tree training for ideographic description sequences
//!
//! # Example
//!
//! ```rust
//! use graphtok_core::{characters, GraphSettings, NodesSequence};
//! use graphtok_training::{MergeTrainer, TrainingConfig};
//!
//! let config = TrainingConfig::default()
//!     .with_settings(GraphSettings::bpe())
//!     .max_merges(10);
//!
//! let corpus: Vec<NodesSequence> = ["low", "lower", "lowest"]
//!     .iter()
//!     .map(|word| characters(word))
//!     .collect();
//! let artifacts = MergeTrainer::new(config).train_sequences(&corpus)?;
//! assert_eq!(artifacts.table.readable()[0].1, "lo");
//! # Ok::<(), graphtok_core::TokenizerError>(())
//! ```

pub use graphtok_core::{Result, TokenizerError};

// Training infrastructure
pub mod training;
pub use training::{
    train, MergeLimit, MergeTrainer, StopReason, TrainerArtifacts, TrainingConfig, WindowIndex,
};
