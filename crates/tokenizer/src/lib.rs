//! Graphtok-tokenizer - high-level tokenization pipeline
//!
//! This crate ties the pieces together: text is split into words, each
//! word is decomposed into units, word boundaries are tagged, and a merge
//! table learned by `graphtok-training` is applied to the result.
//!
//! # Features
//!
//! - GPT-style pre-tokenization with connected or disconnected word boundaries
//! - Character, byte and grapheme-cluster units
//! - BPE, BNE and boundless merge settings
//! - JSON persistence of trained merge tables
//!
//! # Example
//!
//! ```rust
//! use graphtok_tokenizer::{GraphSettings, Tokenizer, Units};
//!
//! let mut tokenizer = Tokenizer::builder()
//!     .units(Units::Characters)
//!     .settings(GraphSettings::bpe())
//!     .max_merges(20)
//!     .build()?;
//!
//! tokenizer.train(&["low lower lowest", "slow slower slowest"])?;
//!
//! let encoded = tokenizer.encode("lower")?;
//! assert!(encoded.len() < "lower".len());
//! assert_eq!(tokenizer.decode(&encoded)?, "lower");
//! # Ok::<(), graphtok_tokenizer::TokenizerError>(())
//! ```

// Re-export core types
pub use graphtok_core::{GraphSettings, NodesSequence, Result, TokenizerError, Units};
pub use graphtok_training::{MergeLimit, StopReason};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{Tokenizer, TokenizerBuilder, TokenizerConfig};

// IO/Serialization
pub mod io;
pub use io::{MergeTableLoader, MergeTableSaver};

// Pre-tokenization
pub mod pre_tokenizer;
pub use pre_tokenizer::{segment, SplitPattern, Splitter, WordSegmenter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
