//! Graphtok-core - graph model and merge application for subword tokenization
//!
//! This crate provides the data structures shared by training and inference:
//! unit decomposition, node sequences with boundary tags, merge settings,
//! and the merge table with its applier.
//!
//! # Features
//!
//! - Byte, scalar and grapheme-cluster decomposition with exact round-trip
//! - Hash-consed composite nodes stored in an arena
//! - Connected/disconnected boundaries that merges can never violate
//! - BPE, BNE and boundless merge settings as a plain `Copy` value
//! - Ideographic description sequences decomposed into mergeable trees
//!
//! # Example
//!
//! ```rust
//! use graphtok_core::{GraphSettings, MergeTable, NodeId, Segmentation, Units};
//!
//! let mut table = MergeTable::new(
//!     GraphSettings::bpe(),
//!     Some(Units::Characters),
//!     Segmentation::Unsegmented,
//! );
//! let (l, o) = (NodeId::from_char('l'), NodeId::from_char('o'));
//! table.push_rule(&[l, o], 1).unwrap();
//!
//! let tokens = table.apply(&Units::Characters.decompose("low")).unwrap();
//! assert_eq!(tokens.token_strings(table.arena()), vec!["lo", "w"]);
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

// Graph model and merge algorithms
pub mod core;
pub use self::core::{
    apply, Chain, Joint, Leaf, MergeCandidate, MergeRule, MergeTable, NodeArena, NodeId,
    NodesSequence, Segmentation, SlotId, Tree, Window, WindowQueue, MERGED_BASE,
};

pub mod settings;
pub use settings::GraphSettings;

// Unit decomposers
pub mod units;
pub use units::{characters, ids_tree, utf8, utf8_clusters, Ids, Units};
