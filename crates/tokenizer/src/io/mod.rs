//! Serialization and deserialization of merge tables.
//!
//! A trained [`MergeTable`](graphtok_core::MergeTable) is stored as a
//! single JSON file; a readable rule listing can be written next to it.

pub mod format;
pub mod load;
pub mod save;

pub use format::{
    SerializedMergeTable, SerializedOperand, SerializedRule, MERGES_FILE, READABLE_FILE,
};
pub use load::MergeTableLoader;
pub use save::MergeTableSaver;
