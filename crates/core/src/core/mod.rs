//! Graph data model and merge algorithms.
//!
//! Leaves and composite nodes ([`node`]), flat sequences with boundary tags
//! ([`sequence`]), the mutable slot chain shared by training and inference
//! ([`chain`]), the candidate queue ([`priority`]), the learned table
//! ([`merges`]), its applier ([`apply`]) and tree-shaped inputs
//! ([`tree`]).

pub mod apply;
pub mod chain;
pub mod merges;
pub mod node;
pub mod priority;
pub mod sequence;
pub mod tree;

pub use apply::apply;
pub use chain::{Chain, SlotId, Window};
pub use merges::{MergeRule, MergeTable};
pub use node::{Leaf, NodeArena, NodeId, MERGED_BASE};
pub use priority::{MergeCandidate, WindowQueue};
pub use sequence::{Joint, NodesSequence, Segmentation};
pub use tree::Tree;
