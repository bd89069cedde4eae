//! Training infrastructure for merge tables.
//!
//! This module provides the window index and the trainer that learns
//! ordered merge rules from node sequences, plus its variant for trees.

pub mod counter;
pub mod trainer;
pub mod trees;

pub use counter::WindowIndex;
pub use trainer::{
    train, MergeLimit, MergeTrainer, StopReason, TrainerArtifacts, TrainingConfig,
};
