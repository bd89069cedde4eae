//! Merge eligibility settings.
//!
//! [`GraphSettings`] is a small `Copy` value handed to every training and
//! inference run. A run reads it once and keeps it for its whole duration;
//! a trained [`MergeTable`](crate::MergeTable) stores the settings it was
//! trained with and applies them again at inference time.

use crate::error::{Result, TokenizerError};
use serde::{Deserialize, Serialize};

/// Controls which adjacent nodes may be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphSettings {
    /// Maximum number of leaves in a merged node (`None` = unbounded)
    max_merge_size: Option<u32>,
    /// Only merge nodes that span exactly one unit
    only_minimal_merges: bool,
}

impl GraphSettings {
    /// Create validated settings.
    ///
    /// `max_merge_size` must be at least 2, and minimal-only merging needs
    /// a bounded size since it enumerates whole n-gram windows.
    pub fn new(max_merge_size: Option<u32>, only_minimal_merges: bool) -> Result<Self> {
        if let Some(size) = max_merge_size {
            if size < 2 {
                return Err(TokenizerError::InvalidConfig(format!(
                    "max merge size must be at least 2, got {}",
                    size
                )));
            }
        } else if only_minimal_merges {
            return Err(TokenizerError::InvalidConfig(
                "minimal merges need a bounded max merge size".to_string(),
            ));
        }

        Ok(Self {
            max_merge_size,
            only_minimal_merges,
        })
    }

    /// BNE: n-grams of up to `n` minimal units.
    pub fn bne(n: u32) -> Result<Self> {
        Self::new(Some(n), true)
    }

    /// Standard BPE: recursive pairwise merges without a size cap.
    pub fn bpe() -> Self {
        Self {
            max_merge_size: None,
            only_minimal_merges: false,
        }
    }

    /// Pairwise merges whose result spans at most `n` leaves.
    pub fn bpe_bounded(n: u32) -> Result<Self> {
        Self::new(Some(n), false)
    }

    /// BoundlessBPE: unbounded pairwise merges, meant for connected
    /// segmentations where merges cross word boundaries.
    pub fn boundless() -> Self {
        Self::bpe()
    }

    /// Maximum number of leaves in a merged node.
    #[inline]
    pub fn max_merge_size(&self) -> Option<u32> {
        self.max_merge_size
    }

    /// Whether only single-unit nodes may merge.
    #[inline]
    pub fn only_minimal_merges(&self) -> bool {
        self.only_minimal_merges
    }

    /// Largest number of operands a single merge can have.
    ///
    /// Minimal merges build n-grams in one step; otherwise merges are pairs.
    #[inline]
    pub fn max_arity(&self) -> u32 {
        match (self.only_minimal_merges, self.max_merge_size) {
            (true, Some(size)) => size,
            _ => 2,
        }
    }

    /// Whether a merge covering `leaves` leaves is within the size bound.
    #[inline]
    pub fn allows_leaves(&self, leaves: u32) -> bool {
        self.max_merge_size.map_or(true, |max| leaves <= max)
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_merge_size: Some(3),
            only_minimal_merges: true,
        }
    }
}
