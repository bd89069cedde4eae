//! Unit decomposers.
//!
//! Each decomposer turns text into an initial [`NodesSequence`] of leaves:
//! - [`characters`]: one leaf per Unicode scalar value
//! - [`utf8`]: one leaf per UTF-8 byte
//! - [`utf8_clusters`]: one nested group of byte leaves per grapheme cluster
//!
//! [`ids`] parses ideographic description sequences into trees instead.

pub mod byte_level;
pub mod char_level;
pub mod ids;

pub use byte_level::{utf8, utf8_clusters};
pub use char_level::characters;
pub use ids::{ids_tree, Ids};

use crate::core::sequence::NodesSequence;
use crate::error::{Result, TokenizerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The granularity text is decomposed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Unicode scalar values
    Characters,
    /// Raw UTF-8 bytes
    Utf8,
    /// UTF-8 bytes grouped by extended grapheme cluster
    #[default]
    Utf8Clusters,
}

impl Units {
    /// Decompose text into leaves.
    pub fn decompose(self, text: &str) -> NodesSequence {
        match self {
            Units::Characters => characters(text),
            Units::Utf8 => utf8(text),
            Units::Utf8Clusters => utf8_clusters(text),
        }
    }

    /// Decompose raw bytes.
    ///
    /// Byte-level decomposition accepts anything; the other granularities
    /// need valid UTF-8 and fail with [`TokenizerError::InvalidInput`].
    pub fn decompose_bytes(self, bytes: &[u8]) -> Result<NodesSequence> {
        match self {
            Units::Utf8 => Ok(byte_level::utf8_bytes(bytes)),
            Units::Characters | Units::Utf8Clusters => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    TokenizerError::InvalidInput(format!(
                        "{} units need valid UTF-8: {}",
                        self, e
                    ))
                })?;
                Ok(self.decompose(text))
            }
        }
    }

    /// Stable name of the decomposer.
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Characters => "characters",
            Units::Utf8 => "utf8",
            Units::Utf8Clusters => "utf8_clusters",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = TokenizerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "characters" => Ok(Units::Characters),
            "utf8" => Ok(Units::Utf8),
            "utf8_clusters" => Ok(Units::Utf8Clusters),
            other => Err(TokenizerError::InvalidConfig(format!(
                "unknown units: {}",
                other
            ))),
        }
    }
}
