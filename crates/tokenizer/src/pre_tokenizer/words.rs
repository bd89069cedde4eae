//! Word segmentation with boundary tagging.
//!
//! Text is split into pre-tokens, each pre-token is decomposed on its own,
//! and the results are joined with boundary tags:
//! - joints inside a word keep the tags of the decomposer;
//! - joints between two words are connected or disconnected on request;
//! - whitespace-only pre-tokens are separators, fully disconnected inside
//!   and from both neighbours.

use super::split::Splitter;
use graphtok_core::{Joint, NodesSequence, Segmentation, Units};

/// Splits text into words and tags the boundaries between them.
#[derive(Debug, Clone)]
pub struct WordSegmenter {
    splitter: Splitter,
    units: Units,
    connected: bool,
}

impl WordSegmenter {
    /// Create a segmenter using the default GPT-style splitter.
    pub fn new(units: Units, connected: bool) -> Self {
        Self::with_splitter(Splitter::default(), units, connected)
    }

    /// Create a segmenter with a custom splitter.
    pub fn with_splitter(splitter: Splitter, units: Units, connected: bool) -> Self {
        Self {
            splitter,
            units,
            connected,
        }
    }

    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    /// The segmentation mode of produced sequences.
    pub fn segmentation(&self) -> Segmentation {
        if self.connected {
            Segmentation::Connected
        } else {
            Segmentation::Disconnected
        }
    }

    /// Decompose `text` word by word.
    pub fn segment(&self, text: &str) -> NodesSequence {
        let mut out = NodesSequence::with_capacity(self.units, text.len());
        let mut after_separator = false;

        for piece in self.splitter.split(text) {
            let separator = piece.chars().all(char::is_whitespace);
            let word = self.units.decompose(piece);

            let boundary = if self.connected && !separator && !after_separator {
                Joint::Connected
            } else {
                Joint::Disconnected
            };

            for (i, &node) in word.nodes().iter().enumerate() {
                let joint = match i {
                    0 => boundary,
                    _ if separator => Joint::Disconnected,
                    _ => word.joints()[i - 1],
                };
                out.push(node, joint);
            }
            after_separator = separator;
        }

        out.with_segmentation(self.segmentation())
    }
}

/// Decompose `text` word by word with the default splitter.
pub fn segment(text: &str, units: Units, connected: bool) -> NodesSequence {
    WordSegmenter::new(units, connected).segment(text)
}
