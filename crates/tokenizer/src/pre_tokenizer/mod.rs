//! Pre-tokenization pipeline.
//!
//! Text is split into pieces before decomposition, and the pieces are
//! joined back into one node sequence with tagged word boundaries.

pub mod split;
pub mod words;

pub use split::{SplitPattern, Splitter, GPT_PATTERN};
pub use words::{segment, WordSegmenter};
