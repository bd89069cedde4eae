//! Text splitting for pre-tokenization.
//!
//! A [`Splitter`] cuts text into contiguous pieces that cover it exactly, so
//! concatenating the pieces always gives back the input. The default is the
//! GPT-style pattern used by recent open-weight models.

use graphtok_core::{Result, TokenizerError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// GPT-style pre-tokenization pattern.
///
/// The usual `\s+(?!\S)` alternative needs look-ahead, which `regex` does
/// not support; [`Splitter::split`] trims whitespace runs instead.
pub const GPT_PATTERN: &str = concat!(
    r"[^\r\n\p{L}\p{N}]?[\p{Lu}\p{Lt}\p{Lm}\p{Lo}\p{M}]*[\p{Ll}\p{Lm}\p{Lo}\p{M}]+(?i:'s|'t|'re|'ve|'m|'ll|'d)?",
    r"|[^\r\n\p{L}\p{N}]?[\p{Lu}\p{Lt}\p{Lm}\p{Lo}\p{M}]+[\p{Ll}\p{Lm}\p{Lo}\p{M}]*(?i:'s|'t|'re|'ve|'m|'ll|'d)?",
    r"|\p{N}{1,3}",
    r"| ?[^\s\p{L}\p{N}]+[\r\n/]*",
    r"|\s*[\r\n]+",
    r"|\s+",
);

fn gpt_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GPT_PATTERN).expect("Invalid regex pattern"))
}

/// Splitting patterns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPattern {
    /// No splitting (keep text as-is)
    NoSplit,
    /// Alternate runs of whitespace and non-whitespace
    Whitespace,
    /// One piece per character
    Character,
    /// GPT-style letters / digits / punctuation / whitespace classes
    #[default]
    Gpt,
    /// Custom regex; matches become pieces, gaps between them too
    Custom(String),
}

/// Text splitter for pre-tokenization.
#[derive(Debug, Clone)]
pub struct Splitter {
    pattern: SplitPattern,
    regex: Option<Regex>,
}

impl Splitter {
    /// Create a new splitter.
    ///
    /// Fails with [`TokenizerError::InvalidConfig`] if a custom pattern does
    /// not compile.
    pub fn new(pattern: SplitPattern) -> Result<Self> {
        let regex = match &pattern {
            SplitPattern::Gpt => Some(gpt_regex().clone()),
            SplitPattern::Custom(custom) => Some(Regex::new(custom).map_err(|e| {
                TokenizerError::InvalidConfig(format!("invalid split pattern {:?}: {}", custom, e))
            })?),
            _ => None,
        };
        Ok(Self { pattern, regex })
    }

    /// Create a GPT-style splitter.
    pub fn gpt() -> Self {
        Self {
            pattern: SplitPattern::Gpt,
            regex: Some(gpt_regex().clone()),
        }
    }

    /// Create a whitespace splitter.
    pub fn whitespace() -> Self {
        Self {
            pattern: SplitPattern::Whitespace,
            regex: None,
        }
    }

    /// Create a character-level splitter.
    pub fn character() -> Self {
        Self {
            pattern: SplitPattern::Character,
            regex: None,
        }
    }

    /// Create a splitter that keeps the text whole.
    pub fn no_split() -> Self {
        Self {
            pattern: SplitPattern::NoSplit,
            regex: None,
        }
    }

    /// The pattern in use.
    pub fn pattern(&self) -> &SplitPattern {
        &self.pattern
    }

    /// Split text into contiguous pieces.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }

        match (&self.pattern, &self.regex) {
            (SplitPattern::NoSplit, _) => vec![text],
            (SplitPattern::Whitespace, _) => split_whitespace_runs(text),
            (SplitPattern::Character, _) => text
                .char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect(),
            (SplitPattern::Gpt, Some(re)) => cover(text, gpt_spans(re, text)),
            (SplitPattern::Custom(_), Some(re)) => {
                cover(text, re.find_iter(text).map(|m| (m.start(), m.end())))
            }
            _ => vec![text],
        }
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::gpt()
    }
}

fn split_whitespace_runs(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.map_or(false, |prev| prev != space) {
            pieces.push(&text[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    pieces.push(&text[start..]);
    pieces
}

/// Matches of the GPT pattern, with a whitespace run that precedes a
/// non-space character giving its last character to the next piece.
fn gpt_spans(re: &Regex, text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(m) = re.find_at(text, pos) {
        let (start, mut end) = (m.start(), m.end());
        if start == end {
            pos = end + text[end..].chars().next().map_or(1, char::len_utf8);
            continue;
        }

        let piece = &text[start..end];
        let trimmable = piece.chars().all(char::is_whitespace)
            && !piece.ends_with(|c: char| c == '\r' || c == '\n')
            && text[end..].chars().next().map_or(false, |c| !c.is_whitespace());
        if trimmable {
            if let Some((last, _)) = piece.char_indices().last() {
                if last > 0 {
                    end = start + last;
                }
            }
        }

        spans.push((start, end));
        pos = end;
        if pos >= text.len() {
            break;
        }
    }

    spans
}

/// Turn match spans into pieces covering all of `text`.
fn cover(text: &str, spans: impl IntoIterator<Item = (usize, usize)>) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut pos = 0;

    for (start, end) in spans {
        if start == end {
            continue;
        }
        if start > pos {
            pieces.push(&text[pos..start]);
        }
        pieces.push(&text[start..end]);
        pos = end;
    }
    if pos < text.len() {
        pieces.push(&text[pos..]);
    }

    pieces
}
