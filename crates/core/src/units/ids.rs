//! Ideographic description sequences.
//!
//! An IDS describes a CJK character as a prefix expression: an ideographic
//! description character (U+2FF0..U+2FFB) followed by its two or three
//! components, each a radical or another IDS. `⿰木木` is 林.
//!
//! [`Ids::parse`] builds the expression tree and [`Ids::to_tree`] turns it
//! into a [`Tree`] of character leaves for training and inference.

use crate::core::node::NodeId;
use crate::core::tree::Tree;
use crate::error::{Result, TokenizerError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Description characters with two components.
pub const BINARY_IDCS: [char; 10] = [
    '⿰', '⿱', '⿴', '⿵', '⿶', '⿷', '⿸', '⿹', '⿺', '⿻',
];

/// Description characters with three components.
pub const TERNARY_IDCS: [char; 2] = ['⿲', '⿳'];

/// Number of components `ch` takes, or `None` for a radical.
pub fn idc_arity(ch: char) -> Option<usize> {
    if BINARY_IDCS.contains(&ch) {
        Some(2)
    } else if TERNARY_IDCS.contains(&ch) {
        Some(3)
    } else {
        None
    }
}

/// A parsed description sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ids {
    Radical { value: char },
    Template { value: char, children: Vec<Ids> },
}

impl Ids {
    /// Parse a complete sequence.
    ///
    /// Fails with [`TokenizerError::InvalidInput`] on an empty string, a
    /// template missing components, or trailing characters.
    pub fn parse(ids: &str) -> Result<Self> {
        if ids.is_empty() {
            return Err(TokenizerError::InvalidInput("empty IDS".to_string()));
        }

        let mut chars = ids.chars();
        let tree = Self::parse_node(&mut chars, ids)?;
        let rest = chars.as_str();
        if !rest.is_empty() {
            return Err(TokenizerError::InvalidInput(format!(
                "extra characters after IDS {:?}: {:?}",
                ids, rest
            )));
        }
        Ok(tree)
    }

    fn parse_node(chars: &mut std::str::Chars<'_>, ids: &str) -> Result<Self> {
        let value = chars.next().ok_or_else(|| {
            TokenizerError::InvalidInput(format!("unexpected end of IDS {:?}", ids))
        })?;

        match idc_arity(value) {
            Some(arity) => {
                let children = (0..arity)
                    .map(|_| Self::parse_node(chars, ids))
                    .collect::<Result<_>>()?;
                Ok(Ids::Template { value, children })
            }
            None => Ok(Ids::Radical { value }),
        }
    }

    /// The description character or radical at the top.
    pub fn value(&self) -> char {
        match self {
            Ids::Radical { value } | Ids::Template { value, .. } => *value,
        }
    }

    pub fn children(&self) -> &[Ids] {
        match self {
            Ids::Radical { .. } => &[],
            Ids::Template { children, .. } => children,
        }
    }

    #[inline]
    pub fn is_radical(&self) -> bool {
        matches!(self, Ids::Radical { .. })
    }

    /// Mergeable tree with one character leaf per description character
    /// and radical.
    pub fn to_tree(&self) -> Tree {
        match self {
            Ids::Radical { value } => Tree::Node(NodeId::from_char(*value)),
            Ids::Template { value, children } => Tree::Template {
                root: NodeId::from_char(*value),
                children: children.iter().map(Ids::to_tree).collect(),
            },
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, prefix: &str, last: bool) -> fmt::Result {
        let connector = if last { "└── " } else { "├── " };
        match self {
            Ids::Radical { value } => writeln!(f, "{}{}Radical: {}", prefix, connector, value),
            Ids::Template { value, children } => {
                writeln!(f, "{}{}Template: {}", prefix, connector, value)?;
                let prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                for (i, child) in children.iter().enumerate() {
                    child.render(f, &prefix, i + 1 == children.len())?;
                }
                Ok(())
            }
        }
    }
}

/// Renders the tree one node per line with box-drawing branches.
impl fmt::Display for Ids {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, "", true)
    }
}

impl FromStr for Ids {
    type Err = TokenizerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse `ids` straight into a mergeable tree.
pub fn ids_tree(ids: &str) -> Result<Tree> {
    Ids::parse(ids).map(|parsed| parsed.to_tree())
}
