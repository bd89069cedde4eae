//! On-disk format of a trained merge table.
//!
//! A table is stored as a single `merges.json` file. Operands refer either
//! to a leaf by value or to the node created by an earlier rule by rank, so
//! the file does not depend on how node ids are numbered in memory.

use crate::pre_tokenizer::SplitPattern;
use graphtok_core::{GraphSettings, Segmentation, Units};
use serde::{Deserialize, Serialize};

/// File name used inside a model directory.
pub const MERGES_FILE: &str = "merges.json";

/// File name of the human-readable rule listing.
pub const READABLE_FILE: &str = "merges.txt";

/// Complete merge table serialization format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedMergeTable {
    /// Crate version that wrote the file
    pub version: String,
    /// Decomposer the table was trained on
    pub units: Option<Units>,
    /// Word boundary mode the table was trained on
    #[serde(default)]
    pub segmentation: Segmentation,
    /// Merge settings used in training and inference
    pub settings: GraphSettings,
    /// Pre-tokenization pattern used to segment the training texts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitPattern>,
    /// Rules in rank order
    pub merges: Vec<SerializedRule>,
}

/// A single rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedRule {
    pub rank: u32,
    pub operands: Vec<SerializedOperand>,
    #[serde(default)]
    pub count: u64,
}

/// Reference to a node inside a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializedOperand {
    /// Byte leaf
    Byte(u8),
    /// Scalar value leaf
    Char(char),
    /// Node created by the rule with this rank
    Merge(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_encoding() {
        let operands = vec![
            SerializedOperand::Byte(215),
            SerializedOperand::Char('a'),
            SerializedOperand::Merge(3),
        ];
        let json = serde_json::to_string(&operands).unwrap();
        assert_eq!(json, r#"[{"byte":215},{"char":"a"},{"merge":3}]"#);
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"{
            "version": "0.1.0",
            "units": "utf8_clusters",
            "segmentation": "disconnected",
            "settings": {"max_merge_size": 3, "only_minimal_merges": true},
            "merges": [
                {"rank": 0, "operands": [{"byte": 97}, {"byte": 98}], "count": 4}
            ]
        }"#;

        let table: SerializedMergeTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.units, Some(Units::Utf8Clusters));
        assert_eq!(table.segmentation, Segmentation::Disconnected);
        assert_eq!(table.settings, GraphSettings::bne(3).unwrap());
        assert_eq!(table.merges[0].count, 4);
        assert_eq!(table.merges[0].operands[1], SerializedOperand::Byte(98));
        assert_eq!(table.split, None);
    }

    #[test]
    fn test_split_pattern_encoding() {
        let json = serde_json::to_string(&SplitPattern::Custom(r"\d+".to_string())).unwrap();
        assert_eq!(json, r#"{"custom":"\\d+"}"#);
        assert_eq!(serde_json::to_string(&SplitPattern::Gpt).unwrap(), r#""gpt""#);
    }
}
