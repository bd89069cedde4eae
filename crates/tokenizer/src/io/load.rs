//! Loading trained merge tables.

use super::format::{SerializedMergeTable, SerializedOperand, MERGES_FILE};
use graphtok_core::{GraphSettings, Leaf, MergeTable, NodeId, Result, TokenizerError};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Merge table loader.
pub struct MergeTableLoader;

impl MergeTableLoader {
    /// Load a table from `merges.json` inside `path`.
    pub fn load(path: &Path) -> Result<MergeTable> {
        let table = Self::from_serialized(Self::read(path)?)?;
        debug!("loaded {} rules from {}", table.len(), path.display());
        Ok(table)
    }

    /// Read `merges.json` inside `path` without rebuilding the table.
    pub fn read(path: &Path) -> Result<SerializedMergeTable> {
        let file_path = path.join(MERGES_FILE);
        let file = File::open(&file_path).map_err(|err| TokenizerError::Io {
            path: file_path.clone(),
            err,
        })?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| TokenizerError::Load(format!("Failed to deserialize merges: {}", e)))
    }

    /// Rebuild a table from its serialized form.
    ///
    /// Settings are validated again, and rules are replayed in rank order;
    /// an operand referring to its own or a later rank is rejected.
    pub fn from_serialized(data: SerializedMergeTable) -> Result<MergeTable> {
        let settings = GraphSettings::new(
            data.settings.max_merge_size(),
            data.settings.only_minimal_merges(),
        )?;
        let mut table = MergeTable::new(settings, data.units, data.segmentation);
        let mut operands = Vec::new();

        for (index, rule) in data.merges.iter().enumerate() {
            if rule.rank as usize != index {
                return Err(TokenizerError::InvalidMerge(format!(
                    "rule at position {} has rank {}",
                    index, rule.rank
                )));
            }

            operands.clear();
            for operand in &rule.operands {
                operands.push(Self::resolve(&table, rule.rank, *operand)?);
            }
            table.push_rule(&operands, rule.count)?;
        }

        Ok(table)
    }

    fn resolve(table: &MergeTable, rank: u32, operand: SerializedOperand) -> Result<NodeId> {
        match operand {
            SerializedOperand::Byte(b) => Ok(Leaf::Byte(b).id()),
            SerializedOperand::Char(c) => Ok(Leaf::Char(c).id()),
            SerializedOperand::Merge(earlier) if earlier < rank => table
                .get(earlier)
                .map(|rule| rule.merged)
                .ok_or_else(|| {
                    TokenizerError::InvalidMerge(format!("unknown merge {}", earlier))
                }),
            SerializedOperand::Merge(later) => Err(TokenizerError::InvalidMerge(format!(
                "rule {} refers to merge {}, which is not learned yet",
                rank, later
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::format::SerializedRule;
    use crate::io::save::MergeTableSaver;
    use graphtok_core::{characters, Segmentation, Units};

    fn sample_table() -> MergeTable {
        let mut table = MergeTable::new(
            GraphSettings::bpe(),
            Some(Units::Characters),
            Segmentation::Disconnected,
        );
        let lo = table
            .push_rule(&[NodeId::from_char('l'), NodeId::from_char('o')], 5)
            .unwrap();
        table.push_rule(&[lo, NodeId::from_char('w')], 2).unwrap();
        table
            .push_rule(&[NodeId::from_char('e'), NodeId::from_char('r')], 1)
            .unwrap();
        table
    }

    #[test]
    fn test_load_roundtrip() {
        let temp_dir = std::env::temp_dir().join("graphtok_test_load");
        let table = sample_table();

        MergeTableSaver::new(&table).save(&temp_dir).unwrap();
        let loaded = MergeTableLoader::load(&temp_dir).unwrap();

        assert_eq!(loaded.rules(), table.rules());
        assert_eq!(loaded.settings(), table.settings());
        assert_eq!(loaded.units(), table.units());
        assert_eq!(loaded.segmentation(), table.segmentation());

        let input = characters("lower").with_segmentation(Segmentation::Disconnected);
        assert_eq!(loaded.apply(&input).unwrap(), table.apply(&input).unwrap());

        std::fs::remove_dir_all(temp_dir).ok();
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let mut data = MergeTableSaver::new(&sample_table()).serialize().unwrap();
        data.merges[1].operands[0] = SerializedOperand::Merge(2);

        assert!(matches!(
            MergeTableLoader::from_serialized(data),
            Err(TokenizerError::InvalidMerge(_))
        ));
    }

    #[test]
    fn test_rank_gap_is_rejected() {
        let mut data = MergeTableSaver::new(&sample_table()).serialize().unwrap();
        data.merges.remove(0);
        data.merges.push(SerializedRule {
            rank: 7,
            operands: vec![SerializedOperand::Char('x'), SerializedOperand::Char('y')],
            count: 1,
        });

        assert!(matches!(
            MergeTableLoader::from_serialized(data),
            Err(TokenizerError::InvalidMerge(_))
        ));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut data = MergeTableSaver::new(&sample_table()).serialize().unwrap();
        let json = serde_json::to_string(&data).unwrap().replace(
            r#""max_merge_size":null"#,
            r#""max_merge_size":1"#,
        );
        data = serde_json::from_str(&json).unwrap();

        assert!(matches!(
            MergeTableLoader::from_serialized(data),
            Err(TokenizerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = std::env::temp_dir().join("graphtok_test_missing");
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(
            MergeTableLoader::load(&dir),
            Err(TokenizerError::Io { .. })
        ));
    }

    #[test]
    fn test_malformed_file() {
        let dir = std::env::temp_dir().join("graphtok_test_malformed");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MERGES_FILE), "{ not json").unwrap();

        assert!(matches!(
            MergeTableLoader::load(&dir),
            Err(TokenizerError::Load(_))
        ));

        std::fs::remove_dir_all(dir).ok();
    }
}
