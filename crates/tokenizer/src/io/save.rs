//! Saving trained merge tables.

use super::format::{
    SerializedMergeTable, SerializedOperand, SerializedRule, MERGES_FILE, READABLE_FILE,
};
use crate::pre_tokenizer::SplitPattern;
use ahash::AHashMap;
use graphtok_core::{Leaf, MergeTable, NodeId, Result, TokenizerError};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Merge table saver.
pub struct MergeTableSaver<'a> {
    table: &'a MergeTable,
    split: Option<&'a SplitPattern>,
}

impl<'a> MergeTableSaver<'a> {
    pub fn new(table: &'a MergeTable) -> Self {
        Self { table, split: None }
    }

    /// Also record the pre-tokenization pattern the table was trained with.
    pub fn with_split(mut self, split: &'a SplitPattern) -> Self {
        self.split = Some(split);
        self
    }

    /// Save the table as `merges.json` inside `path`, creating the directory
    /// if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        create_dir(path)?;

        let file_path = path.join(MERGES_FILE);
        let file = File::create(&file_path).map_err(|err| TokenizerError::Io {
            path: file_path.clone(),
            err,
        })?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.serialize()?)
            .map_err(|e| TokenizerError::Save(format!("Failed to serialize merges: {}", e)))?;

        debug!("saved {} rules to {}", self.table.len(), file_path.display());
        Ok(())
    }

    /// Write one line per rule, `operand operand -> merged`, for inspection.
    ///
    /// Tokens are rendered lossily and escaped; the file cannot be loaded.
    pub fn save_readable(&self, path: &Path) -> Result<()> {
        create_dir(path)?;

        let file_path = path.join(READABLE_FILE);
        let io_err = |err| TokenizerError::Io {
            path: file_path.clone(),
            err,
        };
        let mut writer = BufWriter::new(File::create(&file_path).map_err(io_err)?);

        for (operands, merged) in self.table.readable() {
            let operands: Vec<String> = operands
                .iter()
                .map(|s| s.escape_debug().to_string())
                .collect();
            writeln!(writer, "{} -> {}", operands.join(" "), merged.escape_debug())
                .map_err(io_err)?;
        }
        writer.flush().map_err(io_err)
    }

    /// Convert the table to its serialized form.
    ///
    /// Fails with [`TokenizerError::Save`] if an operand is a composite that
    /// no rule of the table produced.
    pub fn serialize(&self) -> Result<SerializedMergeTable> {
        let ranks: AHashMap<NodeId, u32> = self
            .table
            .rules()
            .iter()
            .map(|rule| (rule.merged, rule.rank))
            .collect();

        let operand = |node: NodeId| match node.leaf() {
            Some(Leaf::Byte(b)) => Ok(SerializedOperand::Byte(b)),
            Some(Leaf::Char(c)) => Ok(SerializedOperand::Char(c)),
            None => ranks
                .get(&node)
                .map(|&rank| SerializedOperand::Merge(rank))
                .ok_or_else(|| {
                    TokenizerError::Save(format!("node {} has no rule in this table", node))
                }),
        };

        let merges = self
            .table
            .rules()
            .iter()
            .map(|rule| -> Result<SerializedRule> {
                Ok(SerializedRule {
                    rank: rule.rank,
                    operands: rule
                        .operands
                        .iter()
                        .map(|&node| operand(node))
                        .collect::<Result<_>>()?,
                    count: rule.count,
                })
            })
            .collect::<Result<_>>()?;

        Ok(SerializedMergeTable {
            version: env!("CARGO_PKG_VERSION").to_string(),
            units: self.table.units(),
            segmentation: self.table.segmentation(),
            settings: self.table.settings(),
            split: self.split.cloned(),
            merges,
        })
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|err| TokenizerError::Io {
        path: path.to_path_buf(),
        err,
    })
}
