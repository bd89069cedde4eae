//! Character-level decomposition.

use crate::core::node::NodeId;
use crate::core::sequence::{Joint, NodesSequence};
use crate::units::Units;

/// One leaf per Unicode scalar value, all joined by connected joints.
pub fn characters(text: &str) -> NodesSequence {
    let mut seq = NodesSequence::with_capacity(Units::Characters, text.len());
    for ch in text.chars() {
        seq.push(NodeId::from_char(ch), Joint::Connected);
    }
    seq
}
