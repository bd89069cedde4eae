//! Byte-level decomposition.
//!
//! [`utf8`] makes every byte its own unit. [`utf8_clusters`] keeps the bytes
//! of each extended grapheme cluster together: bytes inside a cluster are
//! linked by [`Joint::Cluster`], clusters by [`Joint::Connected`].

use crate::core::node::NodeId;
use crate::core::sequence::{Joint, NodesSequence};
use crate::units::Units;
use unicode_segmentation::UnicodeSegmentation;

/// One leaf per UTF-8 byte.
pub fn utf8(text: &str) -> NodesSequence {
    utf8_bytes(text.as_bytes())
}

/// One leaf per byte of arbitrary input.
pub(crate) fn utf8_bytes(bytes: &[u8]) -> NodesSequence {
    let mut seq = NodesSequence::with_capacity(Units::Utf8, bytes.len());
    for &b in bytes {
        seq.push(NodeId::from_byte(b), Joint::Connected);
    }
    seq
}

/// One group of byte leaves per extended grapheme cluster.
pub fn utf8_clusters(text: &str) -> NodesSequence {
    let mut seq = NodesSequence::with_capacity(Units::Utf8Clusters, text.len());

    for cluster in text.graphemes(true) {
        let mut joint = Joint::Connected;
        for &b in cluster.as_bytes() {
            seq.push(NodeId::from_byte(b), joint);
            joint = Joint::Cluster;
        }
    }

    seq
}
