// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic CBOR codec for the persisted change schema.
//!
//! Changes are the stable on-wire/on-disk format: consumers serialize a
//! sequence of [`Change`] values and deliver them to the interpreter. The
//! codec is the boundary where schema mismatches surface — an unknown change
//! tag or a missing mandatory field is a decode error here and never reaches
//! the interpreter as data.

use thiserror::Error;

use crate::edit::Change;

/// Errors produced while encoding a change sequence.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// CBOR serialization failed.
    #[error("cbor encode failed: {0}")]
    Cbor(#[from] ciborium::ser::Error<std::io::Error>),
}

/// Errors produced while decoding a change sequence.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// CBOR deserialization failed: truncated input, an unknown change tag,
    /// or a field violating the schema's presence rules.
    #[error("cbor decode failed: {0}")]
    Cbor(#[from] ciborium::de::Error<std::io::Error>),
}

/// Encodes an ordered change sequence as deterministic CBOR.
pub fn encode_changes(changes: &[Change]) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(changes, &mut bytes)?;
    Ok(bytes)
}

/// Decodes an ordered change sequence from CBOR bytes.
pub fn decode_changes(bytes: &[u8]) -> Result<Vec<Change>, DecodeError> {
    Ok(ciborium::from_reader(bytes)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::edit::{ConstraintEffect, InlineNode};
    use crate::ident::{make_definition_id, make_node_id, make_trait_label, DetachedSequenceId};
    use crate::place::{StablePlace, StableRange};

    #[test]
    fn change_sequences_round_trip() {
        let root = make_node_id("root");
        let label = make_trait_label("body");
        let seq = DetachedSequenceId::from_raw(1);
        let built = InlineNode::new(make_node_id("n"), make_definition_id("para"));
        let changes = vec![
            Change::build(vec![built.into()], seq),
            Change::constraint(StableRange::all(root, label), ConstraintEffect::ValidRetry),
            Change::insert(seq, StablePlace::at_start_of(root, label)),
        ];
        let bytes = encode_changes(&changes).unwrap();
        let decoded = decode_changes(&bytes).unwrap();
        assert_eq!(decoded, changes);
    }

    #[test]
    fn truncated_input_is_a_decode_error() {
        let changes = vec![Change::clear_payload(make_node_id("n"))];
        let bytes = encode_changes(&changes).unwrap();
        assert!(decode_changes(&bytes[..bytes.len() - 1]).is_err());
    }
}
