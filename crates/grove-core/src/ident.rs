// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use blake3::Hasher;

/// Canonical 256-bit hash used throughout the engine for addressing nodes,
/// definitions, trait labels, and payload types.
pub type Hash = [u8; 32];

/// Strongly typed identifier for a node in the document tree.
///
/// `NodeId` is an opaque 32-byte identifier (`Hash`). Many nodes in Grove use
/// stable, label-derived ids via [`make_node_id`] (`blake3("node:" || label)`),
/// but this is a convention, not a global constraint: collaborating hosts may
/// mint ids from session-scoped counters or UUID material, as long as ids are
/// unique within a snapshot.
///
/// Tooling must not assume that every `NodeId` corresponds to a human-readable
/// label, or that ids are reversible back into strings.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub Hash);

impl NodeId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Strongly typed identifier for the definition (logical kind) of a node.
///
/// `DefinitionId` values are produced by [`make_definition_id`] which hashes a
/// label; using a dedicated wrapper prevents accidental mixing of node and
/// definition identifiers. The engine treats definitions as opaque: it copies
/// them through builds and never interprets them.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefinitionId(pub Hash);

impl DefinitionId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

/// Identifier for a named child list (a *trait*) under a parent node.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraitLabel(pub Hash);

impl TraitLabel {
    /// Returns the canonical byte representation of this label.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

/// Strongly typed identifier for the logical type of an opaque payload atom.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PayloadTypeId(pub Hash);

impl PayloadTypeId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

/// Produces a stable, domain‑separated node identifier (prefix `b"node:"`) using BLAKE3.
pub fn make_node_id(label: &str) -> NodeId {
    let mut hasher = Hasher::new();
    hasher.update(b"node:");
    hasher.update(label.as_bytes());
    NodeId(hasher.finalize().into())
}

/// Produces a stable, domain‑separated definition identifier (prefix `b"def:"`) using BLAKE3.
pub fn make_definition_id(label: &str) -> DefinitionId {
    let mut hasher = Hasher::new();
    hasher.update(b"def:");
    hasher.update(label.as_bytes());
    DefinitionId(hasher.finalize().into())
}

/// Produces a stable, domain‑separated trait label (prefix `b"trait:"`) using BLAKE3.
pub fn make_trait_label(label: &str) -> TraitLabel {
    let mut hasher = Hasher::new();
    hasher.update(b"trait:");
    hasher.update(label.as_bytes());
    TraitLabel(hasher.finalize().into())
}

/// Produces a stable, domain-separated payload type identifier (prefix `b"payload:"`) using BLAKE3.
pub fn make_payload_type_id(label: &str) -> PayloadTypeId {
    let mut hasher = Hasher::new();
    hasher.update(b"payload:");
    hasher.update(label.as_bytes());
    PayloadTypeId(hasher.finalize().into())
}

/// Thin wrapper around a detached-sequence identifier.
///
/// A detached sequence is an ordered run of nodes that has been built or
/// detached inside a transaction but not yet re-inserted. The producer of an
/// edit allocates these ids; the engine only requires that they are unique
/// within one edit. External bindings may construct values for interop using
/// [`DetachedSequenceId::from_raw`].
///
/// # Invariants
/// - A `DetachedSequenceId` names a slot in one transaction's private
///   registry; it is never meaningful across transactions.
/// - The registry enforces linear use: a slot is written at most once and
///   consumed at most once. Violations classify the whole edit as malformed.
///
/// The `#[repr(transparent)]` attribute ensures the wrapper has the same
/// memory layout as `u64` across FFI/Wasm boundaries.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetachedSequenceId(u64);

impl DetachedSequenceId {
    /// Constructs a `DetachedSequenceId` from a raw `u64` value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for DetachedSequenceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_separation_prevents_cross_type_collisions() {
        let lbl = "foo";
        let n = make_node_id(lbl).0;
        let d = make_definition_id(lbl).0;
        let t = make_trait_label(lbl).0;
        let p = make_payload_type_id(lbl).0;
        assert_ne!(n, d);
        assert_ne!(n, t);
        assert_ne!(n, p);
        assert_ne!(d, t);
        assert_ne!(d, p);
        assert_ne!(t, p);
    }

    #[test]
    fn detached_sequence_id_round_trips_raw_value() {
        let id = DetachedSequenceId::from_raw(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
    }
}
