// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The persisted change model: edit-node fragments and the five change kinds.
//!
//! [`Change`] is the atomic unit of edit and the stable schema consumers
//! serialize and deliver. It is a **closed** tagged variant: the interpreter
//! dispatches with exhaustive `match`, and an unknown tag is a schema
//! mismatch surfaced by the codec, never a data-level outcome.
//!
//! [`EditNode`] describes new tree content recursively. A leaf is either an
//! inline node or a reference to a previously produced detached sequence;
//! references expand in place and *consume* the sequence (linear use).

use std::collections::BTreeMap;

use crate::ident::{DefinitionId, DetachedSequenceId, Hash, NodeId, TraitLabel};
use crate::payload::AtomPayload;
use crate::place::{StablePlace, StableRange};

/// A fragment of new tree content supplied to a Build change.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EditNode {
    /// Reference to a detached sequence; expands in place and consumes it.
    Detached(DetachedSequenceId),
    /// An inline node carrying its own children.
    Inline(Box<InlineNode>),
}

impl From<InlineNode> for EditNode {
    fn from(node: InlineNode) -> Self {
        Self::Inline(Box::new(node))
    }
}

/// Inline node content inside an [`EditNode`] tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InlineNode {
    /// Identifier the new node will carry in the snapshot.
    pub identifier: NodeId,
    /// Opaque definition of the node.
    pub definition: DefinitionId,
    /// Named child lists; children may themselves be detached references.
    pub traits: BTreeMap<TraitLabel, Vec<EditNode>>,
    /// Optional opaque payload.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub payload: Option<AtomPayload>,
}

impl InlineNode {
    /// Constructs a childless inline node with no payload.
    #[must_use]
    pub fn new(identifier: NodeId, definition: DefinitionId) -> Self {
        Self {
            identifier,
            definition,
            traits: BTreeMap::new(),
            payload: None,
        }
    }
}

/// Whether a violated constraint invalidates the edit or merely flags it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintEffect {
    /// Violation leaves the edit applied; peers may use the signal to detect
    /// a non-semantic conflict and retry.
    ValidRetry,
    /// Violation classifies the edit as invalid for this snapshot.
    InvalidRetry,
}

/// The five change kinds; the atomic unit of edit.
///
/// Optional fields are absent by omission on the wire, with one exception:
/// `SetValue.payload` is always present — `null` encodes "clear" while any
/// other value encodes "set". "No change" is represented by not emitting a
/// SetValue at all.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type")
)]
pub enum Change {
    /// Materialise new nodes as a detached sequence.
    Build {
        /// New content; detached references expand in place.
        source: Vec<EditNode>,
        /// Registry slot the resulting top-level ids are stored under.
        destination: DetachedSequenceId,
    },
    /// Splice a detached sequence into a trait, consuming it.
    Insert {
        /// Registry slot holding the sequence to insert.
        source: DetachedSequenceId,
        /// Where the sequence lands.
        destination: StablePlace,
    },
    /// Remove a contiguous sibling run, optionally keeping it for re-insertion.
    Detach {
        /// The run to remove.
        source: StableRange,
        /// Registry slot to keep the run under; omitted means the nodes are
        /// discarded permanently.
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        destination: Option<DetachedSequenceId>,
    },
    /// Assert properties about a range without mutating the view.
    Constraint {
        /// The range the assertion covers.
        to_constrain: StableRange,
        /// How a violation is classified.
        effect: ConstraintEffect,
        /// Expected number of covered siblings.
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        length: Option<usize>,
        /// Expected parent of the containing trait.
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        parent_node: Option<NodeId>,
        /// Expected label of the containing trait.
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        label: Option<TraitLabel>,
        /// Reserved: identity hash over the covered subtree. Unimplemented;
        /// presence is a producer defect and fails fast.
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        identity_hash: Option<Hash>,
        /// Reserved: content hash over the covered subtree. Unimplemented;
        /// presence is a producer defect and fails fast.
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        content_hash: Option<Hash>,
    },
    /// Set or clear one node's payload.
    SetValue {
        /// Node whose payload changes.
        node_to_modify: NodeId,
        /// `Some` sets the payload; `None` is the explicit clear sentinel.
        #[cfg_attr(feature = "serde", serde(deserialize_with = "required_payload"))]
        payload: Option<AtomPayload>,
    },
}

// Forces the field to be present on the wire; serde's implicit None-default
// for Option fields would otherwise make `{"type":"SetValue",...}` without a
// payload decode as a clear.
#[cfg(feature = "serde")]
fn required_payload<'de, D>(deserializer: D) -> Result<Option<AtomPayload>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer)
}

/// Discriminant of a [`Change`], for diagnostics and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A Build change.
    Build,
    /// An Insert change.
    Insert,
    /// A Detach change.
    Detach,
    /// A Constraint change.
    Constraint,
    /// A SetValue change.
    SetValue,
}

impl ChangeKind {
    /// Stable lowercase label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Insert => "insert",
            Self::Detach => "detach",
            Self::Constraint => "constraint",
            Self::SetValue => "set_value",
        }
    }
}

impl Change {
    /// Returns the change's discriminant.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Build { .. } => ChangeKind::Build,
            Self::Insert { .. } => ChangeKind::Insert,
            Self::Detach { .. } => ChangeKind::Detach,
            Self::Constraint { .. } => ChangeKind::Constraint,
            Self::SetValue { .. } => ChangeKind::SetValue,
        }
    }

    /// Materialise `source` as the detached sequence `destination`.
    #[must_use]
    pub fn build(source: Vec<EditNode>, destination: DetachedSequenceId) -> Self {
        Self::Build {
            source,
            destination,
        }
    }

    /// Splice the detached sequence `source` at `destination`.
    #[must_use]
    pub const fn insert(source: DetachedSequenceId, destination: StablePlace) -> Self {
        Self::Insert {
            source,
            destination,
        }
    }

    /// Remove `source` permanently.
    #[must_use]
    pub const fn delete(source: StableRange) -> Self {
        Self::Detach {
            source,
            destination: None,
        }
    }

    /// Remove `source`, keeping the run under `destination` for re-insertion.
    #[must_use]
    pub const fn detach(source: StableRange, destination: DetachedSequenceId) -> Self {
        Self::Detach {
            source,
            destination: Some(destination),
        }
    }

    /// The two-change pair the original move operation expands to: detach the
    /// run into `sequence`, then insert it at `destination`.
    #[must_use]
    pub const fn move_to(
        source: StableRange,
        destination: StablePlace,
        sequence: DetachedSequenceId,
    ) -> [Self; 2] {
        [
            Self::detach(source, sequence),
            Self::insert(sequence, destination),
        ]
    }

    /// Set the payload of `node_to_modify`.
    #[must_use]
    pub const fn set_payload(node_to_modify: NodeId, payload: AtomPayload) -> Self {
        Self::SetValue {
            node_to_modify,
            payload: Some(payload),
        }
    }

    /// Clear the payload of `node_to_modify` (the explicit-null sentinel).
    #[must_use]
    pub const fn clear_payload(node_to_modify: NodeId) -> Self {
        Self::SetValue {
            node_to_modify,
            payload: None,
        }
    }

    /// Assert nothing beyond resolvability of `to_constrain`.
    ///
    /// Callers add property assertions by filling the optional fields on the
    /// returned variant.
    #[must_use]
    pub const fn constraint(to_constrain: StableRange, effect: ConstraintEffect) -> Self {
        Self::Constraint {
            to_constrain,
            effect,
            length: None,
            parent_node: None,
            label: None,
            identity_hash: None,
            content_hash: None,
        }
    }
}
