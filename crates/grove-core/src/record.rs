// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tree record types: per-node records and trait locations.

use im::{OrdMap, Vector};

use crate::ident::{DefinitionId, NodeId, TraitLabel};
use crate::payload::AtomPayload;

/// Materialised record for a single node stored in a snapshot.
///
/// The optional `payload` carries a typed atom interpreted by higher layers;
/// the store treats payload bytes as opaque and never decodes them.
///
/// Invariants
/// - The node identifier is not embedded here; the snapshot supplies it
///   externally.
/// - Trait lists are non-empty: an empty child list is normalized to an
///   absent entry, so two snapshots that agree on children compare equal.
/// - Trait lists contain no duplicate ids, and an id appears in at most one
///   trait across the whole snapshot (enforced by the snapshot's mutators).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Definition describing the node. Opaque to the engine.
    pub definition: DefinitionId,
    /// Named child lists, keyed by trait label.
    pub traits: OrdMap<TraitLabel, Vector<NodeId>>,
    /// Optional opaque payload owned by the node.
    pub payload: Option<AtomPayload>,
}

impl NodeRecord {
    /// Constructs a childless record with no payload.
    #[must_use]
    pub fn new(definition: DefinitionId) -> Self {
        Self {
            definition,
            traits: OrdMap::new(),
            payload: None,
        }
    }

    /// Constructs a childless record carrying `payload`.
    #[must_use]
    pub fn with_payload(definition: DefinitionId, payload: AtomPayload) -> Self {
        Self {
            definition,
            traits: OrdMap::new(),
            payload: Some(payload),
        }
    }

    /// Returns the child list under `label`, empty when the trait is absent.
    ///
    /// The returned vector shares structure with the record (O(1) clone).
    #[must_use]
    pub fn children(&self, label: &TraitLabel) -> Vector<NodeId> {
        self.traits.get(label).cloned().unwrap_or_default()
    }
}

/// Where a node sits in its parent: the containing trait.
///
/// Locations are maintained by the snapshot as a side index; records carry no
/// back-references to their parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitLocation {
    /// Parent node owning the trait.
    pub parent: NodeId,
    /// Label of the trait under the parent.
    pub label: TraitLabel,
}
