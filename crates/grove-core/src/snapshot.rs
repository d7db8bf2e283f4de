// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable, structurally-shared tree snapshots.
//!
//! A [`Snapshot`] is the engine's unit of state: a mapping from [`NodeId`] to
//! [`NodeRecord`] plus a designated root. All mutators are copy-on-write and
//! return a new snapshot; the receiver is never modified, so a baseline can
//! be shared freely across concurrent readers while a transaction evolves its
//! own view from it.
//!
//! Persistence contract
//! - The id map, the location index, and every per-trait child list are
//!   persistent structures (`im::OrdMap` / `im::Vector`). Producing an edited
//!   snapshot is O(log n) amortised per touched node, and untouched subtrees
//!   are shared bit-for-bit with the source snapshot.
//! - `OrdMap` keys iterate in ascending `NodeId` order, so traversal is
//!   deterministic without explicit sorting.
//!
//! Location index
//! - `locations` maps every *parented* node to the trait containing it. The
//!   root and detached nodes have no entry. Records carry no back-references;
//!   parent lookup goes through the snapshot only.
//! - Mutators maintain the index incrementally; the splice helpers
//!   ([`Snapshot::detach_children`] / [`Snapshot::insert_children`]) are the
//!   only operations that re-parent existing nodes.

use blake3::Hasher;
use im::{OrdMap, Vector};

use crate::ident::{Hash, NodeId, TraitLabel};
use crate::place::{resolve_place, StablePlace};
use crate::record::{NodeRecord, TraitLocation};

/// An immutable tree: id map + root, with copy-on-write mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    root: NodeId,
    nodes: OrdMap<NodeId, NodeRecord>,
    locations: OrdMap<NodeId, TraitLocation>,
}

impl Snapshot {
    /// Creates a singleton snapshot holding only the root node.
    ///
    /// # Panics
    /// Panics if `record` already lists children: a singleton tree cannot
    /// reference nodes that are not in the id map. Use [`Snapshot::from_nodes`]
    /// to construct a multi-node baseline.
    #[must_use]
    pub fn new(root: NodeId, record: NodeRecord) -> Self {
        assert!(
            record.traits.is_empty(),
            "singleton snapshot root must be childless"
        );
        Self {
            root,
            nodes: OrdMap::unit(root, record),
            locations: OrdMap::new(),
        }
    }

    /// Builds a snapshot from a complete set of node records.
    ///
    /// The location index is derived by walking every record's trait lists.
    ///
    /// # Panics
    /// Panics when the records do not form a tree rooted at `root`: a listed
    /// child without a record, a node claimed by two traits, a child list
    /// containing the root, or a missing root record.
    #[must_use]
    pub fn from_nodes(
        root: NodeId,
        records: impl IntoIterator<Item = (NodeId, NodeRecord)>,
    ) -> Self {
        let nodes: OrdMap<NodeId, NodeRecord> = records.into_iter().collect();
        assert!(nodes.contains_key(&root), "root record missing");

        let mut locations = OrdMap::new();
        for (parent, record) in &nodes {
            for (label, children) in &record.traits {
                for child in children {
                    assert!(nodes.contains_key(child), "child record missing: {child:?}");
                    assert_ne!(*child, root, "root cannot appear in a trait");
                    let location = TraitLocation {
                        parent: *parent,
                        label: *label,
                    };
                    assert!(
                        locations.insert(*child, location).is_none(),
                        "node parented twice: {child:?}"
                    );
                }
            }
        }
        Self {
            root,
            nodes,
            locations,
        }
    }

    /// Returns the root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` when a record for `id` exists in this snapshot.
    #[must_use]
    pub fn has_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns a shared reference to the record for `id` when it exists.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    /// Number of records in the id map (parented and detached alike).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the trait containing `id`, or `None` for the root and for
    /// detached nodes.
    #[must_use]
    pub fn trait_location(&self, id: &NodeId) -> Option<&TraitLocation> {
        self.locations.get(id)
    }

    /// Returns the child list under `(parent, label)`, empty when the trait
    /// is absent or the parent does not exist.
    ///
    /// The returned vector shares structure with the snapshot (O(1) clone).
    #[must_use]
    pub fn child_list(&self, parent: &NodeId, label: &TraitLabel) -> Vector<NodeId> {
        self.nodes
            .get(parent)
            .map(|record| record.children(label))
            .unwrap_or_default()
    }

    /// Resolves a stable place to its integer offset within the containing
    /// trait, or `None` when the place does not resolve against this snapshot.
    #[must_use]
    pub fn find_index_within_trait(&self, place: &StablePlace) -> Option<usize> {
        resolve_place(self, place).map(|resolved| resolved.index)
    }

    /// Iterates over all records in ascending `NodeId` order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (&NodeId, &NodeRecord)> {
        self.nodes.iter()
    }

    /// Computes the canonical digest of this snapshot's observable state.
    ///
    /// The digest is a BLAKE3 hash over a canonical byte stream; two
    /// snapshots carry the same digest exactly when they compare equal,
    /// independently of how they were produced or how much structure they
    /// share. Peers use it to compare tree state without shipping the tree.
    ///
    /// Determinism contract
    /// - Records are visited in ascending `NodeId` order; traits within a
    ///   record in ascending label order (`OrdMap` iteration).
    /// - Encoding is fixed-size and architecture-independent: all ids are
    ///   raw 32-byte values, counts and lengths are 8-byte little-endian.
    /// - Payloads are encoded as a 1-byte presence tag (`0` = none, `1` =
    ///   present), then the payload type id, an 8-byte length, and the
    ///   exact payload bytes.
    #[must_use]
    pub fn state_digest(&self) -> Hash {
        let mut hasher = Hasher::new();
        hasher.update(self.root.as_bytes());
        for (id, record) in &self.nodes {
            hasher.update(id.as_bytes());
            hasher.update(record.definition.as_bytes());
            hasher.update(&(record.traits.len() as u64).to_le_bytes());
            for (label, children) in &record.traits {
                hasher.update(label.as_bytes());
                hasher.update(&(children.len() as u64).to_le_bytes());
                for child in children {
                    hasher.update(child.as_bytes());
                }
            }
            match &record.payload {
                None => {
                    hasher.update(&[0u8]);
                }
                Some(payload) => {
                    hasher.update(&[1u8]);
                    hasher.update(payload.type_id.as_bytes());
                    hasher.update(&(payload.bytes.len() as u64).to_le_bytes());
                    hasher.update(&payload.bytes);
                }
            }
        }
        hasher.finalize().into()
    }

    /// Returns a snapshot with `records` added to the id map.
    ///
    /// Children listed by the inserted records are parented under them: each
    /// such child must either be part of the batch or already exist in this
    /// snapshot without a parent (a detached node being re-parented).
    /// Top-level inserted nodes (those no batch record lists) stay detached.
    ///
    /// # Panics
    /// Panics when an inserted id is already present, when a listed child is
    /// unknown, or when a child would end up with two parents.
    #[must_use]
    pub fn insert_nodes(&self, records: Vec<(NodeId, NodeRecord)>) -> Self {
        let mut nodes = self.nodes.clone();
        let mut locations = self.locations.clone();

        for (id, record) in &records {
            assert!(
                nodes.insert(*id, record.clone()).is_none(),
                "node already present: {id:?}"
            );
        }
        for (parent, record) in &records {
            for (label, children) in &record.traits {
                for child in children {
                    assert!(nodes.contains_key(child), "child record missing: {child:?}");
                    let location = TraitLocation {
                        parent: *parent,
                        label: *label,
                    };
                    assert!(
                        locations.insert(*child, location).is_none(),
                        "node parented twice: {child:?}"
                    );
                }
            }
        }
        Self {
            root: self.root,
            nodes,
            locations,
        }
    }

    /// Returns a snapshot with the records for `ids` removed.
    ///
    /// Children still listed by a removed record lose their location entry
    /// (they become detached); their own records are *not* removed.
    ///
    /// # Panics
    /// Panics when an id still has a parent; detach the run first.
    #[must_use]
    pub fn delete_nodes(&self, ids: &[NodeId]) -> Self {
        let mut nodes = self.nodes.clone();
        let mut locations = self.locations.clone();

        for id in ids {
            assert!(
                !locations.contains_key(id),
                "cannot delete a parented node: {id:?}"
            );
            let Some(record) = nodes.remove(id) else {
                debug_assert!(false, "node record missing: {id:?}");
                continue;
            };
            for children in record.traits.values() {
                for child in children {
                    locations.remove(child);
                }
            }
        }
        Self {
            root: self.root,
            nodes,
            locations,
        }
    }

    /// Returns a snapshot with the record for `id` replaced by `record`.
    ///
    /// This operation exists for payload edits; the replacement must list the
    /// same trait structure as the record it replaces, so the location index
    /// stays untouched.
    #[must_use]
    pub fn replace_node_data(&self, id: NodeId, record: NodeRecord) -> Self {
        let Some(previous) = self.nodes.get(&id) else {
            debug_assert!(false, "node record missing: {id:?}");
            return self.clone();
        };
        debug_assert!(
            previous.traits == record.traits,
            "replace_node_data must not alter trait structure: {id:?}"
        );
        let mut nodes = self.nodes.clone();
        nodes.insert(id, record);
        Self {
            root: self.root,
            nodes,
            locations: self.locations.clone(),
        }
    }

    /// Removes the children at `[start, end)` of the located trait.
    ///
    /// Returns the residual snapshot and the removed ids in trait order. The
    /// removed nodes keep their records and become detached.
    pub(crate) fn detach_children(
        &self,
        location: &TraitLocation,
        start: usize,
        end: usize,
    ) -> (Self, Vec<NodeId>) {
        let Some(parent) = self.nodes.get(&location.parent) else {
            debug_assert!(false, "trait parent missing: {:?}", location.parent);
            return (self.clone(), Vec::new());
        };
        let mut list = parent.children(&location.label);
        assert!(
            start <= end && end <= list.len(),
            "detach span out of bounds"
        );

        let right = list.split_off(end);
        let removed_run = list.split_off(start);
        list.append(right);

        let mut record = parent.clone();
        if list.is_empty() {
            record.traits.remove(&location.label);
        } else {
            record.traits.insert(location.label, list);
        }

        let mut nodes = self.nodes.clone();
        nodes.insert(location.parent, record);
        let removed: Vec<NodeId> = removed_run.iter().copied().collect();
        let mut locations = self.locations.clone();
        for id in &removed {
            locations.remove(id);
        }
        (
            Self {
                root: self.root,
                nodes,
                locations,
            },
            removed,
        )
    }

    /// Splices `ids` into the located trait at `index`, re-parenting them.
    ///
    /// Every id must already have a record in this snapshot and must be
    /// detached (no current parent).
    pub(crate) fn insert_children(
        &self,
        location: &TraitLocation,
        index: usize,
        ids: &[NodeId],
    ) -> Self {
        let Some(parent) = self.nodes.get(&location.parent) else {
            debug_assert!(false, "trait parent missing: {:?}", location.parent);
            return self.clone();
        };
        let mut list = parent.children(&location.label);
        assert!(index <= list.len(), "insert index out of bounds");

        let right = list.split_off(index);
        for id in ids {
            debug_assert!(
                self.nodes.contains_key(id),
                "spliced id has no record: {id:?}"
            );
            list.push_back(*id);
        }
        list.append(right);

        let mut record = parent.clone();
        record.traits.insert(location.label, list);

        let mut nodes = self.nodes.clone();
        nodes.insert(location.parent, record);
        let mut locations = self.locations.clone();
        for id in ids {
            assert!(
                locations.insert(*id, *location).is_none(),
                "node parented twice: {id:?}"
            );
        }
        Self {
            root: self.root,
            nodes,
            locations,
        }
    }
}
