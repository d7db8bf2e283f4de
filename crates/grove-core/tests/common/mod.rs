// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use bytes::Bytes;
use im::Vector;

use grove_core::{
    make_definition_id, make_node_id, make_payload_type_id, make_trait_label, AtomPayload,
    DefinitionId, DetachedSequenceId, InlineNode, NodeId, NodeRecord, Snapshot, TraitLabel,
};

/// Definition used for document roots in tests.
pub fn doc_def() -> DefinitionId {
    make_definition_id("test/doc")
}

/// Definition used for ordinary child nodes in tests.
pub fn para_def() -> DefinitionId {
    make_definition_id("test/para")
}

/// Shorthand for a numbered detached-sequence slot.
pub fn seq(slot: u64) -> DetachedSequenceId {
    DetachedSequenceId::from_raw(slot)
}

/// A small typed payload carrying `text` bytes.
pub fn atom(text: &str) -> AtomPayload {
    AtomPayload::new(
        make_payload_type_id("test/text"),
        Bytes::copy_from_slice(text.as_bytes()),
    )
}

/// A childless inline build node named `name`.
pub fn inline(name: &str) -> InlineNode {
    InlineNode::new(make_node_id(name), para_def())
}

/// Baseline with a root and an (empty, hence absent) `body` trait.
pub fn empty_root_baseline() -> (Snapshot, NodeId, TraitLabel) {
    let root = make_node_id("root");
    let label = make_trait_label("body");
    (Snapshot::new(root, NodeRecord::new(doc_def())), root, label)
}

/// Baseline with `count` children `kid-0 .. kid-(count-1)` under the root's
/// `body` trait. Returns the child ids in trait order.
pub fn sibling_baseline(count: usize) -> (Snapshot, NodeId, TraitLabel, Vec<NodeId>) {
    let root = make_node_id("root");
    let label = make_trait_label("body");
    let kids: Vec<NodeId> = (0..count)
        .map(|i| make_node_id(&format!("kid-{i}")))
        .collect();

    let mut root_record = NodeRecord::new(doc_def());
    if !kids.is_empty() {
        root_record
            .traits
            .insert(label, Vector::from_iter(kids.iter().copied()));
    }
    let mut records = vec![(root, root_record)];
    records.extend(kids.iter().map(|id| (*id, NodeRecord::new(para_def()))));
    (Snapshot::from_nodes(root, records), root, label, kids)
}

/// Children of `(parent, label)` as a plain vector, for assertions.
pub fn children_of(snapshot: &Snapshot, parent: &NodeId, label: &TraitLabel) -> Vec<NodeId> {
    snapshot.child_list(parent, label).iter().copied().collect()
}
