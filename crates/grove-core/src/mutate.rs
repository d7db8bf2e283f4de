// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure snapshot transformations: range detach and place splice.
//!
//! These primitives never classify errors; they return `None` when the place
//! or range does not resolve, and leave classification to the caller (the
//! transaction interpreter validates first and maps failures to edit
//! outcomes).

use crate::ident::NodeId;
use crate::place::{range_from_stable_range, resolve_place, StablePlace, StableRange};
use crate::snapshot::Snapshot;

/// Removes the contiguous run covered by `range` from its trait.
///
/// Returns the residual snapshot and the removed ids in trait order. The
/// removed nodes keep their records in the id map (detachment does not
/// delete), so a later splice can re-parent them.
#[must_use]
pub fn detach_range(snapshot: &Snapshot, range: &StableRange) -> Option<(Snapshot, Vec<NodeId>)> {
    let resolved = range_from_stable_range(snapshot, range)?;
    Some(snapshot.detach_children(&resolved.location, resolved.start_index, resolved.end_index))
}

/// Splices `ids` into the trait at the position resolved from `place`.
///
/// The spliced nodes must be detached (present in the id map, no parent);
/// they are re-parented under the place's trait, preserving order.
#[must_use]
pub fn insert_into_trait(
    snapshot: &Snapshot,
    ids: &[NodeId],
    place: &StablePlace,
) -> Option<Snapshot> {
    let resolved = resolve_place(snapshot, place)?;
    Some(snapshot.insert_children(&resolved.location, resolved.index, ids))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ident::{make_definition_id, make_node_id, make_trait_label, TraitLabel};
    use crate::record::NodeRecord;
    use im::Vector;

    fn baseline() -> (Snapshot, NodeId, TraitLabel, [NodeId; 3]) {
        let root = make_node_id("root");
        let label = make_trait_label("body");
        let kids = [make_node_id("a"), make_node_id("b"), make_node_id("c")];
        let mut root_record = NodeRecord::new(make_definition_id("doc"));
        root_record.traits.insert(label, Vector::from_iter(kids));
        let mut records = vec![(root, root_record)];
        records.extend(kids.map(|id| (id, NodeRecord::new(make_definition_id("para")))));
        (Snapshot::from_nodes(root, records), root, label, kids)
    }

    #[test]
    fn detach_then_insert_moves_a_sibling() {
        let (snapshot, root, label, kids) = baseline();
        let (residual, ids) = detach_range(&snapshot, &StableRange::only(kids[1])).unwrap();
        assert_eq!(ids, vec![kids[1]]);
        let moved = insert_into_trait(&residual, &ids, &StablePlace::after(kids[2])).unwrap();
        let order: Vec<NodeId> = moved.child_list(&root, &label).iter().copied().collect();
        assert_eq!(order, vec![kids[0], kids[2], kids[1]]);
    }

    #[test]
    fn unresolvable_range_detaches_nothing() {
        let (snapshot, _, _, _) = baseline();
        let ghost = make_node_id("ghost");
        assert!(detach_range(&snapshot, &StableRange::only(ghost)).is_none());
    }
}
