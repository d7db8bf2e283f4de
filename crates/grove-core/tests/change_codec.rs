// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use bytes::Bytes;
use ciborium::value::Value;

use grove_core::{
    decode_changes, encode_changes, make_definition_id, make_node_id, make_payload_type_id,
    make_trait_label, AtomPayload, Change, ConstraintEffect, DetachedSequenceId, EditNode,
    InlineNode, StablePlace, StableRange,
};

fn seq(slot: u64) -> DetachedSequenceId {
    DetachedSequenceId::from_raw(slot)
}

fn rich_change_sequence() -> Vec<Change> {
    let root = make_node_id("root");
    let label = make_trait_label("body");
    let target = make_node_id("target");

    let mut wrapper = InlineNode::new(make_node_id("wrapper"), make_definition_id("wrapper"));
    wrapper.traits.insert(
        label,
        vec![
            EditNode::Detached(seq(1)),
            InlineNode::new(make_node_id("leaf"), make_definition_id("leaf")).into(),
        ],
    );
    wrapper.payload = Some(AtomPayload::new(
        make_payload_type_id("text"),
        Bytes::from_static(b"hello"),
    ));

    vec![
        Change::build(vec![wrapper.into()], seq(2)),
        Change::insert(seq(2), StablePlace::at_start_of(root, label)),
        Change::detach(StableRange::only(target), seq(3)),
        Change::delete(StableRange::all(root, label)),
        Change::Constraint {
            to_constrain: StableRange::all(root, label),
            effect: ConstraintEffect::InvalidRetry,
            length: Some(3),
            parent_node: Some(root),
            label: Some(label),
            identity_hash: Some([0xAB; 32]),
            content_hash: None,
        },
        Change::set_payload(
            target,
            AtomPayload::new(make_payload_type_id("text"), Bytes::from_static(b"bye")),
        ),
        Change::clear_payload(target),
    ]
}

#[test]
fn every_change_kind_round_trips() {
    let changes = rich_change_sequence();
    let bytes = encode_changes(&changes).unwrap();
    let decoded = decode_changes(&bytes).unwrap();
    assert_eq!(decoded, changes);
}

#[test]
fn set_value_always_carries_the_payload_field() {
    let bytes = encode_changes(&[Change::clear_payload(make_node_id("n"))]).unwrap();
    let value: Value = ciborium::from_reader(bytes.as_slice()).unwrap();
    let Value::Array(items) = value else {
        panic!("expected a change array");
    };
    let Value::Map(entries) = &items[0] else {
        panic!("expected a change map");
    };
    let payload = entries
        .iter()
        .find(|(key, _)| key == &Value::Text("payload".into()))
        .map(|(_, value)| value);
    // The clear sentinel is an explicit null, not an absent field.
    assert_eq!(payload, Some(&Value::Null));
}

#[test]
fn a_missing_payload_field_is_a_decode_error() {
    let bytes = encode_changes(&[Change::clear_payload(make_node_id("n"))]).unwrap();
    let mut value: Value = ciborium::from_reader(bytes.as_slice()).unwrap();
    if let Value::Array(items) = &mut value {
        if let Value::Map(entries) = &mut items[0] {
            entries.retain(|(key, _)| key != &Value::Text("payload".into()));
        }
    }
    let mut stripped = Vec::new();
    ciborium::into_writer(&value, &mut stripped).unwrap();
    assert!(decode_changes(&stripped).is_err());
}

#[test]
fn an_unknown_change_tag_is_a_decode_error() {
    let bytes = encode_changes(&[Change::clear_payload(make_node_id("n"))]).unwrap();
    let mut value: Value = ciborium::from_reader(bytes.as_slice()).unwrap();
    if let Value::Array(items) = &mut value {
        if let Value::Map(entries) = &mut items[0] {
            for (key, entry) in entries.iter_mut() {
                if key == &Value::Text("type".into()) {
                    *entry = Value::Text("Frobnicate".into());
                }
            }
        }
    }
    let mut retagged = Vec::new();
    ciborium::into_writer(&value, &mut retagged).unwrap();
    assert!(decode_changes(&retagged).is_err());
}
