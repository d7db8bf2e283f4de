// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! grove-core: transactional edit engine for ordered, labelled document trees.
//!
//! The engine consumes an immutable baseline [`Snapshot`] and an ordered
//! sequence of [`Change`] values and produces either a successor snapshot
//! with every change applied atomically, or a classified rejection
//! ([`EditResult::Invalid`] / [`EditResult::Malformed`]) with the baseline
//! preserved. Snapshots share structure persistently, so parallel
//! transactions over one baseline are independent by construction.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

#[cfg(feature = "serde")]
mod codec;
mod edit;
mod ident;
mod mutate;
mod payload;
mod place;
mod record;
mod snapshot;
#[cfg(feature = "telemetry")]
mod telemetry;
mod txn;

// Re-exports for stable public API
/// Deterministic CBOR codec for the persisted change schema.
#[cfg(feature = "serde")]
pub use codec::{decode_changes, encode_changes, DecodeError, EncodeError};
/// Change model: edit-node fragments and the five change kinds.
pub use edit::{Change, ChangeKind, ConstraintEffect, EditNode, InlineNode};
/// Core identifier types and constructors for nodes, definitions, traits,
/// payload types, and detached sequences.
pub use ident::{
    make_definition_id, make_node_id, make_payload_type_id, make_trait_label, DefinitionId,
    DetachedSequenceId, Hash, NodeId, PayloadTypeId, TraitLabel,
};
/// Pure snapshot transformations: range detach and place splice.
pub use mutate::{detach_range, insert_into_trait};
/// Opaque typed payload atoms.
pub use payload::AtomPayload;
/// Stable places/ranges and their validation primitives.
pub use place::{
    range_from_stable_range, resolve_place, validate_stable_place, validate_stable_range, Anchor,
    ResolvedPlace, ResolvedRange, Side, StablePlace, StableRange, Validity,
};
/// Per-node records and trait locations.
pub use record::{NodeRecord, TraitLocation};
/// Immutable structurally-shared tree snapshots.
pub use snapshot::Snapshot;
/// The transaction interpreter and its outcomes.
pub use txn::{EditOutcome, EditResult, Transaction};
