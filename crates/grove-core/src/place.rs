// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stable places and ranges, and their validation against a snapshot.
//!
//! A *stable place* names a position inside a trait in a way that survives
//! concurrent edits nearby: it anchors either to a sibling node (before/after
//! it) or to a trait boundary (the start or end of a named child list).
//! A *stable range* is an ordered pair of places that, once resolved against
//! a snapshot, designates a contiguous run of siblings in one trait.
//!
//! Classification table
//!
//! Validation is three-valued ([`Validity`]). The typed representation makes
//! the classic malformed place shapes (both or neither anchor kinds)
//! unrepresentable, so the table is:
//!
//! - Place, sibling anchor: the anchor is absent from the view, or present
//!   but unparented (the root, or a detached node) → `Invalid`.
//! - Place, boundary anchor: the trait's parent is absent → `Invalid`.
//! - Range: both endpoints anchored to boundaries of *different* traits →
//!   `Malformed` (ill-formed against every snapshot, not just this one).
//! - Range: endpoints that resolve to different traits via siblings, or to
//!   an inverted span → `Invalid` (state-dependent: another baseline could
//!   order them correctly).

use crate::ident::{NodeId, TraitLabel};
use crate::record::TraitLocation;
use crate::snapshot::Snapshot;

/// Which side of the anchor a place designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// The position immediately before the anchor.
    Before,
    /// The position immediately after the anchor.
    After,
}

/// What a stable place anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    /// A sibling node inside the target trait.
    Sibling(NodeId),
    /// A boundary of the trait itself, named explicitly.
    TraitBoundary {
        /// Parent node owning the trait.
        parent: NodeId,
        /// Label of the trait under the parent.
        label: TraitLabel,
    },
}

/// A position within a trait that is robust to edits nearby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StablePlace {
    /// Side of the anchor this place designates.
    pub side: Side,
    /// The anchor itself.
    pub anchor: Anchor,
}

impl StablePlace {
    /// The place immediately before `node`.
    #[must_use]
    pub const fn before(node: NodeId) -> Self {
        Self {
            side: Side::Before,
            anchor: Anchor::Sibling(node),
        }
    }

    /// The place immediately after `node`.
    #[must_use]
    pub const fn after(node: NodeId) -> Self {
        Self {
            side: Side::After,
            anchor: Anchor::Sibling(node),
        }
    }

    /// The place at the start of the `(parent, label)` trait.
    #[must_use]
    pub const fn at_start_of(parent: NodeId, label: TraitLabel) -> Self {
        Self {
            side: Side::After,
            anchor: Anchor::TraitBoundary { parent, label },
        }
    }

    /// The place at the end of the `(parent, label)` trait.
    #[must_use]
    pub const fn at_end_of(parent: NodeId, label: TraitLabel) -> Self {
        Self {
            side: Side::Before,
            anchor: Anchor::TraitBoundary { parent, label },
        }
    }
}

/// An ordered pair of places designating a contiguous sibling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StableRange {
    /// Start of the run (inclusive boundary place).
    pub start: StablePlace,
    /// End of the run (exclusive boundary place).
    pub end: StablePlace,
}

impl StableRange {
    /// Constructs a range from explicit endpoints.
    #[must_use]
    pub const fn from_to(start: StablePlace, end: StablePlace) -> Self {
        Self { start, end }
    }

    /// The range covering the entire `(parent, label)` trait.
    #[must_use]
    pub const fn all(parent: NodeId, label: TraitLabel) -> Self {
        Self {
            start: StablePlace::at_start_of(parent, label),
            end: StablePlace::at_end_of(parent, label),
        }
    }

    /// The range covering exactly `node`.
    #[must_use]
    pub const fn only(node: NodeId) -> Self {
        Self {
            start: StablePlace::before(node),
            end: StablePlace::after(node),
        }
    }
}

/// Three-valued classification of a place or range against a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// The place/range resolves against the snapshot.
    Valid,
    /// Well-formed, but the snapshot's current state prevents resolution.
    Invalid,
    /// Ill-formed against every snapshot.
    Malformed,
}

/// A place resolved to a concrete trait and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPlace {
    /// Trait containing the place.
    pub location: TraitLocation,
    /// Integer offset within the trait's child list.
    pub index: usize,
}

/// A range resolved to a concrete trait and index span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    /// Trait containing the run.
    pub location: TraitLocation,
    /// Offset of the first covered child.
    pub start_index: usize,
    /// Offset one past the last covered child.
    pub end_index: usize,
}

/// Classifies `place` against `snapshot`.
#[must_use]
pub fn validate_stable_place(snapshot: &Snapshot, place: &StablePlace) -> Validity {
    match &place.anchor {
        Anchor::Sibling(node) => {
            if snapshot.trait_location(node).is_none() {
                // Absent, or present but unparented (root / detached).
                return Validity::Invalid;
            }
            Validity::Valid
        }
        Anchor::TraitBoundary { parent, .. } => {
            if snapshot.has_node(parent) {
                Validity::Valid
            } else {
                Validity::Invalid
            }
        }
    }
}

/// Classifies `range` against `snapshot`.
#[must_use]
pub fn validate_stable_range(snapshot: &Snapshot, range: &StableRange) -> Validity {
    if let (
        Anchor::TraitBoundary {
            parent: start_parent,
            label: start_label,
        },
        Anchor::TraitBoundary {
            parent: end_parent,
            label: end_label,
        },
    ) = (&range.start.anchor, &range.end.anchor)
    {
        if (start_parent, start_label) != (end_parent, end_label) {
            return Validity::Malformed;
        }
    }

    for place in [&range.start, &range.end] {
        match validate_stable_place(snapshot, place) {
            Validity::Valid => {}
            invalid => return invalid,
        }
    }

    let (Some(start), Some(end)) = (
        resolve_place(snapshot, &range.start),
        resolve_place(snapshot, &range.end),
    ) else {
        debug_assert!(false, "valid places must resolve");
        return Validity::Invalid;
    };
    if start.location != end.location {
        return Validity::Invalid;
    }
    if start.index > end.index {
        return Validity::Invalid;
    }
    Validity::Valid
}

/// Resolves `place` to its containing trait and offset.
///
/// Returns `None` when the place does not resolve against `snapshot`
/// (equivalent to a non-`Valid` classification).
#[must_use]
pub fn resolve_place(snapshot: &Snapshot, place: &StablePlace) -> Option<ResolvedPlace> {
    match &place.anchor {
        Anchor::Sibling(node) => {
            let location = *snapshot.trait_location(node)?;
            let children = snapshot.child_list(&location.parent, &location.label);
            let at = children.index_of(node)?;
            let index = match place.side {
                Side::Before => at,
                Side::After => at + 1,
            };
            Some(ResolvedPlace { location, index })
        }
        Anchor::TraitBoundary { parent, label } => {
            if !snapshot.has_node(parent) {
                return None;
            }
            let children = snapshot.child_list(parent, label);
            let index = match place.side {
                Side::After => 0,
                Side::Before => children.len(),
            };
            Some(ResolvedPlace {
                location: TraitLocation {
                    parent: *parent,
                    label: *label,
                },
                index,
            })
        }
    }
}

/// Resolves `range` to a concrete trait and index span.
///
/// Returns `None` unless both endpoints resolve into the same trait with
/// `start_index <= end_index` (equivalent to a non-`Valid` classification).
#[must_use]
pub fn range_from_stable_range(snapshot: &Snapshot, range: &StableRange) -> Option<ResolvedRange> {
    let start = resolve_place(snapshot, &range.start)?;
    let end = resolve_place(snapshot, &range.end)?;
    if start.location != end.location || start.index > end.index {
        return None;
    }
    Some(ResolvedRange {
        location: start.location,
        start_index: start.index,
        end_index: end.index,
    })
}
