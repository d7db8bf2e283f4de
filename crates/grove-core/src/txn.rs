// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The transaction interpreter: ordered changes over an evolving view.
//!
//! A [`Transaction`] owns a private, evolving [`Snapshot`] (the *view*) and a
//! registry of detached sequences. Changes apply strictly in submission
//! order; each either commits atomically (view and registry together) or
//! closes the transaction with a classified failure, leaving both untouched.
//! The baseline snapshot the transaction was opened with is never modified.
//!
//! Outcome classification
//! - [`EditResult::Malformed`]: the edit cannot be interpreted against any
//!   snapshot (registry misuse, ill-formed range). Peers should reject it.
//! - [`EditResult::Invalid`]: well-formed, but this snapshot's state prevents
//!   application (missing anchor, id collision with existing content). The
//!   distributed layer may retry against a different baseline.
//! - [`EditResult::Applied`]: the change produced a valid successor view.
//!
//! Detached sequences are a linear resource: Build and Detach-with-
//! destination write a fresh slot; Insert and Build-by-reference consume one.
//! Writing an occupied slot or reading a missing one is malformed, and a
//! registry that is still populated at close overrides the outcome to
//! malformed — storing a sequence and never consuming it is a policy error.
//!
//! The interpreter is single-threaded and synchronous: no operation suspends,
//! blocks, or performs I/O. Abandoning a transaction mid-flight is safe;
//! nothing outside it has been mutated.

use im::{OrdMap, Vector};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::edit::{Change, ConstraintEffect, EditNode};
use crate::ident::{DetachedSequenceId, NodeId};
use crate::mutate::{detach_range, insert_into_trait};
use crate::payload::AtomPayload;
use crate::place::{
    range_from_stable_range, validate_stable_place, validate_stable_range, StablePlace,
    StableRange, Validity,
};
use crate::record::NodeRecord;
use crate::snapshot::Snapshot;

/// Three-valued outcome of a change or of a whole transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditResult {
    /// The edit produced a valid resulting snapshot.
    Applied,
    /// Well-formed, but rejected by the current snapshot's state.
    Invalid,
    /// Uninterpretable against any snapshot.
    Malformed,
}

impl EditResult {
    /// Stable lowercase label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Invalid => "invalid",
            Self::Malformed => "malformed",
        }
    }
}

/// Final outcome of a closed transaction.
///
/// When `result` is not [`EditResult::Applied`] the view carries the state at
/// failure time for diagnostics only; callers must not commit it.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// Classification of the whole edit.
    pub result: EditResult,
    /// The view at close time.
    pub view: Snapshot,
}

/// A single in-flight edit over a baseline snapshot.
#[derive(Debug, Clone)]
pub struct Transaction {
    view: Snapshot,
    detached: FxHashMap<DetachedSequenceId, Vec<NodeId>>,
    open: bool,
    result: EditResult,
}

impl Transaction {
    /// Opens a transaction over `initial`.
    ///
    /// The baseline is shared structurally, not copied; it remains observable
    /// and unchanged regardless of what the transaction does.
    #[must_use]
    pub fn new(initial: Snapshot) -> Self {
        Self {
            view: initial,
            detached: FxHashMap::default(),
            open: true,
            result: EditResult::Applied,
        }
    }

    /// Returns the current evolving view.
    ///
    /// Intermediate views are provisional: they may hold detached content
    /// that a later change re-inserts or discards.
    #[must_use]
    pub fn current_view(&self) -> &Snapshot {
        &self.view
    }

    /// Returns `true` until a change fails or the transaction closes.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The running classification; [`EditResult::Applied`] while healthy.
    #[must_use]
    pub fn result(&self) -> EditResult {
        self.result
    }

    /// Number of detached sequences currently held by the registry.
    #[must_use]
    pub fn detached_count(&self) -> usize {
        self.detached.len()
    }

    /// Returns `true` when the registry currently holds `sequence`.
    #[must_use]
    pub fn holds_sequence(&self, sequence: DetachedSequenceId) -> bool {
        self.detached.contains_key(&sequence)
    }

    /// Applies one change, advancing the view on success.
    ///
    /// The first non-applied result closes the transaction and freezes its
    /// classification; subsequent calls are inert and return the frozen
    /// result. View and registry update together or not at all.
    pub fn apply(&mut self, change: Change) -> EditResult {
        if !self.open {
            return self.result;
        }
        #[cfg(feature = "telemetry")]
        let kind = change.kind();
        let result = match change {
            Change::Build {
                source,
                destination,
            } => self.apply_build(&source, destination),
            Change::Insert {
                source,
                destination,
            } => self.apply_insert(source, &destination),
            Change::Detach {
                source,
                destination,
            } => self.apply_detach(&source, destination),
            Change::Constraint {
                to_constrain,
                effect,
                length,
                parent_node,
                label,
                identity_hash,
                content_hash,
            } => {
                let on_violation = match effect {
                    ConstraintEffect::ValidRetry => EditResult::Applied,
                    ConstraintEffect::InvalidRetry => EditResult::Invalid,
                };
                'constraint: {
                    match validate_stable_range(&self.view, &to_constrain) {
                        Validity::Valid => {}
                        Validity::Invalid => break 'constraint on_violation,
                        Validity::Malformed => break 'constraint EditResult::Malformed,
                    }
                    let Some(resolved) = range_from_stable_range(&self.view, &to_constrain)
                    else {
                        debug_assert!(false, "validated range must resolve");
                        break 'constraint on_violation;
                    };
                    if length.is_some_and(|expected| {
                        expected != resolved.end_index - resolved.start_index
                    }) {
                        break 'constraint on_violation;
                    }
                    if parent_node.is_some_and(|expected| expected != resolved.location.parent) {
                        break 'constraint on_violation;
                    }
                    if label.is_some_and(|expected| expected != resolved.location.label) {
                        break 'constraint on_violation;
                    }
                    // Acknowledged but unimplemented constraint kinds: a
                    // producer emitting them against this engine is a defect,
                    // not a data-level outcome.
                    assert!(
                        identity_hash.is_none(),
                        "identity-hash constraints are not implemented"
                    );
                    assert!(
                        content_hash.is_none(),
                        "content-hash constraints are not implemented"
                    );
                    EditResult::Applied
                }
            }
            Change::SetValue {
                node_to_modify,
                payload,
            } => self.apply_set_value(node_to_modify, payload),
        };
        if result != EditResult::Applied {
            self.open = false;
            self.result = result;
        }
        #[cfg(feature = "telemetry")]
        crate::telemetry::change(kind.label(), result.label());
        result
    }

    /// Applies changes in order, stopping at the first failure.
    ///
    /// Returns the transaction's running classification afterwards.
    pub fn apply_all(&mut self, changes: impl IntoIterator<Item = Change>) -> EditResult {
        for change in changes {
            if self.apply(change) != EditResult::Applied {
                break;
            }
        }
        self.result
    }

    /// Closes the transaction and returns its final outcome.
    ///
    /// A still-open transaction whose registry is not empty is classified
    /// malformed: every detached sequence must be consumed exactly once.
    #[must_use]
    pub fn close(mut self) -> EditOutcome {
        if self.open {
            self.open = false;
            if !self.detached.is_empty() {
                self.result = EditResult::Malformed;
            }
        }
        #[cfg(feature = "telemetry")]
        crate::telemetry::closed(self.result.label(), self.detached.len());
        EditOutcome {
            result: self.result,
            view: self.view,
        }
    }

    fn apply_build(&mut self, source: &[EditNode], destination: DetachedSequenceId) -> EditResult {
        if self.detached.contains_key(&destination) {
            return EditResult::Malformed;
        }
        let mut scratch = BuildScratch::default();
        let top_ids = expand_sequence(&self.view, &self.detached, source, &mut scratch);
        // Malformed conditions dominate invalid ones.
        if scratch.malformed {
            return EditResult::Malformed;
        }
        if scratch.invalid {
            return EditResult::Invalid;
        }
        for sequence in &scratch.consumed {
            self.detached.remove(sequence);
        }
        self.view = self.view.insert_nodes(scratch.new_nodes);
        self.detached.insert(destination, top_ids);
        EditResult::Applied
    }

    fn apply_insert(
        &mut self,
        source: DetachedSequenceId,
        destination: &StablePlace,
    ) -> EditResult {
        let Some(ids) = self.detached.get(&source) else {
            return EditResult::Malformed;
        };
        match validate_stable_place(&self.view, destination) {
            Validity::Valid => {}
            Validity::Invalid => return EditResult::Invalid,
            Validity::Malformed => return EditResult::Malformed,
        }
        let Some(next) = insert_into_trait(&self.view, ids, destination) else {
            debug_assert!(false, "validated place must resolve");
            return EditResult::Invalid;
        };
        self.view = next;
        self.detached.remove(&source);
        EditResult::Applied
    }

    fn apply_detach(
        &mut self,
        source: &StableRange,
        destination: Option<DetachedSequenceId>,
    ) -> EditResult {
        match validate_stable_range(&self.view, source) {
            Validity::Valid => {}
            Validity::Invalid => return EditResult::Invalid,
            Validity::Malformed => return EditResult::Malformed,
        }
        let Some((residual, ids)) = detach_range(&self.view, source) else {
            debug_assert!(false, "validated range must resolve");
            return EditResult::Invalid;
        };
        match destination {
            Some(slot) => {
                // Writing an occupied slot would overwrite a live sequence.
                if self.detached.contains_key(&slot) {
                    return EditResult::Malformed;
                }
                self.detached.insert(slot, ids);
                self.view = residual;
            }
            None => {
                self.view = residual.delete_nodes(&ids);
            }
        }
        EditResult::Applied
    }

    fn apply_set_value(
        &mut self,
        node_to_modify: NodeId,
        payload: Option<AtomPayload>,
    ) -> EditResult {
        let Some(record) = self.view.node(&node_to_modify) else {
            return EditResult::Invalid;
        };
        let mut next = record.clone();
        // `None` is the explicit clear sentinel; "no change" is expressed by
        // not emitting a SetValue at all.
        next.payload = payload;
        self.view = self.view.replace_node_data(node_to_modify, next);
        EditResult::Applied
    }
}

#[derive(Default)]
struct BuildScratch {
    consumed: FxHashSet<DetachedSequenceId>,
    new_nodes: Vec<(NodeId, NodeRecord)>,
    seen: FxHashSet<NodeId>,
    malformed: bool,
    invalid: bool,
}

/// Expands a Build source sequence depth-first against the registry.
///
/// Returns the ordered ids the sequence denotes: inline identifiers and
/// detached-reference expansions, in input order. Violations are flagged on
/// the scratch state rather than aborting, so the caller can apply the
/// malformed-over-invalid dominance rule after a full traversal.
fn expand_sequence(
    view: &Snapshot,
    registry: &FxHashMap<DetachedSequenceId, Vec<NodeId>>,
    nodes: &[EditNode],
    scratch: &mut BuildScratch,
) -> Vec<NodeId> {
    let mut ids = Vec::new();
    for node in nodes {
        match node {
            EditNode::Detached(sequence) => {
                if scratch.consumed.contains(sequence) {
                    // Second reference in the same build: already consumed.
                    scratch.malformed = true;
                } else if let Some(run) = registry.get(sequence) {
                    scratch.consumed.insert(*sequence);
                    ids.extend(run.iter().copied());
                } else {
                    scratch.malformed = true;
                }
            }
            EditNode::Inline(inline) => {
                let mut traits = OrdMap::new();
                for (label, children) in &inline.traits {
                    let child_ids = expand_sequence(view, registry, children, scratch);
                    if !child_ids.is_empty() {
                        traits.insert(*label, Vector::from_iter(child_ids));
                    }
                }
                if scratch.seen.insert(inline.identifier) {
                    if view.has_node(&inline.identifier) {
                        scratch.invalid = true;
                    }
                    scratch.new_nodes.push((
                        inline.identifier,
                        NodeRecord {
                            definition: inline.definition,
                            traits,
                            payload: inline.payload.clone(),
                        },
                    ));
                } else {
                    scratch.malformed = true;
                }
                ids.push(inline.identifier);
            }
        }
    }
    ids
}
