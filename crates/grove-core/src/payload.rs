// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Opaque payload atoms carried by tree nodes.
//!
//! A payload is a **typed atom**: the pair `(PayloadTypeId, Bytes)`. The core
//! store treats payload bytes as opaque and never decodes them; pairing bytes
//! with a type id avoids "same bytes, different meaning" collisions when
//! hosts attach heterogeneous values to the tree. Deep validation of payload
//! contents (e.g. serializability of host values) happens above this layer.

use bytes::Bytes;

use crate::ident::PayloadTypeId;

/// A typed opaque payload: `(type_id, bytes)`.
///
/// Cloning is cheap: `Bytes` is reference-counted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomPayload {
    /// Logical type of the payload bytes.
    pub type_id: PayloadTypeId,
    /// Opaque payload bytes.
    pub bytes: Bytes,
}

impl AtomPayload {
    /// Constructs a typed payload atom.
    #[must_use]
    pub fn new(type_id: PayloadTypeId, bytes: Bytes) -> Self {
        Self { type_id, bytes }
    }
}
