// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-type fetch, injected so this crate stays independent of whichever
//! storage layer ultimately implements it (mirrors the pattern in
//! `orc-module` and `orc-policy`).

use crate::entity::TaggedEntity;
use async_trait::async_trait;
use orc_core::Id;
use orc_error::CoreError;

/// A source of record for every entity kind the catalog can route to.
///
/// A single implementor is expected to dispatch internally to whatever
/// per-entity-type stores it wraps; this crate only needs the one surface.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Fetch the entity named by `internal_id`, already known to be of
    /// `entity_type`.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::NotFound`] if no such entity exists.
    async fn fetch(&self, entity_type: crate::entity::EntityType, internal_id: Id) -> Result<TaggedEntity, CoreError>;

    /// Resolve a TRN of the given type to its internal id.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::NotFound`] if no entity has that TRN.
    async fn resolve_trn(&self, entity_type: crate::entity::EntityType, trn: &str) -> Result<Id, CoreError>;
}
