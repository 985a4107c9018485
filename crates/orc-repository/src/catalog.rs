// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`CatalogRepository`] over the shared [`InMemoryStore`].

use crate::store::InMemoryStore;
use async_trait::async_trait;
use orc_catalog::{CatalogRepository, EntityType, TaggedEntity};
use orc_core::Id;
use orc_error::CoreError;

fn not_found(entity_type: EntityType, id: Id) -> CoreError {
    CoreError::not_found(format!("no {} with id {id}", entity_type.tag()))
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn fetch(&self, entity_type: EntityType, internal_id: Id) -> Result<TaggedEntity, CoreError> {
        match entity_type {
            EntityType::Run => self
                .runs
                .lock()
                .unwrap()
                .get(&internal_id)
                .cloned()
                .map(TaggedEntity::Run)
                .ok_or_else(|| not_found(entity_type, internal_id)),
            EntityType::Plan => self
                .plans
                .lock()
                .unwrap()
                .get(&internal_id)
                .cloned()
                .map(TaggedEntity::Plan)
                .ok_or_else(|| not_found(entity_type, internal_id)),
            EntityType::Apply => self
                .applies
                .lock()
                .unwrap()
                .get(&internal_id)
                .cloned()
                .map(TaggedEntity::Apply)
                .ok_or_else(|| not_found(entity_type, internal_id)),
            EntityType::Job => self
                .jobs
                .lock()
                .unwrap()
                .get(&internal_id)
                .cloned()
                .map(TaggedEntity::Job)
                .ok_or_else(|| not_found(entity_type, internal_id)),
            EntityType::Workspace => self
                .workspaces
                .lock()
                .unwrap()
                .get(&internal_id)
                .cloned()
                .map(TaggedEntity::Workspace)
                .ok_or_else(|| not_found(entity_type, internal_id)),
            EntityType::Group => self
                .groups
                .lock()
                .unwrap()
                .get(&internal_id)
                .cloned()
                .map(TaggedEntity::Group)
                .ok_or_else(|| not_found(entity_type, internal_id)),
            EntityType::ManagedIdentity => self
                .managed_identities
                .lock()
                .unwrap()
                .get(&internal_id)
                .cloned()
                .map(TaggedEntity::ManagedIdentity)
                .ok_or_else(|| not_found(entity_type, internal_id)),
        }
    }

    async fn resolve_trn(&self, entity_type: EntityType, trn: &str) -> Result<Id, CoreError> {
        let id = *self
            .trn_index
            .lock()
            .unwrap()
            .get(trn)
            .ok_or_else(|| CoreError::not_found(format!("no entity with trn {trn}")))?;
        // Confirm the resolved id is actually of the requested type; a TRN
        // collision across kinds would otherwise hand the caller the wrong
        // entity under the right id.
        match self.fetch(entity_type, id).await {
            Ok(_) => Ok(id),
            Err(_) => Err(CoreError::not_found(format!("no {} with trn {trn}", entity_type.tag()))),
        }
    }
}
