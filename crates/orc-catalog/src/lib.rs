// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resource catalog (§4.8): translates an opaque id — a global id or a
//! TRN — into the polymorphic entity or internal id it names.

mod entity;
mod global_id;
mod repository;

pub use entity::{EntityType, TaggedEntity};
pub use global_id::encode_global_id;
pub use repository::CatalogRepository;

use global_id::{decode_opaque_id, DecodedRef};
use orc_error::CoreError;

/// Decode `opaque_id`, fetch the entity it names, and return it tagged by
/// kind.
///
/// # Errors
/// [`orc_error::ErrorKind::Invalid`] if `opaque_id` is structurally
/// malformed. [`orc_error::ErrorKind::NotFound`] if it names an
/// unrecognised entity type, or a well-formed id/TRN with no matching
/// entity.
pub async fn fetch_model(opaque_id: &str, repository: &dyn CatalogRepository) -> Result<TaggedEntity, CoreError> {
    match decode_opaque_id(opaque_id)? {
        DecodedRef::GlobalId(entity_type, internal_id) => repository.fetch(entity_type, internal_id).await,
        DecodedRef::Trn { entity_type, trn } => {
            let internal_id = repository.resolve_trn(entity_type, &trn).await?;
            repository.fetch(entity_type, internal_id).await
        }
    }
}

/// Decode `opaque_id` and return only the internal id it resolves to,
/// without loading the entity itself.
///
/// # Errors
/// Same as [`fetch_model`], except a TRN's resolution failure is the only
/// way a well-formed global id can still surface `NotFound` here, since a
/// global id's internal id needs no further lookup.
pub async fn fetch_model_id(opaque_id: &str, repository: &dyn CatalogRepository) -> Result<String, CoreError> {
    match decode_opaque_id(opaque_id)? {
        DecodedRef::GlobalId(_, internal_id) => Ok(internal_id.to_string()),
        DecodedRef::Trn { entity_type, trn } => {
            let internal_id = repository.resolve_trn(entity_type, &trn).await?;
            Ok(internal_id.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use orc_core::{Id, ResourceMetadata, Workspace};
    use orc_error::ErrorKind;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn workspace(id: Id, trn: &str) -> Workspace {
        Workspace {
            metadata: ResourceMetadata::new(id, trn, Utc::now()),
            group_id: Id::nil(),
            group_path: orc_core::GroupPath::new("acme"),
        }
    }

    struct FakeRepository {
        workspaces: Mutex<BTreeMap<Id, Workspace>>,
        trns: Mutex<BTreeMap<String, Id>>,
    }

    #[async_trait]
    impl CatalogRepository for FakeRepository {
        async fn fetch(&self, entity_type: EntityType, internal_id: Id) -> Result<TaggedEntity, CoreError> {
            match entity_type {
                EntityType::Workspace => self
                    .workspaces
                    .lock()
                    .unwrap()
                    .get(&internal_id)
                    .cloned()
                    .map(TaggedEntity::Workspace)
                    .ok_or_else(|| CoreError::not_found(format!("no workspace {internal_id}"))),
                other => Err(CoreError::not_found(format!("no {other:?} {internal_id}"))),
            }
        }

        async fn resolve_trn(&self, _entity_type: EntityType, trn: &str) -> Result<Id, CoreError> {
            self.trns
                .lock()
                .unwrap()
                .get(trn)
                .copied()
                .ok_or_else(|| CoreError::not_found(format!("no entity with trn {trn}")))
        }
    }

    #[tokio::test]
    async fn fetch_model_routes_a_global_id_to_the_repository() {
        let id = Id::new_v4();
        let repo = FakeRepository {
            workspaces: Mutex::new(BTreeMap::from([(id, workspace(id, "trn:workspace:acme/prod"))])),
            trns: Mutex::new(BTreeMap::new()),
        };
        let opaque_id = encode_global_id(EntityType::Workspace, id);

        let entity = fetch_model(&opaque_id, &repo).await.unwrap();
        assert_eq!(entity.entity_type(), EntityType::Workspace);
    }

    #[tokio::test]
    async fn fetch_model_resolves_a_trn_before_fetching() {
        let id = Id::new_v4();
        let repo = FakeRepository {
            workspaces: Mutex::new(BTreeMap::from([(id, workspace(id, "trn:workspace:acme/prod"))])),
            trns: Mutex::new(BTreeMap::from([("trn:workspace:acme/prod".to_string(), id)])),
        };

        let entity = fetch_model("trn:workspace:acme/prod", &repo).await.unwrap();
        assert_eq!(entity.entity_type(), EntityType::Workspace);
    }

    #[tokio::test]
    async fn fetch_model_id_skips_the_fetch_for_a_global_id() {
        let id = Id::new_v4();
        let repo = FakeRepository { workspaces: Mutex::new(BTreeMap::new()), trns: Mutex::new(BTreeMap::new()) };
        let opaque_id = encode_global_id(EntityType::Run, id);

        assert_eq!(fetch_model_id(&opaque_id, &repo).await.unwrap(), id.to_string());
    }

    #[tokio::test]
    async fn unknown_type_is_not_found() {
        use base64::Engine as _;

        let repo = FakeRepository { workspaces: Mutex::new(BTreeMap::new()), trns: Mutex::new(BTreeMap::new()) };
        let opaque_id =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(format!("bogus:{}", Id::new_v4()));

        let err = fetch_model(&opaque_id, &repo).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn malformed_id_is_invalid() {
        let repo = FakeRepository { workspaces: Mutex::new(BTreeMap::new()), trns: Mutex::new(BTreeMap::new()) };

        let err = fetch_model("not base64 at all!!", &repo).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Invalid);
    }
}
