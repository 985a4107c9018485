// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `Local` module-registry source: a module hosted by this process's
//! own module repository (§4.5 step 5).

use crate::source::{ModuleRegistrySource, ModuleRepository};
use orc_core::{Id, ModuleReference};
use orc_error::CoreError;
use std::sync::Arc;

/// A module resolved against this process's own repository.
pub struct LocalSource {
    reference: ModuleReference,
    module_id: Id,
    repository: Arc<dyn ModuleRepository>,
}

impl LocalSource {
    pub(crate) fn new(reference: ModuleReference, module_id: Id, repository: Arc<dyn ModuleRepository>) -> Self {
        Self { reference, module_id, repository }
    }
}

#[async_trait::async_trait]
impl ModuleRegistrySource for LocalSource {
    fn host(&self) -> &str {
        &self.reference.host
    }

    fn namespace(&self) -> &str {
        &self.reference.namespace
    }

    fn name(&self) -> &str {
        &self.reference.name
    }

    fn system(&self) -> &str {
        &self.reference.system
    }

    fn is_tharsis_module(&self) -> bool {
        true
    }

    async fn resolve_semantic_version(&self, wanted: Option<&str>) -> Result<String, CoreError> {
        let versions = self.repository.list_uploaded_versions(self.module_id).await?;
        orc_version::pick(&versions, wanted)
    }

    async fn resolve_digest(&self, version: &str) -> Result<Vec<u8>, CoreError> {
        self.repository.resolve_digest(self.module_id, version).await
    }

    async fn get_attestations(&self, version: &str, digest_hex: &str) -> Result<Vec<String>, CoreError> {
        self.repository
            .get_attestations(self.module_id, version, digest_hex)
            .await
    }
}
