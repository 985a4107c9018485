// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`ModuleRepository`] and [`FederatedRegistryRepository`] over the
//! shared [`InMemoryStore`].

use crate::store::InMemoryStore;
use async_trait::async_trait;
use orc_core::group::GroupPath;
use orc_core::{FederatedRegistryRef, Id};
use orc_error::CoreError;
use orc_module::{FederatedRegistryRepository, ModuleRepository};
use std::collections::BTreeSet;

#[async_trait]
impl ModuleRepository for InMemoryStore {
    async fn find_local_module_id(&self, namespace: &str, name: &str, system: &str) -> Result<Id, CoreError> {
        self.local_modules
            .lock()
            .unwrap()
            .iter()
            .find(|(_, m)| m.namespace == namespace && m.name == name && m.system == system)
            .map(|(id, _)| *id)
            .ok_or_else(|| CoreError::not_found(format!("no local module {namespace}/{name}/{system}")))
    }

    async fn list_uploaded_versions(&self, module_id: Id) -> Result<BTreeSet<String>, CoreError> {
        let modules = self.local_modules.lock().unwrap();
        let module = modules
            .get(&module_id)
            .ok_or_else(|| CoreError::not_found(format!("no local module {module_id}")))?;
        Ok(module.uploaded_versions.keys().cloned().collect())
    }

    async fn resolve_digest(&self, module_id: Id, version: &str) -> Result<Vec<u8>, CoreError> {
        let modules = self.local_modules.lock().unwrap();
        let module = modules
            .get(&module_id)
            .ok_or_else(|| CoreError::not_found(format!("no local module {module_id}")))?;
        module
            .uploaded_versions
            .get(version)
            .map(|v| v.digest.clone())
            .ok_or_else(|| CoreError::not_found(format!("no version {version} for module {module_id}")))
    }

    async fn get_attestations(&self, module_id: Id, version: &str, _digest_hex: &str) -> Result<Vec<String>, CoreError> {
        let modules = self.local_modules.lock().unwrap();
        let module = modules
            .get(&module_id)
            .ok_or_else(|| CoreError::not_found(format!("no local module {module_id}")))?;
        module
            .uploaded_versions
            .get(version)
            .map(|v| v.attestations.clone())
            .ok_or_else(|| CoreError::not_found(format!("no version {version} for module {module_id}")))
    }
}

#[async_trait]
impl FederatedRegistryRepository for InMemoryStore {
    async fn list_visible(&self, workspace_group_path: &GroupPath) -> Result<Vec<(FederatedRegistryRef, String)>, CoreError> {
        let groups = self.groups.lock().unwrap();
        let registries = self.federated_registries.lock().unwrap();

        let mut out = Vec::new();
        for entry in registries.values() {
            if !entry.reference.owning_group_path.is_ancestor_of_or_equal(workspace_group_path) {
                continue;
            }
            let owning_group_deleted = groups
                .values()
                .any(|g| g.full_path == entry.reference.owning_group_path && g.deleted);
            if owning_group_deleted {
                return Err(CoreError::not_found("some groups have been deleted"));
            }
            out.push((entry.reference.clone(), entry.catalog_global_id.clone()));
        }
        Ok(out)
    }
}
