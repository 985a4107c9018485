// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared test fakes and fixture wiring for this crate's `#[cfg(test)]`
//! modules. Not part of the public API.

use crate::{RunService, RunServiceDeps};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orc_config::OrchestratorConfig;
use orc_core::{Group, GroupPath, Id, Job, ResourceMetadata, Workspace};
use orc_dispatch::ExecutionBackend;
use orc_error::CoreError;
use orc_repository::InMemoryStore;
use orc_token::TokenSigner;
use std::sync::{Arc, Mutex};

const TEST_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/test_key_pkcs8.pem");

/// Always succeeds, returning a caller-supplied external id.
pub(crate) struct StubBackend(pub &'static str);

#[async_trait]
impl ExecutionBackend for StubBackend {
    async fn dispatch(&self, _job: &Job, _auth_token: &str) -> Result<String, CoreError> {
        Ok(self.0.to_string())
    }
}

/// Tracks every job handed to it, for assertions that don't care about the
/// returned external id.
#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub dispatched: Mutex<Vec<Id>>,
}

#[async_trait]
impl ExecutionBackend for RecordingBackend {
    async fn dispatch(&self, job: &Job, _auth_token: &str) -> Result<String, CoreError> {
        self.dispatched.lock().unwrap().push(job.metadata.id);
        Ok(format!("ext-{}", job.metadata.id))
    }
}

pub(crate) fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
}

/// A store seeded with one group and one workspace under it, ready for
/// `create_run`/`apply_run` tests that only need `workspace_group_path` and
/// `inherited_variables` to resolve.
pub(crate) fn seeded_store() -> (Arc<InMemoryStore>, Id) {
    let store = Arc::new(InMemoryStore::new());
    let group_id = Id::new_v4();
    store.seed_group(Group {
        metadata: ResourceMetadata::new(group_id, "trn:group:acme", now()),
        full_path: GroupPath::new("acme"),
        parent_id: None,
        deleted: false,
    });

    let workspace_id = Id::new_v4();
    store.seed_workspace(Workspace {
        metadata: ResourceMetadata::new(workspace_id, "trn:workspace:acme/prod", now()),
        group_id,
        group_path: GroupPath::new("acme"),
    });
    (store, workspace_id)
}

pub(crate) fn service(
    store: Arc<InMemoryStore>,
    execution_backend: Arc<dyn ExecutionBackend>,
) -> RunService {
    let token_signer = Arc::new(TokenSigner::from_rsa_pem(TEST_PRIVATE_KEY_PEM.as_bytes()).unwrap());
    RunService::new(
        RunServiceDeps {
            catalog: store.clone(),
            run_repository: store.clone(),
            variables: store.clone(),
            job_source: store.clone(),
            job_repository: store.clone(),
            execution_backend,
            log_source: store.clone(),
            access_rules: store.clone(),
            state_versions: Some(store.clone()),
            module_repository: store.clone(),
            federated_registries: store,
            token_signer,
            http_client: reqwest::Client::new(),
        },
        OrchestratorConfig::default(),
    )
}
