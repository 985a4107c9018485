// SPDX-License-Identifier: MIT OR Apache-2.0
//! The shared in-memory tables every trait implementation in this crate
//! dispatches against. One `Mutex<HashMap<Id, T>>` per entity kind, the
//! same shape every consuming crate's own test doubles already use.

use orc_core::{
    AccessRule, Apply, FederatedRegistryRef, Group, Job, ManagedIdentity, Plan, Run, RunVariable, Workspace,
};
use orc_core::Id;
use std::collections::HashMap;
use std::sync::Mutex;

/// A locally-registered module version record (§4.5 `Local` source).
///
/// There is no shared `orc-core` module entity — `orc-module` only depends
/// on [`orc_module::ModuleRepository`], so this record is private to the
/// store that implements it.
#[derive(Debug, Clone)]
pub(crate) struct LocalModuleVersion {
    pub digest: Vec<u8>,
    pub attestations: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct LocalModule {
    pub namespace: String,
    pub name: String,
    pub system: String,
    pub uploaded_versions: std::collections::BTreeMap<String, LocalModuleVersion>,
}

/// A registered federated registry, keyed by its own id for storage but
/// looked up by owning-group ancestry and hostname.
#[derive(Debug, Clone)]
pub(crate) struct FederatedRegistryEntry {
    pub reference: FederatedRegistryRef,
    pub catalog_global_id: String,
}

/// In-memory backing store for every repository trait this workspace's
/// crates inject. One instance is shared (via `Arc`, by the caller) across
/// however many trait objects are handed out.
#[derive(Default)]
pub struct InMemoryStore {
    pub(crate) groups: Mutex<HashMap<Id, Group>>,
    pub(crate) workspaces: Mutex<HashMap<Id, Workspace>>,
    pub(crate) managed_identities: Mutex<HashMap<Id, ManagedIdentity>>,
    pub(crate) access_rules: Mutex<HashMap<Id, AccessRule>>,
    pub(crate) runs: Mutex<HashMap<Id, Run>>,
    pub(crate) plans: Mutex<HashMap<Id, Plan>>,
    pub(crate) applies: Mutex<HashMap<Id, Apply>>,
    pub(crate) jobs: Mutex<HashMap<Id, Job>>,
    pub(crate) run_variables: Mutex<HashMap<Id, Vec<RunVariable>>>,
    /// Namespace-scoped variable definitions, keyed by the owning group's
    /// id — distinct from `run_variables`, which holds the collated result
    /// already written back for a specific run.
    pub(crate) group_variables: Mutex<HashMap<Id, Vec<RunVariable>>>,
    pub(crate) trn_index: Mutex<HashMap<String, Id>>,
    pub(crate) local_modules: Mutex<HashMap<Id, LocalModule>>,
    pub(crate) federated_registries: Mutex<HashMap<Id, FederatedRegistryEntry>>,
    /// `state_version_id -> run_id`, `None` for a manually-uploaded version.
    pub(crate) state_version_runs: Mutex<HashMap<String, Option<Id>>>,
    pub(crate) job_logs: Mutex<HashMap<Id, Vec<u8>>>,
}

impl InMemoryStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TRN -> id mapping, called by whichever insert helper
    /// creates the entity. Not exposed outside this crate; `CatalogRepository`
    /// is the only consumer that needs TRN resolution.
    pub(crate) fn index_trn(&self, trn: &str, id: Id) {
        self.trn_index.lock().unwrap().insert(trn.to_string(), id);
    }

    /// Register a workspace, keyed by its own id. There is no
    /// `WorkspaceRepository` trait anywhere in the workspace — every
    /// consumer that needs a workspace reaches it through `VariableSource`
    /// or `CatalogRepository`'s TRN index — so seeding one ahead of a test
    /// is a direct table write rather than a trait round trip.
    pub fn seed_workspace(&self, workspace: Workspace) {
        self.workspaces.lock().unwrap().insert(workspace.metadata.id, workspace);
    }

    /// Register a group, keyed by its own id. Needed alongside
    /// [`Self::seed_workspace`] only when a test also exercises
    /// `VariableSource::inherited_variables`, which walks `full_path`
    /// ancestry rather than following `Workspace::group_id`.
    pub fn seed_group(&self, group: Group) {
        self.groups.lock().unwrap().insert(group.metadata.id, group);
    }

    /// Register a managed identity, keyed by its own id.
    pub fn seed_managed_identity(&self, identity: ManagedIdentity) {
        self.managed_identities.lock().unwrap().insert(identity.metadata.id, identity);
    }

    /// Register an access rule, keyed by its own id. `AccessRuleSource`
    /// filters by `AccessRule::managed_identity_id`, not by this key.
    pub fn seed_access_rule(&self, rule: AccessRule) {
        self.access_rules.lock().unwrap().insert(rule.metadata.id, rule);
    }

    /// Append bytes to a job's log. Nothing in `LogSource` itself writes —
    /// a real deployment's execution backend streams bytes in out of band
    /// — so tests append directly.
    pub fn seed_job_log(&self, job_id: Id, bytes: &[u8]) {
        self.job_logs.lock().unwrap().entry(job_id).or_default().extend_from_slice(bytes);
    }

    /// Register a state version's owning run, or `None` for a manually
    /// uploaded one. Nothing in this crate originates state versions
    /// themselves (out of scope); `StateVersionSource::run_id_of` only
    /// reads this table back.
    pub fn seed_state_version(&self, state_version_id: &str, run_id: Option<Id>) {
        self.state_version_runs.lock().unwrap().insert(state_version_id.to_string(), run_id);
    }
}

/// Compare-and-swap an entity's [`orc_core::ResourceMetadata::version`]
/// against what's already stored: the incoming value's version must be
/// exactly one past whatever is on record, matching how every caller in
/// this workspace builds a candidate via `ResourceMetadata::bumped`.
pub(crate) fn check_cas(stored_version: i64, incoming_version: i64, id: Id) -> Result<(), orc_error::CoreError> {
    if incoming_version == stored_version + 1 {
        Ok(())
    } else {
        Err(orc_error::CoreError::conflict(format!(
            "optimistic concurrency conflict: expected version {}, got {}",
            stored_version + 1,
            incoming_version
        ))
        .with_context("entity_id", id.to_string()))
    }
}

/// A seed timestamp convenience re-exported for this crate's test modules.
#[cfg(test)]
pub(crate) fn test_now() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc)
}
