// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence contracts the rule enforcer resolves against. Mirrors
//! `orc-module`'s pattern of injecting narrow traits rather than depending
//! on a concrete store.

use orc_core::{AccessRule, Id};
use orc_error::CoreError;

/// Loads the access rules attached to a managed identity.
#[async_trait::async_trait]
pub trait AccessRuleSource: Send + Sync {
    /// All (non-deleted) rules owned by `managed_identity_id`, in no
    /// particular order — [`crate::enforce::enforce`] re-sorts them by rule
    /// id for deterministic OR evaluation.
    async fn rules_for_managed_identity(&self, managed_identity_id: Id) -> Result<Vec<AccessRule>, CoreError>;
}

/// The lineage facts a state-lineage check needs about the run a state
/// version was produced by.
#[derive(Debug, Clone)]
pub struct RunLineage {
    /// `true` if the run was a destroy run.
    pub destroy: bool,
    /// The run's module source string, if any.
    pub module_source: Option<String>,
}

/// Loads state-version provenance for the module-attestation rule's
/// optional lineage check (§4.4).
#[async_trait::async_trait]
pub trait StateVersionSource: Send + Sync {
    /// The run id that produced `state_version_id`, or `None` if it was
    /// uploaded manually (no owning run).
    async fn run_id_of(&self, state_version_id: &str) -> Result<Option<Id>, CoreError>;

    /// Lineage facts for `run_id`.
    async fn run_lineage(&self, run_id: Id) -> Result<RunLineage, CoreError>;
}
