// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence and variable-collation contracts the state machine resolves
//! against. Mirrors `orc-module`/`orc-policy`'s pattern of injecting narrow
//! traits rather than depending on a concrete store.

use chrono::{DateTime, Utc};
use orc_core::{Apply, GroupPath, Id, Job, Plan, Run, RunStage, RunVariable};
use orc_error::CoreError;

/// Loads and persists the three entities a run owns. Each `save_*` performs
/// the compare-and-swap against the entity's stored
/// [`orc_core::ResourceMetadata::version`] and returns `Conflict` on a
/// mismatch — callers build the candidate from a freshly-loaded copy and
/// never guess at the stored version.
#[async_trait::async_trait]
pub trait RunRepository: Send + Sync {
    /// Persist a brand-new run and its freshly-created plan and apply.
    async fn create(&self, run: Run, plan: Plan, apply: Apply) -> Result<(), CoreError>;

    /// Persist the effective (collated) variable set a run was created
    /// with, for later retrieval by `GetRunVariables`.
    async fn save_run_variables(&self, run_id: Id, variables: Vec<RunVariable>) -> Result<(), CoreError>;

    /// Load the effective variable set saved by [`Self::save_run_variables`]
    /// (§6 `GetRunVariables`). Sensitive-value redaction is the caller's
    /// responsibility via [`orc_core::RunVariable::redacted_for`], not
    /// this trait's.
    async fn get_run_variables(&self, run_id: Id) -> Result<Vec<RunVariable>, CoreError>;

    /// Load a run by id.
    async fn get_run(&self, run_id: Id) -> Result<Run, CoreError>;
    /// Load a plan by id.
    async fn get_plan(&self, plan_id: Id) -> Result<Plan, CoreError>;
    /// Load an apply by id.
    async fn get_apply(&self, apply_id: Id) -> Result<Apply, CoreError>;

    /// Store `run`, enforcing the optimistic-concurrency check against the
    /// currently-stored version.
    async fn save_run(&self, run: Run) -> Result<Run, CoreError>;
    /// Store `plan`, enforcing the optimistic-concurrency check against the
    /// currently-stored version.
    async fn save_plan(&self, plan: Plan) -> Result<Plan, CoreError>;
    /// Store `apply`, enforcing the optimistic-concurrency check against the
    /// currently-stored version.
    async fn save_apply(&self, apply: Apply) -> Result<Apply, CoreError>;
}

/// Resolves the namespace-inherited side of variable collation and the
/// workspace's group path, without exposing the group hierarchy itself to
/// this crate.
#[async_trait::async_trait]
pub trait VariableSource: Send + Sync {
    /// Namespace-inherited variables for `workspace_id`: the walk from the
    /// workspace up through its group and every ancestor group, root-scoped
    /// values first so a closer scope's value can be overridden by a
    /// farther one per the source's own precedence — this crate only
    /// applies run-supplied-wins on top of whatever order comes back.
    async fn inherited_variables(&self, workspace_id: Id) -> Result<Vec<RunVariable>, CoreError>;

    /// The full group path of the workspace's owning group, cached into
    /// every [`orc_events::Event`] this crate emits so ancestor-group
    /// subscription filters never need a repository round trip per publish.
    async fn workspace_group_path(&self, workspace_id: Id) -> Result<GroupPath, CoreError>;
}

/// Finds and signals the worker-side [`Job`] a cancel request targets.
#[async_trait::async_trait]
pub trait JobSource: Send + Sync {
    /// The live (non-terminal) job executing `stage` for `run_id`, if one
    /// exists yet.
    async fn active_job_for_run(&self, run_id: Id, stage: RunStage) -> Result<Option<Job>, CoreError>;

    /// Record a graceful cancel request against `job_id`.
    async fn request_job_cancel(&self, job_id: Id, requested_at: DateTime<Utc>) -> Result<(), CoreError>;
}
