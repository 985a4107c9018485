// SPDX-License-Identifier: MIT OR Apache-2.0
//! Service wiring for the policy-gated execution core (§6).
//!
//! [`RunService`] is the single entry point a gRPC server (or any other
//! framing layer, deliberately not this crate's concern) calls into for
//! every `CreateRun`/`ApplyRun`/`CancelRun`/`UpdatePlan`/`UpdateApply`/
//! `GetRunVariables`/`SubscribeToRunEvents`/`SubscribeToJobLogStream`
//! operation named in §6. It holds one `Arc<dyn Trait>` per capability the
//! rest of the workspace's crates inject, and its methods are thin
//! orchestration over the already-built free functions in `orc-runstate`
//! and `orc-dispatch` plus the resolve/enforce pipeline in `orc-module` and
//! `orc-policy` — no business rule lives here that isn't already owned by
//! one of those crates.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dispatch;
/// Run-event subscription.
pub mod events;
/// Job log pagination and subscription.
pub mod logs;
/// `CreateRun`, `ApplyRun`, `CancelRun`, `UpdatePlan`/`UpdateApply`,
/// `GetRunVariables`.
pub mod run;

pub use dispatch::IdentityGate;
pub use run::CreateRun;

#[cfg(test)]
mod test_support;

use orc_catalog::CatalogRepository;
use orc_config::OrchestratorConfig;
use orc_dispatch::{ExecutionBackend, JobRepository, LogSource};
use orc_events::EventBus;
use orc_module::{FederatedRegistryRepository, ModuleRepository};
use orc_policy::{AccessRuleSource, StateVersionSource};
use orc_runstate::{JobSource, RunRepository, VariableSource};
use orc_token::TokenSigner;
use std::sync::Arc;

/// Every injected capability a [`RunService`] is built from. Grouped into
/// one struct because none of them have a sensible default — a caller
/// assembles this once at startup from its chosen persistence and
/// execution backends.
pub struct RunServiceDeps {
    /// Resource Catalog (§4.8).
    pub catalog: Arc<dyn CatalogRepository>,
    /// Run/Plan/Apply persistence (§4.3).
    pub run_repository: Arc<dyn RunRepository>,
    /// Namespace-inherited variable resolution (§4.3).
    pub variables: Arc<dyn VariableSource>,
    /// Active-job lookup for cancellation (§4.3).
    pub job_source: Arc<dyn JobSource>,
    /// Job persistence for dispatch (§4.4).
    pub job_repository: Arc<dyn JobRepository>,
    /// The opaque external scheduler (§4.4).
    pub execution_backend: Arc<dyn ExecutionBackend>,
    /// Raw log byte storage (§4.6).
    pub log_source: Arc<dyn LogSource>,
    /// Access-rule enumeration (§4.4, §5).
    pub access_rules: Arc<dyn AccessRuleSource>,
    /// State-lineage lookup, absent if this deployment has no state-version
    /// tracking wired up — `verify_state_lineage` rules then hard-fail per
    /// `orc_policy::enforce`'s own contract.
    pub state_versions: Option<Arc<dyn StateVersionSource>>,
    /// Local-module persistence (§4.5).
    pub module_repository: Arc<dyn ModuleRepository>,
    /// Federated-registry visibility lookup (§4.5).
    pub federated_registries: Arc<dyn FederatedRegistryRepository>,
    /// Signer for tokens minted against federated registries (§4.1, §5).
    pub token_signer: Arc<TokenSigner>,
    /// HTTP client shared by service discovery and registry calls.
    pub http_client: reqwest::Client,
}

/// The wired-up execution core. Construct once at startup from
/// [`RunServiceDeps`] and a [`OrchestratorConfig`]; every operation method
/// borrows `&self`, so a single instance is expected to be shared (behind
/// an `Arc`, by the caller) across every inbound RPC handler.
pub struct RunService {
    pub(crate) catalog: Arc<dyn CatalogRepository>,
    pub(crate) run_repository: Arc<dyn RunRepository>,
    pub(crate) variables: Arc<dyn VariableSource>,
    pub(crate) job_source: Arc<dyn JobSource>,
    pub(crate) job_repository: Arc<dyn JobRepository>,
    pub(crate) execution_backend: Arc<dyn ExecutionBackend>,
    pub(crate) log_source: Arc<dyn LogSource>,
    pub(crate) access_rules: Arc<dyn AccessRuleSource>,
    pub(crate) state_versions: Option<Arc<dyn StateVersionSource>>,
    pub(crate) module_repository: Arc<dyn ModuleRepository>,
    pub(crate) federated_registries: Arc<dyn FederatedRegistryRepository>,
    pub(crate) token_signer: Arc<TokenSigner>,
    pub(crate) http_client: reqwest::Client,
    /// Fan-out for every committed Run/Plan/Apply/Job transition.
    pub events: EventBus,
    /// Recognised startup options (§6 Configuration).
    pub config: OrchestratorConfig,
}

impl RunService {
    /// Wire up a new service instance. `events` starts empty — subscribers
    /// register through [`events::subscribe_to_run_events`] after
    /// construction.
    #[must_use]
    pub fn new(deps: RunServiceDeps, config: OrchestratorConfig) -> Self {
        Self {
            catalog: deps.catalog,
            run_repository: deps.run_repository,
            variables: deps.variables,
            job_source: deps.job_source,
            job_repository: deps.job_repository,
            execution_backend: deps.execution_backend,
            log_source: deps.log_source,
            access_rules: deps.access_rules,
            state_versions: deps.state_versions,
            module_repository: deps.module_repository,
            federated_registries: deps.federated_registries,
            token_signer: deps.token_signer,
            http_client: deps.http_client,
            events: EventBus::new(),
            config,
        }
    }
}
