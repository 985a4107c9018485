// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolve a run's module source, gate it through a managed identity's
//! access rules, and hand the stage's job off to the execution backend —
//! the `Module Resolver → Rule Enforcer → Job Dispatch` leg of the
//! principal control flow (§2).

use crate::RunService;
use orc_core::{Caller, GroupPath, Id, Job, ManagedIdentity, RunStage};
use orc_error::CoreError;
use orc_events::{Event, EventAction, EventBus, EventSubject};
use orc_module::{ModuleRegistrySource, ResolveContext, ResolvedSource};
use orc_policy::{enforce, AttestationCheckInput, EnforceDetails};

/// A caller's request to gate a run stage behind one of its managed
/// identities. Absent entirely, the stage dispatches without a rule check —
/// appropriate for a deployment that doesn't bind managed identities to
/// every workspace.
#[derive(Clone, Copy)]
pub struct IdentityGate<'a> {
    /// The managed identity whose rules gate this stage.
    pub managed_identity: &'a ManagedIdentity,
    /// The principal attempting to use it.
    pub caller: &'a Caller,
    /// State version id to check lineage against, if the run has reached
    /// that point and a lineage-verifying rule applies.
    pub current_state_version: Option<&'a str>,
}

impl RunService {
    /// Resolve `module_source` (if present) against this process's module
    /// resolver, then — if `gate` was supplied — enforce the managed
    /// identity's access rules for `stage` before the caller proceeds to
    /// dispatch.
    ///
    /// # Errors
    /// Whatever [`orc_module::resolve`] or [`orc_policy::enforce`] return.
    pub(crate) async fn resolve_and_enforce(
        &self,
        module_source: Option<&str>,
        module_digest: Option<&[u8]>,
        module_version: Option<&str>,
        workspace_group_path: &GroupPath,
        stage: RunStage,
        gate: Option<IdentityGate<'_>>,
    ) -> Result<(), CoreError> {
        let resolved = match module_source {
            Some(source) => {
                let ctx = ResolveContext {
                    http_client: self.http_client.clone(),
                    api_hostname: self.config.api_hostname.clone(),
                    workspace_group_path: workspace_group_path.clone(),
                    module_repository: self.module_repository.clone(),
                    federated_registries: self.federated_registries.clone(),
                    token_signer: self.token_signer.clone(),
                    token_expiry_secs: self.config.federated_registry_token_expiry_secs,
                    env_reader: std::sync::Arc::new(|name: &str| {
                        std::env::var(name)
                            .map_err(|_| CoreError::unauthenticated(format!("no credential configured for {name}")))
                    }),
                    discovery_base: std::sync::Arc::new(orc_module::default_discovery_base),
                };
                Some(orc_module::resolve(source, &ctx).await?)
            }
            None => None,
        };

        let Some(gate) = gate else { return Ok(()) };

        let module_source_ref: Option<&dyn ModuleRegistrySource> = match &resolved {
            Some(ResolvedSource::Source(source)) => Some(source.as_ref()),
            _ => None,
        };

        let details = EnforceDetails {
            run_stage: stage,
            attestation: AttestationCheckInput {
                module_source: module_source_ref,
                module_digest,
                module_version,
                current_state_version: gate.current_state_version,
            },
        };

        enforce(
            gate.managed_identity,
            gate.caller,
            &details,
            self.access_rules.as_ref(),
            self.state_versions.as_deref(),
        )
        .await
    }

    /// Dispatch `stage`'s job for `run_id` and publish the resulting Job
    /// event. `auth_token` is whatever credential the caller's identity
    /// provider already minted for the job to present to the execution
    /// backend — that minting is external to this core (§6).
    pub(crate) async fn dispatch_stage(
        &self,
        run_id: Id,
        workspace_id: Id,
        stage: RunStage,
        trn: impl Into<String>,
        auth_token: &str,
        max_duration_seconds: u32,
        workspace_group_path: &GroupPath,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Job, CoreError> {
        let job = orc_dispatch::dispatch_job(
            run_id,
            workspace_id,
            stage,
            trn,
            auth_token,
            max_duration_seconds,
            self.job_repository.as_ref(),
            self.execution_backend.as_ref(),
            now,
        )
        .await?;

        publish_job_event(&self.events, &job, workspace_group_path);
        Ok(job)
    }
}

fn publish_job_event(events: &EventBus, job: &Job, workspace_group_path: &GroupPath) {
    events.publish(&Event {
        action: EventAction::Update,
        run_id: job.run_id,
        workspace_id: job.workspace_id,
        workspace_group_path: workspace_group_path.clone(),
        subject: EventSubject::Job(Box::new(job.clone())),
    });
}
