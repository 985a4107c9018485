// SPDX-License-Identifier: MIT OR Apache-2.0
//! `CreateRun`, `ApplyRun`, `CancelRun`, `UpdatePlan`/`UpdateApply`, and
//! `GetRunVariables` (§6) — thin wrappers over `orc-runstate`'s free
//! functions that add the module-resolution and rule-enforcement gate
//! `orc-runstate` itself has no knowledge of.

use crate::dispatch::IdentityGate;
use crate::RunService;
use chrono::{DateTime, Utc};
use orc_core::{Id, Run, RunStage, RunVariable};
use orc_error::CoreError;
use orc_runstate::CreateRunInput;

/// Dispatch facts for the Apply stage a `planned` run with `auto_apply` set
/// queues and dispatches on its own, with no separate `ApplyRun` call.
pub struct AutoApplyDispatch<'a> {
    /// Gates the Apply stage's job dispatch, same as [`CreateRun::plan_gate`].
    pub apply_gate: Option<IdentityGate<'a>>,
    /// Credential the execution backend should receive for the Apply job.
    pub runner_auth_token: String,
    /// Per-job wall-clock budget.
    pub max_duration_seconds: u32,
}

/// `CreateRun` input: the caller-supplied run facts plus the optional
/// managed-identity gate the Plan stage is dispatched behind.
pub struct CreateRun<'a> {
    /// Fields forwarded verbatim to [`orc_runstate::create_run`].
    pub input: CreateRunInput,
    /// Gates the Plan stage's job dispatch, if this deployment binds
    /// managed identities to workspaces.
    pub plan_gate: Option<IdentityGate<'a>>,
    /// Credential the execution backend should receive for the Plan job,
    /// minted by an external identity provider (§6) — this core only
    /// forwards it.
    pub runner_auth_token: String,
    /// Per-job wall-clock budget.
    pub max_duration_seconds: u32,
}

impl RunService {
    /// Resolve the run's module source (if any), enforce `plan_gate`,
    /// create the Run/Plan/Apply trio, and dispatch the Plan job.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::Invalid`] from [`orc_runstate::create_run`]'s
    /// own module-field check. [`orc_error::ErrorKind::Forbidden`] if
    /// `plan_gate` was supplied and its rules reject. [`orc_error::ErrorKind::NotFound`]
    /// if the workspace doesn't exist.
    pub async fn create_run(&self, request: CreateRun<'_>, now: DateTime<Utc>) -> Result<Run, CoreError> {
        let workspace_group_path = self.variables.workspace_group_path(request.input.workspace_id).await?;

        self.resolve_and_enforce(
            request.input.module_source.as_deref(),
            request.input.module_digest.as_deref(),
            request.input.module_version.as_deref(),
            &workspace_group_path,
            RunStage::Plan,
            request.plan_gate,
        )
        .await?;

        let run = orc_runstate::create_run(
            request.input,
            self.run_repository.as_ref(),
            self.variables.as_ref(),
            &self.events,
            now,
        )
        .await?;

        if run.speculative {
            return Ok(run);
        }

        self.dispatch_stage(
            run.metadata.id,
            run.workspace_id,
            RunStage::Plan,
            format!("trn:job:{}/run-{}/plan", workspace_group_path.0, run.metadata.id),
            &request.runner_auth_token,
            request.max_duration_seconds,
            &workspace_group_path,
            now,
        )
        .await?;

        Ok(run)
    }

    /// `ApplyRun` (§6): transition a planned run to `apply_queued` and
    /// dispatch the Apply job, optionally gated the same way [`Self::create_run`]
    /// gates the Plan stage.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::Conflict`] if the run isn't `planned`, or is
    /// speculative. [`orc_error::ErrorKind::Forbidden`] if `apply_gate`
    /// rejects.
    pub async fn apply_run(
        &self,
        run_id: Id,
        triggered_by: &str,
        apply_gate: Option<IdentityGate<'_>>,
        runner_auth_token: &str,
        max_duration_seconds: u32,
        now: DateTime<Utc>,
    ) -> Result<Run, CoreError> {
        let run = self.run_repository.get_run(run_id).await?;
        let workspace_group_path = self.variables.workspace_group_path(run.workspace_id).await?;

        self.resolve_and_enforce(
            run.module_source.as_deref(),
            run.module_digest.as_deref(),
            run.module_version.as_deref(),
            &workspace_group_path,
            RunStage::Apply,
            apply_gate,
        )
        .await?;

        let run = orc_runstate::apply_run(
            run_id,
            triggered_by,
            self.run_repository.as_ref(),
            &workspace_group_path,
            &self.events,
            now,
        )
        .await?;

        self.dispatch_stage(
            run_id,
            run.workspace_id,
            RunStage::Apply,
            format!("trn:job:{}/run-{}/apply", workspace_group_path.0, run_id),
            runner_auth_token,
            max_duration_seconds,
            &workspace_group_path,
            now,
        )
        .await?;

        Ok(run)
    }

    /// `CancelRun` (§6), graceful form.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::Conflict`] if the run is already terminal.
    pub async fn request_cancel(&self, run_id: Id, now: DateTime<Utc>) -> Result<Run, CoreError> {
        let run = self.run_repository.get_run(run_id).await?;
        let workspace_group_path = self.variables.workspace_group_path(run.workspace_id).await?;
        orc_runstate::request_cancel(
            run_id,
            self.config.cancel_grace_period_secs,
            self.run_repository.as_ref(),
            self.job_source.as_ref(),
            &workspace_group_path,
            &self.events,
            now,
        )
        .await
    }

    /// `CancelRun` (§6), force form.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::Conflict`] if force-cancel isn't yet
    /// available and `is_administrator` is `false`, or the run has no
    /// active phase.
    pub async fn force_cancel(
        &self,
        run_id: Id,
        caller_id: &str,
        is_administrator: bool,
        now: DateTime<Utc>,
    ) -> Result<Run, CoreError> {
        let run = self.run_repository.get_run(run_id).await?;
        let workspace_group_path = self.variables.workspace_group_path(run.workspace_id).await?;
        orc_runstate::force_cancel(
            run_id,
            caller_id,
            is_administrator,
            self.run_repository.as_ref(),
            &workspace_group_path,
            &self.events,
            now,
        )
        .await
    }

    /// `UpdatePlan` (§6). A run that reaches `planned` with `auto_apply` set
    /// queues and dispatches the Apply stage immediately — `auto_apply_dispatch`
    /// supplies what that dispatch needs; a `planned` transition with
    /// `auto_apply` set but no dispatch facts supplied leaves the run
    /// `planned` rather than silently skipping the apply.
    ///
    /// # Errors
    /// See [`orc_runstate::update_plan`]. [`orc_error::ErrorKind::Forbidden`]
    /// if `auto_apply_dispatch`'s gate rejects. [`orc_error::ErrorKind::Internal`]
    /// if the run has `auto_apply` set and reaches `planned` but no
    /// `auto_apply_dispatch` was supplied.
    pub async fn update_plan(
        &self,
        input: orc_runstate::UpdatePlanInput,
        auto_apply_dispatch: Option<AutoApplyDispatch<'_>>,
        now: DateTime<Utc>,
    ) -> Result<orc_core::Plan, CoreError> {
        let plan = self.run_repository.get_plan(input.plan_id).await?;
        let run = self.run_repository.get_run(plan.run_id).await?;
        let workspace_group_path = self.variables.workspace_group_path(run.workspace_id).await?;
        let will_auto_apply =
            input.status == orc_core::PlanStatus::Finished && run.auto_apply && !run.speculative;

        if will_auto_apply {
            self.resolve_and_enforce(
                run.module_source.as_deref(),
                run.module_digest.as_deref(),
                run.module_version.as_deref(),
                &workspace_group_path,
                RunStage::Apply,
                auto_apply_dispatch.as_ref().and_then(|d| d.apply_gate),
            )
            .await?;
        }

        let updated =
            orc_runstate::update_plan(input, self.run_repository.as_ref(), &workspace_group_path, &self.events, now)
                .await?;

        if will_auto_apply {
            let Some(dispatch) = auto_apply_dispatch else {
                return Err(CoreError::internal(
                    "run has auto_apply set but UpdatePlan was called with no auto_apply_dispatch",
                ));
            };

            let run = orc_runstate::apply_run(
                run.metadata.id,
                &run.created_by,
                self.run_repository.as_ref(),
                &workspace_group_path,
                &self.events,
                now,
            )
            .await?;

            self.dispatch_stage(
                run.metadata.id,
                run.workspace_id,
                RunStage::Apply,
                format!("trn:job:{}/run-{}/apply", workspace_group_path.0, run.metadata.id),
                &dispatch.runner_auth_token,
                dispatch.max_duration_seconds,
                &workspace_group_path,
                now,
            )
            .await?;
        }

        Ok(updated)
    }

    /// `UpdateApply` (§6).
    ///
    /// # Errors
    /// See [`orc_runstate::update_apply`].
    pub async fn update_apply(
        &self,
        input: orc_runstate::UpdateApplyInput,
        now: DateTime<Utc>,
    ) -> Result<orc_core::Apply, CoreError> {
        let apply = self.run_repository.get_apply(input.apply_id).await?;
        let run = self.run_repository.get_run(apply.run_id).await?;
        let workspace_group_path = self.variables.workspace_group_path(run.workspace_id).await?;
        orc_runstate::update_apply(input, self.run_repository.as_ref(), &workspace_group_path, &self.events, now)
            .await
    }

    /// `GetRunVariables` (§6): the collated variable set saved at
    /// creation, with sensitive values redacted unless `include_sensitive`.
    ///
    /// # Errors
    /// Whatever [`orc_runstate::RunRepository::get_run_variables`] returns.
    pub async fn get_run_variables(
        &self,
        run_id: Id,
        include_sensitive: bool,
    ) -> Result<Vec<RunVariable>, CoreError> {
        let vars = self.run_repository.get_run_variables(run_id).await?;
        Ok(vars.into_iter().map(|v| v.redacted_for(include_sensitive)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::IdentityGate;
    use crate::test_support::{now, seeded_store, service, RecordingBackend, StubBackend};
    use orc_core::{AccessRule, Caller, ManagedIdentity, ResourceMetadata, RuleType, VariableCategory};
    use std::sync::Arc;

    fn create_input(workspace_id: Id) -> CreateRunInput {
        CreateRunInput {
            workspace_id,
            created_by: "user-1".to_string(),
            configuration_version_id: None,
            module_source: None,
            module_version: None,
            module_digest: None,
            destroy: false,
            refresh: false,
            refresh_only: false,
            target_addresses: Vec::new(),
            speculative: false,
            auto_apply: false,
            variables: vec![RunVariable::new("region", "us-east-1", VariableCategory::Terraform)],
        }
    }

    #[tokio::test]
    async fn create_run_dispatches_the_plan_job_when_not_speculative() {
        let (store, workspace_id) = seeded_store();
        let backend = Arc::new(RecordingBackend::default());
        let svc = service(store, backend.clone());

        let run = svc
            .create_run(
                CreateRun { input: create_input(workspace_id), plan_gate: None, runner_auth_token: "tok".into(), max_duration_seconds: 3600 },
                now(),
            )
            .await
            .unwrap();

        assert!(!run.speculative);
        assert_eq!(backend.dispatched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_run_skips_dispatch_for_speculative_runs() {
        let (store, workspace_id) = seeded_store();
        let backend = Arc::new(RecordingBackend::default());
        let svc = service(store, backend.clone());

        let mut input = create_input(workspace_id);
        input.speculative = true;
        svc.create_run(CreateRun { input, plan_gate: None, runner_auth_token: "tok".into(), max_duration_seconds: 3600 }, now())
            .await
            .unwrap();

        assert!(backend.dispatched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_run_rejects_caller_not_eligible_under_plan_gate() {
        let (store, workspace_id) = seeded_store();
        let svc = service(store.clone(), Arc::new(StubBackend("ext-1")));

        let identity = ManagedIdentity {
            metadata: ResourceMetadata::new(Id::new_v4(), "trn:identity:acme/ci", now()),
            name: "ci".to_string(),
            group_id: Id::new_v4(),
            provider_type: "aws".to_string(),
            deleted: false,
        };
        store.seed_access_rule(AccessRule {
            metadata: ResourceMetadata::new(Id::new_v4(), "trn:rule:1", now()),
            managed_identity_id: identity.metadata.id,
            run_stage: RunStage::Plan,
            rule_type: RuleType::EligiblePrincipals,
            allowed_user_ids: Default::default(),
            allowed_service_account_ids: std::collections::BTreeSet::from(["deploy-bot".to_string()]),
            allowed_team_ids: Default::default(),
            module_attestation_policies: Vec::new(),
            verify_state_lineage: false,
        });

        let caller = Caller::service_account("someone-else");
        let gate = IdentityGate { managed_identity: &identity, caller: &caller, current_state_version: None };

        let err = svc
            .create_run(
                CreateRun { input: create_input(workspace_id), plan_gate: Some(gate), runner_auth_token: "tok".into(), max_duration_seconds: 3600 },
                now(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, orc_error::ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn apply_run_dispatches_the_apply_job() {
        use orc_core::{Apply, ApplyStatus, ForceCancelState, Plan, PlanStatus, RunStatus};
        use orc_runstate::RunRepository;

        let (store, workspace_id) = seeded_store();
        let backend = Arc::new(RecordingBackend::default());
        let svc = service(store.clone(), backend.clone());

        let run_id = Id::new_v4();
        let plan_id = Id::new_v4();
        let apply_id = Id::new_v4();
        let run = Run {
            metadata: ResourceMetadata::new(run_id, "trn:run:acme/run-1", now()),
            workspace_id,
            created_by: "user-1".to_string(),
            plan_id,
            apply_id,
            configuration_version_id: None,
            module_source: None,
            module_version: None,
            module_digest: None,
            destroy: false,
            refresh: false,
            refresh_only: false,
            target_addresses: Vec::new(),
            speculative: false,
            auto_apply: false,
            force_cancel: ForceCancelState::default(),
            status: RunStatus::Planned,
            has_changes: Some(true),
        };
        let plan = Plan {
            metadata: ResourceMetadata::new(plan_id, "trn:plan:acme/run-1", now()),
            run_id,
            status: PlanStatus::Finished,
            error_message: None,
            summary: None,
            has_binary_data: false,
        };
        let apply = Apply {
            metadata: ResourceMetadata::new(apply_id, "trn:apply:acme/run-1", now()),
            run_id,
            status: ApplyStatus::Pending,
            error_message: None,
            triggered_by: String::new(),
        };
        store.create(run, plan, apply).await.unwrap();

        svc.apply_run(run_id, "user-1", None, "tok", 3600, now()).await.unwrap();
        assert_eq!(backend.dispatched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_plan_auto_applies_when_plan_finishes() {
        use orc_core::RunStatus;
        use orc_runstate::UpdatePlanInput;

        let (store, workspace_id) = seeded_store();
        let backend = Arc::new(RecordingBackend::default());
        let svc = service(store.clone(), backend.clone());

        let run_id = Id::new_v4();
        let plan_id = Id::new_v4();
        let apply_id = Id::new_v4();
        let run = Run {
            metadata: ResourceMetadata::new(run_id, "trn:run:acme/run-1", now()),
            workspace_id,
            created_by: "user-1".to_string(),
            plan_id,
            apply_id,
            configuration_version_id: None,
            module_source: None,
            module_version: None,
            module_digest: None,
            destroy: false,
            refresh: false,
            refresh_only: false,
            target_addresses: Vec::new(),
            speculative: false,
            auto_apply: true,
            force_cancel: orc_core::ForceCancelState::default(),
            status: RunStatus::Planning,
            has_changes: None,
        };
        let plan = orc_core::Plan {
            metadata: ResourceMetadata::new(plan_id, "trn:plan:acme/run-1", now()),
            run_id,
            status: orc_core::PlanStatus::Running,
            error_message: None,
            summary: None,
            has_binary_data: false,
        };
        let apply = orc_core::Apply {
            metadata: ResourceMetadata::new(apply_id, "trn:apply:acme/run-1", now()),
            run_id,
            status: orc_core::ApplyStatus::Pending,
            error_message: None,
            triggered_by: String::new(),
        };
        store.create(run, plan, apply).await.unwrap();

        let input = UpdatePlanInput {
            plan_id,
            status: orc_core::PlanStatus::Finished,
            summary: None,
            error_message: None,
            version: 0,
        };
        let dispatch = AutoApplyDispatch { apply_gate: None, runner_auth_token: "tok".into(), max_duration_seconds: 3600 };
        svc.update_plan(input, Some(dispatch), now()).await.unwrap();

        assert_eq!(backend.dispatched.lock().unwrap().len(), 1);

        use orc_runstate::RunRepository;
        let updated_run = store.get_run(run_id).await.unwrap();
        assert_eq!(updated_run.status, RunStatus::ApplyQueued);
    }

    #[tokio::test]
    async fn update_plan_with_auto_apply_and_no_dispatch_facts_is_internal_error() {
        use orc_core::RunStatus;
        use orc_runstate::UpdatePlanInput;

        let (store, workspace_id) = seeded_store();
        let svc = service(store.clone(), Arc::new(StubBackend("ext-1")));

        let run_id = Id::new_v4();
        let plan_id = Id::new_v4();
        let apply_id = Id::new_v4();
        let run = Run {
            metadata: ResourceMetadata::new(run_id, "trn:run:acme/run-1", now()),
            workspace_id,
            created_by: "user-1".to_string(),
            plan_id,
            apply_id,
            configuration_version_id: None,
            module_source: None,
            module_version: None,
            module_digest: None,
            destroy: false,
            refresh: false,
            refresh_only: false,
            target_addresses: Vec::new(),
            speculative: false,
            auto_apply: true,
            force_cancel: orc_core::ForceCancelState::default(),
            status: RunStatus::Planning,
            has_changes: None,
        };
        let plan = orc_core::Plan {
            metadata: ResourceMetadata::new(plan_id, "trn:plan:acme/run-1", now()),
            run_id,
            status: orc_core::PlanStatus::Running,
            error_message: None,
            summary: None,
            has_binary_data: false,
        };
        let apply = orc_core::Apply {
            metadata: ResourceMetadata::new(apply_id, "trn:apply:acme/run-1", now()),
            run_id,
            status: orc_core::ApplyStatus::Pending,
            error_message: None,
            triggered_by: String::new(),
        };
        store.create(run, plan, apply).await.unwrap();

        let input = UpdatePlanInput {
            plan_id,
            status: orc_core::PlanStatus::Finished,
            summary: None,
            error_message: None,
            version: 0,
        };
        let err = svc.update_plan(input, None, now()).await.unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn get_run_variables_redacts_sensitive_values_by_default() {
        let (store, workspace_id) = seeded_store();
        let svc = service(store, Arc::new(StubBackend("ext-1")));

        let mut input = create_input(workspace_id);
        input.variables = vec![RunVariable { sensitive: true, ..RunVariable::new("db_password", "hunter2", VariableCategory::Environment) }];
        let run = svc
            .create_run(CreateRun { input, plan_gate: None, runner_auth_token: "tok".into(), max_duration_seconds: 3600 }, now())
            .await
            .unwrap();

        let redacted = svc.get_run_variables(run.metadata.id, false).await.unwrap();
        assert_eq!(redacted[0].value, None);

        let plain = svc.get_run_variables(run.metadata.id, true).await.unwrap();
        assert_eq!(plain[0].value.as_deref(), Some("hunter2"));
    }
}
