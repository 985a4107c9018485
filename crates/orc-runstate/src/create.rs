// SPDX-License-Identifier: MIT OR Apache-2.0
//! `CreateRun` (§4.3, §6): build a new Run with its Plan and Apply, collate
//! its effective variables, and queue it for planning.

use crate::repository::{RunRepository, VariableSource};
use crate::variables::effective_variables;
use chrono::{DateTime, Utc};
use orc_core::{Apply, ApplyStatus, ForceCancelState, Id, Plan, PlanStatus, ResourceMetadata, Run, RunStatus, RunVariable};
use orc_error::CoreError;
use orc_events::{Event, EventAction, EventBus, EventSubject};

/// Caller-supplied facts for a new run. Mirrors the `CreateRun` input
/// highlights named in §6 one field at a time rather than as a single
/// catch-all map, so a missing field is a compile error, not a runtime one.
pub struct CreateRunInput {
    /// Owning workspace.
    pub workspace_id: Id,
    /// Creator's principal id.
    pub created_by: String,
    /// Configuration-version reference, mutually exclusive in intent with
    /// `module_source` — see `DESIGN.md` for the precedence this core
    /// applies when both are supplied.
    pub configuration_version_id: Option<Id>,
    /// Module source string.
    pub module_source: Option<String>,
    /// Resolved module version.
    pub module_version: Option<String>,
    /// Resolved module digest.
    pub module_digest: Option<Vec<u8>>,
    /// Destroy-plan flag.
    pub destroy: bool,
    /// Refresh-state flag.
    pub refresh: bool,
    /// Refresh-only flag.
    pub refresh_only: bool,
    /// Ordered `-target` addresses.
    pub target_addresses: Vec<String>,
    /// Speculative runs terminate at `planned` — no apply.
    pub speculative: bool,
    /// Auto-transition `planned → apply_queued` without a separate
    /// `ApplyRun` call.
    pub auto_apply: bool,
    /// Run-supplied variables, which win over namespace-inherited ones on
    /// key collision.
    pub variables: Vec<RunVariable>,
}

/// Create a run: validate the module-field invariant, collate its
/// effective variables, persist the run with its plan and apply both
/// `pending`, queue it (`pending → plan_queued`), and publish a `create`
/// event.
///
/// # Errors
/// [`orc_error::ErrorKind::Invalid`] if `module_source`, `module_version`,
/// and `module_digest` are not all present or all absent.
pub async fn create_run(
    input: CreateRunInput,
    repository: &dyn RunRepository,
    variables: &dyn VariableSource,
    events: &EventBus,
    now: DateTime<Utc>,
) -> Result<Run, CoreError> {
    let run_id = Id::new_v4();
    let plan_id = Id::new_v4();
    let apply_id = Id::new_v4();
    let group_path = variables.workspace_group_path(input.workspace_id).await?;

    let mut run = Run {
        metadata: ResourceMetadata::new(run_id, format!("trn:run:{}/run-{run_id}", group_path.0), now),
        workspace_id: input.workspace_id,
        created_by: input.created_by,
        plan_id,
        apply_id,
        configuration_version_id: input.configuration_version_id,
        module_source: input.module_source,
        module_version: input.module_version,
        module_digest: input.module_digest,
        destroy: input.destroy,
        refresh: input.refresh,
        refresh_only: input.refresh_only,
        target_addresses: input.target_addresses,
        speculative: input.speculative,
        auto_apply: input.auto_apply,
        force_cancel: ForceCancelState::default(),
        status: RunStatus::Pending,
        has_changes: None,
    };
    if !run.module_fields_consistent() {
        return Err(CoreError::invalid(
            "module_source, module_version, and module_digest must be all present or all absent",
        ));
    }

    let effective = effective_variables(input.workspace_id, &input.variables, variables).await?;

    let plan = Plan {
        metadata: ResourceMetadata::new(plan_id, format!("trn:plan:{}/run-{run_id}", group_path.0), now),
        run_id,
        status: PlanStatus::Pending,
        error_message: None,
        summary: None,
        has_binary_data: false,
    };
    let apply = Apply {
        metadata: ResourceMetadata::new(apply_id, format!("trn:apply:{}/run-{run_id}", group_path.0), now),
        run_id,
        status: ApplyStatus::Pending,
        error_message: None,
        triggered_by: String::new(),
    };

    repository.create(run.clone(), plan, apply).await?;
    repository.save_run_variables(run_id, effective).await?;

    run.status = RunStatus::PlanQueued;
    run.metadata = run.metadata.bumped(now);
    let run = repository.save_run(run).await?;

    events.publish(&Event {
        action: EventAction::Create,
        run_id,
        workspace_id: run.workspace_id,
        workspace_group_path: group_path,
        subject: EventSubject::Run(Box::new(run.clone())),
    });

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::GroupPath;
    use orc_error::ErrorKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryRepo {
        runs: Mutex<std::collections::HashMap<Id, Run>>,
    }

    #[async_trait::async_trait]
    impl RunRepository for InMemoryRepo {
        async fn create(&self, run: Run, _plan: Plan, _apply: Apply) -> Result<(), CoreError> {
            self.runs.lock().unwrap().insert(run.metadata.id, run);
            Ok(())
        }
        async fn save_run_variables(&self, _run_id: Id, _variables: Vec<RunVariable>) -> Result<(), CoreError> {
            Ok(())
        }
        async fn get_run_variables(&self, _run_id: Id) -> Result<Vec<RunVariable>, CoreError> {
            unimplemented!("not exercised by create_run tests")
        }
        async fn get_run(&self, run_id: Id) -> Result<Run, CoreError> {
            self.runs.lock().unwrap().get(&run_id).cloned().ok_or_else(|| CoreError::not_found("run"))
        }
        async fn get_plan(&self, _plan_id: Id) -> Result<Plan, CoreError> {
            unimplemented!("not exercised by create_run tests")
        }
        async fn get_apply(&self, _apply_id: Id) -> Result<Apply, CoreError> {
            unimplemented!("not exercised by create_run tests")
        }
        async fn save_run(&self, run: Run) -> Result<Run, CoreError> {
            self.runs.lock().unwrap().insert(run.metadata.id, run.clone());
            Ok(run)
        }
        async fn save_plan(&self, plan: Plan) -> Result<Plan, CoreError> {
            Ok(plan)
        }
        async fn save_apply(&self, apply: Apply) -> Result<Apply, CoreError> {
            Ok(apply)
        }
    }

    struct NoVariables;

    #[async_trait::async_trait]
    impl VariableSource for NoVariables {
        async fn inherited_variables(&self, _workspace_id: Id) -> Result<Vec<RunVariable>, CoreError> {
            Ok(vec![])
        }
        async fn workspace_group_path(&self, _workspace_id: Id) -> Result<GroupPath, CoreError> {
            Ok(GroupPath::new("acme"))
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn base_input() -> CreateRunInput {
        CreateRunInput {
            workspace_id: Id::new_v4(),
            created_by: "u1".into(),
            configuration_version_id: Some(Id::new_v4()),
            module_source: None,
            module_version: None,
            module_digest: None,
            destroy: false,
            refresh: true,
            refresh_only: false,
            target_addresses: vec![],
            speculative: false,
            auto_apply: false,
            variables: vec![],
        }
    }

    #[tokio::test]
    async fn new_run_starts_at_plan_queued() {
        let repo = InMemoryRepo::default();
        let events = EventBus::new();
        let run = create_run(base_input(), &repo, &NoVariables, &events, now()).await.unwrap();
        assert_eq!(run.status, RunStatus::PlanQueued);
    }

    #[tokio::test]
    async fn inconsistent_module_fields_are_rejected() {
        let repo = InMemoryRepo::default();
        let events = EventBus::new();
        let mut input = base_input();
        input.configuration_version_id = None;
        input.module_source = Some("registry.example.com/ns/m/aws".into());

        let err = create_run(input, &repo, &NoVariables, &events, now()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Invalid);
    }
}
