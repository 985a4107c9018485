// SPDX-License-Identifier: MIT OR Apache-2.0
//! `UpdatePlan` / `UpdateApply` (§4.3, §6): version-checked, transition-
//! validated phase updates that drive the owning Run's own status forward
//! and publish the resulting events in commit order.

use crate::repository::RunRepository;
use crate::transitions::{run_status_after_apply, run_status_after_plan, valid_phase_transition, JobPhaseStatus};
use chrono::{DateTime, Utc};
use orc_core::{Apply, ApplyStatus, GroupPath, Id, Plan, PlanStatus, PlanSummary, RunStatus};
use orc_error::CoreError;
use orc_events::{Event, EventAction, EventBus, EventSubject};

/// Caller-supplied fields for an `UpdatePlan` call.
pub struct UpdatePlanInput {
    /// The plan to update.
    pub plan_id: Id,
    /// Requested new status.
    pub status: PlanStatus,
    /// Resource-level summary, set once `status` is `Finished`.
    pub summary: Option<PlanSummary>,
    /// Error detail, set once `status` is `Errored`.
    pub error_message: Option<String>,
    /// Caller-supplied optimistic-concurrency version.
    pub version: i64,
}

/// Caller-supplied fields for an `UpdateApply` call.
pub struct UpdateApplyInput {
    /// The apply to update.
    pub apply_id: Id,
    /// Requested new status.
    pub status: ApplyStatus,
    /// Error detail, set once `status` is `Errored`.
    pub error_message: Option<String>,
    /// Caller-supplied optimistic-concurrency version.
    pub version: i64,
}

/// Apply a plan-phase transition: check the supplied version against the
/// stored one, validate the transition is one `UpdatePlan` itself (not the
/// cancel path) may make, persist the plan, and — if the transition carries
/// a Run-level consequence — advance the owning Run and publish both
/// events in commit order.
///
/// # Errors
/// [`orc_error::ErrorKind::Conflict`] on a version mismatch.
/// [`orc_error::ErrorKind::Invalid`] on a foreign transition.
pub async fn update_plan(
    input: UpdatePlanInput,
    repository: &dyn RunRepository,
    workspace_group_path: &GroupPath,
    events: &EventBus,
    now: DateTime<Utc>,
) -> Result<Plan, CoreError> {
    let current = repository.get_plan(input.plan_id).await?;
    current.metadata.check_version(input.version)?;
    if !valid_phase_transition(current.status, input.status, false) {
        return Err(CoreError::invalid(format!(
            "illegal plan transition {:?} -> {:?}",
            current.status, input.status
        )));
    }
    let run = repository.get_run(current.run_id).await?;

    let mut updated = current.clone();
    updated.status = input.status;
    updated.summary = input.summary.or(current.summary);
    updated.error_message = input.error_message.or(current.error_message);
    updated.metadata = current.metadata.bumped(now);
    let updated = repository.save_plan(updated).await?;

    let run_id = updated.run_id;
    events.publish(&Event {
        action: phase_event_action(updated.status),
        run_id,
        workspace_id: run.workspace_id,
        workspace_group_path: workspace_group_path.clone(),
        subject: EventSubject::Plan(Box::new(updated.clone())),
    });

    if let Some(next_run_status) = run_status_after_plan(updated.status) {
        advance_run(repository, run, next_run_status, updated.summary, workspace_group_path, events, now).await?;
    }

    Ok(updated)
}

/// Apply an apply-phase transition. See [`update_plan`] for the shared
/// version/transition/derivation contract.
pub async fn update_apply(
    input: UpdateApplyInput,
    repository: &dyn RunRepository,
    workspace_group_path: &GroupPath,
    events: &EventBus,
    now: DateTime<Utc>,
) -> Result<Apply, CoreError> {
    let current = repository.get_apply(input.apply_id).await?;
    current.metadata.check_version(input.version)?;
    if !valid_phase_transition(current.status, input.status, false) {
        return Err(CoreError::invalid(format!(
            "illegal apply transition {:?} -> {:?}",
            current.status, input.status
        )));
    }
    let run = repository.get_run(current.run_id).await?;

    let mut updated = current.clone();
    updated.status = input.status;
    updated.error_message = input.error_message.or(current.error_message);
    updated.metadata = current.metadata.bumped(now);
    let updated = repository.save_apply(updated).await?;

    let run_id = updated.run_id;
    events.publish(&Event {
        action: phase_event_action(updated.status),
        run_id,
        workspace_id: run.workspace_id,
        workspace_group_path: workspace_group_path.clone(),
        subject: EventSubject::Apply(Box::new(updated.clone())),
    });

    if let Some(next_run_status) = run_status_after_apply(updated.status) {
        advance_run(repository, run, next_run_status, None, workspace_group_path, events, now).await?;
    }

    Ok(updated)
}

async fn advance_run(
    repository: &dyn RunRepository,
    mut run: orc_core::Run,
    next_status: RunStatus,
    summary: Option<PlanSummary>,
    workspace_group_path: &GroupPath,
    events: &EventBus,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    let run_id = run.metadata.id;
    if !run.status.valid_next().contains(&next_status) {
        return Err(CoreError::internal(format!(
            "plan/apply derivation produced an illegal run transition {:?} -> {:?}",
            run.status, next_status
        )));
    }
    run.status = next_status;
    if next_status == RunStatus::Planned {
        run.has_changes = Some(summary.map(|s| s.has_changes()).unwrap_or(false));
    }
    run.metadata = run.metadata.bumped(now);
    let run = repository.save_run(run).await?;

    events.publish(&Event {
        action: action_for_run(next_status),
        run_id,
        workspace_id: run.workspace_id,
        workspace_group_path: workspace_group_path.clone(),
        subject: EventSubject::Run(Box::new(run)),
    });

    Ok(())
}

fn phase_event_action<S: JobPhaseStatus>(status: S) -> EventAction {
    if status == S::CANCELED {
        EventAction::Cancel
    } else if status == S::FINISHED || status == S::ERRORED {
        EventAction::Complete
    } else {
        EventAction::Update
    }
}

fn action_for_run(status: RunStatus) -> EventAction {
    if status.is_canceled() {
        EventAction::Cancel
    } else if status.is_terminal() {
        EventAction::Complete
    } else {
        EventAction::Update
    }
}
