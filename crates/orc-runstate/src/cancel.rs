// SPDX-License-Identifier: MIT OR Apache-2.0
//! `CancelRun` (§4.3, §6): graceful and force cancellation.
//!
//! Graceful cancellation records intent and waits for the active Job to
//! notice; force cancellation short-circuits straight to the canceled
//! terminal state once the grace period has elapsed (or unconditionally
//! for an administrator).

use crate::repository::{JobSource, RunRepository};
use chrono::{DateTime, Utc};
use orc_core::{ApplyStatus, GroupPath, Id, PlanStatus, Run, RunStage, RunStatus};
use orc_error::CoreError;
use orc_events::{Event, EventAction, EventBus, EventSubject};

/// Which phase a run's active job is executing, inferred from its status,
/// so the cancel path knows which job to signal and which terminal status
/// to drive the plan or apply to.
fn active_stage(run: &Run) -> Option<RunStage> {
    match run.status {
        RunStatus::PlanQueued | RunStatus::Planning => Some(RunStage::Plan),
        RunStatus::ApplyQueued | RunStatus::Applying => Some(RunStage::Apply),
        _ => None,
    }
}

/// Request a graceful cancellation: sets `force_cancel_available_at = now +
/// grace_period` on the run and asks the active job (if any) to terminate.
///
/// # Errors
/// [`orc_error::ErrorKind::Conflict`] if the run is already in a terminal
/// status.
pub async fn request_cancel(
    run_id: Id,
    grace_period_secs: u64,
    repository: &dyn RunRepository,
    jobs: &dyn JobSource,
    workspace_group_path: &GroupPath,
    events: &EventBus,
    now: DateTime<Utc>,
) -> Result<Run, CoreError> {
    let mut run = repository.get_run(run_id).await?;
    if run.status.is_terminal() {
        return Err(CoreError::conflict("run is already in a terminal status"));
    }

    run.force_cancel.force_cancel_available_at = Some(now + chrono::Duration::seconds(grace_period_secs as i64));
    run.metadata = run.metadata.bumped(now);
    let run = repository.save_run(run).await?;

    if let Some(stage) = active_stage(&run)
        && let Some(job) = jobs.active_job_for_run(run_id, stage).await?
    {
        jobs.request_job_cancel(job.metadata.id, now).await?;
    }

    events.publish(&Event {
        action: EventAction::Update,
        run_id,
        workspace_id: run.workspace_id,
        workspace_group_path: workspace_group_path.clone(),
        subject: EventSubject::Run(Box::new(run.clone())),
    });

    Ok(run)
}

/// Force-cancel a run: immediately terminates the active plan or apply as
/// canceled regardless of job state.
///
/// `is_administrator` bypasses the grace-period check entirely; otherwise
/// force is only allowed once `force_cancel_available_at` has passed.
///
/// # Errors
/// [`orc_error::ErrorKind::Conflict`] if force is attempted before
/// `force_cancel_available_at`, or the run has no active phase to cancel.
pub async fn force_cancel(
    run_id: Id,
    caller_id: &str,
    is_administrator: bool,
    repository: &dyn RunRepository,
    workspace_group_path: &GroupPath,
    events: &EventBus,
    now: DateTime<Utc>,
) -> Result<Run, CoreError> {
    let run = repository.get_run(run_id).await?;
    if !is_administrator {
        match run.force_cancel.force_cancel_available_at {
            Some(available_at) if now >= available_at => {}
            _ => return Err(CoreError::conflict("force-cancel is not yet available for this run")),
        }
    }

    let stage = active_stage(&run).ok_or_else(|| CoreError::conflict("run has no active phase to cancel"))?;

    match stage {
        RunStage::Plan => {
            let mut plan = repository.get_plan(run.plan_id).await?;
            plan.status = PlanStatus::Canceled;
            plan.metadata = plan.metadata.bumped(now);
            let plan = repository.save_plan(plan).await?;
            events.publish(&Event {
                action: EventAction::Cancel,
                run_id,
                workspace_id: run.workspace_id,
                workspace_group_path: workspace_group_path.clone(),
                subject: EventSubject::Plan(Box::new(plan)),
            });
        }
        RunStage::Apply => {
            let mut apply = repository.get_apply(run.apply_id).await?;
            apply.status = ApplyStatus::Canceled;
            apply.metadata = apply.metadata.bumped(now);
            let apply = repository.save_apply(apply).await?;
            events.publish(&Event {
                action: EventAction::Cancel,
                run_id,
                workspace_id: run.workspace_id,
                workspace_group_path: workspace_group_path.clone(),
                subject: EventSubject::Apply(Box::new(apply)),
            });
        }
    }

    let mut run = run;
    run.status = if stage == RunStage::Plan { RunStatus::PlanCanceled } else { RunStatus::ApplyCanceled };
    run.force_cancel.force_canceled = true;
    run.force_cancel.force_canceled_by = Some(caller_id.to_string());
    run.metadata = run.metadata.bumped(now);
    let run = repository.save_run(run).await?;

    events.publish(&Event {
        action: EventAction::Cancel,
        run_id,
        workspace_id: run.workspace_id,
        workspace_group_path: workspace_group_path.clone(),
        subject: EventSubject::Run(Box::new(run.clone())),
    });

    Ok(run)
}
