// SPDX-License-Identifier: MIT OR Apache-2.0
//! `ApplyRun` (§4.3, §6): the user-triggered `planned → apply_queued`
//! transition for a non-speculative run that didn't request auto-apply.

use crate::repository::RunRepository;
use chrono::{DateTime, Utc};
use orc_core::{ApplyStatus, GroupPath, Id, Run, RunStatus};
use orc_error::CoreError;
use orc_events::{Event, EventAction, EventBus, EventSubject};

/// Queue a planned run's apply: the run must be `planned` and not
/// speculative (speculative runs terminate at `planned` with no apply).
///
/// # Errors
/// [`orc_error::ErrorKind::Conflict`] if the run is not `planned`, or is
/// speculative.
pub async fn apply_run(
    run_id: Id,
    triggered_by: &str,
    repository: &dyn RunRepository,
    workspace_group_path: &GroupPath,
    events: &EventBus,
    now: DateTime<Utc>,
) -> Result<Run, CoreError> {
    let mut run = repository.get_run(run_id).await?;
    if run.status != RunStatus::Planned {
        return Err(CoreError::conflict(format!("run is {:?}, not planned", run.status)));
    }
    if run.speculative {
        return Err(CoreError::conflict("speculative runs terminate at planned and cannot be applied"));
    }

    let mut apply = repository.get_apply(run.apply_id).await?;
    apply.status = ApplyStatus::Queued;
    apply.triggered_by = triggered_by.to_string();
    apply.metadata = apply.metadata.bumped(now);
    let apply = repository.save_apply(apply).await?;

    events.publish(&Event {
        action: EventAction::Update,
        run_id,
        workspace_id: run.workspace_id,
        workspace_group_path: workspace_group_path.clone(),
        subject: EventSubject::Apply(Box::new(apply)),
    });

    run.status = RunStatus::ApplyQueued;
    run.metadata = run.metadata.bumped(now);
    let run = repository.save_run(run).await?;

    events.publish(&Event {
        action: EventAction::Update,
        run_id,
        workspace_id: run.workspace_id,
        workspace_group_path: workspace_group_path.clone(),
        subject: EventSubject::Run(Box::new(run.clone())),
    });

    Ok(run)
}
