// SPDX-License-Identifier: MIT OR Apache-2.0
//! Job Dispatch (§4.4, §6): lazily create the Job for a run stage and hand
//! it off to the execution backend, recording the backend's external id.

use crate::repository::{ExecutionBackend, JobRepository};
use chrono::{DateTime, Utc};
use orc_core::{Id, Job, JobStatus, ResourceMetadata, RunStage};
use orc_error::CoreError;
use tracing::debug;

/// Dispatch the given run stage's job: reuse the latest job if one exists
/// and hasn't finished, otherwise create one, then hand it to the backend.
///
/// # Errors
/// Propagates whatever the backend or repository return; the backend's
/// error kind is not reinterpreted.
pub async fn dispatch_job(
    run_id: Id,
    workspace_id: Id,
    stage: RunStage,
    trn: impl Into<String>,
    auth_token: &str,
    max_duration_seconds: u32,
    repository: &dyn JobRepository,
    backend: &dyn ExecutionBackend,
    now: DateTime<Utc>,
) -> Result<Job, CoreError> {
    let job = match repository.latest_job(run_id, stage).await? {
        Some(job) if !job.status.is_terminal() => {
            debug!(run_id = %run_id, ?stage, job_id = %job.metadata.id, "reusing non-terminal job");
            job
        }
        _ => {
            let job = Job {
                metadata: ResourceMetadata::new(Id::new_v4(), trn, now),
                job_type: stage,
                workspace_id,
                run_id,
                runner_id: None,
                external_id: None,
                status: JobStatus::Queued,
                pending_at: None,
                started_at: None,
                finished_at: None,
                cancel_requested_at: None,
                max_duration_seconds,
            };
            debug!(run_id = %run_id, ?stage, job_id = %job.metadata.id, "creating job");
            repository.create_job(job).await?
        }
    };

    let external_id = backend.dispatch(&job, auth_token).await?;

    let mut job = job;
    job.external_id = Some(external_id);
    job.metadata = job.metadata.bumped(now);
    repository.save_job(job).await
}
