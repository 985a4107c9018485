// SPDX-License-Identifier: MIT OR Apache-2.0
//! Worker-side execution record for a [`crate::plan::Plan`] or
//! [`crate::apply::Apply`] (§4.4 Job Dispatch).

use crate::{run::RunStage, Id, ResourceMetadata};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which phase of a run a job executes. Re-exported as a convenience alias
/// so callers of `orc-core::job` don't need to reach into `run` directly.
pub type JobType = RunStage;

/// Lifecycle status of a [`Job`] (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet claimable.
    Queued,
    /// Claimed by a runner, not yet started.
    Pending,
    /// Runner reports progress.
    Running,
    /// Terminal: success or failure, runner has reported completion.
    Finished,
}

impl JobStatus {
    /// `true` for the one terminal status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished)
    }
}

/// A unit of worker-side execution dispatched to a runner (§4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Shared resource metadata.
    pub metadata: ResourceMetadata,
    /// Which phase this job executes.
    pub job_type: JobType,
    /// Owning workspace.
    pub workspace_id: Id,
    /// Owning run.
    pub run_id: Id,
    /// Id of the runner that has claimed this job, once claimed.
    pub runner_id: Option<Id>,
    /// Identifier returned by the execution backend once dispatched
    /// (§4.4 Job Dispatch). `None` until the job has been handed off.
    pub external_id: Option<String>,
    /// Current status.
    pub status: JobStatus,
    /// Set when a runner claims the job and it transitions to
    /// [`JobStatus::Pending`].
    pub pending_at: Option<DateTime<Utc>>,
    /// Set when the job transitions to [`JobStatus::Running`].
    pub started_at: Option<DateTime<Utc>>,
    /// Set when the job transitions to [`JobStatus::Finished`].
    pub finished_at: Option<DateTime<Utc>>,
    /// Set when a graceful cancel has been requested for this job.
    pub cancel_requested_at: Option<DateTime<Utc>>,
    /// Hard ceiling on execution time; a runner exceeding this is presumed
    /// dead and the job is requeued or errored by the dispatcher.
    pub max_duration_seconds: u32,
}

impl Job {
    /// `true` if a cancel has been requested but the job has not yet
    /// reached a terminal status.
    #[must_use]
    pub fn cancel_pending(&self) -> bool {
        self.cancel_requested_at.is_some() && !self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn job(status: JobStatus, cancel_requested: bool) -> Job {
        Job {
            metadata: ResourceMetadata::new(Id::nil(), "trn:job:g/w/r1/plan", now()),
            job_type: JobType::Plan,
            workspace_id: Id::nil(),
            run_id: Id::nil(),
            runner_id: None,
            external_id: None,
            status,
            pending_at: None,
            started_at: None,
            finished_at: None,
            cancel_requested_at: if cancel_requested { Some(now()) } else { None },
            max_duration_seconds: 3600,
        }
    }

    #[test]
    fn finished_is_terminal() {
        assert!(JobStatus::Finished.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn cancel_pending_requires_request_and_non_terminal() {
        assert!(job(JobStatus::Running, true).cancel_pending());
        assert!(!job(JobStatus::Running, false).cancel_pending());
        assert!(!job(JobStatus::Finished, true).cancel_pending());
    }
}
