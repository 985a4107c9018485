// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence and execution-backend contracts consumed by this crate.

use async_trait::async_trait;
use orc_core::{Id, Job, RunStage};
use orc_error::CoreError;

/// Create and persist [`Job`] records. Jobs of a Run are created lazily —
/// the first dispatch for a given (run, stage) pair is what creates one.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// The latest job for a given run and stage, if one has been created.
    async fn latest_job(&self, run_id: Id, stage: RunStage) -> Result<Option<Job>, CoreError>;
    /// Persist a newly created job.
    async fn create_job(&self, job: Job) -> Result<Job, CoreError>;
    /// Persist an update to an existing job.
    async fn save_job(&self, job: Job) -> Result<Job, CoreError>;
}

/// The opaque execution backend a job is handed off to (§4.4 Job Dispatch).
/// The core never inspects how the backend schedules or runs work — only
/// that it accepts a descriptor and an auth token and returns an
/// identifier the core can use to refer to the dispatched work later.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Hand the job off to the backend, returning its external identifier.
    async fn dispatch(&self, job: &Job, auth_token: &str) -> Result<String, CoreError>;
}

/// Raw byte storage a job's log is read from (§4.6 Log Streaming Pager).
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Total number of bytes currently written for this job's log.
    async fn len(&self, job_id: Id) -> Result<u64, CoreError>;
    /// Read up to `len` bytes starting at `start`. May return fewer bytes
    /// than requested if the log is shorter than `start + len`.
    async fn read_range(&self, job_id: Id, start: u64, len: u64) -> Result<Vec<u8>, CoreError>;
}
