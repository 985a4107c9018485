// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`JobRepository`] and [`LogSource`] over the shared [`InMemoryStore`].
//!
//! [`orc_dispatch::ExecutionBackend`] is the opaque external scheduler a
//! job is handed off to — it has no persistence shape and is not
//! implemented here.

use crate::store::InMemoryStore;
use async_trait::async_trait;
use orc_core::{Id, Job, RunStage};
use orc_dispatch::{JobRepository, LogSource};
use orc_error::CoreError;

#[async_trait]
impl JobRepository for InMemoryStore {
    async fn latest_job(&self, run_id: Id, stage: RunStage) -> Result<Option<Job>, CoreError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.run_id == run_id && j.job_type == stage)
            .max_by_key(|j| j.metadata.created_at)
            .cloned())
    }

    async fn create_job(&self, job: Job) -> Result<Job, CoreError> {
        self.index_trn(&job.metadata.trn.clone(), job.metadata.id);
        self.jobs.lock().unwrap().insert(job.metadata.id, job.clone());
        Ok(job)
    }

    async fn save_job(&self, job: Job) -> Result<Job, CoreError> {
        self.jobs.lock().unwrap().insert(job.metadata.id, job.clone());
        Ok(job)
    }
}

#[async_trait]
impl LogSource for InMemoryStore {
    async fn len(&self, job_id: Id) -> Result<u64, CoreError> {
        Ok(self.job_logs.lock().unwrap().get(&job_id).map_or(0, Vec::len) as u64)
    }

    async fn read_range(&self, job_id: Id, start: u64, len: u64) -> Result<Vec<u8>, CoreError> {
        let logs = self.job_logs.lock().unwrap();
        let Some(bytes) = logs.get(&job_id) else {
            return Ok(Vec::new());
        };
        let start = start as usize;
        if start >= bytes.len() {
            return Ok(Vec::new());
        }
        let end = (start + len as usize).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_now;
    use orc_core::{JobStatus, ResourceMetadata};

    fn job(run_id: Id, stage: RunStage, created_at: chrono::DateTime<chrono::Utc>) -> Job {
        Job {
            metadata: ResourceMetadata::new(Id::new_v4(), "trn:job:g/w/r1/plan", created_at),
            job_type: stage,
            workspace_id: Id::new_v4(),
            run_id,
            runner_id: None,
            external_id: None,
            status: JobStatus::Queued,
            pending_at: None,
            started_at: None,
            finished_at: None,
            cancel_requested_at: None,
            max_duration_seconds: 3600,
        }
    }

    #[tokio::test]
    async fn latest_job_picks_the_most_recently_created() {
        let store = InMemoryStore::new();
        let run_id = Id::new_v4();
        let older = job(run_id, RunStage::Plan, test_now());
        let newer = job(run_id, RunStage::Plan, test_now() + chrono::Duration::seconds(1));
        store.create_job(older.clone()).await.unwrap();
        store.create_job(newer.clone()).await.unwrap();

        let latest = store.latest_job(run_id, RunStage::Plan).await.unwrap().unwrap();
        assert_eq!(latest.metadata.id, newer.metadata.id);
    }

    #[tokio::test]
    async fn read_range_returns_empty_past_the_end() {
        let store = InMemoryStore::new();
        let job_id = Id::new_v4();
        store.job_logs.lock().unwrap().insert(job_id, vec![b'x'; 10]);

        assert_eq!(store.len(job_id).await.unwrap(), 10);
        assert!(store.read_range(job_id, 20, 5).await.unwrap().is_empty());
        assert_eq!(store.read_range(job_id, 5, 10).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn unknown_job_log_is_empty_not_an_error() {
        let store = InMemoryStore::new();
        assert_eq!(store.len(Id::new_v4()).await.unwrap(), 0);
    }
}
