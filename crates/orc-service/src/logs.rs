// SPDX-License-Identifier: MIT OR Apache-2.0
//! `SubscribeToJobLogStream` (§6): wait for a job's log to grow, then page
//! through the new bytes.
//!
//! There's no dedicated "log grew" event — a job's log only grows while a
//! [`orc_core::JobStatus`] transition is being published for it, so this
//! subscribes to the owning run's events and re-reads whatever the pager
//! now reports past the caller's last-seen offset each time one arrives.

use crate::RunService;
use orc_catalog::{EntityType, TaggedEntity};
use orc_core::{CancellationToken, Id};
use orc_error::CoreError;
use orc_events::{EventFilter, EventStream, EventSubject, Lagged};

/// A live job-log subscription. Call [`Self::recv_page`] in a loop until it
/// returns `Ok(None)` (the job reached a terminal status with nothing left
/// to read) or an error.
pub struct JobLogStream {
    job_id: Id,
    offset: u64,
    default_limit: u64,
    max_limit: u64,
    events: EventStream,
}

impl JobLogStream {
    /// Read the next page past the last offset this stream delivered,
    /// waiting for a Job transition on the owning run if nothing new is
    /// available yet.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::Invalid`] if `limit` exceeds this service's
    /// configured maximum. [`orc_events::Lagged`] if this subscriber's
    /// event queue overflowed — no further calls are meaningful after.
    pub async fn recv_page(
        &mut self,
        limit: Option<u64>,
        log_source: &dyn orc_dispatch::LogSource,
    ) -> Result<Option<orc_dispatch::LogPage>, JobLogStreamError> {
        let limit = limit.unwrap_or(self.default_limit).min(self.max_limit);
        loop {
            let page = orc_dispatch::read_log_page(self.job_id, self.offset, limit, log_source).await?;
            if !page.bytes.is_empty() {
                self.offset += page.bytes.len() as u64;
                return Ok(Some(page));
            }
            if !page.has_more {
                // Caught up. Wait for the job's next transition before
                // trying again; a terminal Job event with nothing new
                // means this stream is done.
                match self.events.recv().await? {
                    Some(event) => {
                        if let EventSubject::Job(job) = &event.subject
                            && job.metadata.id == self.job_id
                            && job.status.is_terminal()
                        {
                            let page = orc_dispatch::read_log_page(self.job_id, self.offset, limit, log_source).await?;
                            if page.bytes.is_empty() {
                                return Ok(None);
                            }
                            self.offset += page.bytes.len() as u64;
                            return Ok(Some(page));
                        }
                    }
                    None => return Ok(None),
                }
            }
        }
    }
}

/// Error surface for [`JobLogStream::recv_page`], kept distinct from
/// [`CoreError`] so a lagged subscriber — not a policy or persistence
/// failure — stays recognisable to the caller.
#[derive(Debug)]
pub enum JobLogStreamError {
    /// This subscriber's event queue overflowed.
    Lagged,
    /// Any other failure reading the log.
    Core(CoreError),
}

impl From<CoreError> for JobLogStreamError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<Lagged> for JobLogStreamError {
    fn from(_: Lagged) -> Self {
        Self::Lagged
    }
}

impl RunService {
    /// Open a `SubscribeToJobLogStream` subscription for `job_id`, starting
    /// past `last_seen_log_size` bytes.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::NotFound`] if `job_id` doesn't exist.
    pub async fn subscribe_to_job_log_stream(
        &self,
        job_id: Id,
        last_seen_log_size: u64,
        cancellation: CancellationToken,
    ) -> Result<JobLogStream, CoreError> {
        let TaggedEntity::Job(job) = self.catalog.fetch(EntityType::Job, job_id).await? else {
            return Err(CoreError::internal("catalog returned the wrong entity kind for EntityType::Job"));
        };

        let filter = EventFilter { run_id: Some(job.run_id), ..Default::default() };
        let events = self.events.subscribe(filter, cancellation)?;

        Ok(JobLogStream {
            job_id,
            offset: last_seen_log_size,
            default_limit: u64::from(self.config.default_log_page_size_bytes),
            max_limit: u64::from(self.config.max_log_page_size_bytes),
            events,
        })
    }
}
