// SPDX-License-Identifier: MIT OR Apache-2.0
//! Job Dispatch and the Log Streaming Pager (§4.4, §4.6).
//!
//! Dispatch hands a job descriptor and auth token to an injected
//! [`ExecutionBackend`] and records the external identifier it returns;
//! the core never inspects how that backend schedules or runs work. The
//! pager reads fixed-size byte ranges from an injected [`LogSource`] with
//! over-fetch-by-one `has_more` detection.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// `DispatchJob`: lazy job creation and hand-off to the execution backend.
pub mod dispatch;
/// Log pagination.
pub mod pager;
/// Persistence and execution-backend contracts.
pub mod repository;

pub use dispatch::dispatch_job;
pub use pager::{read as read_log_page, LogPage};
pub use repository::{ExecutionBackend, JobRepository, LogSource};
