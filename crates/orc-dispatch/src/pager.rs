// SPDX-License-Identifier: MIT OR Apache-2.0
//! Log Streaming Pager (§4.6, §6): byte-range reads with over-fetch-by-one
//! `has_more` detection.

use crate::repository::LogSource;
use orc_core::Id;
use orc_error::CoreError;

/// A page of log bytes and whether more remain past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPage {
    /// The bytes read, at most `limit` long.
    pub bytes: Vec<u8>,
    /// `true` if the log extends past `start + bytes.len()`.
    pub has_more: bool,
}

const MAX_LIMIT: u64 = 50_000;

/// Read a page of `job_id`'s log starting at `start`.
///
/// Fetches `limit + 1` bytes; if the source returns `≤ limit`, `has_more`
/// is `false` and the bytes are returned as-is; otherwise the page is
/// truncated to `limit` and `has_more` is `true`.
///
/// # Errors
/// [`orc_error::ErrorKind::Invalid`] if `limit` exceeds 50,000.
pub async fn read(job_id: Id, start: u64, limit: u64, source: &dyn LogSource) -> Result<LogPage, CoreError> {
    if limit > MAX_LIMIT {
        return Err(CoreError::invalid(format!("limit {limit} exceeds the maximum of {MAX_LIMIT}")));
    }

    let mut bytes = source.read_range(job_id, start, limit + 1).await?;
    let has_more = bytes.len() as u64 > limit;
    if has_more {
        bytes.truncate(limit as usize);
    }
    Ok(LogPage { bytes, has_more })
}
