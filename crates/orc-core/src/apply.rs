// SPDX-License-Identifier: MIT OR Apache-2.0
//! Apply phase of a [`crate::run::Run`].

use crate::{Id, ResourceMetadata};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status of an [`Apply`]'s underlying job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStatus {
    /// Not yet queued.
    Pending,
    /// Queued for a worker.
    Queued,
    /// Executing.
    Running,
    /// Finished successfully.
    Finished,
    /// Finished with an error; see [`Apply::error_message`].
    Errored,
    /// Cancelled before completion.
    Canceled,
}

/// The apply half of a run: what Terraform actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Apply {
    /// Shared resource metadata.
    pub metadata: ResourceMetadata,
    /// Owning run id.
    pub run_id: Id,
    /// Current status.
    pub status: ApplyStatus,
    /// Populated once `status` is [`ApplyStatus::Errored`].
    pub error_message: Option<String>,
    /// Identity of the principal that triggered this apply, distinct from
    /// the run's creator when a separate `ApplyRun` call is required.
    pub triggered_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn apply_carries_trigger_identity() {
        let a = Apply {
            metadata: ResourceMetadata::new(Id::nil(), "trn:apply:g/w/r1", now()),
            run_id: Id::nil(),
            status: ApplyStatus::Pending,
            error_message: None,
            triggered_by: "u2".into(),
        };
        assert_eq!(a.triggered_by, "u2");
    }
}
