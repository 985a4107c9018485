// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plan phase of a [`crate::run::Run`].

use crate::{Id, ResourceMetadata};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status of a [`Plan`]'s underlying job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Not yet queued.
    Pending,
    /// Queued for a worker.
    Queued,
    /// Executing.
    Running,
    /// Finished, [`Plan::summary`] is populated.
    Finished,
    /// Finished with an error; see [`Plan::error_message`].
    Errored,
    /// Cancelled before completion.
    Canceled,
}

/// Resource-level summary of a finished plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlanSummary {
    /// Resources to be created.
    pub resource_additions: u32,
    /// Resources to be changed in place.
    pub resource_changes: u32,
    /// Resources to be destroyed.
    pub resource_destructions: u32,
}

impl PlanSummary {
    /// `true` if this plan would change any resource.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.resource_additions > 0 || self.resource_changes > 0 || self.resource_destructions > 0
    }
}

/// The plan half of a run: what Terraform would do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Shared resource metadata.
    pub metadata: ResourceMetadata,
    /// Owning run id.
    pub run_id: Id,
    /// Current status.
    pub status: PlanStatus,
    /// Populated once `status` is [`PlanStatus::Errored`].
    pub error_message: Option<String>,
    /// Populated once `status` is [`PlanStatus::Finished`].
    pub summary: Option<PlanSummary>,
    /// True once a binary plan file has been uploaded for this plan.
    pub has_binary_data: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary_has_no_changes() {
        assert!(!PlanSummary::default().has_changes());
    }

    #[test]
    fn nonzero_additions_counts_as_changes() {
        let s = PlanSummary { resource_additions: 1, ..Default::default() };
        assert!(s.has_changes());
    }

    #[test]
    fn nonzero_destructions_counts_as_changes() {
        let s = PlanSummary { resource_destructions: 1, ..Default::default() };
        assert!(s.has_changes());
    }
}
