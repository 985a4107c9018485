// SPDX-License-Identifier: MIT OR Apache-2.0
//! The Run/Plan/Apply workflow root entity (§3, §4.3).

use crate::{Id, ResourceMetadata};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which half of a run's workflow a rule or job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    /// The plan phase.
    Plan,
    /// The apply phase.
    Apply,
}

/// Run status, per the state machine in §4.3:
/// `pending → plan_queued → planning → {planned | plan_errored | plan_canceled}`,
/// then from `planned` (auto-apply or `ApplyRun`) →
/// `apply_queued → applying → {applied | apply_errored | apply_canceled}`.
/// Speculative runs terminate at `planned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Freshly created, not yet queued for planning.
    Pending,
    /// Queued, waiting for a planning worker.
    PlanQueued,
    /// Plan is executing.
    Planning,
    /// Plan finished with a usable result.
    Planned,
    /// Plan finished with an error.
    PlanErrored,
    /// Plan was cancelled.
    PlanCanceled,
    /// Apply has been queued.
    ApplyQueued,
    /// Apply is executing.
    Applying,
    /// Apply finished successfully.
    Applied,
    /// Apply finished with an error.
    ApplyErrored,
    /// Apply was cancelled.
    ApplyCanceled,
}

impl RunStatus {
    /// All statuses in the order they occur in the state machine's partial
    /// order, used to check the "event X precedes event Y" ordering
    /// guarantee in §4.3.
    const ORDER: &'static [RunStatus] = &[
        RunStatus::Pending,
        RunStatus::PlanQueued,
        RunStatus::Planning,
        RunStatus::Planned,
        RunStatus::ApplyQueued,
        RunStatus::Applying,
        RunStatus::Applied,
    ];

    /// Position in the canonical (non-error, non-cancel) happy-path
    /// sequence, or `None` for a terminal error/cancel status (those branch
    /// off and aren't totally ordered against each other).
    fn happy_path_index(self) -> Option<usize> {
        Self::ORDER.iter().position(|s| *s == self)
    }

    /// `true` if `self` strictly precedes `other` in the state machine's
    /// partial order. Error/cancel statuses are only ever reached *after*
    /// the phase they terminate, so they precede nothing and nothing
    /// precedes them except their own phase's prefix.
    #[must_use]
    pub fn precedes(self, other: RunStatus) -> bool {
        match (self.happy_path_index(), other.happy_path_index()) {
            (Some(a), Some(b)) => a < b,
            (Some(a), None) => {
                // other is a terminal error/cancel; it is reachable from any
                // happy-path status in the same phase that precedes it.
                match other {
                    RunStatus::PlanErrored | RunStatus::PlanCanceled => {
                        a < RunStatus::Planning.happy_path_index().unwrap() + 1
                    }
                    RunStatus::ApplyErrored | RunStatus::ApplyCanceled => {
                        a < RunStatus::Applying.happy_path_index().unwrap() + 1
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Valid next statuses from `self`, used by the run state machine to
    /// reject foreign transitions with `Invalid`.
    #[must_use]
    pub fn valid_next(self) -> &'static [RunStatus] {
        use RunStatus::*;
        match self {
            Pending => &[PlanQueued],
            PlanQueued => &[Planning, PlanCanceled],
            Planning => &[Planned, PlanErrored, PlanCanceled],
            Planned => &[ApplyQueued, ApplyCanceled],
            ApplyQueued => &[Applying, ApplyCanceled],
            Applying => &[Applied, ApplyErrored, ApplyCanceled],
            PlanErrored | PlanCanceled | Applied | ApplyErrored | ApplyCanceled => &[],
        }
    }

    /// `true` for any of the six terminal statuses.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.valid_next().is_empty()
    }

    /// `true` for the three cancellation statuses.
    #[must_use]
    pub fn is_canceled(self) -> bool {
        matches!(self, RunStatus::PlanCanceled | RunStatus::ApplyCanceled)
    }
}

/// Cancellation state tracked on a [`Run`] (§4.3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForceCancelState {
    /// Set once a graceful cancel has been requested.
    pub force_canceled: bool,
    /// The subject (caller id) that triggered the force-cancel, if any.
    pub force_canceled_by: Option<String>,
    /// Earliest time at which an unprivileged caller may force-cancel.
    /// Set by a graceful cancel request to `now + grace`.
    pub force_cancel_available_at: Option<DateTime<Utc>>,
}

/// A full plan-and-optional-apply workflow on one workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Run {
    /// Shared resource metadata.
    pub metadata: ResourceMetadata,
    /// Owning workspace.
    pub workspace_id: Id,
    /// Creator's principal id (user or service account).
    pub created_by: String,
    /// This run's Plan id.
    pub plan_id: Id,
    /// This run's Apply id.
    pub apply_id: Id,
    /// Configuration-version reference, mutually exclusive in intent with
    /// `module_source` (§9 Open Question — coexistence is not rejected;
    /// see DESIGN.md for the precedence this core applies).
    pub configuration_version_id: Option<Id>,
    /// Module source string, e.g. `registry.example.com/ns/m/aws`.
    pub module_source: Option<String>,
    /// Resolved module version (semver string).
    pub module_version: Option<String>,
    /// Resolved module digest (typically 32-byte SHA-256).
    pub module_digest: Option<Vec<u8>>,
    /// Destroy-plan flag.
    pub destroy: bool,
    /// Refresh-state flag.
    pub refresh: bool,
    /// Refresh-only flag (no plan changes computed).
    pub refresh_only: bool,
    /// Ordered list of `-target` addresses.
    pub target_addresses: Vec<String>,
    /// Speculative runs terminate at `planned` — no apply.
    pub speculative: bool,
    /// Automatically transition `planned → apply_queued` without a user
    /// `ApplyRun` call.
    pub auto_apply: bool,
    /// Force-cancel tracking.
    pub force_cancel: ForceCancelState,
    /// Current status.
    pub status: RunStatus,
    /// Only meaningful once `status` has passed the `Planned` boundary.
    pub has_changes: Option<bool>,
}

impl Run {
    /// Validate the module-source invariant from §3: source, version, and
    /// digest are either all present or all absent.
    #[must_use]
    pub fn module_fields_consistent(&self) -> bool {
        let present = [
            self.module_source.is_some(),
            self.module_version.is_some(),
            self.module_digest.is_some(),
        ];
        present.iter().all(|p| *p) || present.iter().all(|p| !*p)
    }
}
