// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transition validation for [`Plan`]/[`Apply`] phase statuses, and the
//! derivation of the owning [`Run`]'s status from a phase transition
//! (§4.3).
//!
//! [`PlanStatus`] and [`ApplyStatus`] are structurally identical six-variant
//! enums with identical transition rules, so [`JobPhaseStatus`] names the
//! five fixed points once and the validity check in [`valid_phase_transition`]
//! is written against the trait rather than duplicated per enum — the same
//! reasoning `orc_core::run::RunStatus` applies to its own `valid_next`
//! table, generalised across two types instead of one.

use orc_core::{ApplyStatus, PlanStatus, RunStatus};

/// The five statuses every job phase (plan or apply) moves through.
pub trait JobPhaseStatus: Copy + Eq {
    /// Not yet queued.
    const PENDING: Self;
    /// Queued for a worker.
    const QUEUED: Self;
    /// Executing.
    const RUNNING: Self;
    /// Finished successfully.
    const FINISHED: Self;
    /// Finished with an error.
    const ERRORED: Self;
    /// Cancelled before completion.
    const CANCELED: Self;
}

impl JobPhaseStatus for PlanStatus {
    const PENDING: Self = PlanStatus::Pending;
    const QUEUED: Self = PlanStatus::Queued;
    const RUNNING: Self = PlanStatus::Running;
    const FINISHED: Self = PlanStatus::Finished;
    const ERRORED: Self = PlanStatus::Errored;
    const CANCELED: Self = PlanStatus::Canceled;
}

impl JobPhaseStatus for ApplyStatus {
    const PENDING: Self = ApplyStatus::Pending;
    const QUEUED: Self = ApplyStatus::Queued;
    const RUNNING: Self = ApplyStatus::Running;
    const FINISHED: Self = ApplyStatus::Finished;
    const ERRORED: Self = ApplyStatus::Errored;
    const CANCELED: Self = ApplyStatus::Canceled;
}

/// `true` if moving a phase status from `from` to `to` is permitted.
///
/// Per §4.3: any status may repeat itself (an update that only carries
/// fresh metadata); `queued → running → {finished, errored}`; `* →
/// canceled` is valid only when `via_cancel` is set, since that transition
/// is reserved for the dedicated cancel path rather than an ordinary
/// `UpdatePlan`/`UpdateApply` call. Everything else is a foreign transition.
#[must_use]
pub fn valid_phase_transition<S: JobPhaseStatus>(from: S, to: S, via_cancel: bool) -> bool {
    if from == to {
        return true;
    }
    if to == S::CANCELED {
        return via_cancel;
    }
    (from == S::QUEUED && to == S::RUNNING) || (from == S::RUNNING && (to == S::FINISHED || to == S::ERRORED))
}

/// Derive the Run status a successful plan-phase transition produces, or
/// `None` if `to` carries no Run-level consequence (a same-status metadata
/// update).
#[must_use]
pub fn run_status_after_plan(to: PlanStatus) -> Option<RunStatus> {
    match to {
        PlanStatus::Pending => None,
        PlanStatus::Queued => None,
        PlanStatus::Running => Some(RunStatus::Planning),
        PlanStatus::Finished => Some(RunStatus::Planned),
        PlanStatus::Errored => Some(RunStatus::PlanErrored),
        PlanStatus::Canceled => Some(RunStatus::PlanCanceled),
    }
}

/// Derive the Run status a successful apply-phase transition produces, or
/// `None` if `to` carries no Run-level consequence.
#[must_use]
pub fn run_status_after_apply(to: ApplyStatus) -> Option<RunStatus> {
    match to {
        ApplyStatus::Pending => None,
        ApplyStatus::Queued => None,
        ApplyStatus::Running => Some(RunStatus::Applying),
        ApplyStatus::Finished => Some(RunStatus::Applied),
        ApplyStatus::Errored => Some(RunStatus::ApplyErrored),
        ApplyStatus::Canceled => Some(RunStatus::ApplyCanceled),
    }
}
