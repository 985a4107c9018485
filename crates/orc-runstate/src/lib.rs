// SPDX-License-Identifier: MIT OR Apache-2.0
//! The Run/Plan/Apply state machine (§4.3): `CreateRun`, `ApplyRun`,
//! `UpdatePlan` / `UpdateApply`, and the two forms of run cancellation.
//!
//! Persistence and variable-collation facts are resolved through the
//! narrow traits in [`repository`] — [`RunRepository`], [`VariableSource`],
//! [`JobSource`] — rather than a concrete store, following the same
//! injected-capability pattern `orc-module` and `orc-policy` use. Every
//! committed transition is published to an [`orc_events::EventBus`] in
//! commit order, matching §5's ordering guarantee.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// `ApplyRun`: the user-triggered `planned -> apply_queued` transition.
pub mod apply_run;
/// `CancelRun`: graceful and force cancellation.
pub mod cancel;
/// `CreateRun`: variable collation and initial plan/apply creation.
pub mod create;
/// Persistence and variable-collation contracts.
pub mod repository;
/// Phase-status transition validation and Run-status derivation.
pub mod transitions;
/// `UpdatePlan` / `UpdateApply`.
pub mod update;
/// Effective-variable resolution.
pub mod variables;

pub use apply_run::apply_run;
pub use cancel::{force_cancel, request_cancel};
pub use create::{create_run, CreateRunInput};
pub use repository::{JobSource, RunRepository, VariableSource};
pub use transitions::{run_status_after_apply, run_status_after_plan, valid_phase_transition, JobPhaseStatus};
pub use update::{update_apply, update_plan, UpdateApplyInput, UpdatePlanInput};
pub use variables::effective_variables;
