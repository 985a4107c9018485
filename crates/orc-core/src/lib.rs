// SPDX-License-Identifier: MIT OR Apache-2.0
//! orc-core
//!
//! Stable contract types for the policy-gated execution core of a Terraform
//! orchestration service: [`Run`], [`Plan`], [`Apply`], [`Job`],
//! [`ManagedIdentity`] / [`AccessRule`], module-source references, and the
//! group/workspace hierarchy used for variable collation and federated
//! registry scoping.
//!
//! If you only take one dependency in this workspace, take this one.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Access rules (eligible-principals, module-attestation) owned by a
/// [`identity::ManagedIdentity`].
pub mod access_rule;
/// Apply phase of a [`run::Run`].
pub mod apply;
/// The cancellation token every externally-invoked operation's context
/// carries.
pub mod cancel;
/// Caller identity and principal kind, used by the rule enforcer.
pub mod caller;
/// Hierarchical group / workspace model used for variable collation and
/// federated-registry scoping.
pub mod group;
/// Managed identities and their owning group.
pub mod identity;
/// Worker-side execution of a [`plan::Plan`] or [`apply::Apply`].
pub mod job;
/// Module-registry source references (local / federated / generic).
pub mod module_source;
/// Plan phase of a [`run::Run`].
pub mod plan;
/// The Run/Plan/Apply workflow root entity.
pub mod run;
/// Namespace-inherited and run-supplied variable collation.
pub mod variables;

pub use access_rule::{AccessRule, ModuleAttestationPolicy, RuleType};
pub use apply::{Apply, ApplyStatus};
pub use caller::{Caller, Principal};
pub use cancel::CancellationToken;
pub use group::{Group, GroupPath, Workspace};
pub use identity::ManagedIdentity;
pub use job::{Job, JobStatus, JobType};
pub use module_source::{FederatedRegistryRef, ModuleReference};
pub use plan::{Plan, PlanStatus, PlanSummary};
pub use run::{ForceCancelState, Run, RunStage, RunStatus};
pub use variables::{RunVariable, VariableCategory};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable opaque identifier shared by every entity in the data model.
pub type Id = Uuid;

/// Fields every entity in §3 of the spec carries: a stable opaque id, the
/// external human-readable TRN, creation/update timestamps, and the
/// monotonically increasing optimistic-concurrency version token.
///
/// A mutating operation must read the stored `version`, build the updated
/// entity, and pass that same `version` back to the repository's
/// compare-and-swap. A mismatch surfaces as
/// [`orc_error::ErrorKind::Conflict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceMetadata {
    /// Stable opaque id.
    pub id: Id,
    /// Tharsis Resource Name, e.g. `trn:run:group/ws/run-abc123`.
    pub trn: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency token. Incremented on every successful update.
    pub version: i64,
}

impl ResourceMetadata {
    /// Construct metadata for a brand-new entity (`version == 1`).
    #[must_use]
    pub fn new(id: Id, trn: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            trn: trn.into(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Return a copy with `updated_at` bumped to `now` and `version`
    /// incremented by one — the shape every repository compare-and-swap
    /// must produce on a successful write.
    #[must_use]
    pub fn bumped(&self, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            trn: self.trn.clone(),
            created_at: self.created_at,
            updated_at: now,
            version: self.version + 1,
        }
    }

    /// Check an incoming caller-supplied version against the stored one.
    /// Returns `Ok(())` on match, `Err` (kind [`orc_error::ErrorKind::Conflict`])
    /// otherwise.
    pub fn check_version(&self, supplied: i64) -> Result<(), orc_error::CoreError> {
        if supplied == self.version {
            Ok(())
        } else {
            Err(orc_error::CoreError::conflict(format!(
                "optimistic concurrency conflict: expected version {}, got {}",
                self.version, supplied
            ))
            .with_context("entity_id", self.id.to_string())
            .with_context("stored_version", self.version)
            .with_context("supplied_version", supplied))
        }
    }
}
