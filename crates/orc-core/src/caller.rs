// SPDX-License-Identifier: MIT OR Apache-2.0
//! Caller identity as seen by the rule enforcer and run state machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The kind of principal a caller is authenticated as.
///
/// Spec §9 Open Question: team membership is checked only on the
/// [`Principal::User`] branch — a service-account caller's rule evaluation
/// never consults `allowed_team_ids`, even if the rule defines them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// A human user, optionally a member of one or more teams.
    User {
        /// Stable user id.
        id: String,
        /// Team ids this user belongs to.
        team_ids: BTreeSet<String>,
    },
    /// A service account (machine identity).
    ServiceAccount {
        /// Stable service-account id.
        id: String,
    },
}

/// A caller's identity plus out-of-band authorization facts (administrator
/// override) needed by [`crate::run::Run`] cancellation handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// The authenticated principal.
    pub principal: Principal,
    /// Whether this caller holds administrator privileges — allows an
    /// unconditional force-cancel regardless of `force_cancel_available_at`.
    pub is_admin: bool,
}

impl Caller {
    /// Construct a non-admin user caller.
    #[must_use]
    pub fn user(id: impl Into<String>, team_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            principal: Principal::User {
                id: id.into(),
                team_ids: team_ids.into_iter().collect(),
            },
            is_admin: false,
        }
    }

    /// Construct a service-account caller.
    #[must_use]
    pub fn service_account(id: impl Into<String>) -> Self {
        Self {
            principal: Principal::ServiceAccount { id: id.into() },
            is_admin: false,
        }
    }

    /// Mark this caller as an administrator.
    #[must_use]
    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}
