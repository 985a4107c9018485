// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `EligiblePrincipals` rule: restricts which callers may use a
//! managed identity (§5.1).

use orc_core::{AccessRule, Caller, Principal};

/// `Ok(())` if `caller` is named by `rule`, else a diagnostic naming the
/// offending principal.
///
/// Team membership is only consulted for [`Principal::User`] — a
/// service-account caller never matches `allowed_team_ids`.
pub(crate) fn check(rule: &AccessRule, caller: &Caller) -> Result<(), String> {
    match &caller.principal {
        Principal::User { id, team_ids } => {
            if rule.allowed_user_ids.contains(id) || !rule.allowed_team_ids.is_disjoint(team_ids) {
                Ok(())
            } else {
                Err(format!("user '{id}' is not an eligible principal"))
            }
        }
        Principal::ServiceAccount { id } => {
            if rule.allowed_service_account_ids.contains(id) {
                Ok(())
            } else {
                Err(format!("service account '{id}' is not an eligible principal"))
            }
        }
    }
}
