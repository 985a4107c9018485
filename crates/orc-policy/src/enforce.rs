// SPDX-License-Identifier: MIT OR Apache-2.0
//! `enforce` (§4.4): the top-level managed-identity access-rule check.

use crate::module_attestation::AttestationCheckInput;
use crate::repository::{AccessRuleSource, StateVersionSource};
use crate::{eligible_principals, module_attestation};
use orc_core::{AccessRule, Caller, ManagedIdentity, RuleType, RunStage};
use orc_error::CoreError;

/// The run-stage-scoped facts a single `enforce` call is evaluated against.
pub struct EnforceDetails<'a> {
    /// Which phase the managed identity is being used for.
    pub run_stage: RunStage,
    /// Module-source-dependent facts for the `ModuleAttestation` rule.
    pub attestation: AttestationCheckInput<'a>,
}

/// Rule types are evaluated in this fixed order. Order across groups never
/// changes the AND outcome, but it does make which diagnostic set a caller
/// sees first deterministic when more than one group fails.
const RULE_TYPES: [RuleType; 2] = [RuleType::EligiblePrincipals, RuleType::ModuleAttestation];

/// Evaluate every access rule gating `managed_identity` for `caller` at
/// `details.run_stage`.
///
/// Rules are grouped by [`RuleType`]; within a group any one rule passing
/// satisfies it (OR, evaluated in stable rule-id order); every group present
/// must be satisfied (AND). A rule type with no rules for this stage is
/// vacuously satisfied.
///
/// # Errors
/// [`orc_error::ErrorKind::Forbidden`] if any rule-type group fails, with a
/// message naming the type, run stage, managed-identity TRN, and the
/// group's joined diagnostics. [`orc_error::ErrorKind::Internal`] if a
/// module-attestation rule is evaluated without its required digest,
/// version, or (when lineage verification is requested) state-version
/// source — these indicate a caller-side programming error, not a policy
/// failure.
pub async fn enforce(
    managed_identity: &ManagedIdentity,
    caller: &Caller,
    details: &EnforceDetails<'_>,
    rules: &dyn AccessRuleSource,
    state_versions: Option<&dyn StateVersionSource>,
) -> Result<(), CoreError> {
    let mut applicable: Vec<AccessRule> = rules
        .rules_for_managed_identity(managed_identity.metadata.id)
        .await?
        .into_iter()
        .filter(|r| r.run_stage == details.run_stage)
        .collect();
    applicable.sort_by_key(|r| r.metadata.id);

    for rule_type in RULE_TYPES {
        let group: Vec<&AccessRule> = applicable.iter().filter(|r| r.rule_type == rule_type).collect();
        if group.is_empty() {
            continue;
        }

        let mut diagnostics = Vec::new();
        let mut satisfied = false;
        for rule in &group {
            let outcome: Result<Result<(), String>, CoreError> = match rule_type {
                RuleType::EligiblePrincipals => Ok(eligible_principals::check(rule, caller)),
                RuleType::ModuleAttestation => {
                    module_attestation::check(rule, &details.attestation, state_versions).await
                }
            };
            match outcome? {
                Ok(()) => {
                    satisfied = true;
                    break;
                }
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        if !satisfied {
            tracing::debug!(
                managed_identity_id = %managed_identity.metadata.id,
                ?rule_type,
                ?details.run_stage,
                diagnostics = %diagnostics.join("; "),
                "access-rule group failed"
            );
            return Err(CoreError::forbidden(format!(
                "{rule_type:?} rule failed for {:?} stage on managed identity {}: {}",
                details.run_stage,
                managed_identity.metadata.trn,
                diagnostics.join("; ")
            ))
            .with_context("managed_identity_id", managed_identity.metadata.id.to_string())
            .with_context("run_stage", format!("{:?}", details.run_stage)));
        }
    }

    Ok(())
}
