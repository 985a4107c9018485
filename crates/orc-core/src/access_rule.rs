// SPDX-License-Identifier: MIT OR Apache-2.0
//! Access rules owned by a [`crate::identity::ManagedIdentity`] (§5).
//!
//! A managed identity may carry any number of rules. Rules of the same
//! [`RuleType`] are OR'd together (any one satisfying allows); rules across
//! different types are AND'd (every type present must have at least one
//! satisfied member) — see §5.3.

use crate::{run::RunStage, Id, ResourceMetadata};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which enforcement a rule performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Restricts which callers may act using the identity.
    EligiblePrincipals,
    /// Requires a module's attestations to satisfy a policy before the
    /// identity may be used against it.
    ModuleAttestation,
}

/// A single `ModuleAttestation` policy (§5.2, §6.4). A rule carries an
/// ordered list of these; every one must be independently satisfied by some
/// attestation (AND within the rule's policy list) before the rule passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModuleAttestationPolicy {
    /// PEM-encoded public key a qualifying attestation's signature must
    /// verify against.
    pub public_key: String,
    /// In-toto predicate type a qualifying attestation's `predicateType`
    /// must equal (e.g. `https://slsa.dev/provenance/v1`). Unconstrained if
    /// absent.
    pub predicate_type: Option<String>,
}

/// A single access rule belonging to a managed identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccessRule {
    /// Shared resource metadata.
    pub metadata: ResourceMetadata,
    /// Owning managed identity.
    pub managed_identity_id: Id,
    /// Which run stage this rule gates (a rule only applies when the
    /// identity is used for a job of this stage).
    pub run_stage: RunStage,
    /// Discriminates which of the two payloads below is populated.
    pub rule_type: RuleType,
    /// Populated when `rule_type` is [`RuleType::EligiblePrincipals`].
    pub allowed_user_ids: BTreeSet<String>,
    /// Populated when `rule_type` is [`RuleType::EligiblePrincipals`].
    pub allowed_service_account_ids: BTreeSet<String>,
    /// Populated when `rule_type` is [`RuleType::EligiblePrincipals`].
    /// Only consulted against [`crate::caller::Principal::User`] callers —
    /// see the Open Question note on [`crate::caller::Principal`].
    pub allowed_team_ids: BTreeSet<String>,
    /// Populated when `rule_type` is [`RuleType::ModuleAttestation`]. Every
    /// policy in the list must be independently satisfied.
    pub module_attestation_policies: Vec<ModuleAttestationPolicy>,
    /// Populated when `rule_type` is [`RuleType::ModuleAttestation`]. If set,
    /// also require the attested subject's module source to match the run
    /// that produced the current state version (§6.4).
    pub verify_state_lineage: bool,
}

impl AccessRule {
    /// `true` if this is an eligible-principals rule with no members in any
    /// of its three id sets — such a rule can never be satisfied and is
    /// rejected at creation time by the service layer.
    #[must_use]
    pub fn is_empty_eligible_principals(&self) -> bool {
        self.rule_type == RuleType::EligiblePrincipals
            && self.allowed_user_ids.is_empty()
            && self.allowed_service_account_ids.is_empty()
            && self.allowed_team_ids.is_empty()
    }
}
