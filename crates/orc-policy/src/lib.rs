// SPDX-License-Identifier: MIT OR Apache-2.0
//! Managed-identity access-rule enforcement (§4.4, §5).
//!
//! [`enforce`] loads the rules attached to a managed identity, groups them
//! by [`orc_core::RuleType`], and applies the OR-within-group /
//! AND-across-groups decision the execution core uses before letting a job
//! assume an identity's credential. The two rule kinds —
//! [`orc_core::RuleType::EligiblePrincipals`] and
//! [`orc_core::RuleType::ModuleAttestation`] — live in their own modules;
//! the latter composes `orc-attestation`'s DSSE/in-toto verifier and
//! `orc-module`'s `ModuleRegistrySource` capability.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod eligible_principals;
mod enforce;
mod module_attestation;
mod repository;

pub use enforce::{EnforceDetails, enforce};
pub use module_attestation::AttestationCheckInput;
pub use repository::{AccessRuleSource, RunLineage, StateVersionSource};
