// SPDX-License-Identifier: MIT OR Apache-2.0
//! The in-toto `Statement` layer DSSE envelopes carry as payload.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub(crate) struct Statement {
    #[serde(rename = "predicateType")]
    pub(crate) predicate_type: String,
    #[serde(default)]
    pub(crate) subject: Vec<Subject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Subject {
    #[serde(default)]
    #[allow(dead_code)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) digest: BTreeMap<String, String>,
}

impl Statement {
    /// `true` if any subject's `sha256` digest equals `expected_hex`
    /// (case-insensitive, as hex digests are conventionally lowercase but
    /// not guaranteed to be produced that way by every signer).
    pub(crate) fn has_subject_with_sha256(&self, expected_hex: &str) -> bool {
        self.subject
            .iter()
            .any(|s| s.digest.get("sha256").is_some_and(|d| d.eq_ignore_ascii_case(expected_hex)))
    }
}
