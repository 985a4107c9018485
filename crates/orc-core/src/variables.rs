// SPDX-License-Identifier: MIT OR Apache-2.0
//! Namespace-inherited and run-supplied variable collation (§4.3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a variable configures Terraform itself or the environment the
/// run executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableCategory {
    /// A Terraform input variable.
    Terraform,
    /// An environment variable exposed to the run's process.
    Environment,
}

/// A single key/value variable, possibly marked sensitive.
///
/// Sensitive values are redacted on read unless the caller explicitly
/// requests sensitive values *and* has the requisite authorization — see
/// [`crate::run::Run`] and `GetRunVariables` in the service layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunVariable {
    /// Variable key.
    pub key: String,
    /// Variable value. `None` once redacted.
    pub value: Option<String>,
    /// Category (Terraform vs. environment).
    pub category: VariableCategory,
    /// Whether this value is marked sensitive.
    pub sensitive: bool,
}

impl RunVariable {
    /// Construct a non-sensitive variable.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        category: VariableCategory,
    ) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            category,
            sensitive: false,
        }
    }

    /// Construct a sensitive variable.
    #[must_use]
    pub fn sensitive(
        key: impl Into<String>,
        value: impl Into<String>,
        category: VariableCategory,
    ) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            category,
            sensitive: true,
        }
    }

    /// Return a copy with the value redacted if [`Self::sensitive`] is set
    /// and the caller has not been granted `include_sensitive`.
    #[must_use]
    pub fn redacted_for(&self, include_sensitive: bool) -> Self {
        if self.sensitive && !include_sensitive {
            Self {
                key: self.key.clone(),
                value: None,
                category: self.category,
                sensitive: true,
            }
        } else {
            self.clone()
        }
    }
}

/// Collate namespace-inherited variables with run-supplied ones.
///
/// Walks workspace → group → ancestor groups (`inherited`, ordered root
/// first so closer scopes can override farther ones), then applies
/// `run_supplied` last so it wins on key collision — matching §4.3's
/// "Run-supplied wins on key collision."
///
/// Collation key is `(category, key)`: a Terraform variable and an
/// environment variable with the same name do not collide.
#[must_use]
pub fn collate(
    inherited: &[RunVariable],
    run_supplied: &[RunVariable],
) -> Vec<RunVariable> {
    let mut by_key: BTreeMap<(VariableCategory, String), RunVariable> = BTreeMap::new();
    for v in inherited.iter().chain(run_supplied.iter()) {
        by_key.insert((v.category, v.key.clone()), v.clone());
    }
    by_key.into_values().collect()
}

impl Ord for VariableCategory {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}
impl PartialOrd for VariableCategory {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
