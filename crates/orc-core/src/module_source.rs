// SPDX-License-Identifier: MIT OR Apache-2.0
//! Module-registry source reference data shared by the module resolver
//! (`orc-module`) and the rule enforcer (`orc-policy`).
//!
//! The `ModuleRegistrySource` *capability* itself (`resolve_semantic_version`,
//! `resolve_digest`, `get_attestations`, …) is an async trait and lives in
//! `orc-module`, which also owns the concrete `Local` / `Federated` /
//! `Generic` variants — this crate only carries the plain reference data
//! those variants are built from, so that `orc-core` stays free of async
//! runtime dependencies, matching the teacher's `abp-core`.

use serde::{Deserialize, Serialize};

/// The parsed `host/namespace/name/system[//subdir]` tuple a module source
/// string resolves to (§4.5 step 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReference {
    /// Registry hostname.
    pub host: String,
    /// Namespace (root group path for `Local` sources).
    pub namespace: String,
    /// Module name.
    pub name: String,
    /// Target system (e.g. `aws`, `azurerm`).
    pub system: String,
}

impl ModuleReference {
    /// The canonical `source` string this reference was derived from /
    /// would normalize to: `host/namespace/name/system`.
    #[must_use]
    pub fn source(&self) -> String {
        format!("{}/{}/{}/{}", self.host, self.namespace, self.name, self.system)
    }
}

/// A federated registry: an external peer trusted by this service,
/// scoped to the group that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedRegistryRef {
    /// Peer hostname.
    pub hostname: String,
    /// Expected `aud` claim on tokens minted for this peer.
    pub expected_audience: String,
    /// Full path of the group that owns this federated registry
    /// registration.
    pub owning_group_path: crate::group::GroupPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_reference_source_format() {
        let m = ModuleReference {
            host: "registry.example.com".into(),
            namespace: "ns".into(),
            name: "m".into(),
            system: "aws".into(),
        };
        assert_eq!(m.source(), "registry.example.com/ns/m/aws");
    }
}
