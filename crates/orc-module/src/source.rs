// SPDX-License-Identifier: MIT OR Apache-2.0
//! The [`ModuleRegistrySource`] capability trait and the repository
//! contracts its concrete variants are built from.

use orc_core::FederatedRegistryRef;
use orc_core::group::GroupPath;
use orc_error::CoreError;

/// Capability set every module-registry source variant exposes (§4.5, §9).
///
/// `Local`, `Federated`, and `Generic` each implement this over a different
/// transport (an in-process repository, an authenticated peer, an
/// unauthenticated-or-token-authenticated third party respectively), so
/// callers that only need to resolve a version or fetch an attestation never
/// have to match on which kind of source they were handed.
#[async_trait::async_trait]
pub trait ModuleRegistrySource: Send + Sync {
    /// Registry hostname this source was resolved against.
    fn host(&self) -> &str;
    /// Namespace component of the module reference.
    fn namespace(&self) -> &str;
    /// Module name.
    fn name(&self) -> &str;
    /// Target system (e.g. `aws`).
    fn system(&self) -> &str;
    /// `true` only for [`Local`](crate::local::LocalSource) sources — modules
    /// hosted by this process's own module repository. The rule enforcer's
    /// module-attestation check treats this as "no external trust boundary
    /// was crossed".
    fn is_tharsis_module(&self) -> bool;

    /// Resolve the version to use, per the §4.1 `pick` procedure. `wanted`
    /// is the caller-supplied version constraint, if any.
    async fn resolve_semantic_version(&self, wanted: Option<&str>) -> Result<String, CoreError>;

    /// Resolve the content digest (raw bytes) for `version`.
    async fn resolve_digest(&self, version: &str) -> Result<Vec<u8>, CoreError>;

    /// Fetch the base64-encoded DSSE attestation envelopes recorded for
    /// `version`. `digest_hex` is the hex-encoded digest the caller expects
    /// the attestations' subject to match; the rule enforcer (not this
    /// trait) performs that comparison.
    async fn get_attestations(
        &self,
        version: &str,
        digest_hex: &str,
    ) -> Result<Vec<String>, CoreError>;
}

/// Persistence contract the [`Local`](crate::local::LocalSource) variant
/// resolves against. Implemented by the repository layer; `orc-module` only
/// depends on this trait, never a concrete store.
#[async_trait::async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Look up the internal module id for `(namespace, name, system)`, where
    /// `namespace` is the module's root group path.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::NotFound`] if no such module is registered.
    async fn find_local_module_id(
        &self,
        namespace: &str,
        name: &str,
        system: &str,
    ) -> Result<orc_core::Id, CoreError>;

    /// Versions with upload status `uploaded` for `module_id`.
    async fn list_uploaded_versions(
        &self,
        module_id: orc_core::Id,
    ) -> Result<std::collections::BTreeSet<String>, CoreError>;

    /// Content digest for `module_id` at `version`.
    async fn resolve_digest(
        &self,
        module_id: orc_core::Id,
        version: &str,
    ) -> Result<Vec<u8>, CoreError>;

    /// Attestation envelopes recorded for `module_id` at `version`.
    async fn get_attestations(
        &self,
        module_id: orc_core::Id,
        version: &str,
        digest_hex: &str,
    ) -> Result<Vec<String>, CoreError>;
}

/// Lookup contract the [`Federated`](crate::federated::FederatedSource)
/// dispatch resolves against (§4.5 step 6).
#[async_trait::async_trait]
pub trait FederatedRegistryRepository: Send + Sync {
    /// List every federated registry whose owning group is an ancestor of,
    /// or equal to, `workspace_group_path`, together with that registry's
    /// Resource Catalog global id (used as the JWT `sub` claim when a token
    /// is minted for it).
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::NotFound`] with the message `"some groups
    /// have been deleted"` if any matching registry's owning group has been
    /// (soft-)deleted since it was registered — the implementation owns the
    /// group table and is responsible for detecting this.
    async fn list_visible(
        &self,
        workspace_group_path: &GroupPath,
    ) -> Result<Vec<(FederatedRegistryRef, String)>, CoreError>;
}

/// Pick the deepest-owning federated registry matching `host` among the
/// registries visible to `workspace_group_path` (§4.5 step 6: "multiple
/// federated registries may share a hostname at different scopes; the one
/// owned by the deepest ancestor group wins").
pub(crate) fn pick_federated_registry(
    visible: Vec<(FederatedRegistryRef, String)>,
    host: &str,
) -> Option<(FederatedRegistryRef, String)> {
    visible
        .into_iter()
        .filter(|(registry, _)| registry.hostname == host)
        .max_by_key(|(registry, _)| registry.owning_group_path.depth())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(hostname: &str, owning_path: &str) -> (FederatedRegistryRef, String) {
        (
            FederatedRegistryRef {
                hostname: hostname.to_string(),
                expected_audience: format!("{hostname}-aud"),
                owning_group_path: GroupPath::new(owning_path),
            },
            format!("global-id-{owning_path}"),
        )
    }

    #[test]
    fn picks_deepest_ancestor_among_matching_hostnames() {
        let visible = vec![
            registry("registry.example.com", "acme"),
            registry("registry.example.com", "acme/platform"),
            registry("other.example.com", "acme/platform/networking"),
        ];
        let (picked, global_id) = pick_federated_registry(visible, "registry.example.com").unwrap();
        assert_eq!(picked.owning_group_path, GroupPath::new("acme/platform"));
        assert_eq!(global_id, "global-id-acme/platform");
    }

    #[test]
    fn returns_none_when_no_hostname_matches() {
        let visible = vec![registry("registry.example.com", "acme")];
        assert!(pick_federated_registry(visible, "unrelated.example.com").is_none());
    }
}
