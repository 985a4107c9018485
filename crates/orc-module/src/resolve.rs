// SPDX-License-Identifier: MIT OR Apache-2.0
//! Top-level module-source resolution: classify a source string, run
//! service discovery, and dispatch to the `Local`/`Federated`/`Generic`
//! variant it names (§4.5 steps 4-7).

use crate::federated::FederatedSource;
use crate::generic::{EnvReader, GenericSource};
use crate::local::LocalSource;
use crate::reference::{ParseOutcome, parse_reference};
use crate::source::{FederatedRegistryRepository, ModuleRegistrySource, ModuleRepository, pick_federated_registry};
use orc_core::group::GroupPath;
use orc_error::CoreError;
use std::sync::Arc;
use url::Url;

/// Outcome of resolving a module-source string.
pub enum ResolvedSource {
    /// A registry-backed source ready for version/digest/attestation
    /// queries.
    Source(Box<dyn ModuleRegistrySource>),
    /// A non-registry (go-getter-style) remote source. The rule enforcer's
    /// module-attestation checks never apply to these.
    Remote,
}

/// Builds the source base URL service discovery resolves `modules.v1`
/// against for a given host. Production callers use
/// [`default_discovery_base`]; tests substitute one pointing at a mock
/// server so they can exercise real HTTP without TLS.
pub type DiscoveryBaseBuilder = Arc<dyn Fn(&str) -> Result<Url, CoreError> + Send + Sync>;

/// The production `DiscoveryBaseBuilder`: `https://{host}/`.
#[must_use]
pub fn default_discovery_base(host: &str) -> Result<Url, CoreError> {
    Url::parse(&format!("https://{host}/"))
        .map_err(|e| CoreError::invalid(format!("'{host}' is not a valid registry host")).with_source(e))
}

/// Collaborators `resolve` needs to complete steps 4-7 of module-source
/// resolution. Grouped into one struct because the individual pieces (an
/// HTTP client, this process's own hostname, two repository contracts, a
/// token signer, and an environment-variable reader) are all required
/// together and have no natural default.
pub struct ResolveContext {
    /// Client used for both service discovery and registry HTTP calls.
    pub http_client: reqwest::Client,
    /// This process's own configured API hostname. A `registry_base_url`
    /// whose host matches this is a `Local` source.
    pub api_hostname: Option<String>,
    /// Full group path of the workspace the module source belongs to, used
    /// to scope the federated-registry lookup.
    pub workspace_group_path: GroupPath,
    /// Repository the `Local` variant resolves against.
    pub module_repository: Arc<dyn ModuleRepository>,
    /// Repository backing the federated-registry lookup.
    pub federated_registries: Arc<dyn FederatedRegistryRepository>,
    /// Signer used to mint tokens for `Federated` sources.
    pub token_signer: Arc<orc_token::TokenSigner>,
    /// Lifetime given to tokens minted for `Federated` sources.
    pub token_expiry_secs: u64,
    /// Reads the caller's credential for a `Generic` source, keyed by the
    /// env var name [`orc_discovery::derive_token_env_var`] derives.
    pub env_reader: EnvReader,
    /// Builds the service-discovery source base for a host. Defaults to
    /// [`default_discovery_base`]; override only in tests.
    pub discovery_base: DiscoveryBaseBuilder,
}

/// Resolve `source` into a [`ResolvedSource`] (§4.5 steps 1-7).
///
/// # Errors
/// Returns whatever [`crate::reference::parse_reference`] returns for a
/// malformed source; [`orc_error::ErrorKind::Network`] if service discovery
/// against the parsed host fails; [`orc_error::ErrorKind::NotFound`] if the
/// host resolves to this process but no matching module is registered, or
/// if a matching federated registry's owning group has been deleted.
pub async fn resolve(source: &str, ctx: &ResolveContext) -> Result<ResolvedSource, CoreError> {
    let reference = match parse_reference(source)? {
        ParseOutcome::Remote => return Ok(ResolvedSource::Remote),
        ParseOutcome::Registry(reference) => reference,
    };

    let source_base = (ctx.discovery_base)(&reference.host)?;
    let registry_base_url = orc_discovery::discover_at(&ctx.http_client, &source_base, &reference.host).await?;

    let is_local = ctx
        .api_hostname
        .as_deref()
        .is_some_and(|h| registry_base_url.host_str() == Some(h));

    if is_local {
        let module_id = ctx
            .module_repository
            .find_local_module_id(&reference.namespace, &reference.name, &reference.system)
            .await?;
        tracing::debug!(host = %reference.host, %module_id, "dispatching module source to local repository");
        return Ok(ResolvedSource::Source(Box::new(LocalSource::new(
            reference,
            module_id,
            Arc::clone(&ctx.module_repository),
        ))));
    }

    let visible = ctx.federated_registries.list_visible(&ctx.workspace_group_path).await?;
    if let Some((registry, registry_global_id)) = pick_federated_registry(visible, &reference.host) {
        tracing::debug!(
            host = %reference.host,
            owning_group = %registry.owning_group_path.0,
            "dispatching module source to federated registry"
        );
        return Ok(ResolvedSource::Source(Box::new(FederatedSource::new(
            reference,
            registry,
            registry_global_id,
            registry_base_url,
            ctx.http_client.clone(),
            Arc::clone(&ctx.token_signer),
            ctx.token_expiry_secs,
        ))));
    }

    let env_var_name = orc_discovery::derive_token_env_var(&reference.host)?;
    tracing::debug!(host = %reference.host, %env_var_name, "dispatching module source to generic registry");
    Ok(ResolvedSource::Source(Box::new(GenericSource::new(
        reference,
        registry_base_url,
        env_var_name,
        Arc::clone(&ctx.env_reader),
        ctx.http_client.clone(),
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::{FederatedRegistryRef, Id};
    use std::collections::BTreeSet;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NoLocalModules;

    #[async_trait::async_trait]
    impl ModuleRepository for NoLocalModules {
        async fn find_local_module_id(&self, _: &str, _: &str, _: &str) -> Result<Id, CoreError> {
            Err(CoreError::not_found("no local modules in this test double"))
        }
        async fn list_uploaded_versions(&self, _: Id) -> Result<BTreeSet<String>, CoreError> {
            Ok(BTreeSet::new())
        }
        async fn resolve_digest(&self, _: Id, _: &str) -> Result<Vec<u8>, CoreError> {
            Err(CoreError::not_found("unused"))
        }
        async fn get_attestations(&self, _: Id, _: &str, _: &str) -> Result<Vec<String>, CoreError> {
            Ok(vec![])
        }
    }

    struct NoFederatedRegistries;

    #[async_trait::async_trait]
    impl FederatedRegistryRepository for NoFederatedRegistries {
        async fn list_visible(&self, _: &GroupPath) -> Result<Vec<(FederatedRegistryRef, String)>, CoreError> {
            Ok(vec![])
        }
    }

    fn test_signer() -> orc_token::TokenSigner {
        const PEM: &str = include_str!("../tests/fixtures/test_key_pkcs8.pem");
        orc_token::TokenSigner::from_rsa_pem(PEM.as_bytes()).unwrap()
    }

    fn env_reader_returning(value: &'static str) -> EnvReader {
        Arc::new(move |_name: &str| Ok(value.to_string()))
    }

    /// A `DiscoveryBaseBuilder` that ignores the reference host and always
    /// points at `server_uri` — lets tests use a readable registry host
    /// name in the module-source string while actually driving a
    /// `wiremock` server (which has no TLS certificate and an arbitrary
    /// port) underneath.
    fn mock_discovery_base(server_uri: &str) -> DiscoveryBaseBuilder {
        let base = Url::parse(server_uri).expect("wiremock URI is a valid URL");
        Arc::new(move |_host: &str| Ok(base.clone()))
    }

    #[tokio::test]
    async fn remote_sources_bypass_discovery_entirely() {
        let ctx = ResolveContext {
            http_client: reqwest::Client::new(),
            api_hostname: None,
            workspace_group_path: GroupPath::new("acme"),
            module_repository: Arc::new(NoLocalModules),
            federated_registries: Arc::new(NoFederatedRegistries),
            token_signer: Arc::new(test_signer()),
            token_expiry_secs: 60,
            env_reader: env_reader_returning("unused"),
            discovery_base: Arc::new(default_discovery_base),
        };

        let outcome = resolve("git::https://example.com/vpc.git", &ctx).await.unwrap();
        assert!(matches!(outcome, ResolvedSource::Remote));
    }

    #[tokio::test]
    async fn generic_registry_happy_path_resolves_greatest_stable_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/terraform.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "modules.v1": "/api/m/"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/m/ns/m/aws/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "modules": [{"versions": [
                    {"version": "1.0.0"}, {"version": "0.9.0"}, {"version": "0.8.0"}
                ]}]
            })))
            .mount(&server)
            .await;

        let ctx = ResolveContext {
            http_client: reqwest::Client::new(),
            api_hostname: Some("tharsis.internal".to_string()),
            workspace_group_path: GroupPath::new("acme"),
            module_repository: Arc::new(NoLocalModules),
            federated_registries: Arc::new(NoFederatedRegistries),
            token_signer: Arc::new(test_signer()),
            token_expiry_secs: 60,
            env_reader: env_reader_returning("test-token"),
            discovery_base: mock_discovery_base(&server.uri()),
        };

        let resolved = resolve("registry.example.com/ns/m/aws", &ctx).await.unwrap();
        let ResolvedSource::Source(source) = resolved else {
            panic!("expected a registry source");
        };
        assert!(!source.is_tharsis_module());
        let version = source.resolve_semantic_version(None).await.unwrap();
        assert_eq!(version, "1.0.0");
    }

    #[tokio::test]
    async fn host_matching_configured_api_hostname_dispatches_local() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/terraform.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "modules.v1": "/api/m/"
            })))
            .mount(&server)
            .await;

        let resolved_host = Url::parse(&server.uri()).unwrap().host_str().unwrap().to_string();

        struct OneModule;
        #[async_trait::async_trait]
        impl ModuleRepository for OneModule {
            async fn find_local_module_id(&self, namespace: &str, name: &str, system: &str) -> Result<Id, CoreError> {
                assert_eq!(namespace, "ns");
                assert_eq!(name, "m");
                assert_eq!(system, "aws");
                Ok(Id::nil())
            }
            async fn list_uploaded_versions(&self, _: Id) -> Result<BTreeSet<String>, CoreError> {
                Ok(BTreeSet::new())
            }
            async fn resolve_digest(&self, _: Id, _: &str) -> Result<Vec<u8>, CoreError> {
                Err(CoreError::not_found("unused"))
            }
            async fn get_attestations(&self, _: Id, _: &str, _: &str) -> Result<Vec<String>, CoreError> {
                Ok(vec![])
            }
        }

        let ctx = ResolveContext {
            http_client: reqwest::Client::new(),
            api_hostname: Some(resolved_host),
            workspace_group_path: GroupPath::new("acme"),
            module_repository: Arc::new(OneModule),
            federated_registries: Arc::new(NoFederatedRegistries),
            token_signer: Arc::new(test_signer()),
            token_expiry_secs: 60,
            env_reader: env_reader_returning("unused"),
            discovery_base: mock_discovery_base(&server.uri()),
        };

        let resolved = resolve("registry.example.com/ns/m/aws", &ctx).await.unwrap();
        let ResolvedSource::Source(source) = resolved else {
            panic!("expected a registry source");
        };
        assert!(source.is_tharsis_module());
    }

    #[tokio::test]
    async fn federated_registry_dispatch_mints_token_for_deepest_owner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/terraform.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "modules.v1": "/api/m/"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/m/ns/m/aws/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "modules": [{"versions": [{"version": "2.0.0"}]}]
            })))
            .mount(&server)
            .await;

        struct TwoScopedRegistries;
        #[async_trait::async_trait]
        impl FederatedRegistryRepository for TwoScopedRegistries {
            async fn list_visible(
                &self,
                _workspace_group_path: &GroupPath,
            ) -> Result<Vec<(FederatedRegistryRef, String)>, CoreError> {
                Ok(vec![
                    (
                        FederatedRegistryRef {
                            hostname: "registry.example.com".to_string(),
                            expected_audience: "root-aud".to_string(),
                            owning_group_path: GroupPath::new("acme"),
                        },
                        "global-id-root".to_string(),
                    ),
                    (
                        FederatedRegistryRef {
                            hostname: "registry.example.com".to_string(),
                            expected_audience: "platform-aud".to_string(),
                            owning_group_path: GroupPath::new("acme/platform"),
                        },
                        "global-id-platform".to_string(),
                    ),
                ])
            }
        }

        let ctx = ResolveContext {
            http_client: reqwest::Client::new(),
            api_hostname: Some("tharsis.internal".to_string()),
            workspace_group_path: GroupPath::new("acme/platform/networking"),
            module_repository: Arc::new(NoLocalModules),
            federated_registries: Arc::new(TwoScopedRegistries),
            token_signer: Arc::new(test_signer()),
            token_expiry_secs: 60,
            env_reader: env_reader_returning("unused"),
            discovery_base: mock_discovery_base(&server.uri()),
        };

        let resolved = resolve("registry.example.com/ns/m/aws", &ctx).await.unwrap();
        let ResolvedSource::Source(source) = resolved else {
            panic!("expected a registry source");
        };
        assert!(!source.is_tharsis_module());
        let version = source.resolve_semantic_version(None).await.unwrap();
        assert_eq!(version, "2.0.0");
    }
}
