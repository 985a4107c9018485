// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `Generic` module-registry source: any third-party registry that
//! isn't this process and isn't a registered federated peer (§4.5 step 7).

use crate::http::{fetch_detail, fetch_versions};
use crate::source::ModuleRegistrySource;
use orc_error::CoreError;
use orc_core::ModuleReference;
use std::sync::Arc;
use url::Url;

/// Reads the caller's bearer-token credential for a host, typically an
/// environment-variable lookup keyed by
/// [`orc_discovery::derive_token_env_var`].
pub type EnvReader = Arc<dyn Fn(&str) -> Result<String, CoreError> + Send + Sync>;

/// A module resolved against an unregistered third-party registry,
/// authenticated with whatever token `env_reader` returns for
/// `env_var_name`.
pub struct GenericSource {
    reference: ModuleReference,
    base_url: Url,
    env_var_name: String,
    env_reader: EnvReader,
    client: reqwest::Client,
}

impl GenericSource {
    pub(crate) fn new(
        reference: ModuleReference,
        base_url: Url,
        env_var_name: String,
        env_reader: EnvReader,
        client: reqwest::Client,
    ) -> Self {
        Self { reference, base_url, env_var_name, env_reader, client }
    }

    fn token(&self) -> Result<String, CoreError> {
        (self.env_reader)(&self.env_var_name)
    }
}

#[async_trait::async_trait]
impl ModuleRegistrySource for GenericSource {
    fn host(&self) -> &str {
        &self.reference.host
    }

    fn namespace(&self) -> &str {
        &self.reference.namespace
    }

    fn name(&self) -> &str {
        &self.reference.name
    }

    fn system(&self) -> &str {
        &self.reference.system
    }

    fn is_tharsis_module(&self) -> bool {
        false
    }

    async fn resolve_semantic_version(&self, wanted: Option<&str>) -> Result<String, CoreError> {
        let token = self.token()?;
        let versions =
            fetch_versions(&self.client, &self.base_url, &self.reference, &token, &self.env_var_name).await?;
        orc_version::pick(&versions, wanted)
    }

    async fn resolve_digest(&self, version: &str) -> Result<Vec<u8>, CoreError> {
        let token = self.token()?;
        let (digest, _) =
            fetch_detail(&self.client, &self.base_url, &self.reference, version, &token, &self.env_var_name).await?;
        Ok(digest)
    }

    async fn get_attestations(&self, version: &str, _digest_hex: &str) -> Result<Vec<String>, CoreError> {
        let token = self.token()?;
        let (_, attestations) =
            fetch_detail(&self.client, &self.base_url, &self.reference, version, &token, &self.env_var_name).await?;
        Ok(attestations)
    }
}
