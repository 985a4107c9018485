// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `Federated` module-registry source: an external peer this process
//! authenticates to with a freshly-minted JWT (§4.5 step 6, §4.1).

use crate::http::{fetch_detail, fetch_versions};
use crate::source::ModuleRegistrySource;
use orc_core::{FederatedRegistryRef, ModuleReference};
use orc_error::CoreError;
use orc_token::TokenSigner;
use std::sync::Arc;
use url::Url;

/// A module resolved against a federated (peer) registry. The token signer
/// is injected at construction, never reached for via a callback into the
/// resolver itself — this is the "cyclic module source / federated
/// registry client is broken by injection" design noted for this variant.
pub struct FederatedSource {
    reference: ModuleReference,
    registry: FederatedRegistryRef,
    registry_global_id: String,
    base_url: Url,
    client: reqwest::Client,
    token_signer: Arc<TokenSigner>,
    token_expiry_secs: u64,
}

impl FederatedSource {
    pub(crate) fn new(
        reference: ModuleReference,
        registry: FederatedRegistryRef,
        registry_global_id: String,
        base_url: Url,
        client: reqwest::Client,
        token_signer: Arc<TokenSigner>,
        token_expiry_secs: u64,
    ) -> Self {
        Self {
            reference,
            registry,
            registry_global_id,
            base_url,
            client,
            token_signer,
            token_expiry_secs,
        }
    }

    fn mint_token(&self) -> Result<String, CoreError> {
        self.token_signer.mint(
            &self.registry.expected_audience,
            &self.registry_global_id,
            self.token_expiry_secs,
        )
    }
}

#[async_trait::async_trait]
impl ModuleRegistrySource for FederatedSource {
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
        let token = self.mint_token()?;
        let versions =
            fetch_versions(&self.client, &self.base_url, &self.reference, &token, &self.registry.hostname).await?;
        orc_version::pick(&versions, wanted)
    }

    async fn resolve_digest(&self, version: &str) -> Result<Vec<u8>, CoreError> {
        let token = self.mint_token()?;
        let (digest, _) =
            fetch_detail(&self.client, &self.base_url, &self.reference, version, &token, &self.registry.hostname)
                .await?;
        Ok(digest)
    }

    async fn get_attestations(&self, version: &str, _digest_hex: &str) -> Result<Vec<String>, CoreError> {
        let token = self.mint_token()?;
        let (_, attestations) =
            fetch_detail(&self.client, &self.base_url, &self.reference, version, &token, &self.registry.hostname)
                .await?;
        Ok(attestations)
    }
}
