// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared wire protocol for the `Federated` and `Generic` source variants
//! (§6 "external interfaces"): both talk to an authenticated third-party
//! registry over the same modules-v1-style JSON protocol, differing only in
//! how the bearer token is obtained.

use orc_core::ModuleReference;
use orc_error::CoreError;
use serde::Deserialize;
use std::collections::BTreeSet;
use url::Url;

#[derive(Debug, Deserialize)]
struct VersionsResponse {
    modules: Vec<ModuleVersions>,
}

#[derive(Debug, Deserialize)]
struct ModuleVersions {
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    version: String,
}

/// Digest and attestations recorded for one module version. The wire shape
/// isn't specified beyond the versions endpoint; this mirrors it one level
/// deeper (`{base}/{ns}/{name}/{system}/{version}`) rather than inventing an
/// unrelated protocol.
#[derive(Debug, Deserialize)]
struct VersionDetail {
    digest: String,
    #[serde(default)]
    attestations: Vec<String>,
}

fn versions_url(base_url: &Url, reference: &ModuleReference) -> Result<Url, CoreError> {
    base_url
        .join(&format!(
            "{}/{}/{}/versions",
            reference.namespace, reference.name, reference.system
        ))
        .map_err(|e| {
            CoreError::internal("failed to build registry versions URL").with_source(e)
        })
}

fn detail_url(base_url: &Url, reference: &ModuleReference, version: &str) -> Result<Url, CoreError> {
    base_url
        .join(&format!(
            "{}/{}/{}/{}",
            reference.namespace, reference.name, reference.system, version
        ))
        .map_err(|e| CoreError::internal("failed to build registry version-detail URL").with_source(e))
}

/// `true` if `status` signals the bearer token was rejected.
fn is_auth_failure(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
}

/// Fetch the set of published versions for `reference` from `base_url`,
/// authenticating with `token`.
///
/// # Errors
/// [`orc_error::ErrorKind::Unauthenticated`] if the registry rejects the
/// token (`expected_token_hint` is folded into the message so callers can
/// tell the caller which credential to check); [`orc_error::ErrorKind::Network`]
/// for any other non-2xx response, transport failure, or unparseable body.
pub(crate) async fn fetch_versions(
    client: &reqwest::Client,
    base_url: &Url,
    reference: &ModuleReference,
    token: &str,
    expected_token_hint: &str,
) -> Result<BTreeSet<String>, CoreError> {
    let url = versions_url(base_url, reference)?;
    let response = client
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| CoreError::network("registry versions request failed").with_source(e))?;

    let status = response.status();
    if is_auth_failure(status) {
        return Err(CoreError::unauthenticated(format!(
            "registry rejected the credential; expected a valid token for {expected_token_hint}"
        )));
    }
    if !status.is_success() {
        return Err(CoreError::network(format!("registry returned {status}")));
    }

    let body: VersionsResponse = response
        .json()
        .await
        .map_err(|e| CoreError::network("registry versions response was not valid JSON").with_source(e))?;

    Ok(body
        .modules
        .into_iter()
        .flat_map(|m| m.versions)
        .map(|v| v.version)
        .collect())
}

/// Fetch the digest and attestations recorded for `version`.
///
/// # Errors
/// Same as [`fetch_versions`], plus [`orc_error::ErrorKind::Invalid`] if the
/// digest isn't valid hex.
pub(crate) async fn fetch_detail(
    client: &reqwest::Client,
    base_url: &Url,
    reference: &ModuleReference,
    version: &str,
    token: &str,
    expected_token_hint: &str,
) -> Result<(Vec<u8>, Vec<String>), CoreError> {
    let url = detail_url(base_url, reference, version)?;
    let response = client
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| CoreError::network("registry version-detail request failed").with_source(e))?;

    let status = response.status();
    if is_auth_failure(status) {
        return Err(CoreError::unauthenticated(format!(
            "registry rejected the credential; expected a valid token for {expected_token_hint}"
        )));
    }
    if !status.is_success() {
        return Err(CoreError::network(format!("registry returned {status}")));
    }

    let body: VersionDetail = response
        .json()
        .await
        .map_err(|e| CoreError::network("registry version-detail response was not valid JSON").with_source(e))?;

    let digest = hex_decode(&body.digest)
        .ok_or_else(|| CoreError::invalid(format!("registry reported a non-hex digest '{}'", body.digest)))?;

    Ok((digest, body.attestations))
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
