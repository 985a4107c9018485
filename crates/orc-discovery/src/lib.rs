// SPDX-License-Identifier: MIT OR Apache-2.0
//! Service-discovery resolver (§4.2).
//!
//! Given a registry host, fetches `/.well-known/terraform.json` and derives
//! the base URL modules are resolved against, plus the `TF_TOKEN_*`
//! environment variable name a caller should read for that host's
//! credential.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use orc_error::CoreError;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    #[serde(rename = "modules.v1")]
    modules_v1: Option<String>,
}

/// Fetch and normalise the modules-v1 base URL for `host`.
///
/// Performs `GET https://{host}/.well-known/terraform.json`. The response
/// must be HTTP 200 with a JSON body carrying a `"modules.v1"` field
/// parseable as a relative-or-absolute URL. The result is resolved against
/// `https://{host}/` so an empty scheme defaults to `https` and an empty
/// host defaults to the source host, and a trailing `/` is appended to the
/// path if missing.
///
/// # Errors
/// Returns [`orc_error::ErrorKind::Invalid`] if `host` doesn't form a valid
/// URL authority, and [`orc_error::ErrorKind::Network`] for any non-2xx
/// response, a non-JSON body, a missing `modules.v1` field, or a
/// `modules.v1` value that isn't a valid URL.
pub async fn discover(client: &reqwest::Client, host: &str) -> Result<Url, CoreError> {
    let source_base = Url::parse(&format!("https://{host}/"))
        .map_err(|e| CoreError::invalid(format!("'{host}' is not a valid registry host")).with_source(e))?;
    discover_at(client, &source_base, host).await
}

/// Like [`discover`], but against an explicit base URL instead of assuming
/// `https://{host}/`. `host` is used only for error messages and the
/// `Network`-kind context.
///
/// Exists so callers that already know a non-default source base (a plain
/// HTTP mock server in tests, or a scheme/port override in production) can
/// reuse the normalisation logic `discover` wraps, without `discover`
/// itself needing a scheme parameter.
pub async fn discover_at(client: &reqwest::Client, source_base: &Url, host: &str) -> Result<Url, CoreError> {
    let discovery_url = source_base
        .join(".well-known/terraform.json")
        .expect("well-known path is a valid relative URL");

    let response = client
        .get(discovery_url)
        .send()
        .await
        .map_err(|e| {
            CoreError::network(format!("service-discovery request to {host} failed")).with_source(e)
        })?;

    if !response.status().is_success() {
        return Err(CoreError::network(format!(
            "service-discovery at {host} returned {}",
            response.status()
        ))
        .with_context("host", host));
    }

    let document: DiscoveryDocument = response.json().await.map_err(|e| {
        CoreError::network(format!("service-discovery response from {host} was not valid JSON"))
            .with_source(e)
    })?;

    let raw = document.modules_v1.ok_or_else(|| {
        CoreError::network(format!("service-discovery document from {host} has no modules.v1 field"))
    })?;

    let mut resolved = source_base.join(&raw).map_err(|e| {
        CoreError::network(format!("modules.v1 value '{raw}' from {host} is not a valid URL"))
            .with_source(e)
    })?;

    if !resolved.path().ends_with('/') {
        let path = format!("{}/", resolved.path());
        resolved.set_path(&path);
    }

    Ok(resolved)
}

/// Derive the `TF_TOKEN_*` environment variable name for `host`.
///
/// IDNA-encodes the host (punycode for non-ASCII labels), replaces `.`
/// with `_` and `-` with `__`, and prepends `TF_TOKEN_`.
///
/// # Errors
/// Returns [`orc_error::ErrorKind::Invalid`] if `host` is empty or fails
/// IDNA encoding.
pub fn derive_token_env_var(host: &str) -> Result<String, CoreError> {
    if host.trim().is_empty() {
        return Err(CoreError::invalid("host must not be empty"));
    }
    let ascii = idna::domain_to_ascii(host).map_err(|e| {
        CoreError::invalid(format!("'{host}' is not a valid IDNA host")).with_context("error", e.to_string())
    })?;

    let mut out = String::from("TF_TOKEN_");
    for c in ascii.chars() {
        match c {
            '.' => out.push('_'),
            '-' => out.push_str("__"),
            other => out.push(other),
        }
    }
    Ok(out)
}
