// SPDX-License-Identifier: MIT OR Apache-2.0
//! Federated-registry token minting (§4.1, §5).
//!
//! A federated registry is an external peer the core authenticates to on
//! the run's behalf. The token minted for it carries the peer's expected
//! audience, the registry's global id as subject, and a fixed `type` claim
//! of `federated_registry` distinguishing it from the identity provider's
//! other token kinds (`access`, `service_account`, `runner`).
#![deny(unsafe_code)]
#![warn(missing_docs)]

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use orc_error::CoreError;
use serde::{Deserialize, Serialize};

/// The fixed `type` claim value for federated-registry tokens.
pub const TOKEN_TYPE: &str = "federated_registry";

/// Default token lifetime absent an explicit configuration override.
pub const DEFAULT_EXPIRY_SECS: u64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct FederatedRegistryClaims {
    aud: String,
    sub: String,
    #[serde(rename = "type")]
    token_type: String,
    iat: i64,
    exp: i64,
}

/// Mints RS256-signed federated-registry JWTs from a private key held by
/// the core's own identity.
pub struct TokenSigner {
    key: EncodingKey,
}

impl TokenSigner {
    /// Build a signer from an RSA private key in PEM form (PKCS#1 or
    /// PKCS#8).
    ///
    /// # Errors
    /// Returns [`orc_error::ErrorKind::Invalid`] if `pem` isn't a decodable
    /// RSA private key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, CoreError> {
        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| CoreError::invalid("malformed RSA private key").with_source(e))?;
        Ok(Self { key })
    }

    /// Mint a federated-registry token for `audience`/`subject`, expiring
    /// `expiry_secs` seconds from now.
    ///
    /// # Errors
    /// Returns [`orc_error::ErrorKind::Internal`] if signing fails (should
    /// never happen for a validly constructed [`TokenSigner`]).
    pub fn mint(&self, audience: &str, subject: &str, expiry_secs: u64) -> Result<String, CoreError> {
        let now = Utc::now();
        let exp = now
            + Duration::try_seconds(i64::try_from(expiry_secs).unwrap_or(i64::MAX))
                .unwrap_or(Duration::zero());
        let claims = FederatedRegistryClaims {
            aud: audience.to_string(),
            sub: subject.to_string(),
            token_type: TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| CoreError::internal("failed to sign federated-registry token").with_source(e))
    }
}
