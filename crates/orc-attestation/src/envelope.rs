// SPDX-License-Identifier: MIT OR Apache-2.0
//! DSSE envelope parsing and Pre-Authentication-Encoding signature checks.

use base64::Engine as _;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::{SignatureEncoding, Verifier};
use rsa::RsaPublicKey;
use serde::Deserialize;
use sha2::Sha256;

#[derive(Debug, Deserialize)]
pub(crate) struct DsseEnvelope {
    #[serde(rename = "payloadType")]
    pub(crate) payload_type: String,
    pub(crate) payload: String,
    pub(crate) signatures: Vec<DsseSignature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DsseSignature {
    #[serde(default)]
    #[allow(dead_code)]
    pub(crate) keyid: Option<String>,
    pub(crate) sig: String,
}

/// A public key capable of verifying DSSE envelope signatures.
pub(crate) struct EnvelopeVerifier {
    key: VerifyingKey<Sha256>,
}

impl EnvelopeVerifier {
    pub(crate) fn new(public_key: RsaPublicKey) -> Self {
        Self { key: VerifyingKey::new(public_key) }
    }

    /// `true` if at least one of `envelope`'s signatures verifies over the
    /// DSSE Pre-Authentication Encoding of `payload_type` and `payload`.
    pub(crate) fn any_signature_valid(&self, payload_type: &str, payload: &[u8], signatures: &[DsseSignature]) -> bool {
        let pae = pre_authentication_encoding(payload_type, payload);
        signatures.iter().any(|candidate| {
            let Ok(sig_bytes) = base64::engine::general_purpose::STANDARD.decode(&candidate.sig) else {
                return false;
            };
            let Ok(signature) = Signature::try_from(sig_bytes.as_slice()) else {
                return false;
            };
            self.key.verify(&pae, &signature).is_ok()
        })
    }
}

/// `PAE(type, body) = "DSSEv1" SP LEN(type) SP type SP LEN(body) SP body`,
/// per the DSSE spec (lengths are ASCII decimal byte counts).
fn pre_authentication_encoding(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload_type.len() + payload.len() + 32);
    out.extend_from_slice(b"DSSEv1");
    out.push(b' ');
    out.extend_from_slice(payload_type.len().to_string().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload_type.as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload);
    out
}

pub(crate) fn decode_base64(value: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::STANDARD.decode(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pae_matches_dsse_reference_encoding() {
        let pae = pre_authentication_encoding("http://example.com/Statement", b"hello");
        assert_eq!(
            pae,
            b"DSSEv1 29 http://example.com/Statement 5 hello".to_vec()
        );
    }
}
