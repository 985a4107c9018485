// SPDX-License-Identifier: MIT OR Apache-2.0
//! DSSE-envelope / in-toto attestation verification (§4.4).
//!
//! A [`AttestationVerifier`] is built once from a policy's configured RSA
//! public key and then tried against each of a module's attestation strings
//! until one satisfies the expected digest and (optionally) predicate type.
//! Each attempt either succeeds or returns a [`VerificationFailure`] whose
//! message is the diagnostic recorded against the owning rule.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod statement;

use envelope::{DsseEnvelope, EnvelopeVerifier, decode_base64};
use orc_error::CoreError;
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use statement::Statement;

/// Why a single attestation string failed to satisfy a policy.
///
/// Its [`Display`](std::fmt::Display) text is the exact diagnostic recorded
/// against the owning rule; callers join these across attempts with `"; "`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerificationFailure {
    /// The attestation's base64/JSON/DSSE framing was unparseable.
    #[error("malformed attestation")]
    Malformed,
    /// None of the envelope's signatures verified under the policy's key.
    #[error("signature not valid for required public key")]
    InvalidSignature,
    /// The in-toto statement's `subject` array was empty.
    #[error("no subject")]
    NoSubject,
    /// No subject's `sha256` digest matched the module's digest.
    #[error("subject with digest {0} not found")]
    DigestNotFound(String),
    /// The statement's `predicateType` didn't match the policy's.
    #[error("invalid predicate type")]
    InvalidPredicateType,
}

/// Verifies DSSE-enveloped in-toto attestations against one RSA public key.
pub struct AttestationVerifier {
    envelope: EnvelopeVerifier,
}

impl AttestationVerifier {
    /// Build a verifier from an RSA public key in PEM form (SPKI or PKCS#1).
    ///
    /// # Errors
    /// Returns [`orc_error::ErrorKind::Invalid`] if `pem` isn't a decodable
    /// RSA public key.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, CoreError> {
        let key = match RsaPublicKey::from_public_key_pem(pem) {
            Ok(key) => key,
            Err(_) => RsaPublicKey::from_pkcs1_pem(pem)
                .map_err(|e| CoreError::invalid("malformed RSA public key").with_source(e))?,
        };
        Ok(Self { envelope: EnvelopeVerifier::new(key) })
    }

    /// Verify one base64-encoded DSSE envelope against `expected_digest_hex`
    /// and, unless `required_predicate_types` is empty, require the
    /// statement's `predicateType` to be one of them.
    ///
    /// Implements the per-attestation checks: envelope signature, non-empty
    /// subject, a subject digest match, and (if the policy names any) a
    /// predicate-type match. The first attestation a caller finds passing
    /// all of these satisfies the policy; callers iterating several
    /// attestations or several trusted keys should stop at the first `Ok`.
    pub fn verify(
        &self,
        attestation_base64: &str,
        expected_digest_hex: &str,
        required_predicate_types: &[&str],
    ) -> Result<(), VerificationFailure> {
        let envelope_bytes = decode_base64(attestation_base64).ok_or(VerificationFailure::Malformed)?;
        let envelope: DsseEnvelope =
            serde_json::from_slice(&envelope_bytes).map_err(|_| VerificationFailure::Malformed)?;
        let payload_bytes = decode_base64(&envelope.payload).ok_or(VerificationFailure::Malformed)?;

        if !self.envelope.any_signature_valid(&envelope.payload_type, &payload_bytes, &envelope.signatures) {
            return Err(VerificationFailure::InvalidSignature);
        }

        let statement: Statement =
            serde_json::from_slice(&payload_bytes).map_err(|_| VerificationFailure::Malformed)?;

        if statement.subject.is_empty() {
            return Err(VerificationFailure::NoSubject);
        }

        if !statement.has_subject_with_sha256(expected_digest_hex) {
            return Err(VerificationFailure::DigestNotFound(expected_digest_hex.to_string()));
        }

        if !required_predicate_types.is_empty()
            && !required_predicate_types.contains(&statement.predicate_type.as_str())
        {
            return Err(VerificationFailure::InvalidPredicateType);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use rsa::pkcs1v15::SigningKey;
    use rsa::pkcs8::DecodePrivateKey;
    use rsa::signature::{SignatureEncoding, Signer};
    use serde_json::json;
    use sha2::Sha256;

    const TEST_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/test_key_pkcs8.pem");
    const TEST_PUBLIC_KEY_PEM: &str = include_str!("../tests/fixtures/test_key_pub.pem");
    const OTHER_DIGEST: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn sign_envelope(payload_type: &str, payload_json: &serde_json::Value) -> String {
        let key = rsa::RsaPrivateKey::from_pkcs8_pem(TEST_PRIVATE_KEY_PEM).unwrap();
        let signing_key = SigningKey::<Sha256>::new(key);
        let payload_bytes = serde_json::to_vec(payload_json).unwrap();

        let mut pae = Vec::new();
        pae.extend_from_slice(b"DSSEv1");
        pae.push(b' ');
        pae.extend_from_slice(payload_type.len().to_string().as_bytes());
        pae.push(b' ');
        pae.extend_from_slice(payload_type.as_bytes());
        pae.push(b' ');
        pae.extend_from_slice(payload_bytes.len().to_string().as_bytes());
        pae.push(b' ');
        pae.extend_from_slice(&payload_bytes);

        let signature = signing_key.sign(&pae);
        let envelope = json!({
            "payloadType": payload_type,
            "payload": b64(&payload_bytes),
            "signatures": [{"keyid": "test", "sig": b64(&signature.to_bytes())}],
        });
        b64(serde_json::to_vec(&envelope).unwrap().as_slice())
    }

    fn statement(digest_hex: &str, predicate_type: &str) -> serde_json::Value {
        json!({
            "predicateType": predicate_type,
            "subject": [{"name": "module.tar.gz", "digest": {"sha256": digest_hex}}],
        })
    }

    #[test]
    fn valid_attestation_verifies() {
        let verifier = AttestationVerifier::from_public_key_pem(TEST_PUBLIC_KEY_PEM).unwrap();
        let digest = "b".repeat(64);
        let attestation = sign_envelope(
            "application/vnd.in-toto+json",
            &statement(&digest, "https://slsa.dev/provenance/v1"),
        );

        assert!(verifier.verify(&attestation, &digest, &[]).is_ok());
    }

    #[test]
    fn predicate_type_mismatch_is_rejected() {
        let verifier = AttestationVerifier::from_public_key_pem(TEST_PUBLIC_KEY_PEM).unwrap();
        let digest = "c".repeat(64);
        let attestation = sign_envelope(
            "application/vnd.in-toto+json",
            &statement(&digest, "https://slsa.dev/provenance/v1"),
        );

        let err = verifier.verify(&attestation, &digest, &["https://other/v1"]).unwrap_err();
        assert_eq!(err, VerificationFailure::InvalidPredicateType);
    }

    #[test]
    fn digest_mismatch_is_rejected() {
        let verifier = AttestationVerifier::from_public_key_pem(TEST_PUBLIC_KEY_PEM).unwrap();
        let digest = "d".repeat(64);
        let attestation = sign_envelope("application/vnd.in-toto+json", &statement(&digest, "predicate/v1"));

        let err = verifier.verify(&attestation, OTHER_DIGEST, &[]).unwrap_err();
        assert_eq!(err, VerificationFailure::DigestNotFound(OTHER_DIGEST.to_string()));
    }

    #[test]
    fn empty_subject_is_rejected() {
        let verifier = AttestationVerifier::from_public_key_pem(TEST_PUBLIC_KEY_PEM).unwrap();
        let payload = json!({"predicateType": "predicate/v1", "subject": []});
        let attestation = sign_envelope("application/vnd.in-toto+json", &payload);

        let err = verifier.verify(&attestation, OTHER_DIGEST, &[]).unwrap_err();
        assert_eq!(err, VerificationFailure::NoSubject);
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let verifier = AttestationVerifier::from_public_key_pem(TEST_PUBLIC_KEY_PEM).unwrap();
        let digest = "e".repeat(64);
        let attestation = sign_envelope("application/vnd.in-toto+json", &statement(&digest, "predicate/v1"));

        let envelope_bytes = decode_base64(&attestation).unwrap();
        let mut envelope: serde_json::Value = serde_json::from_slice(&envelope_bytes).unwrap();
        envelope["payload"] = json!(b64(br#"{"predicateType":"tampered","subject":[]}"#));
        let tampered = b64(serde_json::to_vec(&envelope).unwrap().as_slice());

        let err = verifier.verify(&tampered, &digest, &[]).unwrap_err();
        assert_eq!(err, VerificationFailure::InvalidSignature);
    }

    #[test]
    fn malformed_base64_is_rejected() {
        let verifier = AttestationVerifier::from_public_key_pem(TEST_PUBLIC_KEY_PEM).unwrap();
        let err = verifier.verify("not-base64!!", "irrelevant", &[]).unwrap_err();
        assert_eq!(err, VerificationFailure::Malformed);
    }

    #[test]
    fn malformed_public_key_is_rejected() {
        let err = AttestationVerifier::from_public_key_pem("not a key").unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::Invalid);
    }
}
