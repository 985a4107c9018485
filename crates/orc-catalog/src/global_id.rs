// SPDX-License-Identifier: MIT OR Apache-2.0
//! Global id encoding: `base64(type-tag ":" internal-id)`.

use crate::entity::EntityType;
use base64::Engine as _;
use orc_error::CoreError;
use uuid::Uuid;

/// Encode a global id for `(entity_type, internal_id)`.
#[must_use]
pub fn encode_global_id(entity_type: EntityType, internal_id: Uuid) -> String {
    let raw = format!("{}:{internal_id}", entity_type.tag());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw)
}

/// An opaque id the catalog can decode, after distinguishing which of the
/// two textual forms a caller handed it.
pub(crate) enum DecodedRef {
    /// A global id, fully self-describing.
    GlobalId(EntityType, Uuid),
    /// A TRN (`trn:<type-tag>:<path>`) — the internal id still needs to be
    /// resolved through a repository, since a TRN names a path, not an id.
    Trn { entity_type: EntityType, trn: String },
}

/// Decode `opaque_id`, which is either a global id or a TRN
/// (`trn:<type-tag>:...`).
///
/// # Errors
/// [`orc_error::ErrorKind::Invalid`] if the id is structurally malformed
/// (bad base64, bad separator, bad UUID, or an unprefixed/empty TRN).
/// [`orc_error::ErrorKind::NotFound`] if the id is well-formed but names an
/// unrecognised entity type.
pub(crate) fn decode_opaque_id(opaque_id: &str) -> Result<DecodedRef, CoreError> {
    if let Some(rest) = opaque_id.strip_prefix("trn:") {
        let (tag, _) = rest
            .split_once(':')
            .ok_or_else(|| CoreError::invalid(format!("'{opaque_id}' is not a valid TRN")))?;
        let entity_type = EntityType::from_tag(tag)
            .ok_or_else(|| CoreError::not_found(format!("unrecognised entity type '{tag}'")))?;
        return Ok(DecodedRef::Trn { entity_type, trn: opaque_id.to_string() });
    }

    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(opaque_id)
        .map_err(|e| CoreError::invalid(format!("'{opaque_id}' is not a valid global id")).with_source(e))?;
    let raw = String::from_utf8(raw)
        .map_err(|e| CoreError::invalid(format!("'{opaque_id}' is not a valid global id")).with_source(e))?;
    let (tag, id) = raw
        .split_once(':')
        .ok_or_else(|| CoreError::invalid(format!("'{opaque_id}' is not a valid global id")))?;
    let internal_id = Uuid::parse_str(id)
        .map_err(|e| CoreError::invalid(format!("'{opaque_id}' carries a malformed internal id")).with_source(e))?;
    let entity_type =
        EntityType::from_tag(tag).ok_or_else(|| CoreError::not_found(format!("unrecognised entity type '{tag}'")))?;

    Ok(DecodedRef::GlobalId(entity_type, internal_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_id_roundtrips() {
        let id = Uuid::new_v4();
        let encoded = encode_global_id(EntityType::Run, id);
        match decode_opaque_id(&encoded).unwrap() {
            DecodedRef::GlobalId(entity_type, decoded_id) => {
                assert_eq!(entity_type, EntityType::Run);
                assert_eq!(decoded_id, id);
            }
            DecodedRef::Trn { .. } => panic!("expected a global id"),
        }
    }

    #[test]
    fn trn_is_recognised_without_resolving_id() {
        match decode_opaque_id("trn:workspace:acme/prod").unwrap() {
            DecodedRef::Trn { entity_type, trn } => {
                assert_eq!(entity_type, EntityType::Workspace);
                assert_eq!(trn, "trn:workspace:acme/prod");
            }
            DecodedRef::GlobalId(..) => panic!("expected a TRN"),
        }
    }

    #[test]
    fn malformed_base64_is_invalid() {
        let err = decode_opaque_id("not valid base64!!").unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::Invalid);
    }

    #[test]
    fn unknown_type_tag_is_not_found() {
        let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(format!("bogus:{}", Uuid::new_v4()));
        let err = decode_opaque_id(&raw).unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::NotFound);
    }

    #[test]
    fn unknown_trn_type_is_not_found() {
        let err = decode_opaque_id("trn:bogus:acme/prod").unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::NotFound);
    }

    #[test]
    fn malformed_uuid_is_invalid() {
        let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("run:not-a-uuid");
        let err = decode_opaque_id(&raw).unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::Invalid);
    }
}
