// SPDX-License-Identifier: MIT OR Apache-2.0
//! Managed identities: the credential a run assumes to talk to a cloud
//! provider, gated by the [`crate::access_rule::AccessRule`]s attached to it
//! (§5).

use crate::{Id, ResourceMetadata};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named, group-owned credential a workspace may bind for plan and/or
/// apply jobs.
///
/// A workspace references a managed identity by id, never by value — the
/// identity's secret payload (cloud-provider specific, out of scope for
/// this core) is held by the credential-issuance subsystem, not here. This
/// type only carries the metadata the rule enforcer needs: who owns it and
/// which rules gate its use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ManagedIdentity {
    /// Shared resource metadata.
    pub metadata: ResourceMetadata,
    /// Human-readable name, unique within the owning group.
    pub name: String,
    /// Owning group.
    pub group_id: Id,
    /// Provider type discriminator (e.g. `aws`, `azure`), opaque to this
    /// crate beyond display and filtering.
    pub provider_type: String,
    /// `true` once soft-deleted. A deleted identity cannot be newly bound
    /// to a workspace but existing bindings are left intact for history.
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn managed_identity_roundtrips_through_json() {
        let mi = ManagedIdentity {
            metadata: ResourceMetadata::new(Id::nil(), "trn:mi:g/aws-prod", now()),
            name: "aws-prod".into(),
            group_id: Id::nil(),
            provider_type: "aws".into(),
            deleted: false,
        };
        let json = serde_json::to_string(&mi).unwrap();
        let back: ManagedIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(mi, back);
    }
}
