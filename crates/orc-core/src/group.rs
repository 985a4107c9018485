// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hierarchical group / workspace model.
//!
//! Groups nest into an ancestor chain; workspaces hang off a single group.
//! Variable collation (§4.3) walks workspace → group → ancestor groups,
//! and federated-registry lookup (§4.5) walks a workspace's group path to
//! find the deepest-owning ancestor for a hostname.

use crate::{Id, ResourceMetadata};
use serde::{Deserialize, Serialize};

/// A `/`-separated full path of group names from the root group down to
/// (and including, for a workspace, excluding) the entity in question —
/// e.g. `"acme/platform/networking"`.
///
/// Ordered root-first so `ancestors()` yields root → immediate parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPath(pub String);

impl GroupPath {
    /// Construct from a full dotted/slashed path string.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Segments of the path, root first.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// All ancestor paths of `self`, root first, `self` last (inclusive).
    ///
    /// `"a/b/c".ancestors_inclusive() == ["a", "a/b", "a/b/c"]`.
    #[must_use]
    pub fn ancestors_inclusive(&self) -> Vec<GroupPath> {
        let segs = self.segments();
        (1..=segs.len())
            .map(|n| GroupPath(segs[..n].join("/")))
            .collect()
    }

    /// `true` if `self` is an ancestor of, or equal to, `other`.
    #[must_use]
    pub fn is_ancestor_of_or_equal(&self, other: &GroupPath) -> bool {
        let a = self.segments();
        let b = other.segments();
        a.len() <= b.len() && a == b[..a.len()]
    }

    /// Depth (number of segments) — used to pick the "deepest descendant"
    /// owner when multiple federated registries share a hostname.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().len()
    }
}

/// A hierarchical container of workspaces, groups, managed identities, and
/// federated registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Shared resource metadata.
    pub metadata: ResourceMetadata,
    /// Full path from the root group.
    pub full_path: GroupPath,
    /// Parent group id, `None` for a root group.
    pub parent_id: Option<Id>,
    /// Whether this group has been (soft-)deleted. A deleted group
    /// invalidates federated-registry lookups that reference it (§4.5).
    pub deleted: bool,
}

/// The unit holding Terraform state, variables, and runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Shared resource metadata.
    pub metadata: ResourceMetadata,
    /// Owning group id.
    pub group_id: Id,
    /// Full path of the owning group (cached for variable collation without
    /// a repository round trip).
    pub group_path: GroupPath,
}
