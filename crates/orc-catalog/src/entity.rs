// SPDX-License-Identifier: MIT OR Apache-2.0
//! The tagged entity kinds the catalog can route a fetch to (§4.8).

use orc_core::{Apply, Group, Job, ManagedIdentity, Plan, Run, Workspace};

/// Discriminator encoded into a global id, and the tag prefixing a TRN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityType {
    /// A [`Run`].
    Run,
    /// A [`Plan`].
    Plan,
    /// An [`Apply`].
    Apply,
    /// A [`Job`].
    Job,
    /// A [`Workspace`].
    Workspace,
    /// A [`Group`].
    Group,
    /// A [`ManagedIdentity`].
    ManagedIdentity,
}

impl EntityType {
    /// The short tag this type encodes to (e.g. `"run"`).
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Job => "job",
            Self::Workspace => "workspace",
            Self::Group => "group",
            Self::ManagedIdentity => "managed_identity",
        }
    }

    /// Parse a tag produced by [`Self::tag`]. `None` for an unrecognised
    /// tag — the caller maps this to `NotFound`, not `Invalid`, since the
    /// surrounding id/TRN was structurally well-formed.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "run" => Some(Self::Run),
            "plan" => Some(Self::Plan),
            "apply" => Some(Self::Apply),
            "job" => Some(Self::Job),
            "workspace" => Some(Self::Workspace),
            "group" => Some(Self::Group),
            "managed_identity" => Some(Self::ManagedIdentity),
            _ => None,
        }
    }
}

/// A polymorphic entity returned from [`crate::fetch_model`], tagged by the
/// kind loaded so callers pattern-match and error on the wrong tag rather
/// than receiving an opaque blob.
#[derive(Debug, Clone)]
pub enum TaggedEntity {
    /// A loaded run.
    Run(Run),
    /// A loaded plan.
    Plan(Plan),
    /// A loaded apply.
    Apply(Apply),
    /// A loaded job.
    Job(Job),
    /// A loaded workspace.
    Workspace(Workspace),
    /// A loaded group.
    Group(Group),
    /// A loaded managed identity.
    ManagedIdentity(ManagedIdentity),
}

impl TaggedEntity {
    /// The [`EntityType`] this value is tagged with.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Run(_) => EntityType::Run,
            Self::Plan(_) => EntityType::Plan,
            Self::Apply(_) => EntityType::Apply,
            Self::Job(_) => EntityType::Job,
            Self::Workspace(_) => EntityType::Workspace,
            Self::Group(_) => EntityType::Group,
            Self::ManagedIdentity(_) => EntityType::ManagedIdentity,
        }
    }
}
