// SPDX-License-Identifier: MIT OR Apache-2.0
//! The event envelope and subscriber filter (§4.3, §4.6).

use orc_core::{Apply, GroupPath, Id, Job, Plan, Run};

/// What happened to the entity, pushed by the transactional writer on
/// every successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// The entity was created.
    Create,
    /// The entity's state changed without reaching a terminal status.
    Update,
    /// The entity moved to a canceled terminal status.
    Cancel,
    /// The entity moved to a completed (successful or errored) terminal
    /// status.
    Complete,
}

/// A snapshot of the entity the event describes, tagged by kind.
#[derive(Debug, Clone)]
pub enum EventSubject {
    /// A Run transition.
    Run(Box<Run>),
    /// A Plan transition.
    Plan(Box<Plan>),
    /// An Apply transition.
    Apply(Box<Apply>),
    /// A Job transition.
    Job(Box<Job>),
}

/// One committed state change, broadcast to every subscriber whose filter
/// matches.
#[derive(Debug, Clone)]
pub struct Event {
    /// What kind of transition this is.
    pub action: EventAction,
    /// The owning run, present for every subject kind (a Run event names
    /// itself).
    pub run_id: Id,
    /// The owning workspace.
    pub workspace_id: Id,
    /// The owning workspace's full group path, cached by the producer so
    /// ancestor-group filters don't need a repository round trip per
    /// publish.
    pub workspace_group_path: GroupPath,
    /// The entity snapshot this event reports.
    pub subject: EventSubject,
}

/// A subscription filter. At least one of the three fields must be set —
/// an all-`None` filter is rejected with `Invalid` by [`crate::subscribe`].
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Match events for this workspace only.
    pub workspace_id: Option<Id>,
    /// Match events for this run only.
    pub run_id: Option<Id>,
    /// Match events for any workspace under this group path (inclusive).
    pub ancestor_group: Option<GroupPath>,
}

impl EventFilter {
    /// `true` if the filter names no criterion at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workspace_id.is_none() && self.run_id.is_none() && self.ancestor_group.is_none()
    }

    /// `true` if `event` satisfies every criterion this filter names.
    /// Criteria left unset don't constrain the match.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(workspace_id) = self.workspace_id
            && workspace_id != event.workspace_id
        {
            return false;
        }
        if let Some(run_id) = self.run_id
            && run_id != event.run_id
        {
            return false;
        }
        if let Some(ancestor_group) = &self.ancestor_group
            && !ancestor_group.is_ancestor_of_or_equal(&event.workspace_group_path)
        {
            return false;
        }
        true
    }
}
