// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`AccessRuleSource`] and [`StateVersionSource`] over the shared
//! [`InMemoryStore`].

use crate::store::InMemoryStore;
use async_trait::async_trait;
use orc_core::{AccessRule, Id};
use orc_error::CoreError;
use orc_policy::{AccessRuleSource, RunLineage, StateVersionSource};

#[async_trait]
impl AccessRuleSource for InMemoryStore {
    async fn rules_for_managed_identity(&self, managed_identity_id: Id) -> Result<Vec<AccessRule>, CoreError> {
        Ok(self
            .access_rules
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.managed_identity_id == managed_identity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StateVersionSource for InMemoryStore {
    async fn run_id_of(&self, state_version_id: &str) -> Result<Option<Id>, CoreError> {
        self.state_version_runs
            .lock()
            .unwrap()
            .get(state_version_id)
            .copied()
            .ok_or_else(|| CoreError::not_found(format!("no state version {state_version_id}")))
    }

    async fn run_lineage(&self, run_id: Id) -> Result<RunLineage, CoreError> {
        let run = self
            .runs
            .lock()
            .unwrap()
            .get(&run_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("no run {run_id}")))?;
        Ok(RunLineage { destroy: run.destroy, module_source: run.module_source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_now;
    use orc_core::{ResourceMetadata, RunStage, RuleType};
    use std::collections::BTreeSet;

    fn rule(managed_identity_id: Id) -> AccessRule {
        AccessRule {
            metadata: ResourceMetadata::new(Id::new_v4(), "trn:rule:g/mi/r1", test_now()),
            managed_identity_id,
            run_stage: RunStage::Plan,
            rule_type: RuleType::EligiblePrincipals,
            allowed_user_ids: BTreeSet::from(["u1".to_string()]),
            allowed_service_account_ids: BTreeSet::new(),
            allowed_team_ids: BTreeSet::new(),
            module_attestation_policies: Vec::new(),
            verify_state_lineage: false,
        }
    }

    #[tokio::test]
    async fn rules_filtered_by_managed_identity() {
        let store = InMemoryStore::new();
        let mi = Id::new_v4();
        let r = rule(mi);
        store.access_rules.lock().unwrap().insert(r.metadata.id, r);
        store.access_rules.lock().unwrap().insert(Id::new_v4(), rule(Id::new_v4()));

        let rules = store.rules_for_managed_identity(mi).await.unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[tokio::test]
    async fn unknown_state_version_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.run_id_of("sv-missing").await.unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn manually_uploaded_state_version_has_no_run() {
        let store = InMemoryStore::new();
        store.state_version_runs.lock().unwrap().insert("sv-1".to_string(), None);
        assert_eq!(store.run_id_of("sv-1").await.unwrap(), None);
    }
}
