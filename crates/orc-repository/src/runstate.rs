// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`RunRepository`], [`VariableSource`], and [`JobSource`] over the shared
//! [`InMemoryStore`].

use crate::store::{check_cas, InMemoryStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orc_core::{Apply, GroupPath, Id, Job, Plan, Run, RunStage, RunVariable};
use orc_error::CoreError;
use orc_runstate::{JobSource, RunRepository, VariableSource};

#[async_trait]
impl RunRepository for InMemoryStore {
    async fn create(&self, run: Run, plan: Plan, apply: Apply) -> Result<(), CoreError> {
        self.index_trn(&run.metadata.trn.clone(), run.metadata.id);
        self.index_trn(&plan.metadata.trn.clone(), plan.metadata.id);
        self.index_trn(&apply.metadata.trn.clone(), apply.metadata.id);
        self.runs.lock().unwrap().insert(run.metadata.id, run);
        self.plans.lock().unwrap().insert(plan.metadata.id, plan);
        self.applies.lock().unwrap().insert(apply.metadata.id, apply);
        Ok(())
    }

    async fn save_run_variables(&self, run_id: Id, variables: Vec<RunVariable>) -> Result<(), CoreError> {
        self.run_variables.lock().unwrap().insert(run_id, variables);
        Ok(())
    }

    async fn get_run_variables(&self, run_id: Id) -> Result<Vec<RunVariable>, CoreError> {
        Ok(self.run_variables.lock().unwrap().get(&run_id).cloned().unwrap_or_default())
    }

    async fn get_run(&self, run_id: Id) -> Result<Run, CoreError> {
        self.runs
            .lock()
            .unwrap()
            .get(&run_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("no run {run_id}")))
    }

    async fn get_plan(&self, plan_id: Id) -> Result<Plan, CoreError> {
        self.plans
            .lock()
            .unwrap()
            .get(&plan_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("no plan {plan_id}")))
    }

    async fn get_apply(&self, apply_id: Id) -> Result<Apply, CoreError> {
        self.applies
            .lock()
            .unwrap()
            .get(&apply_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("no apply {apply_id}")))
    }

    async fn save_run(&self, run: Run) -> Result<Run, CoreError> {
        let mut runs = self.runs.lock().unwrap();
        let stored = runs
            .get(&run.metadata.id)
            .ok_or_else(|| CoreError::not_found(format!("no run {}", run.metadata.id)))?;
        check_cas(stored.metadata.version, run.metadata.version, run.metadata.id)?;
        runs.insert(run.metadata.id, run.clone());
        Ok(run)
    }

    async fn save_plan(&self, plan: Plan) -> Result<Plan, CoreError> {
        let mut plans = self.plans.lock().unwrap();
        let stored = plans
            .get(&plan.metadata.id)
            .ok_or_else(|| CoreError::not_found(format!("no plan {}", plan.metadata.id)))?;
        check_cas(stored.metadata.version, plan.metadata.version, plan.metadata.id)?;
        plans.insert(plan.metadata.id, plan.clone());
        Ok(plan)
    }

    async fn save_apply(&self, apply: Apply) -> Result<Apply, CoreError> {
        let mut applies = self.applies.lock().unwrap();
        let stored = applies
            .get(&apply.metadata.id)
            .ok_or_else(|| CoreError::not_found(format!("no apply {}", apply.metadata.id)))?;
        check_cas(stored.metadata.version, apply.metadata.version, apply.metadata.id)?;
        applies.insert(apply.metadata.id, apply.clone());
        Ok(apply)
    }
}

#[async_trait]
impl VariableSource for InMemoryStore {
    async fn inherited_variables(&self, workspace_id: Id) -> Result<Vec<RunVariable>, CoreError> {
        let workspace = self
            .workspaces
            .lock()
            .unwrap()
            .get(&workspace_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("no workspace {workspace_id}")))?;

        let groups = self.groups.lock().unwrap();
        let mut inherited = Vec::new();
        for ancestor in workspace.group_path.ancestors_inclusive() {
            if let Some(vars) = groups
                .values()
                .find(|g| g.full_path == ancestor)
                .and_then(|g| self.group_variables.lock().unwrap().get(&g.metadata.id).cloned())
            {
                inherited.extend(vars);
            }
        }
        Ok(inherited)
    }

    async fn workspace_group_path(&self, workspace_id: Id) -> Result<GroupPath, CoreError> {
        self.workspaces
            .lock()
            .unwrap()
            .get(&workspace_id)
            .map(|w| w.group_path.clone())
            .ok_or_else(|| CoreError::not_found(format!("no workspace {workspace_id}")))
    }
}

#[async_trait]
impl JobSource for InMemoryStore {
    async fn active_job_for_run(&self, run_id: Id, stage: RunStage) -> Result<Option<Job>, CoreError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .find(|j| j.run_id == run_id && j.job_type == stage && !j.status.is_terminal())
            .cloned())
    }

    async fn request_job_cancel(&self, job_id: Id, requested_at: DateTime<Utc>) -> Result<(), CoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| CoreError::not_found(format!("no job {job_id}")))?;
        job.cancel_requested_at = Some(requested_at);
        Ok(())
    }
}
