use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::{
    model::{JobApplication, JobChanges, NewJob},
    repo::JobRepo,
};
use crate::{
    activity::{model::ActivityKind, recorder::ActivityRecorder},
    error::StoreError,
};

/// Owner-scoped job access. Successful mutations enqueue an activity event
/// without waiting on it.
#[derive(Clone)]
pub struct JobStore {
    repo: Arc<dyn JobRepo>,
    activity: ActivityRecorder,
}

impl JobStore {
    pub fn new(repo: Arc<dyn JobRepo>, activity: ActivityRecorder) -> Self {
        Self { repo, activity }
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<JobApplication>, StoreError> {
        self.repo.list(owner).await
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<JobApplication, StoreError> {
        self.repo.get(owner, id).await
    }

    pub async fn create(&self, owner: Uuid, job: NewJob) -> Result<JobApplication, StoreError> {
        let created = self.repo.create(owner, job).await?;
        self.activity
            .record(owner, ActivityKind::JobCreate, json!({ "jobId": created.id }));
        Ok(created)
    }

    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: JobChanges,
    ) -> Result<JobApplication, StoreError> {
        let updated = self.repo.update(owner, id, changes).await?;
        self.activity
            .record(owner, ActivityKind::JobUpdate, json!({ "jobId": updated.id }));
        Ok(updated)
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        self.repo.delete(owner, id).await?;
        self.activity
            .record(owner, ActivityKind::JobDelete, json!({ "jobId": id }));
        Ok(())
    }

    pub async fn count_all(&self) -> Result<i64, StoreError> {
        self.repo.count_all().await
    }
}
