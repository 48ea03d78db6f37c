//! In-memory repositories backing `AppState::in_memory` in tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    activity::{
        model::{ActivityEntry, ActivityKind, ActivityUser, NewActivity},
        repo::ActivityRepo,
    },
    error::StoreError,
    jobs::{
        model::{JobApplication, JobChanges, NewJob},
        repo::JobRepo,
    },
    users::{
        model::{Role, User},
        repo::UserRepo,
    },
};

#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepo {
    fn get(&self, id: Uuid) -> Option<User> {
        self.users.read().iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.get(id))
    }

    async fn update_profile(&self, id: Uuid, name: &str, email: &str) -> Result<User, StoreError> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == email && u.id != id) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = users.iter_mut().find(|u| u.id == id).ok_or(StoreError::NotFound)?;
        user.name = name.into();
        user.email = email.into();
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.users.write();
        let user = users.iter_mut().find(|u| u.id == id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.into();
        user.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<User, StoreError> {
        let mut users = self.users.write();
        let user = users.iter_mut().find(|u| u.id == id).ok_or(StoreError::NotFound)?;
        user.role = role;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().iter().rev().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryJobRepo {
    jobs: RwLock<Vec<JobApplication>>,
}

#[async_trait]
impl JobRepo for MemoryJobRepo {
    async fn list(&self, owner: Uuid) -> Result<Vec<JobApplication>, StoreError> {
        let mut owned: Vec<_> = self
            .jobs
            .read()
            .iter()
            .rev()
            .filter(|j| j.user_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(owned)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<JobApplication, StoreError> {
        self.jobs
            .read()
            .iter()
            .find(|j| j.id == id && j.user_id == owner)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, owner: Uuid, job: NewJob) -> Result<JobApplication, StoreError> {
        let now = OffsetDateTime::now_utc();
        let row = JobApplication {
            id: Uuid::new_v4(),
            user_id: owner,
            position: job.position,
            company: job.company,
            link: job.link,
            date: job.date,
            status: job.status,
            notes: job.notes,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: JobChanges,
    ) -> Result<JobApplication, StoreError> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id && j.user_id == owner)
            .ok_or(StoreError::NotFound)?;
        changes.apply(job);
        job.updated_at = OffsetDateTime::now_utc();
        Ok(job.clone())
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|j| !(j.id == id && j.user_id == owner));
        if jobs.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count_all(&self) -> Result<i64, StoreError> {
        Ok(self.jobs.read().len() as i64)
    }
}

pub struct MemoryActivityRepo {
    users: Arc<MemoryUserRepo>,
    events: RwLock<Vec<(Uuid, NewActivity, OffsetDateTime)>>,
}

impl MemoryActivityRepo {
    pub fn new(users: Arc<MemoryUserRepo>) -> Self {
        Self {
            users,
            events: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ActivityRepo for MemoryActivityRepo {
    async fn insert(&self, event: NewActivity) -> Result<(), StoreError> {
        self.events
            .write()
            .push((Uuid::new_v4(), event, OffsetDateTime::now_utc()));
        Ok(())
    }

    async fn recent(&self, kind: ActivityKind, limit: i64) -> Result<Vec<ActivityEntry>, StoreError> {
        let events = self.events.read();
        Ok(events
            .iter()
            .rev()
            .filter(|(_, e, _)| e.kind == kind)
            .take(limit.max(0) as usize)
            .map(|(id, e, at)| ActivityEntry {
                id: *id,
                kind: e.kind,
                details: e.details.clone(),
                created_at: *at,
                user: self.users.get(e.user_id).map(|u| ActivityUser {
                    id: u.id,
                    name: u.name,
                    email: u.email,
                }),
            })
            .collect())
    }
}

/// Rejects every call, for exercising the best-effort path.
pub struct FailingActivityRepo;

#[async_trait]
impl ActivityRepo for FailingActivityRepo {
    async fn insert(&self, _event: NewActivity) -> Result<(), StoreError> {
        Err(StoreError::Backend(anyhow::anyhow!("activity store unavailable")))
    }

    async fn recent(&self, _kind: ActivityKind, _limit: i64) -> Result<Vec<ActivityEntry>, StoreError> {
        Err(StoreError::Backend(anyhow::anyhow!("activity store unavailable")))
    }
}
