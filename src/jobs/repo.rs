use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{JobApplication, JobChanges, NewJob};
use crate::error::StoreError;

/// Owner-scoped persistence. Every single-record call matches on id and owner
/// in one predicate; a foreign record is `NotFound` exactly like a missing one.
#[async_trait]
pub trait JobRepo: Send + Sync {
    /// Newest application date first.
    async fn list(&self, owner: Uuid) -> Result<Vec<JobApplication>, StoreError>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<JobApplication, StoreError>;
    async fn create(&self, owner: Uuid, job: NewJob) -> Result<JobApplication, StoreError>;
    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: JobChanges,
    ) -> Result<JobApplication, StoreError>;
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError>;
    /// Across all owners; admin only.
    async fn count_all(&self) -> Result<i64, StoreError>;
}

const JOB_COLUMNS: &str =
    "id, user_id, position, company, link, date, status, notes, created_at, updated_at";

pub struct PgJobRepo {
    db: PgPool,
}

impl PgJobRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobRepo for PgJobRepo {
    async fn list(&self, owner: Uuid) -> Result<Vec<JobApplication>, StoreError> {
        let rows = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE user_id = $1
            ORDER BY date DESC, created_at DESC
            "#
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<JobApplication, StoreError> {
        sqlx::query_as::<_, JobApplication>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn create(&self, owner: Uuid, job: NewJob) -> Result<JobApplication, StoreError> {
        let row = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            INSERT INTO jobs (id, user_id, position, company, link, date, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&job.position)
        .bind(&job.company)
        .bind(&job.link)
        .bind(job.date)
        .bind(job.status.as_str())
        .bind(&job.notes)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: JobChanges,
    ) -> Result<JobApplication, StoreError> {
        sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            UPDATE jobs
               SET position = COALESCE($3, position),
                   company = COALESCE($4, company),
                   link = COALESCE($5, link),
                   date = COALESCE($6, date),
                   status = COALESCE($7, status),
                   notes = COALESCE($8, notes),
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(changes.position)
        .bind(changes.company)
        .bind(changes.link)
        .bind(changes.date)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.notes)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM jobs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count_all(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
