use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::UnknownVariant;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
    Pending,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Applied => "applied",
            JobStatus::Interview => "interview",
            JobStatus::Offer => "offer",
            JobStatus::Rejected => "rejected",
            JobStatus::Pending => "pending",
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "applied" => Ok(JobStatus::Applied),
            "interview" => Ok(JobStatus::Interview),
            "offer" => Ok(JobStatus::Offer),
            "rejected" => Ok(JobStatus::Rejected),
            "pending" => Ok(JobStatus::Pending),
            other => Err(UnknownVariant {
                kind: "job status",
                value: other.to_string(),
            }),
        }
    }
}

/// A tracked application. `user_id` is the owner and never changes.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub position: String,
    pub company: String,
    pub link: String,
    pub date: Date,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated fields for a new record. The owner is supplied separately.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub position: String,
    pub company: String,
    pub link: String,
    pub date: Date,
    pub status: JobStatus,
    pub notes: Option<String>,
}

/// Fields to overwrite on update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct JobChanges {
    pub position: Option<String>,
    pub company: Option<String>,
    pub link: Option<String>,
    pub date: Option<Date>,
    pub status: Option<JobStatus>,
    pub notes: Option<String>,
}

impl JobChanges {
    pub fn apply(self, job: &mut JobApplication) {
        if let Some(v) = self.position {
            job.position = v;
        }
        if let Some(v) = self.company {
            job.company = v;
        }
        if let Some(v) = self.link {
            job.link = v;
        }
        if let Some(v) = self.date {
            job.date = v;
        }
        if let Some(v) = self.status {
            job.status = v;
        }
        if let Some(v) = self.notes {
            job.notes = Some(v);
        }
    }
}
