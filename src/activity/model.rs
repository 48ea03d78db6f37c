use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::UnknownVariant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    Register,
    JobCreate,
    JobUpdate,
    JobDelete,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Login => "login",
            ActivityKind::Register => "register",
            ActivityKind::JobCreate => "job_create",
            ActivityKind::JobUpdate => "job_update",
            ActivityKind::JobDelete => "job_delete",
        }
    }
}

impl TryFrom<String> for ActivityKind {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "login" => Ok(ActivityKind::Login),
            "register" => Ok(ActivityKind::Register),
            "job_create" => Ok(ActivityKind::JobCreate),
            "job_update" => Ok(ActivityKind::JobUpdate),
            "job_delete" => Ok(ActivityKind::JobDelete),
            other => Err(UnknownVariant {
                kind: "activity kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Name and email of the subject, joined in for the admin view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActivityUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub details: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// `None` if the subject user no longer resolves.
    pub user: Option<ActivityUser>,
}

/// An event waiting to be persisted.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub kind: ActivityKind,
    pub details: serde_json::Value,
}
