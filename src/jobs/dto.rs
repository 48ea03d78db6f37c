use serde::Deserialize;
use time::Date;

use super::model::{JobChanges, JobStatus, NewJob};
use crate::{auth::dto::required, error::ApiError};

/// Body for create and update. No owner field; the owner always comes
/// from the authenticated caller.
#[derive(Debug, Default, Deserialize)]
pub struct JobPayload {
    pub position: Option<String>,
    pub company: Option<String>,
    pub link: Option<String>,
    pub date: Option<Date>,
    pub status: Option<JobStatus>,
    pub notes: Option<String>,
}

impl JobPayload {
    pub fn into_new_job(self) -> Result<NewJob, ApiError> {
        let (Some(position), Some(company), Some(link), Some(date)) = (
            required(self.position),
            required(self.company),
            required(self.link),
            self.date,
        ) else {
            return Err(ApiError::validation(
                "Please provide position, company, link and date",
            ));
        };
        Ok(NewJob {
            position,
            company,
            link,
            date,
            status: self.status.unwrap_or_default(),
            notes: self.notes,
        })
    }

    /// Fields that are present must still be non-empty.
    pub fn into_changes(self) -> Result<JobChanges, ApiError> {
        let position = non_blank("position", self.position)?;
        let company = non_blank("company", self.company)?;
        let link = non_blank("link", self.link)?;
        Ok(JobChanges {
            position,
            company,
            link,
            date: self.date,
            status: self.status,
            notes: self.notes,
        })
    }
}

fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(v) => match required(Some(v)) {
            Some(v) => Ok(Some(v)),
            None => Err(ApiError::validation(format!("{field} must not be empty"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_defaults_to_applied() {
        let payload: JobPayload = serde_json::from_value(json!({
            "position": "SWE",
            "company": "Acme",
            "link": "https://x",
            "date": "2024-01-01"
        }))
        .unwrap();
        let job = payload.into_new_job().unwrap();
        assert_eq!(job.status, JobStatus::Applied);
        assert_eq!(job.date.to_string(), "2024-01-01");
        assert!(job.notes.is_none());
    }

    #[test]
    fn missing_required_field_is_a_validation_error() {
        let payload: JobPayload = serde_json::from_value(json!({
            "position": "SWE",
            "company": "  ",
            "link": "https://x",
            "date": "2024-01-01"
        }))
        .unwrap();
        assert!(matches!(payload.into_new_job(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn unknown_status_fails_to_deserialize() {
        let parsed = serde_json::from_value::<JobPayload>(json!({ "status": "ghosted" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn changes_reject_blanked_required_fields() {
        let payload = JobPayload {
            company: Some(String::new()),
            ..Default::default()
        };
        assert!(payload.into_changes().is_err());

        let changes = JobPayload {
            status: Some(JobStatus::Offer),
            ..Default::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.status, Some(JobStatus::Offer));
        assert!(changes.position.is_none());
    }
}
