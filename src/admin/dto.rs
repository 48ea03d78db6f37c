use serde::Serialize;

use crate::activity::model::ActivityEntry;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub logins: Vec<ActivityEntry>,
    pub registrations: Vec<ActivityEntry>,
    pub total_jobs: i64,
}
