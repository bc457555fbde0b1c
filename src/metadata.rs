use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_name: String,
    pub project_description: String,
    pub project_start_date: NaiveDate,
    /// The as-of date progress is measured against.
    pub status_date: NaiveDate,
    /// Seeds the backward pass when present; otherwise the latest early
    /// finish across terminal activities is used.
    #[serde(default)]
    pub target_finish_date: Option<NaiveDate>,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        Self {
            project_name: "New Project".to_string(),
            project_description: "No description".to_string(),
            project_start_date: start,
            status_date: start,
            target_finish_date: None,
        }
    }
}
