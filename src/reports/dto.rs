use serde::{Deserialize, Serialize};

use crate::{attendance::repo_types::ReportLine, sessions::repo_types::SessionRow};

#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub session: SessionRow,
    pub records: Vec<ReportLine>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Comma separated session ids.
    #[serde(default)]
    pub sessions: String,
}

impl SummaryQuery {
    /// Distinct ids in the order given.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.sessions.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionScores {
    pub session_id: String,
    pub exam: f64,
    pub am: f64,
    pub pm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub student_name: String,
    pub sessions: Vec<SessionScores>,
    pub total: f64,
    pub average: f64,
}
