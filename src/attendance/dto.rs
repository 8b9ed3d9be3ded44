use serde::Deserialize;

use crate::{attendance::repo_types::Period, error::AppError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(alias = "rfidCode")]
    pub badge_or_manual_id: String,
    pub session_id: String,
    #[serde(alias = "statusColumn")]
    pub period: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    #[serde(alias = "schoolId")]
    pub student_id: String,
    pub session_id: String,
    #[serde(alias = "statusColumn")]
    pub period: String,
    /// Base64 PNG, optionally as a `data:` URL.
    pub signature: String,
}

pub(crate) fn parse_period(raw: &str) -> Result<Period, AppError> {
    raw.parse::<Period>()
        .map_err(|e| AppError::validation(e.to_string()))
}
