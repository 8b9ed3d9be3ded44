use serde::{Deserialize, Serialize};

use crate::{
    attendance::repo_types::Period,
    clock::{parse_date, parse_time},
    error::{AppError, Result},
    sessions::repo_types::{PeriodWindow, Session, SessionRow},
};

/// Body of session create and update. Every field is required; they are
/// optional here so all missing names can be reported at once.
#[derive(Debug, Default, Deserialize)]
pub struct SessionRequest {
    pub session_id: Option<String>,
    pub session_name: Option<String>,
    pub publish_date: Option<String>,
    #[serde(alias = "weekly_start")]
    pub exam_start: Option<String>,
    #[serde(alias = "weekly_late")]
    pub exam_late: Option<String>,
    #[serde(alias = "weekly_end")]
    pub exam_end: Option<String>,
    pub am_start: Option<String>,
    pub am_late: Option<String>,
    pub am_end: Option<String>,
    pub pm_start: Option<String>,
    pub pm_late: Option<String>,
    pub pm_end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedSessionResponse {
    pub session: SessionRow,
    pub records_created: u64,
}

#[derive(Debug, Serialize)]
pub struct CurrentPeriodResponse {
    pub session_id: String,
    pub period: Option<Period>,
}

fn present(v: &Option<String>) -> bool {
    v.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl SessionRequest {
    /// Builds a session. `path_id` wins over the body id (update by path).
    pub fn into_session(self, path_id: Option<&str>) -> Result<Session> {
        let session_id = path_id.map(str::to_string).or(self.session_id.clone());

        let fields: [(&str, &Option<String>); 12] = [
            ("session_id", &session_id),
            ("session_name", &self.session_name),
            ("publish_date", &self.publish_date),
            ("exam_start", &self.exam_start),
            ("exam_late", &self.exam_late),
            ("exam_end", &self.exam_end),
            ("am_start", &self.am_start),
            ("am_late", &self.am_late),
            ("am_end", &self.am_end),
            ("pm_start", &self.pm_start),
            ("pm_late", &self.pm_late),
            ("pm_end", &self.pm_end),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, v)| !present(v))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "missing required session data: {}",
                missing.join(", ")
            )));
        }

        let text = |v: Option<String>| v.unwrap_or_default().trim().to_string();
        let date = |name: &str, v: Option<String>| {
            parse_date(&text(v))
                .ok_or_else(|| AppError::validation(format!("{name} must be YYYY-MM-DD")))
        };
        let hms = |name: &str, v: Option<String>| {
            parse_time(&text(v))
                .ok_or_else(|| AppError::validation(format!("{name} must be HH:MM or HH:MM:SS")))
        };

        Ok(Session {
            session_id: text(session_id),
            session_name: text(self.session_name),
            publish_date: date("publish_date", self.publish_date)?,
            exam: PeriodWindow::new(
                Period::Exam,
                hms("exam_start", self.exam_start)?,
                hms("exam_late", self.exam_late)?,
                hms("exam_end", self.exam_end)?,
            )?,
            morning: PeriodWindow::new(
                Period::Morning,
                hms("am_start", self.am_start)?,
                hms("am_late", self.am_late)?,
                hms("am_end", self.am_end)?,
            )?,
            afternoon: PeriodWindow::new(
                Period::Afternoon,
                hms("pm_start", self.pm_start)?,
                hms("pm_late", self.pm_late)?,
                hms("pm_end", self.pm_end)?,
            )?,
        })
    }
}

#[cfg(test)]
pub(crate) fn full_request(id: &str) -> SessionRequest {
    let s = |v: &str| Some(v.to_string());
    SessionRequest {
        session_id: s(id),
        session_name: s("Week 1"),
        publish_date: s("2025-06-02"),
        exam_start: s("07:00"),
        exam_late: s("07:30"),
        exam_end: s("08:00"),
        am_start: s("08:00"),
        am_late: s("08:30"),
        am_end: s("12:00"),
        pm_start: s("13:00"),
        pm_late: s("13:30:00"),
        pm_end: s("17:00"),
    }
}
