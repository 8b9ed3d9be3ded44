use std::collections::BTreeMap;

use tracing::debug;

use super::dto::{SessionReport, SessionScores, StudentSummary};
use crate::{
    attendance::repo_types::{Period, ReportLine},
    error::{AppError, Result},
    sessions::{repo_types::SessionRow, services::get_session},
    state::AppState,
};

pub async fn session_report(st: &AppState, session_id: &str) -> Result<SessionReport> {
    let session = get_session(st, session_id).await?;
    let records = st.store.session_report(session_id).await?;
    debug!(%session_id, records = records.len(), "session report loaded");
    Ok(SessionReport {
        session: SessionRow::from(&session),
        records,
    })
}

pub async fn summary(st: &AppState, session_ids: &[String]) -> Result<Vec<StudentSummary>> {
    if session_ids.is_empty() {
        return Err(AppError::validation("at least one session is required"));
    }

    let mut reports = Vec::with_capacity(session_ids.len());
    for id in session_ids {
        get_session(st, id).await?;
        reports.push((id.clone(), st.store.session_report(id).await?));
    }
    Ok(summarize(&reports))
}

/// Scores each student over the given sessions: Present 1, Late 0.5, Absent 0.
/// `average` is over the periods the student has records for.
pub fn summarize(reports: &[(String, Vec<ReportLine>)]) -> Vec<StudentSummary> {
    let mut by_student: BTreeMap<String, StudentSummary> = BTreeMap::new();

    for (session_id, lines) in reports {
        for line in lines {
            let entry = by_student
                .entry(line.student_id.clone())
                .or_insert_with(|| StudentSummary {
                    student_id: line.student_id.clone(),
                    student_name: line.student_name.clone(),
                    sessions: Vec::new(),
                    total: 0.0,
                    average: 0.0,
                });
            entry.sessions.push(SessionScores {
                session_id: session_id.clone(),
                exam: line.statuses.get(Period::Exam).score(),
                am: line.statuses.get(Period::Morning).score(),
                pm: line.statuses.get(Period::Afternoon).score(),
            });
        }
    }

    let mut out: Vec<StudentSummary> = by_student
        .into_values()
        .map(|mut s| {
            s.total = s.sessions.iter().map(|x| x.exam + x.am + x.pm).sum();
            let scored = (s.sessions.len() * Period::ALL.len()) as f64;
            s.average = if scored > 0.0 { s.total / scored } else { 0.0 };
            s
        })
        .collect();
    out.sort_by(|a, b| {
        a.student_name
            .cmp(&b.student_name)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    out
}
