//! Fixtures shared by the unit tests.

use std::sync::Arc;

use time::{
    macros::{date, time},
    OffsetDateTime,
};

use crate::{
    attendance::repo_types::Period,
    clock::FixedClock,
    config::{AppConfig, AttendanceConfig, Backend, CutoffDate},
    sessions::repo_types::{PeriodWindow, Session},
    state::AppState,
    students::repo_types::NewStudent,
};

/// Session on 2025-06-02: exam 07:00/07:30/08:00, am 08:00/08:30/12:00,
/// pm 13:00/13:30/17:00.
pub(crate) fn sample_session(id: &str) -> Session {
    Session {
        session_id: id.to_string(),
        session_name: format!("Session {id}"),
        publish_date: date!(2025 - 06 - 02),
        exam: window(Period::Exam, time!(07:00), time!(07:30), time!(08:00)),
        morning: window(Period::Morning, time!(08:00), time!(08:30), time!(12:00)),
        afternoon: window(Period::Afternoon, time!(13:00), time!(13:30), time!(17:00)),
    }
}

fn window(period: Period, start: time::Time, late: time::Time, end: time::Time) -> PeriodWindow {
    PeriodWindow::new(period, start, late, end).expect("valid fixture window")
}

pub(crate) fn new_student(id: &str, name: &str) -> NewStudent {
    NewStudent {
        school_id: id.to_string(),
        name: name.to_string(),
        section: "Grade 10 - Rizal".to_string(),
    }
}

pub(crate) fn memory_config(cutoff_date: CutoffDate) -> AppConfig {
    AppConfig {
        backend: Backend::Memory,
        database_url: None,
        storage: None,
        attendance: AttendanceConfig {
            cutoff_date,
            ..AttendanceConfig::default()
        },
    }
}

/// Memory-backed state whose clock is frozen at `now`.
pub(crate) fn state_at(now: OffsetDateTime) -> AppState {
    state_with(now, CutoffDate::Today)
}

pub(crate) fn state_with(now: OffsetDateTime, cutoff_date: CutoffDate) -> AppState {
    AppState::in_memory(Arc::new(memory_config(cutoff_date)), Arc::new(FixedClock(now)))
}
