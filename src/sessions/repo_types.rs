use serde::Serialize;
use sqlx::FromRow;
use time::{Date, Time};

use crate::{
    attendance::repo_types::Period,
    clock::{serialize_date, serialize_time},
    error::{AppError, Result},
};

/// Start, late cutoff and end of one period. `start < late_cutoff < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: Time,
    pub late_cutoff: Time,
    pub end: Time,
}

impl PeriodWindow {
    pub fn new(period: Period, start: Time, late_cutoff: Time, end: Time) -> Result<Self> {
        if !(start < late_cutoff && late_cutoff < end) {
            return Err(AppError::validation(format!(
                "{period} window must satisfy start < late < end"
            )));
        }
        Ok(Self {
            start,
            late_cutoff,
            end,
        })
    }

    pub fn contains(&self, t: Time) -> bool {
        self.start <= t && t <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub session_name: String,
    pub publish_date: Date,
    pub exam: PeriodWindow,
    pub morning: PeriodWindow,
    pub afternoon: PeriodWindow,
}

impl Session {
    pub fn window(&self, period: Period) -> &PeriodWindow {
        match period {
            Period::Exam => &self.exam,
            Period::Morning => &self.morning,
            Period::Afternoon => &self.afternoon,
        }
    }

    /// First period whose window contains `t`.
    pub fn period_at(&self, t: Time) -> Option<Period> {
        Period::ALL.into_iter().find(|p| self.window(*p).contains(t))
    }
}

/// Flat session layout shared by the `sessions` table and the JSON API.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionRow {
    pub session_id: String,
    pub session_name: String,
    #[serde(serialize_with = "serialize_date")]
    pub publish_date: Date,
    #[serde(serialize_with = "serialize_time")]
    pub exam_start: Time,
    #[serde(serialize_with = "serialize_time")]
    pub exam_late: Time,
    #[serde(serialize_with = "serialize_time")]
    pub exam_end: Time,
    #[serde(serialize_with = "serialize_time")]
    pub am_start: Time,
    #[serde(serialize_with = "serialize_time")]
    pub am_late: Time,
    #[serde(serialize_with = "serialize_time")]
    pub am_end: Time,
    #[serde(serialize_with = "serialize_time")]
    pub pm_start: Time,
    #[serde(serialize_with = "serialize_time")]
    pub pm_late: Time,
    #[serde(serialize_with = "serialize_time")]
    pub pm_end: Time,
}

impl From<SessionRow> for Session {
    fn from(r: SessionRow) -> Self {
        Self {
            session_id: r.session_id,
            session_name: r.session_name,
            publish_date: r.publish_date,
            exam: PeriodWindow {
                start: r.exam_start,
                late_cutoff: r.exam_late,
                end: r.exam_end,
            },
            morning: PeriodWindow {
                start: r.am_start,
                late_cutoff: r.am_late,
                end: r.am_end,
            },
            afternoon: PeriodWindow {
                start: r.pm_start,
                late_cutoff: r.pm_late,
                end: r.pm_end,
            },
        }
    }
}

impl From<&Session> for SessionRow {
    fn from(s: &Session) -> Self {
        Self {
            session_id: s.session_id.clone(),
            session_name: s.session_name.clone(),
            publish_date: s.publish_date,
            exam_start: s.exam.start,
            exam_late: s.exam.late_cutoff,
            exam_end: s.exam.end,
            am_start: s.morning.start,
            am_late: s.morning.late_cutoff,
            am_end: s.morning.end,
            pm_start: s.afternoon.start,
            pm_late: s.afternoon.late_cutoff,
            pm_end: s.afternoon.end,
        }
    }
}
