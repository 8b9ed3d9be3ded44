use std::{fmt, str::FromStr};

use serde::{ser::SerializeMap, Serialize, Serializer};
use sqlx::FromRow;

/// One of the three daily attendance windows of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Exam,
    Morning,
    Afternoon,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Exam, Period::Morning, Period::Afternoon];

    fn index(self) -> usize {
        match self {
            Period::Exam => 0,
            Period::Morning => 1,
            Period::Afternoon => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Exam => "exam",
            Period::Morning => "am",
            Period::Afternoon => "pm",
        }
    }

    /// Status column of `attendance_records` holding this period.
    pub fn status_column(self) -> &'static str {
        match self {
            Period::Exam => "exam_status",
            Period::Morning => "am_status",
            Period::Afternoon => "pm_status",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPeriod(pub String);

impl fmt::Display for UnknownPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown period '{}', expected exam, am or pm", self.0)
    }
}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exam" | "exam_status" | "weekly" => Ok(Period::Exam),
            "am" | "morning" | "am_status" => Ok(Period::Morning),
            "pm" | "afternoon" | "pm_status" => Ok(Period::Afternoon),
            _ => Err(UnknownPeriod(s.to_string())),
        }
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Attendance state of one period. `Present` and `Late` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AttendanceStatus {
    #[default]
    Absent,
    Present,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Late => "Late",
        }
    }

    pub fn is_marked(self) -> bool {
        !matches!(self, AttendanceStatus::Absent)
    }

    /// Weight used by the multi-session summary.
    pub fn score(self) -> f64 {
        match self {
            AttendanceStatus::Absent => 0.0,
            AttendanceStatus::Present => 1.0,
            AttendanceStatus::Late => 0.5,
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Absent" => Ok(AttendanceStatus::Absent),
            "Present" => Ok(AttendanceStatus::Present),
            "Late" => Ok(AttendanceStatus::Late),
            other => anyhow::bail!("unknown attendance status '{other}'"),
        }
    }
}

/// Status per period, serialized as `{"exam": .., "am": .., "pm": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodStatuses([AttendanceStatus; 3]);

impl PeriodStatuses {
    pub fn get(&self, period: Period) -> AttendanceStatus {
        self.0[period.index()]
    }

    pub fn set(&mut self, period: Period, status: AttendanceStatus) {
        self.0[period.index()] = status;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, AttendanceStatus)> + '_ {
        Period::ALL.into_iter().map(|p| (p, self.get(p)))
    }

    fn from_columns(exam: &str, am: &str, pm: &str) -> anyhow::Result<Self> {
        Ok(Self([exam.parse()?, am.parse()?, pm.parse()?]))
    }
}

impl Serialize for PeriodStatuses {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(3))?;
        for (period, status) in self.iter() {
            map.serialize_entry(period.as_str(), &status)?;
        }
        map.end()
    }
}

/// One row per (session, student).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub session_id: String,
    pub student_id: String,
    pub statuses: PeriodStatuses,
}

/// A record joined with the student's roster data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub statuses: PeriodStatuses,
}

#[derive(Debug, FromRow)]
pub struct RecordRow {
    pub session_id: String,
    pub student_id: String,
    pub exam_status: String,
    pub am_status: String,
    pub pm_status: String,
}

impl TryFrom<RecordRow> for AttendanceRecord {
    type Error = anyhow::Error;

    fn try_from(r: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            statuses: PeriodStatuses::from_columns(&r.exam_status, &r.am_status, &r.pm_status)?,
            session_id: r.session_id,
            student_id: r.student_id,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ReportLineRow {
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub exam_status: String,
    pub am_status: String,
    pub pm_status: String,
}

impl TryFrom<ReportLineRow> for ReportLine {
    type Error = anyhow::Error;

    fn try_from(r: ReportLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            statuses: PeriodStatuses::from_columns(&r.exam_status, &r.am_status, &r.pm_status)?,
            student_id: r.student_id,
            student_name: r.student_name,
            section: r.section,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_accepts_aliases() {
        assert_eq!("exam".parse::<Period>().unwrap(), Period::Exam);
        assert_eq!("Morning".parse::<Period>().unwrap(), Period::Morning);
        assert_eq!("am_status".parse::<Period>().unwrap(), Period::Morning);
        assert_eq!(" PM ".parse::<Period>().unwrap(), Period::Afternoon);
        assert_eq!("afternoon".parse::<Period>().unwrap(), Period::Afternoon);
    }

    #[test]
    fn period_rejects_anything_else() {
        let err = "evening".parse::<Period>().unwrap_err();
        assert!(err.to_string().contains("evening"));
        assert!("".parse::<Period>().is_err());
    }

    #[test]
    fn statuses_start_absent_and_are_keyed_by_period() {
        let mut statuses = PeriodStatuses::default();
        assert!(statuses.iter().all(|(_, s)| s == AttendanceStatus::Absent));

        statuses.set(Period::Afternoon, AttendanceStatus::Late);
        assert_eq!(statuses.get(Period::Afternoon), AttendanceStatus::Late);
        assert_eq!(statuses.get(Period::Exam), AttendanceStatus::Absent);
        assert_eq!(statuses.get(Period::Morning), AttendanceStatus::Absent);
    }

    #[test]
    fn statuses_serialize_as_map() {
        let mut statuses = PeriodStatuses::default();
        statuses.set(Period::Morning, AttendanceStatus::Present);
        let json = serde_json::to_value(statuses).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"exam": "Absent", "am": "Present", "pm": "Absent"})
        );
    }

    #[test]
    fn record_row_rejects_unknown_status() {
        let row = RecordRow {
            session_id: "S1".into(),
            student_id: "2021-001".into(),
            exam_status: "Absent".into(),
            am_status: "Excused".into(),
            pm_status: "Absent".into(),
        };
        assert!(AttendanceRecord::try_from(row).is_err());
    }

    #[test]
    fn scores() {
        assert_eq!(AttendanceStatus::Absent.score(), 0.0);
        assert_eq!(AttendanceStatus::Late.score(), 0.5);
        assert_eq!(AttendanceStatus::Present.score(), 1.0);
        assert!(AttendanceStatus::Late.is_marked());
        assert!(!AttendanceStatus::Absent.is_marked());
    }
}
