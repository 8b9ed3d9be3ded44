use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    attendance::{
        repo::AttendanceRepo,
        repo_types::{AttendanceRecord, AttendanceStatus, Period, PeriodStatuses, ReportLine},
    },
    error::{AppError, Result},
    sessions::{repo::SessionRepo, repo_types::Session},
    students::{
        repo::StudentRepo,
        repo_types::{NewStudent, Student},
    },
};

#[derive(Default)]
struct Tables {
    students: BTreeMap<String, Student>,
    sessions: HashMap<String, Session>,
    records: BTreeMap<(String, String), PeriodStatuses>,
}

/// In-process store behind `APP_BACKEND=memory`. One lock covers all tables
/// so the roster snapshot at session creation is consistent.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn by_name(a: &Student, b: &Student) -> std::cmp::Ordering {
    a.name.cmp(&b.name).then_with(|| a.school_id.cmp(&b.school_id))
}

#[async_trait]
impl StudentRepo for MemoryStore {
    async fn list_students(&self, limit: i64, offset: i64) -> Result<Vec<Student>> {
        let t = self.tables.read().await;
        let mut all: Vec<Student> = t.students.values().cloned().collect();
        all.sort_by(by_name);
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn find_by_badge(&self, badge_code: &str) -> Result<Option<Student>> {
        let t = self.tables.read().await;
        Ok(t.students
            .values()
            .find(|s| s.badge_code.as_deref() == Some(badge_code))
            .cloned())
    }

    async fn find_student(&self, school_id: &str) -> Result<Option<Student>> {
        Ok(self.tables.read().await.students.get(school_id).cloned())
    }

    async fn create_student(&self, new: &NewStudent) -> Result<Student> {
        let mut t = self.tables.write().await;
        if t.students.contains_key(&new.school_id) {
            return Err(AppError::conflict(format!(
                "student {} already exists",
                new.school_id
            )));
        }
        let student = Student {
            school_id: new.school_id.clone(),
            name: new.name.clone(),
            section: new.section.clone(),
            badge_code: None,
        };
        t.students.insert(student.school_id.clone(), student.clone());
        Ok(student)
    }

    async fn register_badge(&self, school_id: &str, badge_code: &str) -> Result<Student> {
        let mut t = self.tables.write().await;
        let taken = t
            .students
            .values()
            .any(|s| s.badge_code.as_deref() == Some(badge_code) && s.school_id != school_id);

        let student = t
            .students
            .get_mut(school_id)
            .ok_or_else(|| AppError::not_found("student"))?;
        if student.badge_code.is_some() {
            return Err(AppError::conflict("student already has a registered badge"));
        }
        if taken {
            return Err(AppError::conflict(
                "badge code is already registered to another student",
            ));
        }
        student.badge_code = Some(badge_code.to_string());
        Ok(student.clone())
    }
}

#[async_trait]
impl SessionRepo for MemoryStore {
    async fn create_session(&self, session: &Session) -> Result<u64> {
        let mut t = self.tables.write().await;
        if t.sessions.contains_key(&session.session_id) {
            return Err(AppError::conflict(format!(
                "session {} already exists",
                session.session_id
            )));
        }
        t.sessions
            .insert(session.session_id.clone(), session.clone());

        let roster: Vec<String> = t.students.keys().cloned().collect();
        for student_id in &roster {
            t.records.insert(
                (session.session_id.clone(), student_id.clone()),
                PeriodStatuses::default(),
            );
        }
        Ok(roster.len() as u64)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let t = self.tables.read().await;
        let mut all: Vec<Session> = t.sessions.values().cloned().collect();
        all.sort_by(|a, b| {
            b.publish_date
                .cmp(&a.publish_date)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(all)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(session_id).cloned())
    }

    async fn update_session(&self, session: &Session) -> Result<Option<Session>> {
        let mut t = self.tables.write().await;
        match t.sessions.get_mut(&session.session_id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let mut t = self.tables.write().await;
        t.records.retain(|(sid, _), _| sid != session_id);
        Ok(t.sessions.remove(session_id).is_some())
    }
}

#[async_trait]
impl AttendanceRepo for MemoryStore {
    async fn find_record(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> Result<Option<AttendanceRecord>> {
        let t = self.tables.read().await;
        Ok(t.records
            .get(&(session_id.to_string(), student_id.to_string()))
            .map(|statuses| AttendanceRecord {
                session_id: session_id.to_string(),
                student_id: student_id.to_string(),
                statuses: *statuses,
            }))
    }

    async fn mark_period(
        &self,
        session_id: &str,
        student_id: &str,
        period: Period,
        status: AttendanceStatus,
    ) -> Result<bool> {
        let mut t = self.tables.write().await;
        match t
            .records
            .get_mut(&(session_id.to_string(), student_id.to_string()))
        {
            Some(statuses) if !statuses.get(period).is_marked() => {
                statuses.set(period, status);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn session_report(&self, session_id: &str) -> Result<Vec<ReportLine>> {
        let t = self.tables.read().await;
        let mut lines: Vec<ReportLine> = t
            .records
            .iter()
            .filter(|((sid, _), _)| sid == session_id)
            .filter_map(|((_, student_id), statuses)| {
                t.students.get(student_id).map(|s| ReportLine {
                    student_id: s.school_id.clone(),
                    student_name: s.name.clone(),
                    section: s.section.clone(),
                    statuses: *statuses,
                })
            })
            .collect();
        lines.sort_by(|a, b| {
            a.student_name
                .cmp(&b.student_name)
                .then_with(|| a.student_id.cmp(&b.student_id))
        });
        Ok(lines)
    }
}
