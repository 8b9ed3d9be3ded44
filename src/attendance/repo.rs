use anyhow::Context;
use async_trait::async_trait;

use crate::{
    attendance::repo_types::{
        AttendanceRecord, AttendanceStatus, Period, RecordRow, ReportLine, ReportLineRow,
    },
    db::PgStore,
    error::Result,
};

#[async_trait]
pub trait AttendanceRepo: Send + Sync {
    async fn find_record(&self, session_id: &str, student_id: &str)
        -> Result<Option<AttendanceRecord>>;
    /// Writes `status` into `period` if that period is still `Absent`.
    /// Returns whether a row changed.
    async fn mark_period(
        &self,
        session_id: &str,
        student_id: &str,
        period: Period,
        status: AttendanceStatus,
    ) -> Result<bool>;
    /// Records of a session joined with the roster, ordered by student name.
    async fn session_report(&self, session_id: &str) -> Result<Vec<ReportLine>>;
}

#[async_trait]
impl AttendanceRepo for PgStore {
    async fn find_record(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> Result<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT session_id, student_id, exam_status, am_status, pm_status
              FROM attendance_records
             WHERE session_id = $1 AND student_id = $2
            "#,
        )
        .bind(session_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AttendanceRecord::try_from).transpose()?)
    }

    async fn mark_period(
        &self,
        session_id: &str,
        student_id: &str,
        period: Period,
        status: AttendanceStatus,
    ) -> Result<bool> {
        let column = period.status_column();
        let changed = sqlx::query(&format!(
            r#"
            UPDATE attendance_records
               SET {column} = $3
             WHERE session_id = $1 AND student_id = $2 AND {column} = 'Absent'
            "#
        ))
        .bind(session_id)
        .bind(student_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("update {column}"))?
        .rows_affected();
        Ok(changed > 0)
    }

    async fn session_report(&self, session_id: &str) -> Result<Vec<ReportLine>> {
        let rows = sqlx::query_as::<_, ReportLineRow>(
            r#"
            SELECT r.student_id, s.name AS student_name, s.section,
                   r.exam_status, r.am_status, r.pm_status
              FROM attendance_records r
              JOIN students s ON s.school_id = r.student_id
             WHERE r.session_id = $1
             ORDER BY s.name ASC, r.student_id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(ReportLine::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(lines)
    }
}
