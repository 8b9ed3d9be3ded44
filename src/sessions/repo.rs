use anyhow::Context;
use async_trait::async_trait;

use crate::{
    db::{is_unique_violation, PgStore},
    error::{AppError, Result},
    sessions::repo_types::{Session, SessionRow},
};

#[async_trait]
pub trait SessionRepo: Send + Sync {
    /// Inserts the session and one all-`Absent` record per rostered student.
    /// Returns the number of records created.
    async fn create_session(&self, session: &Session) -> Result<u64>;
    /// Sessions ordered by publish date, newest first.
    async fn list_sessions(&self) -> Result<Vec<Session>>;
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>>;
    /// Replaces every field but the id. `None` when the session is absent.
    async fn update_session(&self, session: &Session) -> Result<Option<Session>>;
    /// Deletes the session's records, then the session. `false` when absent.
    async fn delete_session(&self, session_id: &str) -> Result<bool>;
}

const SESSION_COLUMNS: &str = "session_id, session_name, publish_date, \
    exam_start, exam_late, exam_end, am_start, am_late, am_end, pm_start, pm_late, pm_end";

#[async_trait]
impl SessionRepo for PgStore {
    async fn create_session(&self, session: &Session) -> Result<u64> {
        let row = SessionRow::from(session);
        let mut tx = self.pool.begin().await.context("begin tx")?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO sessions (session_id, session_name, publish_date,
                                  exam_start, exam_late, exam_end,
                                  am_start, am_late, am_end,
                                  pm_start, pm_late, pm_end)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&row.session_id)
        .bind(&row.session_name)
        .bind(row.publish_date)
        .bind(row.exam_start)
        .bind(row.exam_late)
        .bind(row.exam_end)
        .bind(row.am_start)
        .bind(row.am_late)
        .bind(row.am_end)
        .bind(row.pm_start)
        .bind(row.pm_late)
        .bind(row.pm_end)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            return Err(if is_unique_violation(&e) {
                AppError::conflict(format!("session {} already exists", row.session_id))
            } else {
                e.into()
            });
        }

        // Roster snapshot and fan-out in one statement.
        let records = sqlx::query(
            r#"
            INSERT INTO attendance_records (session_id, student_id, exam_status, am_status, pm_status)
            SELECT $1, school_id, 'Absent', 'Absent', 'Absent'
              FROM students
            "#,
        )
        .bind(&row.session_id)
        .execute(&mut *tx)
        .await
        .context("fan out attendance records")?
        .rows_affected();

        tx.commit().await.context("commit tx")?;
        Ok(records)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY publish_date DESC, session_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    async fn update_session(&self, session: &Session) -> Result<Option<Session>> {
        let row = SessionRow::from(session);
        let updated = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            UPDATE sessions
               SET session_name = $2, publish_date = $3,
                   exam_start = $4, exam_late = $5, exam_end = $6,
                   am_start = $7, am_late = $8, am_end = $9,
                   pm_start = $10, pm_late = $11, pm_end = $12
             WHERE session_id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(&row.session_id)
        .bind(&row.session_name)
        .bind(row.publish_date)
        .bind(row.exam_start)
        .bind(row.exam_late)
        .bind(row.exam_end)
        .bind(row.am_start)
        .bind(row.am_late)
        .bind(row.am_end)
        .bind(row.pm_start)
        .bind(row.pm_late)
        .bind(row.pm_end)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated.map(Session::from))
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        sqlx::query("DELETE FROM attendance_records WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .context("delete attendance records")?;

        let deleted = sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .context("delete session")?
            .rows_affected();

        tx.commit().await.context("commit tx")?;
        Ok(deleted > 0)
    }
}
