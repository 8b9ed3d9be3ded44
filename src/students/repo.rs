use async_trait::async_trait;

use crate::{
    db::{is_unique_violation, PgStore},
    error::{AppError, Result},
    students::repo_types::{NewStudent, Student},
};

#[async_trait]
pub trait StudentRepo: Send + Sync {
    /// Students ordered by name.
    async fn list_students(&self, limit: i64, offset: i64) -> Result<Vec<Student>>;
    async fn find_by_badge(&self, badge_code: &str) -> Result<Option<Student>>;
    async fn find_student(&self, school_id: &str) -> Result<Option<Student>>;
    async fn create_student(&self, new: &NewStudent) -> Result<Student>;
    /// Binds a badge to a student that has none yet.
    async fn register_badge(&self, school_id: &str, badge_code: &str) -> Result<Student>;
}

#[async_trait]
impl StudentRepo for PgStore {
    async fn list_students(&self, limit: i64, offset: i64) -> Result<Vec<Student>> {
        let rows = sqlx::query_as::<_, Student>(
            r#"
            SELECT school_id, name, section, badge_code
              FROM students
             ORDER BY name ASC, school_id ASC
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_badge(&self, badge_code: &str) -> Result<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT school_id, name, section, badge_code
              FROM students
             WHERE badge_code = $1
            "#,
        )
        .bind(badge_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn find_student(&self, school_id: &str) -> Result<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT school_id, name, section, badge_code
              FROM students
             WHERE school_id = $1
            "#,
        )
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn create_student(&self, new: &NewStudent) -> Result<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (school_id, name, section)
            VALUES ($1, $2, $3)
            RETURNING school_id, name, section, badge_code
            "#,
        )
        .bind(&new.school_id)
        .bind(&new.name)
        .bind(&new.section)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("student {} already exists", new.school_id))
            } else {
                e.into()
            }
        })
    }

    async fn register_badge(&self, school_id: &str, badge_code: &str) -> Result<Student> {
        let updated = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
               SET badge_code = $2
             WHERE school_id = $1 AND badge_code IS NULL
            RETURNING school_id, name, section, badge_code
            "#,
        )
        .bind(school_id)
        .bind(badge_code)
        .fetch_optional(&self.pool)
        .await;

        match updated {
            Ok(Some(student)) => Ok(student),
            Ok(None) => match self.find_student(school_id).await? {
                None => Err(AppError::not_found("student")),
                Some(_) => Err(AppError::conflict("student already has a registered badge")),
            },
            Err(e) if is_unique_violation(&e) => Err(AppError::conflict(
                "badge code is already registered to another student",
            )),
            Err(e) => Err(e.into()),
        }
    }
}
