use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{attendance::repo::AttendanceRepo, sessions::repo::SessionRepo, students::repo::StudentRepo};

/// Everything the handlers need from persistence.
pub trait Store: StudentRepo + SessionRepo + AttendanceRepo {}

impl<T> Store for T where T: StudentRepo + SessionRepo + AttendanceRepo {}

/// Postgres-backed store; the repository impls live next to each domain module.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
