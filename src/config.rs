use anyhow::Context;
use time::{macros::format_description, UtcOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Memory,
}

/// Which calendar date the late cutoff time is combined with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffDate {
    /// The day of the scan, whatever the session's publish date is.
    Today,
    /// The session's publish date.
    Session,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    pub utc_offset: UtcOffset,
    pub cutoff_date: CutoffDate,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            utc_offset: UtcOffset::UTC,
            cutoff_date: CutoffDate::Today,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub database_url: Option<String>,
    pub storage: Option<StorageConfig>,
    pub attendance: AttendanceConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match get("APP_BACKEND").as_deref() {
            None | Some("postgres") => Backend::Postgres,
            Some("memory") => Backend::Memory,
            Some(other) => anyhow::bail!("APP_BACKEND must be postgres or memory, got {other}"),
        };

        let (database_url, storage) = match backend {
            Backend::Memory => (get("DATABASE_URL"), None),
            Backend::Postgres => {
                let database_url = get("DATABASE_URL").context("DATABASE_URL is required")?;
                let storage = StorageConfig {
                    endpoint: get("S3_ENDPOINT").context("S3_ENDPOINT is required")?,
                    bucket: get("S3_BUCKET").context("S3_BUCKET is required")?,
                    access_key: get("S3_ACCESS_KEY").context("S3_ACCESS_KEY is required")?,
                    secret_key: get("S3_SECRET_KEY").context("S3_SECRET_KEY is required")?,
                    region: get("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
                };
                (Some(database_url), Some(storage))
            }
        };

        let utc_offset = match get("SCHOOL_UTC_OFFSET") {
            Some(raw) => parse_offset(&raw)?,
            None => UtcOffset::UTC,
        };

        let cutoff_date = match get("LATE_CUTOFF_DATE").as_deref() {
            None | Some("today") => CutoffDate::Today,
            Some("session") => CutoffDate::Session,
            Some(other) => anyhow::bail!("LATE_CUTOFF_DATE must be today or session, got {other}"),
        };

        Ok(Self {
            backend,
            database_url,
            storage,
            attendance: AttendanceConfig {
                utc_offset,
                cutoff_date,
            },
        })
    }
}

fn parse_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    UtcOffset::parse(
        raw.trim(),
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .with_context(|| format!("SCHOOL_UTC_OFFSET must look like +08:00, got {raw}"))
}
