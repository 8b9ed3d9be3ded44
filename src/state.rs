use std::sync::Arc;

use anyhow::Context;

use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, Backend};
use crate::db::{PgStore, Store};
use crate::memory::MemoryStore;
use crate::storage::{MemoryStorage, Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wires the backend selected by `APP_BACKEND`. For Postgres the pool is
    /// returned as well so `main` can run migrations on it.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, Option<sqlx::PgPool>)> {
        let config = Arc::new(config);
        let clock = Arc::new(SystemClock::new(config.attendance.utc_offset)) as Arc<dyn Clock>;

        match config.backend {
            Backend::Memory => {
                tracing::warn!("using in-memory backend; data is lost on exit");
                Ok((Self::in_memory(config, clock), None))
            }
            Backend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required")?;
                let pg = PgStore::connect(url).await?;
                let pool = pg.pool.clone();

                let storage_cfg = config
                    .storage
                    .as_ref()
                    .context("S3 settings are required")?;
                let storage = Arc::new(Storage::new(storage_cfg).await?) as Arc<dyn StorageClient>;

                let state = Self {
                    store: Arc::new(pg),
                    config,
                    storage,
                    clock,
                };
                Ok((state, Some(pool)))
            }
        }
    }

    pub fn in_memory(config: Arc<AppConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            config,
            storage: Arc::new(MemoryStorage::default()),
            clock,
        }
    }
}
