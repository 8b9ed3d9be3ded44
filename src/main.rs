mod app;
mod attendance;
mod clock;
mod config;
mod db;
mod error;
mod extract;
mod memory;
mod reports;
mod sessions;
mod signatures;
mod state;
mod storage;
mod students;
#[cfg(test)]
mod test_support;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "rollcall=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let (state, pool) = AppState::init(config).await?;

    if let Some(pool) = pool {
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    }

    app::serve(app::build_app(state)).await
}
