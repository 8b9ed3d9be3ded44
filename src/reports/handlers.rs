use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{SessionReport, StudentSummary, SummaryQuery},
    services,
};
use crate::{error::Result, extract::ApiQuery, state::AppState};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(get_summary))
        .route("/reports/:session_id/attendance", get(get_session_report))
}

/// GET /reports/:session_id/attendance
#[instrument(skip(state))]
pub async fn get_session_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionReport>> {
    Ok(Json(services::session_report(&state, &session_id).await?))
}

/// GET /reports/summary?sessions=W1,W2
#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<SummaryQuery>,
) -> Result<Json<Vec<StudentSummary>>> {
    Ok(Json(services::summary(&state, &q.session_ids()).await?))
}
