use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::instrument;

use super::{
    dto::{CreatedSessionResponse, CurrentPeriodResponse, SessionRequest},
    services,
};
use crate::{
    error::Result, extract::ApiJson, sessions::repo_types::SessionRow, state::AppState,
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route(
            "/sessions/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route("/sessions/:id/current-period", get(current_period))
}

#[instrument(skip(state, body))]
pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SessionRequest>,
) -> Result<(StatusCode, Json<CreatedSessionResponse>)> {
    let session = body.into_session(None)?;
    let (session, records_created) = services::create_session(&state, session).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedSessionResponse {
            session: SessionRow::from(&session),
            records_created,
        }),
    ))
}

/// GET /sessions, newest publish date first.
#[instrument(skip(state))]
pub async fn list_sessions(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let sessions = state.store.list_sessions().await?;
    let data: Vec<SessionRow> = sessions.iter().map(SessionRow::from).collect();
    Ok(Json(json!({ "data": data })))
}

#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionRow>> {
    let session = services::get_session(&state, &id).await?;
    Ok(Json(SessionRow::from(&session)))
}

#[instrument(skip(state, body))]
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SessionRequest>,
) -> Result<Json<SessionRow>> {
    let session = body.into_session(Some(&id))?;
    let updated = services::update_session(&state, session).await?;
    Ok(Json(SessionRow::from(&updated)))
}

#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    services::delete_session(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn current_period(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CurrentPeriodResponse>> {
    let period = services::current_period(&state, &id).await?;
    Ok(Json(CurrentPeriodResponse {
        session_id: id,
        period,
    }))
}
