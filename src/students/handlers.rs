use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::instrument;

use super::{
    dto::{CreateStudentRequest, Pagination, RegisterBadgeRequest},
    services,
};
use crate::{
    error::Result,
    extract::{ApiJson, ApiQuery},
    signatures,
    state::AppState,
    students::repo_types::Student,
};

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/:id/badge", put(register_badge))
        .route("/students/:id/signature", get(get_signature))
}

/// GET /students?page=1&limit=200
#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
    ApiQuery(p): ApiQuery<Pagination>,
) -> Result<Json<serde_json::Value>> {
    let (limit, offset) = p.limit_offset();
    let data = state.store.list_students(limit, offset).await?;
    Ok(Json(json!({ "data": data })))
}

#[instrument(skip(state))]
pub async fn create_student(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<Student>)> {
    let student = services::create_student(&state, body).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[instrument(skip(state))]
pub async fn register_badge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RegisterBadgeRequest>,
) -> Result<Json<Student>> {
    let student = services::register_badge(&state, &id, &body.badge_code).await?;
    Ok(Json(student))
}

/// 307 to a presigned url of the student's signature.
#[instrument(skip(state))]
pub async fn get_signature(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let url = signatures::presign_signature(&state, &id).await?;
    Ok(Redirect::temporary(&url))
}

