use axum::{
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{parse_period, ScanRequest, SignatureRequest},
    services::{classify_and_record, record_signature_and_attend, ScanOutcome},
};
use crate::{
    error::{require, Result},
    extract::ApiJson,
    signatures::decode_signature,
    state::AppState,
};

pub fn scan_routes() -> Router<AppState> {
    Router::new().route("/attendance/scan", post(scan))
}

pub fn signature_routes() -> Router<AppState> {
    Router::new()
        .route("/attendance/signature", post(submit_signature))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024)) // 5MB
}

/// POST /attendance/scan { badgeOrManualId, sessionId, period }
#[instrument(skip(state))]
pub async fn scan(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ScanRequest>,
) -> Result<Json<ScanOutcome>> {
    let period = parse_period(&body.period)?;
    require("badgeOrManualId", &body.badge_or_manual_id)?;
    require("sessionId", &body.session_id)?;

    let outcome =
        classify_and_record(&state, &body.badge_or_manual_id, body.session_id.trim(), period)
            .await?;
    Ok(Json(outcome))
}

/// POST /attendance/signature { studentId, sessionId, period, signature }
#[instrument(skip(state, body), fields(student_id = %body.student_id, session_id = %body.session_id))]
pub async fn submit_signature(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignatureRequest>,
) -> Result<Json<ScanOutcome>> {
    let period = parse_period(&body.period)?;
    require("studentId", &body.student_id)?;
    require("sessionId", &body.session_id)?;
    let image = decode_signature(&body.signature)?;

    let outcome = record_signature_and_attend(
        &state,
        &body.student_id,
        body.session_id.trim(),
        period,
        image,
    )
    .await?;
    Ok(Json(outcome))
}
