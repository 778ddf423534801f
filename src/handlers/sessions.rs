//! Session lifecycle endpoints: signed-URL minting, duration checkpoints,
//! and completion.

use axum::Json;
use axum::extract::State;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApiJson, require_field};
use crate::db::is_unique_violation;
use crate::errors::app_error::{AppError, AppResult};
use crate::quota;
use crate::state::AppState;

/// Attempts at inserting a freshly generated session id before giving up.
/// A collision requires a 128-bit random match, so the retry is essentially
/// never taken; the bound keeps a misbehaving store from looping.
const MAX_SESSION_ID_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpenSessionResponse {
    pub signed_url: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionUpdateRequest {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    /// Optional on both the checkpoint and the close path; `None` keeps the
    /// stored value, `Some(0)` is a valid explicit duration.
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// A fresh session token: `sess_` plus a 128-bit random identifier.
fn generate_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}

/// Handler for POST /voice/get-signed-url.
///
/// Quota is checked before the provider call and enforced again inside the
/// insert itself, so a client cannot open sessions past its allowance by
/// skipping the availability endpoint.
pub async fn open_session(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<OpenSessionRequest>,
) -> AppResult<Json<OpenSessionResponse>> {
    let user_id = require_field(req.user_id, "user_id")?;

    // Cheap read first: an exhausted user never costs a provider call.
    let Some(plan) = state.store.active_plan(&user_id).await? else {
        return Err(AppError::QuotaExhausted);
    };
    let since = quota::month_start(&Local::now());
    let used_seconds = state.store.usage_seconds_since(&user_id, since).await?;
    if !quota::evaluate(plan.voice_minutes, used_seconds).can_start {
        return Err(AppError::QuotaExhausted);
    }

    let signed = state.voice.signed_conversation_url().await?;

    for _ in 0..MAX_SESSION_ID_ATTEMPTS {
        let session_id = generate_session_id();
        match state
            .store
            .insert_session_within_quota(&user_id, &session_id, since, plan.voice_minutes)
            .await
        {
            Ok(true) => {
                info!(user_id = %user_id, session_id = %session_id, "voice session opened");
                return Ok(Json(OpenSessionResponse {
                    signed_url: signed.signed_url,
                    session_id,
                }));
            }
            Ok(false) => {
                // Lost the quota race after the URL was minted; the URL is
                // short-lived and simply dropped.
                warn!(user_id = %user_id, "quota exhausted between signed-url mint and insert");
                return Err(AppError::QuotaExhausted);
            }
            Err(e) if is_unique_violation(&e) => {
                warn!(session_id = %session_id, "session id collision, regenerating");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(
        "could not allocate a unique session id".to_string(),
    ))
}

/// Handler for POST /voice/update-duration.
///
/// Invoked repeatedly while a conversation runs so progress survives an
/// abrupt disconnect. Filtering by both ids keeps a guessed session id from
/// touching another user's row; zero matched rows is still a success so the
/// response does not reveal whether someone else's session exists.
pub async fn update_duration(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SessionUpdateRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let (user_id, session_id, duration) = validate_session_update(req)?;
    state
        .store
        .update_duration(&user_id, &session_id, duration)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Handler for POST /voice/end-session.
pub async fn end_session(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SessionUpdateRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let (user_id, session_id, duration) = validate_session_update(req)?;
    state
        .store
        .complete_session(&user_id, &session_id, duration)
        .await?;
    info!(user_id = %user_id, session_id = %session_id, "voice session completed");
    Ok(Json(SuccessResponse { success: true }))
}

fn validate_session_update(
    req: SessionUpdateRequest,
) -> Result<(String, String, Option<i64>), AppError> {
    let user_id = require_field(req.user_id, "user_id")?;
    let session_id = require_field(req.session_id, "session_id")?;
    if req.duration_seconds.is_some_and(|d| d < 0) {
        return Err(AppError::BadRequest(
            "duration_seconds must be non-negative".to_string(),
        ));
    }
    Ok((user_id, session_id, req.duration_seconds))
}
