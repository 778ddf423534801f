//! Monthly quota check endpoint.

use axum::Json;
use axum::extract::State;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiJson, require_field};
use crate::errors::app_error::AppResult;
use crate::quota;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityRequest {
    pub user_id: Option<String>,
}

/// Quota position reported to the client.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub can_start: bool,
    pub minutes_remaining: i64,
    pub minutes_used: i64,
    pub monthly_limit: i64,
    pub plan_type: String,
}

impl AvailabilityResponse {
    /// The shape returned when the user has no active plan. Not an error:
    /// clients poll this endpoint for users who never subscribed.
    fn no_plan() -> Self {
        Self {
            can_start: false,
            minutes_remaining: 0,
            minutes_used: 0,
            monthly_limit: 0,
            plan_type: "none".to_string(),
        }
    }
}

/// Handler for POST /voice/check-availability.
///
/// Read-only: usage is recomputed from the session rows on every call and
/// never cached.
pub async fn check_availability(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CheckAvailabilityRequest>,
) -> AppResult<Json<AvailabilityResponse>> {
    let user_id = require_field(req.user_id, "user_id")?;

    let Some(plan) = state.store.active_plan(&user_id).await? else {
        return Ok(Json(AvailabilityResponse::no_plan()));
    };

    let since = quota::month_start(&Local::now());
    let used_seconds = state.store.usage_seconds_since(&user_id, since).await?;
    let quota = quota::evaluate(plan.voice_minutes, used_seconds);

    info!(
        user_id = %user_id,
        minutes_used = quota.minutes_used,
        minutes_remaining = quota.minutes_remaining,
        "quota check"
    );

    Ok(Json(AvailabilityResponse {
        can_start: quota.can_start,
        minutes_remaining: quota.minutes_remaining,
        minutes_used: quota.minutes_used,
        monthly_limit: quota.monthly_limit,
        plan_type: plan.plan_name,
    }))
}
