//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check endpoint
//! - `availability` - Monthly quota check
//! - `sessions` - Signed-URL minting and session lifecycle updates

pub mod api;
pub mod availability;
pub mod sessions;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};

use crate::errors::app_error::AppError;

/// JSON extractor whose rejection renders as the standard `{"error": ...}`
/// body instead of axum's plain-text default, keeping the error shape
/// uniform across every failure mode.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Presence-validate a required string field; blank counts as missing.
fn require_field(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("{name} required"))),
    }
}
