//! Unified request error type.
//!
//! Every handler returns [`AppResult<T>`]; `AppError` implements
//! [`axum::response::IntoResponse`] so failures are rendered as a JSON
//! `{"error": message}` body with the matching status code.
//!
//! **Security note:** Internal failures (store, provider) are logged with
//! full detail but only a generic message is returned, so connection
//! strings, SQL, or provider response bodies never reach clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::core::voice::ProviderError;

pub type AppResult<T> = Result<T, AppError>;

/// All errors that can occur in the voicegate request lifecycle.
#[derive(Debug, Error)]
pub enum AppError {
    /// The caller sent an invalid or incomplete request body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The path exists but does not accept this HTTP method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The user's monthly voice allowance is spent (or no plan is active).
    #[error("monthly voice quota exhausted")]
    QuotaExhausted,

    /// Propagated from the Postgres store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The voice provider call failed or returned a non-success status.
    #[error("voice provider error: {0}")]
    Upstream(#[from] ProviderError),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_owned(),
            ),
            AppError::QuotaExhausted => (
                StatusCode::FORBIDDEN,
                "monthly voice quota exhausted".to_owned(),
            ),

            // Internal errors: log the full detail, return a generic message.
            AppError::Database(e) => {
                error!(error = %e, "store call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_owned())
            }
            AppError::Upstream(e) => {
                error!(error = %e, "voice provider call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Voice provider error".to_owned(),
                )
            }
            AppError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn bad_request_exposes_message() {
        let (status, body) = render(AppError::BadRequest("user_id required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "user_id required");
    }

    #[tokio::test]
    async fn method_not_allowed_is_405() {
        let (status, body) = render(AppError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn quota_exhausted_is_403() {
        let (status, body) = render(AppError::QuotaExhausted).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "monthly voice quota exhausted");
    }

    #[tokio::test]
    async fn database_detail_is_not_leaked() {
        let (status, body) = render(AppError::Database(sqlx::Error::PoolClosed)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database error");
    }

    #[tokio::test]
    async fn upstream_detail_is_not_leaked() {
        let err = AppError::Upstream(ProviderError::Status {
            status: 503,
            body: "secret provider payload".into(),
        });
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Voice provider error");
    }
}
