//! Shared test support: an in-memory store, a provider stub, and app
//! construction helpers mirroring the layers main.rs applies.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::util::ServiceExt;
use tower_http::cors::{Any, CorsLayer};

use voicegate::config::ServerConfig;
use voicegate::core::voice::{ConversationProvider, ProviderError, SignedConversation};
use voicegate::db::{PlanStore, STATUS_ACTIVE, STATUS_COMPLETED, SessionStore, UserPlan};
use voicegate::{AppState, quota, routes};

/// One session row held by [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub session_id: String,
    pub user_id: String,
    pub duration_seconds: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// In-memory stand-in for the Postgres store, mirroring its row semantics
/// closely enough for handler-level tests.
#[derive(Default)]
pub struct MemoryStore {
    plans: Mutex<Vec<UserPlan>>,
    sessions: Mutex<Vec<SessionRow>>,
    /// Store calls observed; lets tests assert that invalid requests stay
    /// side-effect free.
    calls: AtomicUsize,
    /// When set, session inserts fail, simulating a store outage.
    pub fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_plan(&self, user_id: &str, plan_name: &str, voice_minutes: i64) {
        self.plans.lock().unwrap().push(UserPlan {
            user_id: user_id.to_string(),
            plan_name: plan_name.to_string(),
            voice_minutes,
            active: true,
        });
    }

    pub fn add_session(
        &self,
        user_id: &str,
        session_id: &str,
        duration_seconds: i64,
        created_at: DateTime<Utc>,
    ) {
        self.sessions.lock().unwrap().push(SessionRow {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            duration_seconds,
            status: STATUS_ACTIVE.to_string(),
            created_at,
            updated_at: created_at,
            ended_at: None,
        });
    }

    pub fn session(&self, session_id: &str) -> Option<SessionRow> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn active_plan(&self, user_id: &str) -> Result<Option<UserPlan>, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id && p.active)
            .cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn usage_seconds_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.created_at >= since)
            .map(|s| s.duration_seconds)
            .sum())
    }

    async fn insert_session_within_quota(
        &self,
        user_id: &str,
        session_id: &str,
        since: DateTime<Utc>,
        limit_minutes: i64,
    ) -> Result<bool, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }

        let mut sessions = self.sessions.lock().unwrap();
        let used: i64 = sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.created_at >= since)
            .map(|s| s.duration_seconds)
            .sum();
        if quota::minutes_used(used) >= limit_minutes {
            return Ok(false);
        }

        let now = Utc::now();
        sessions.push(SessionRow {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            duration_seconds: 0,
            status: STATUS_ACTIVE.to_string(),
            created_at: now,
            updated_at: now,
            ended_at: None,
        });
        Ok(true)
    }

    async fn update_duration(
        &self,
        user_id: &str,
        session_id: &str,
        duration_seconds: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(row) = sessions
            .iter_mut()
            .find(|s| s.session_id == session_id && s.user_id == user_id)
        {
            if let Some(d) = duration_seconds {
                row.duration_seconds = d;
            }
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn complete_session(
        &self,
        user_id: &str,
        session_id: &str,
        duration_seconds: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(row) = sessions
            .iter_mut()
            .find(|s| s.session_id == session_id && s.user_id == user_id)
        {
            if let Some(d) = duration_seconds {
                row.duration_seconds = d;
            }
            let now = Utc::now();
            row.status = STATUS_COMPLETED.to_string();
            row.ended_at = Some(now);
            row.updated_at = now;
        }
        Ok(())
    }
}

/// Provider stub answering every mint with a fixed URL.
pub struct StaticProvider(pub String);

#[async_trait]
impl ConversationProvider for StaticProvider {
    async fn signed_conversation_url(&self) -> Result<SignedConversation, ProviderError> {
        Ok(SignedConversation {
            signed_url: self.0.clone(),
        })
    }
}

/// Helper function to create a minimal test configuration
pub fn test_config(provider_base_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        database_url: "postgres://unused-in-tests".to_string(),
        database_max_connections: 1,
        elevenlabs_api_key: "test_elevenlabs_key".to_string(),
        elevenlabs_agent_id: "agent-test".to_string(),
        elevenlabs_base_url: provider_base_url.to_string(),
        cors_allowed_origins: Some("*".to_string()),
        rate_limit_requests_per_second: 100000, // Disable for tests
        rate_limit_burst_size: 100,
    }
}

/// The API router with the same permissive CORS main.rs applies when
/// `CORS_ALLOWED_ORIGINS=*`.
pub fn test_app(
    config: ServerConfig,
    store: Arc<MemoryStore>,
    voice: Arc<dyn ConversationProvider>,
) -> Router {
    let state = AppState::new(config, store, voice);
    routes::api::create_api_router().with_state(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([axum::http::header::CONTENT_TYPE]),
    )
}

/// POST a JSON body and decode the JSON response (Null for empty bodies).
pub async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
