//! Store abstraction layer.
//!
//! [`PlanStore`] and [`SessionStore`] define the persistence interface for
//! user plans and voice sessions. The production implementation is
//! [`postgres::PgStore`]; tests swap in an in-memory store. Both traits are
//! object-safe so [`crate::state::AppState`] can hold them behind `dyn`
//! without committing handlers to a concrete backend.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A user's row in `user_plans`. At most one active row per user, enforced
/// by a partial unique index; plans are written by an external billing
/// process and read-only here.
#[derive(Debug, Clone)]
pub struct UserPlan {
    pub user_id: String,
    /// Display label, e.g. `"pro"`.
    pub plan_name: String,
    /// Monthly allowance in minutes.
    pub voice_minutes: i64,
    pub active: bool,
}

/// `voice_sessions.status` value for a live conversation.
pub const STATUS_ACTIVE: &str = "active";

/// `voice_sessions.status` value once a conversation has ended.
pub const STATUS_COMPLETED: &str = "completed";

#[async_trait]
pub trait PlanStore: Send + Sync {
    /// The user's active plan, if any.
    async fn active_plan(&self, user_id: &str) -> Result<Option<UserPlan>, sqlx::Error>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Total `duration_seconds` over the user's sessions created at or after
    /// `since`. Missing durations count as zero.
    async fn usage_seconds_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error>;

    /// Insert a new active session with zero duration, but only while the
    /// user's month-to-date minutes since `since` are below `limit_minutes`.
    /// Returns `false` when the quota guard rejected the insert.
    ///
    /// The check and the insert must execute as one atomic statement, so two
    /// concurrent opens cannot both slip under the limit through a
    /// read-then-write gap.
    async fn insert_session_within_quota(
        &self,
        user_id: &str,
        session_id: &str,
        since: DateTime<Utc>,
        limit_minutes: i64,
    ) -> Result<bool, sqlx::Error>;

    /// Checkpoint a live session's duration, touching `updated_at`. A `None`
    /// duration keeps the stored value. Filtered by both `session_id` and
    /// `user_id`; matching zero rows is not an error.
    async fn update_duration(
        &self,
        user_id: &str,
        session_id: &str,
        duration_seconds: Option<i64>,
    ) -> Result<(), sqlx::Error>;

    /// Mark a session completed, recording the final duration and `ended_at`.
    /// Same dual filter and zero-row behavior as
    /// [`SessionStore::update_duration`].
    async fn complete_session(
        &self,
        user_id: &str,
        session_id: &str,
        duration_seconds: Option<i64>,
    ) -> Result<(), sqlx::Error>;
}

/// Everything the handlers need from one backing store.
pub trait Store: PlanStore + SessionStore {}

impl<T: PlanStore + SessionStore> Store for T {}

/// `true` when an insert failed because the generated `session_id` already
/// exists, in which case the caller retries with a fresh token.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
