//! Postgres implementation of the store traits.
//!
//! Uses [`sqlx`] with the `postgres` feature. Migrations run automatically
//! on [`PgStore::connect`].
//!
//! # Migrations path
//!
//! `sqlx::migrate!("./migrations")` resolves the path **at compile time**
//! relative to `CARGO_MANIFEST_DIR` (the crate root), so the SQL is embedded
//! into the binary. The database location is determined at runtime by
//! `DATABASE_URL`.
//!
//! # Queries
//!
//! The `sqlx::query` (runtime-verified) form is used deliberately so that no
//! `DATABASE_URL` environment variable is needed at compile time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{PlanStore, STATUS_ACTIVE, STATUS_COMPLETED, SessionStore, UserPlan};

/// Postgres-backed plan and session store.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database at `url` and run pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl PlanStore for PgStore {
    async fn active_plan(&self, user_id: &str) -> Result<Option<UserPlan>, sqlx::Error> {
        let row: Option<(String, String, i64, bool)> = sqlx::query_as(
            "SELECT user_id, plan_name, voice_minutes, active \
             FROM user_plans WHERE user_id = $1 AND active",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, plan_name, voice_minutes, active)| UserPlan {
            user_id,
            plan_name,
            voice_minutes,
            active,
        }))
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn usage_seconds_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(duration_seconds), 0)::BIGINT \
             FROM voice_sessions WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn insert_session_within_quota(
        &self,
        user_id: &str,
        session_id: &str,
        since: DateTime<Utc>,
        limit_minutes: i64,
    ) -> Result<bool, sqlx::Error> {
        // Single statement: the quota re-check and the insert cannot be
        // separated by a concurrent writer. CEIL matches the reader's
        // partial-minutes-count-as-full arithmetic.
        let result = sqlx::query(
            "INSERT INTO voice_sessions (session_id, user_id, duration_seconds, status) \
             SELECT $1, $2, 0, $3 \
             WHERE (SELECT CEIL(COALESCE(SUM(duration_seconds), 0) / 60.0) \
                    FROM voice_sessions WHERE user_id = $2 AND created_at >= $4) < $5",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(STATUS_ACTIVE)
        .bind(since)
        .bind(limit_minutes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_duration(
        &self,
        user_id: &str,
        session_id: &str,
        duration_seconds: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE voice_sessions \
             SET duration_seconds = COALESCE($3, duration_seconds), updated_at = now() \
             WHERE session_id = $1 AND user_id = $2",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(duration_seconds)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete_session(
        &self,
        user_id: &str,
        session_id: &str,
        duration_seconds: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE voice_sessions \
             SET duration_seconds = COALESCE($3, duration_seconds), status = $4, \
                 ended_at = now(), updated_at = now() \
             WHERE session_id = $1 AND user_id = $2",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(duration_seconds)
        .bind(STATUS_COMPLETED)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
