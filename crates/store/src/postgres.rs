use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::SessionId;
use domain::Session;
use sqlx::{PgPool, Row};

use crate::traits::SessionStore;
use crate::{Result, StoreError};

/// PostgreSQL-backed session store.
///
/// Sessions are stored as JSONB keyed by session id, with a `version` column
/// for optimistic concurrency across engine instances and an `expires_at`
/// column refreshed on every save.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
    ttl: Duration,
}

impl PostgresSessionStore {
    /// Creates a new PostgreSQL session store.
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn current_version(&self, session_id: &SessionId) -> Result<u64> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM chat_sessions WHERE session_id = $1 AND expires_at > NOW()",
        )
        .bind(session_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(version.unwrap_or(0) as u64)
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn load(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT payload, version
            FROM chat_sessions
            WHERE session_id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(session_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: serde_json::Value = row.try_get("payload")?;
        let version: i64 = row.try_get("version")?;
        let mut session: Session = serde_json::from_value(payload)?;
        session.version = version as u64;
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<u64> {
        let next_version = session.version + 1;
        let mut stored = session.clone();
        stored.version = next_version;
        let payload = serde_json::to_value(&stored)?;
        let expires_at = Utc::now() + self.ttl;

        let result = if session.version == 0 {
            // Expired rows are fair game for a fresh session with the same id.
            sqlx::query(
                r#"
                INSERT INTO chat_sessions (session_id, state, payload, version, updated_at, expires_at)
                VALUES ($1, $2, $3, $4, NOW(), $5)
                ON CONFLICT (session_id) DO UPDATE
                SET state = EXCLUDED.state,
                    payload = EXCLUDED.payload,
                    version = EXCLUDED.version,
                    updated_at = EXCLUDED.updated_at,
                    expires_at = EXCLUDED.expires_at
                WHERE chat_sessions.expires_at <= NOW()
                "#,
            )
            .bind(session.id.as_str())
            .bind(session.state.as_str())
            .bind(&payload)
            .bind(next_version as i64)
            .bind(expires_at)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE chat_sessions
                SET state = $2, payload = $3, version = $4, updated_at = NOW(), expires_at = $5
                WHERE session_id = $1 AND version = $6 AND expires_at > NOW()
                "#,
            )
            .bind(session.id.as_str())
            .bind(session.state.as_str())
            .bind(&payload)
            .bind(next_version as i64)
            .bind(expires_at)
            .bind(session.version as i64)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            let actual = self.current_version(&session.id).await?;
            return Err(StoreError::VersionConflict {
                session_id: session.id.clone(),
                expected: session.version,
                actual,
            });
        }

        Ok(next_version)
    }

    async fn delete(&self, session_id: &SessionId) -> Result<()> {
        sqlx::query("DELETE FROM chat_sessions WHERE session_id = $1")
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        metrics::counter!("chat_sessions_purged_total").increment(result.rows_affected());
        Ok(result.rows_affected())
    }
}
