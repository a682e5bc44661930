/// Session database operations
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::postgres::{map_write_error, PgStore};
use super::SessionRepository;
use crate::error::Result;
use crate::models::Session;

#[async_trait]
impl SessionRepository for PgStore {
    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, expires_at, revoked_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "User"))?;

        Ok(session)
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, expires_at, revoked_at, created_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn revoke_session(&self, session_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET revoked_at = $1
            WHERE id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
