/// Session issuing and request authentication
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::db::{SessionRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{Principal, Session, User};

/// Gate in front of every authenticated route
#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
    ttl: Duration,
}

impl AuthGate {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            sessions,
            users,
            ttl: Duration::hours(config.ttl_hours),
        }
    }

    /// Open a session for a freshly authenticated user
    pub async fn login(&self, user: &User) -> Result<Session> {
        let expires_at = Utc::now() + self.ttl;
        let session = self.sessions.create_session(user.id, expires_at).await?;

        info!(user_id = %user.id, session_id = %session.id, "session opened");
        Ok(session)
    }

    /// Resolve a session token into a principal.
    ///
    /// Missing, malformed, expired and revoked tokens, and tokens whose user
    /// no longer exists, all fail with `Unauthenticated`.
    pub async fn require_auth(&self, token: Option<&str>) -> Result<Principal> {
        let token = token.ok_or(AppError::Unauthenticated)?;
        let session_id = Uuid::parse_str(token.trim()).map_err(|_| AppError::Unauthenticated)?;

        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if !session.is_active(Utc::now()) {
            debug!(session_id = %session.id, "inactive session presented");
            return Err(AppError::Unauthenticated);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(Principal {
            user_id: user.id,
            username: user.username,
            session_id: session.id,
        })
    }

    /// Revoke the principal's session
    pub async fn logout(&self, principal: &Principal) -> Result<()> {
        self.sessions.revoke_session(principal.session_id).await?;
        info!(user_id = %principal.user_id, session_id = %principal.session_id, "session closed");
        Ok(())
    }
}
