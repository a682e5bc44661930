/// Data models for photo-service
///
/// Entities reference each other by id only; relationships are walked with
/// explicit repository queries.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Uploaded photo; `file_name` is the stored (on-disk) name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub file_name: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// At most one per (user_id, photo_id)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub photo_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub photo_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's username, as shown in the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: Uuid,
    pub photo_id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
}

/// Server-side login session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Authenticated identity bound to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub session_id: Uuid,
}

/// One entry of the assembled feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub photo: Photo,
    pub like_count: i64,
    pub viewer_has_liked: bool,
    pub comments: Vec<CommentView>,
}

/// Profile page payload
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: UserSummary,
    pub photos: Vec<Photo>,
    pub is_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_activity() {
        let now = Utc::now();
        let mut session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: now + Duration::hours(1),
            revoked_at: None,
            created_at: now,
        };
        assert!(session.is_active(now));
        assert!(!session.is_active(now + Duration::hours(2)));

        session.revoked_at = Some(now);
        assert!(!session.is_active(now));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
