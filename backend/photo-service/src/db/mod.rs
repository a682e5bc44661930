//! Persistence layer
//!
//! Three repository traits cover the relational model. `PgStore` implements
//! them on PostgreSQL; `MemoryStore` implements them in-process for local
//! development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Comment, CommentView, LikeState, Photo, Session, User};

pub mod memory;
pub mod pool;
pub mod postgres;

mod sessions;
mod social;
mod users;

pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations};
pub use postgres::PgStore;

/// Credential storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; fails with `DuplicateUsername` / `DuplicateEmail`
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
}

/// Server-side sessions keyed by the cookie value
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session>;

    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>>;

    /// Mark a session revoked (no-op if unknown or already revoked)
    async fn revoke_session(&self, session_id: Uuid) -> Result<()>;
}

/// Photos, likes and comments with referential integrity to users
#[async_trait]
pub trait SocialGraphRepository: Send + Sync {
    /// Record one photo row; `NotFound` if the owner does not exist
    async fn create_photo(&self, owner_id: Uuid, file_name: &str) -> Result<Photo>;

    /// Record several photo rows atomically (all or none)
    async fn create_photos(&self, owner_id: Uuid, file_names: &[String]) -> Result<Vec<Photo>>;

    async fn find_photo(&self, photo_id: Uuid) -> Result<Option<Photo>>;

    /// Photos owned by a user, newest first
    async fn find_photos_by_user(&self, user_id: Uuid) -> Result<Vec<Photo>>;

    /// All photos, newest first, ties broken by id descending
    async fn list_photos_by_recency(&self) -> Result<Vec<Photo>>;

    /// Delete a photo and every like and comment on it in one transaction.
    ///
    /// Returns the removed row so the caller can clean up the stored file.
    /// `Forbidden` if `requester_id` is not the owner, `NotFound` if absent.
    async fn delete_photo_cascade(&self, photo_id: Uuid, requester_id: Uuid) -> Result<Photo>;

    /// Flip the (user, photo) like; atomic per pair
    async fn toggle_like(&self, user_id: Uuid, photo_id: Uuid) -> Result<LikeState>;

    async fn count_likes(&self, photo_id: Uuid) -> Result<i64>;

    async fn has_liked(&self, user_id: Uuid, photo_id: Uuid) -> Result<bool>;

    /// Like counts for many photos; photos without likes are absent
    async fn count_likes_for(&self, photo_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>>;

    /// Subset of `photo_ids` the user has liked
    async fn liked_photo_ids(&self, user_id: Uuid, photo_ids: &[Uuid]) -> Result<HashSet<Uuid>>;

    /// `NotFound` if the photo does not exist
    async fn add_comment(&self, user_id: Uuid, photo_id: Uuid, content: &str) -> Result<Comment>;

    /// Comments on one photo, oldest first
    async fn list_comments(&self, photo_id: Uuid) -> Result<Vec<CommentView>>;

    /// Comments on many photos, oldest first
    async fn list_comments_for(&self, photo_ids: &[Uuid]) -> Result<Vec<CommentView>>;
}
