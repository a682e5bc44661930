//! In-process repositories
//!
//! All tables sit behind one `RwLock`, so each trait call is a single
//! atomic step with respect to every other caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SessionRepository, SocialGraphRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentView, Like, LikeState, Photo, Session, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    photos: HashMap<Uuid, Photo>,
    likes: HashMap<(Uuid, Uuid), Like>,
    comments: Vec<Comment>,
}

impl Tables {
    fn require_user(&self, user_id: Uuid) -> Result<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(AppError::NotFound("User not found".to_string()))
        }
    }

    fn require_photo(&self, photo_id: Uuid) -> Result<&Photo> {
        self.photos
            .get(&photo_id)
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))
    }

    fn insert_photo(&mut self, owner_id: Uuid, file_name: &str) -> Photo {
        let photo = Photo {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            user_id: owner_id,
            created_at: Utc::now(),
        };
        self.photos.insert(photo.id, photo.clone());
        photo
    }

    fn comment_views(&self, photo_ids: &HashSet<Uuid>) -> Vec<CommentView> {
        let mut views: Vec<CommentView> = self
            .comments
            .iter()
            .filter(|c| photo_ids.contains(&c.photo_id))
            .map(|c| CommentView {
                id: c.id,
                photo_id: c.photo_id,
                content: c.content.clone(),
                author_id: c.user_id,
                author_username: self
                    .users
                    .get(&c.user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                created_at: c.created_at,
            })
            .collect();
        views.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        views
    }
}

fn newest_first(photos: &mut [Photo]) {
    photos.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
}

/// Repository backed by process memory; clones share the same tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == username) {
            return Err(AppError::DuplicateUsername);
        }
        if tables.users.values().any(|u| u.email == email) {
            return Err(AppError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session> {
        let mut tables = self.tables.write().await;
        tables.require_user(user_id)?;

        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.get(&session_id).cloned())
    }

    async fn revoke_session(&self, session_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(session) = tables.sessions.get_mut(&session_id) {
            if session.revoked_at.is_none() {
                session.revoked_at = Some(Utc::now());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SocialGraphRepository for MemoryStore {
    async fn create_photo(&self, owner_id: Uuid, file_name: &str) -> Result<Photo> {
        let mut tables = self.tables.write().await;
        tables.require_user(owner_id)?;
        Ok(tables.insert_photo(owner_id, file_name))
    }

    async fn create_photos(&self, owner_id: Uuid, file_names: &[String]) -> Result<Vec<Photo>> {
        let mut tables = self.tables.write().await;
        tables.require_user(owner_id)?;
        Ok(file_names
            .iter()
            .map(|name| tables.insert_photo(owner_id, name))
            .collect())
    }

    async fn find_photo(&self, photo_id: Uuid) -> Result<Option<Photo>> {
        let tables = self.tables.read().await;
        Ok(tables.photos.get(&photo_id).cloned())
    }

    async fn find_photos_by_user(&self, user_id: Uuid) -> Result<Vec<Photo>> {
        let tables = self.tables.read().await;
        let mut photos: Vec<Photo> = tables
            .photos
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut photos);
        Ok(photos)
    }

    async fn list_photos_by_recency(&self) -> Result<Vec<Photo>> {
        let tables = self.tables.read().await;
        let mut photos: Vec<Photo> = tables.photos.values().cloned().collect();
        newest_first(&mut photos);
        Ok(photos)
    }

    async fn delete_photo_cascade(&self, photo_id: Uuid, requester_id: Uuid) -> Result<Photo> {
        let mut tables = self.tables.write().await;

        if tables.require_photo(photo_id)?.user_id != requester_id {
            return Err(AppError::Forbidden(
                "Only the owner can delete this photo".to_string(),
            ));
        }

        tables.likes.retain(|(_, liked_photo), _| *liked_photo != photo_id);
        tables.comments.retain(|c| c.photo_id != photo_id);
        tables
            .photos
            .remove(&photo_id)
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))
    }

    async fn toggle_like(&self, user_id: Uuid, photo_id: Uuid) -> Result<LikeState> {
        let mut tables = self.tables.write().await;
        tables.require_photo(photo_id)?;
        tables.require_user(user_id)?;

        let key = (user_id, photo_id);
        if tables.likes.remove(&key).is_some() {
            return Ok(LikeState { liked: false });
        }

        tables.likes.insert(
            key,
            Like {
                id: Uuid::new_v4(),
                user_id,
                photo_id,
                created_at: Utc::now(),
            },
        );
        Ok(LikeState { liked: true })
    }

    async fn count_likes(&self, photo_id: Uuid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .keys()
            .filter(|(_, liked_photo)| *liked_photo == photo_id)
            .count() as i64)
    }

    async fn has_liked(&self, user_id: Uuid, photo_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.likes.contains_key(&(user_id, photo_id)))
    }

    async fn count_likes_for(&self, photo_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        let wanted: HashSet<Uuid> = photo_ids.iter().copied().collect();
        let tables = self.tables.read().await;

        let mut counts = HashMap::new();
        for (_, photo_id) in tables.likes.keys() {
            if wanted.contains(photo_id) {
                *counts.entry(*photo_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn liked_photo_ids(&self, user_id: Uuid, photo_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        let tables = self.tables.read().await;
        Ok(photo_ids
            .iter()
            .filter(|photo_id| tables.likes.contains_key(&(user_id, **photo_id)))
            .copied()
            .collect())
    }

    async fn add_comment(&self, user_id: Uuid, photo_id: Uuid, content: &str) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        tables.require_photo(photo_id)?;
        tables.require_user(user_id)?;

        let comment = Comment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            user_id,
            photo_id,
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, photo_id: Uuid) -> Result<Vec<CommentView>> {
        self.list_comments_for(&[photo_id]).await
    }

    async fn list_comments_for(&self, photo_ids: &[Uuid]) -> Result<Vec<CommentView>> {
        let wanted: HashSet<Uuid> = photo_ids.iter().copied().collect();
        let tables = self.tables.read().await;
        Ok(tables.comment_views(&wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(name, &format!("{}@example.com", name), "hash")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;

        let dup_name = store
            .create_user("alice", "other@example.com", "hash")
            .await;
        assert!(matches!(dup_name, Err(AppError::DuplicateUsername)));

        let dup_email = store
            .create_user("bob", "alice@example.com", "hash")
            .await;
        assert!(matches!(dup_email, Err(AppError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_photo_requires_existing_owner() {
        let store = MemoryStore::new();
        let result = store.create_photo(Uuid::new_v4(), "cat_1.png").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_photos_is_all_or_nothing() {
        let store = MemoryStore::new();
        let names = vec!["a_1.png".to_string(), "b_1.png".to_string()];
        assert!(store.create_photos(Uuid::new_v4(), &names).await.is_err());
        assert!(store.list_photos_by_recency().await.unwrap().is_empty());

        let alice = seed_user(&store, "alice").await;
        let photos = store.create_photos(alice.id, &names).await.unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(store.find_photos_by_user(alice.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_like_on_missing_photo() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let result = store.toggle_like(alice.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_batch_like_queries() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let p1 = store.create_photo(alice.id, "p1.png").await.unwrap();
        let p2 = store.create_photo(alice.id, "p2.png").await.unwrap();

        store.toggle_like(alice.id, p1.id).await.unwrap();
        store.toggle_like(bob.id, p1.id).await.unwrap();

        let counts = store.count_likes_for(&[p1.id, p2.id]).await.unwrap();
        assert_eq!(counts.get(&p1.id), Some(&2));
        assert_eq!(counts.get(&p2.id), None);

        let liked = store.liked_photo_ids(bob.id, &[p1.id, p2.id]).await.unwrap();
        assert!(liked.contains(&p1.id));
        assert!(!liked.contains(&p2.id));
    }

    #[tokio::test]
    async fn test_revoke_session() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let session = store
            .create_session(alice.id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        store.revoke_session(session.id).await.unwrap();
        let stored = store.find_session(session.id).await.unwrap().unwrap();
        assert!(stored.revoked_at.is_some());

        // Unknown ids are ignored
        store.revoke_session(Uuid::new_v4()).await.unwrap();
    }
}
