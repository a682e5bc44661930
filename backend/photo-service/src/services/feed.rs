/// Read-side views: the global feed and profile pages
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{SocialGraphRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{CommentView, FeedItem, ProfileView, UserSummary};

#[derive(Clone)]
pub struct FeedAssembler {
    photos: Arc<dyn SocialGraphRepository>,
    users: Arc<dyn UserRepository>,
}

impl FeedAssembler {
    pub fn new(photos: Arc<dyn SocialGraphRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { photos, users }
    }

    /// Every photo newest first, with like count, the viewer's like state
    /// and comments oldest first.
    ///
    /// Runs a fixed number of queries regardless of feed length.
    pub async fn build_feed(&self, viewer_id: Uuid) -> Result<Vec<FeedItem>> {
        let photos = self.photos.list_photos_by_recency().await?;
        if photos.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = photos.iter().map(|p| p.id).collect();
        let counts = self.photos.count_likes_for(&ids).await?;
        let liked = self.photos.liked_photo_ids(viewer_id, &ids).await?;

        let mut comments: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
        for comment in self.photos.list_comments_for(&ids).await? {
            comments.entry(comment.photo_id).or_default().push(comment);
        }

        Ok(photos
            .into_iter()
            .map(|photo| FeedItem {
                like_count: counts.get(&photo.id).copied().unwrap_or(0),
                viewer_has_liked: liked.contains(&photo.id),
                comments: comments.remove(&photo.id).unwrap_or_default(),
                photo,
            })
            .collect())
    }

    pub async fn profile(&self, viewer_id: Uuid, user_id: Uuid) -> Result<ProfileView> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let photos = self.photos.find_photos_by_user(user_id).await?;

        Ok(ProfileView {
            user: UserSummary::from(&user),
            photos,
            is_owner: viewer_id == user_id,
        })
    }
}
