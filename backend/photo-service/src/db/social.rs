/// Photo, like and comment database operations
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::postgres::{map_write_error, PgStore};
use super::SocialGraphRepository;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentView, LikeState, Photo};

#[async_trait]
impl SocialGraphRepository for PgStore {
    async fn create_photo(&self, owner_id: Uuid, file_name: &str) -> Result<Photo> {
        let photo = sqlx::query_as::<_, Photo>(
            r#"
            INSERT INTO photos (id, file_name, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, file_name, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(file_name)
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "User"))?;

        Ok(photo)
    }

    async fn create_photos(&self, owner_id: Uuid, file_names: &[String]) -> Result<Vec<Photo>> {
        let mut tx = self.pool.begin().await?;
        let mut photos = Vec::with_capacity(file_names.len());

        for file_name in file_names {
            let photo = sqlx::query_as::<_, Photo>(
                r#"
                INSERT INTO photos (id, file_name, user_id, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id, file_name, user_id, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(file_name)
            .bind(owner_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "User"))?;
            photos.push(photo);
        }

        tx.commit().await?;
        Ok(photos)
    }

    async fn find_photo(&self, photo_id: Uuid) -> Result<Option<Photo>> {
        let photo = sqlx::query_as::<_, Photo>(
            "SELECT id, file_name, user_id, created_at FROM photos WHERE id = $1",
        )
        .bind(photo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(photo)
    }

    async fn find_photos_by_user(&self, user_id: Uuid) -> Result<Vec<Photo>> {
        let photos = sqlx::query_as::<_, Photo>(
            r#"
            SELECT id, file_name, user_id, created_at
            FROM photos
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    async fn list_photos_by_recency(&self) -> Result<Vec<Photo>> {
        let photos = sqlx::query_as::<_, Photo>(
            r#"
            SELECT id, file_name, user_id, created_at
            FROM photos
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    async fn delete_photo_cascade(&self, photo_id: Uuid, requester_id: Uuid) -> Result<Photo> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes against toggles and concurrent deletes
        let photo = sqlx::query_as::<_, Photo>(
            "SELECT id, file_name, user_id, created_at FROM photos WHERE id = $1 FOR UPDATE",
        )
        .bind(photo_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

        if photo.user_id != requester_id {
            return Err(AppError::Forbidden(
                "Only the owner can delete this photo".to_string(),
            ));
        }

        sqlx::query("DELETE FROM likes WHERE photo_id = $1")
            .bind(photo_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM comments WHERE photo_id = $1")
            .bind(photo_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(photo_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(photo)
    }

    async fn toggle_like(&self, user_id: Uuid, photo_id: Uuid) -> Result<LikeState> {
        let mut tx = self.pool.begin().await?;

        // NO KEY UPDATE conflicts with itself but not with the KEY SHARE
        // locks taken by comment inserts
        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM photos WHERE id = $1 FOR NO KEY UPDATE")
                .bind(photo_id)
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_none() {
            return Err(AppError::NotFound("Photo not found".to_string()));
        }

        let removed = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND photo_id = $2")
            .bind(user_id)
            .bind(photo_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let liked = if removed > 0 {
            false
        } else {
            sqlx::query(
                r#"
                INSERT INTO likes (id, user_id, photo_id, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, photo_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(photo_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "User"))?;
            true
        };

        tx.commit().await?;
        Ok(LikeState { liked })
    }

    async fn count_likes(&self, photo_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE photo_id = $1")
            .bind(photo_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn has_liked(&self, user_id: Uuid, photo_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE user_id = $1 AND photo_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(photo_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_likes_for(&self, photo_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if photo_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT photo_id, COUNT(*)
            FROM likes
            WHERE photo_id = ANY($1)
            GROUP BY photo_id
            "#,
        )
        .bind(photo_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn liked_photo_ids(&self, user_id: Uuid, photo_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if photo_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let liked: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT photo_id
            FROM likes
            WHERE user_id = $1 AND photo_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(photo_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(liked.into_iter().collect())
    }

    async fn add_comment(&self, user_id: Uuid, photo_id: Uuid, content: &str) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, content, user_id, photo_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, content, user_id, photo_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(user_id)
        .bind(photo_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Photo"))?;

        Ok(comment)
    }

    async fn list_comments(&self, photo_id: Uuid) -> Result<Vec<CommentView>> {
        self.list_comments_for(&[photo_id]).await
    }

    async fn list_comments_for(&self, photo_ids: &[Uuid]) -> Result<Vec<CommentView>> {
        if photo_ids.is_empty() {
            return Ok(Vec::new());
        }

        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.photo_id, c.content, c.user_id AS author_id,
                   u.username AS author_username, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.photo_id = ANY($1)
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(photo_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
