/// Photo upload, deletion, likes and comments
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::db::SocialGraphRepository;
use crate::error::{AppError, Result};
use crate::media::MediaStore;
use crate::models::{Comment, LikeState, Photo, Principal};
use crate::validators::{validate_comment, validate_image_filename};

/// One file part of an upload form
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub original_name: String,
    pub bytes: Bytes,
}

/// Bounds on a single upload request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
    pub max_request_bytes: usize,
    pub max_files: usize,
}

impl From<&MediaConfig> for UploadLimits {
    fn from(config: &MediaConfig) -> Self {
        Self {
            max_file_bytes: config.max_upload_bytes,
            max_request_bytes: config.max_request_bytes,
            max_files: config.max_files_per_upload,
        }
    }
}

impl UploadLimits {
    pub fn file_too_large(&self) -> AppError {
        AppError::Validation(format!(
            "photo: file exceeds the {} byte limit",
            self.max_file_bytes
        ))
    }

    pub fn request_too_large(&self) -> AppError {
        AppError::Validation(format!(
            "photo: upload exceeds the {} byte request limit",
            self.max_request_bytes
        ))
    }

    pub fn too_many_files(&self) -> AppError {
        AppError::Validation(format!(
            "photo: at most {} files per upload",
            self.max_files
        ))
    }
}

#[derive(Clone)]
pub struct PhotoService {
    photos: Arc<dyn SocialGraphRepository>,
    media: Arc<dyn MediaStore>,
    limits: UploadLimits,
}

impl PhotoService {
    pub fn new(
        photos: Arc<dyn SocialGraphRepository>,
        media: Arc<dyn MediaStore>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            photos,
            media,
            limits,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Store every file, then record all rows in one write.
    ///
    /// Empty parts are skipped. If any write or the row insert fails, files
    /// already written by this call are removed.
    pub async fn upload(&self, owner: &Principal, files: Vec<UploadFile>) -> Result<Vec<Photo>> {
        let files: Vec<UploadFile> = files.into_iter().filter(|f| !f.bytes.is_empty()).collect();
        if files.is_empty() {
            return Err(AppError::Validation(
                "photo: at least one file is required".to_string(),
            ));
        }

        if files.len() > self.limits.max_files {
            return Err(self.limits.too_many_files());
        }

        let mut total = 0usize;
        for file in &files {
            validate_image_filename(&file.original_name)?;
            if file.bytes.len() > self.limits.max_file_bytes {
                return Err(self.limits.file_too_large());
            }
            total += file.bytes.len();
            if total > self.limits.max_request_bytes {
                return Err(self.limits.request_too_large());
            }
        }

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            match self.media.save(owner, file.bytes, &file.original_name).await {
                Ok(name) => stored.push(name),
                Err(err) => {
                    self.discard(&stored).await;
                    return Err(err);
                }
            }
        }

        match self.photos.create_photos(owner.user_id, &stored).await {
            Ok(photos) => {
                info!(user_id = %owner.user_id, count = photos.len(), "photos uploaded");
                Ok(photos)
            }
            Err(err) => {
                self.discard(&stored).await;
                Err(err)
            }
        }
    }

    async fn discard(&self, stored: &[String]) {
        for name in stored {
            if let Err(err) = self.media.delete(name).await {
                warn!(stored_name = %name, error = %err, "failed to remove orphaned upload");
            }
        }
    }

    /// Owner-only delete of the photo, its likes and comments, then its file.
    ///
    /// File removal is best-effort once the rows are gone.
    pub async fn delete_photo(&self, requester: &Principal, photo_id: Uuid) -> Result<Photo> {
        let photo = self
            .photos
            .delete_photo_cascade(photo_id, requester.user_id)
            .await?;

        if let Err(err) = self.media.delete(&photo.file_name).await {
            warn!(
                photo_id = %photo.id,
                stored_name = %photo.file_name,
                error = %err,
                "photo rows deleted but file removal failed"
            );
        }

        info!(photo_id = %photo.id, user_id = %requester.user_id, "photo deleted");
        Ok(photo)
    }

    pub async fn toggle_like(&self, viewer: &Principal, photo_id: Uuid) -> Result<LikeState> {
        self.photos.toggle_like(viewer.user_id, photo_id).await
    }

    pub async fn add_comment(
        &self,
        author: &Principal,
        photo_id: Uuid,
        content: &str,
    ) -> Result<Comment> {
        let content = validate_comment(content)?;
        self.photos
            .add_comment(author.user_id, photo_id, &content)
            .await
    }
}
