//! Uploaded photo files
//!
//! Stored names are `{stem}_{unix_millis}{.ext}`. When that name is already
//! on disk a random hex suffix is appended. Files are created with
//! create-new semantics, so an existing upload is never overwritten.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use crate::models::Principal;

const MAX_STEM_CHARS: usize = 200;
const MAX_SUFFIX_ATTEMPTS: usize = 8;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist bytes under a fresh unique name and return that name
    async fn save(&self, owner: &Principal, bytes: Bytes, original_name: &str) -> Result<String>;

    /// Remove a stored file; absent files are not an error
    async fn delete(&self, stored_name: &str) -> Result<()>;
}

/// Strip directories and replace anything outside `[A-Za-z0-9._-]`.
///
/// The extension is split off before leading dots are trimmed from the
/// stem, so `..png` keeps `.png`. An empty stem becomes `photo`.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let (stem, ext) = split_extension(&cleaned);
    let stem = stem.trim_start_matches('.');
    let stem = if stem.is_empty() { "photo" } else { stem };

    format!("{}{}", stem, ext)
}

/// Split into stem and extension (extension keeps its leading dot)
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}

/// Derive the stored name from a sanitized upload name
pub fn stored_file_name(sanitized: &str, timestamp_millis: i64, suffix: Option<&str>) -> String {
    let (stem, ext) = split_extension(sanitized);
    let stem: String = stem.chars().take(MAX_STEM_CHARS).collect();

    match suffix {
        Some(suffix) => format!("{}_{}_{}{}", stem, timestamp_millis, suffix, ext),
        None => format!("{}_{}{}", stem, timestamp_millis, ext),
    }
}

fn random_suffix() -> String {
    hex::encode(rand::random::<[u8; 4]>())
}

/// Stored names never carry path components
fn checked_name(stored_name: &str) -> Result<&str> {
    if stored_name.is_empty()
        || stored_name.contains('/')
        || stored_name.contains('\\')
        || stored_name.starts_with('.')
    {
        return Err(AppError::Validation(format!(
            "invalid stored file name: {}",
            stored_name
        )));
    }
    Ok(stored_name)
}

/// Files on the local filesystem under one upload directory
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    write_timeout: Duration,
}

impl LocalMediaStore {
    /// Create the upload directory if needed
    pub async fn new(config: &MediaConfig) -> Result<Self> {
        fs::create_dir_all(&config.upload_dir).await?;
        Ok(Self {
            root: config.upload_dir.clone(),
            write_timeout: Duration::from_secs(config.write_timeout_secs),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }

    async fn write_new(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;

        let write = async {
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await
        };

        let outcome = match tokio::time::timeout(self.write_timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                ErrorKind::TimedOut,
                "photo write timed out",
            )),
        };

        if let Err(err) = outcome {
            // Partial file must not outlive the failed upload
            if let Err(cleanup) = fs::remove_file(path).await {
                warn!(path = %path.display(), error = %cleanup, "failed to remove partial upload");
            }
            return Err(err);
        }

        Ok(())
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, owner: &Principal, bytes: Bytes, original_name: &str) -> Result<String> {
        let sanitized = sanitize_file_name(original_name);
        let millis = Utc::now().timestamp_millis();

        for attempt in 0..=MAX_SUFFIX_ATTEMPTS {
            let suffix = (attempt > 0).then(random_suffix);
            let stored_name = stored_file_name(&sanitized, millis, suffix.as_deref());
            let path = self.path_for(&stored_name);

            match self.write_new(&path, &bytes).await {
                Ok(()) => {
                    debug!(
                        user_id = %owner.user_id,
                        stored_name = %stored_name,
                        size = bytes.len(),
                        "photo file written"
                    );
                    return Ok(stored_name);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(stored_name = %stored_name, "stored name taken, retrying with suffix");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::Internal(format!(
            "could not allocate a unique stored name for {}",
            sanitized
        )))
    }

    async fn delete(&self, stored_name: &str) -> Result<()> {
        let path = self.path_for(checked_name(stored_name)?);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
