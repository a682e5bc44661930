#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use photo_service::config::{MediaConfig, SessionConfig};
use photo_service::db::{MemoryStore, UserRepository};
use photo_service::media::LocalMediaStore;
use photo_service::models::Principal;
use photo_service::services::UploadLimits;
use photo_service::AppState;

pub const BOUNDARY: &str = "----photo-service-test-boundary";

pub const LIMITS: UploadLimits = UploadLimits {
    max_file_bytes: 64 * 1024,
    max_request_bytes: 128 * 1024,
    max_files: 4,
};

/// In-memory store plus a throwaway upload directory
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub media: Arc<LocalMediaStore>,
    _dir: TempDir,
}

pub async fn setup() -> TestContext {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(
        LocalMediaStore::new(&MediaConfig::with_upload_dir(dir.path()))
            .await
            .expect("media store"),
    );
    let state = AppState::new(
        store.clone(),
        media.clone(),
        SessionConfig::default(),
        LIMITS,
    );

    TestContext {
        state,
        store,
        media,
        _dir: dir,
    }
}

/// Create a user directly in the store and wrap it as a principal
pub async fn seed_principal(store: &MemoryStore, name: &str) -> Principal {
    let user = store
        .create_user(name, &format!("{}@example.com", name), "hash")
        .await
        .expect("seed user");
    Principal {
        user_id: user.id,
        username: user.username,
        session_id: Uuid::new_v4(),
    }
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SessionConfig::default().cookie_name)
        .map(|c| c.into_owned())
        .expect("session cookie set")
}

pub fn register_form(username: &str, email: &str) -> Vec<(&'static str, String)> {
    vec![
        ("username", username.to_string()),
        ("email", email.to_string()),
        ("password", "hunter22".to_string()),
        ("confirm_password", "hunter22".to_string()),
    ]
}

/// Build a multipart/form-data body with one `photo` part per file
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"photo\"; filename=\"{}\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
