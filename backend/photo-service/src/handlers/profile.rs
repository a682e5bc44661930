/// Profile page and photo upload
use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentDisposition};
use actix_web::{web, HttpResponse};
use bytes::BytesMut;
use futures::StreamExt;
use uuid::Uuid;

use super::redirect;
use crate::error::{AppError, Result};
use crate::models::Principal;
use crate::services::{UploadFile, UploadLimits};
use crate::state::AppState;

/// GET /profile/{user_id}
pub async fn view_profile(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let view = state
        .feed
        .profile(principal.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /profile/{user_id} (multipart, one or more `photo` parts)
pub async fn upload_photos(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    if user_id != principal.user_id {
        return Err(AppError::Forbidden(
            "You can only upload to your own profile".to_string(),
        ));
    }

    let files = read_files(payload, state.photos.limits()).await?;
    state.photos.upload(&principal, files).await?;

    Ok(redirect(&format!("/profile/{}", user_id)))
}

/// Collect every part that carries a filename; other parts are drained.
///
/// Stops reading as soon as a file, the whole body or the file count goes
/// over its limit.
async fn read_files(mut payload: Multipart, limits: UploadLimits) -> Result<Vec<UploadFile>> {
    let mut files = Vec::new();
    let mut total_bytes: usize = 0;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::Validation(format!("multipart: {}", e)))?;

        let file_name = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok())
            .and_then(|cd| cd.get_filename().map(str::to_string));

        if file_name.is_some() && files.len() >= limits.max_files {
            return Err(limits.too_many_files());
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::Validation(format!("multipart: {}", e)))?;
            total_bytes += chunk.len();
            if total_bytes > limits.max_request_bytes {
                return Err(limits.request_too_large());
            }
            if file_name.is_some() && buf.len() + chunk.len() > limits.max_file_bytes {
                return Err(limits.file_too_large());
            }
            if file_name.is_some() {
                buf.extend_from_slice(&chunk);
            }
        }

        if let Some(original_name) = file_name {
            files.push(UploadFile {
                original_name,
                bytes: buf.freeze(),
            });
        }
    }

    Ok(files)
}
