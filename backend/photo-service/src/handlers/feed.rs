/// Feed view and the actions taken from it
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::redirect;
use crate::error::Result;
use crate::models::Principal;
use crate::state::AppState;
use crate::validators::CommentForm;

/// GET /feed
pub async fn view_feed(state: web::Data<AppState>, principal: Principal) -> Result<HttpResponse> {
    let items = state.feed.build_feed(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// POST /like/{photo_id}
pub async fn toggle_like(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state
        .photos
        .toggle_like(&principal, path.into_inner())
        .await?;
    Ok(redirect("/feed"))
}

/// POST /comment/{photo_id}
pub async fn add_comment(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    state
        .photos
        .add_comment(&principal, path.into_inner(), &form.content)
        .await?;
    Ok(redirect("/feed"))
}

/// POST /deletephoto/{photo_id}
pub async fn delete_photo(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state
        .photos
        .delete_photo(&principal, path.into_inner())
        .await?;
    Ok(redirect(&format!("/profile/{}", principal.user_id)))
}
