/// HTTP handlers and route table
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpResponse, HttpResponseBuilder};
use serde_json::json;

use crate::config::SessionConfig;
use crate::error::AppError;

pub mod auth;
pub mod feed;
pub mod profile;

/// Register every route on the app
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Malformed or incomplete forms answer with the JSON error body
    cfg.app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("form: {}", err)).into()
    }));

    cfg.route("/health", web::get().to(health))
        .service(
            web::resource("/")
                .route(web::get().to(auth::login_page))
                .route(web::post().to(auth::login)),
        )
        .service(
            web::resource("/createaccount")
                .route(web::get().to(auth::register_page))
                .route(web::post().to(auth::register)),
        )
        .service(
            web::resource("/logout")
                .route(web::get().to(auth::logout))
                .route(web::post().to(auth::logout)),
        )
        .service(
            web::resource("/profile/{user_id}")
                .route(web::get().to(profile::view_profile))
                .route(web::post().to(profile::upload_photos)),
        )
        .route("/feed", web::get().to(feed::view_feed))
        .route("/like/{photo_id}", web::post().to(feed::toggle_like))
        .route("/comment/{photo_id}", web::post().to(feed::add_comment))
        .route("/deletephoto/{photo_id}", web::post().to(feed::delete_photo));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub(crate) fn see_other(location: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::SeeOther();
    builder.insert_header((header::LOCATION, location));
    builder
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    see_other(location).finish()
}

pub(crate) fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::hours(config.ttl_hours))
        .finish()
}

pub(crate) fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.cookie_name.clone(), "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}
