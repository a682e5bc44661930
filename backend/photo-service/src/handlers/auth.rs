/// Login, registration and logout
use actix_web::{web, HttpResponse};
use serde_json::json;

use super::{redirect, removal_cookie, see_other, session_cookie};
use crate::error::Result;
use crate::models::{Principal, User};
use crate::state::AppState;
use crate::validators::{validate_login, validate_registration, LoginForm, RegisterForm};

/// GET /
pub async fn login_page(principal: Option<Principal>) -> HttpResponse {
    match principal {
        Some(principal) => redirect(&format!("/profile/{}", principal.user_id)),
        None => HttpResponse::Ok().json(json!({
            "view": "login",
            "fields": ["email", "password"],
        })),
    }
}

/// GET /createaccount
pub async fn register_page(principal: Option<Principal>) -> HttpResponse {
    match principal {
        Some(principal) => redirect(&format!("/profile/{}", principal.user_id)),
        None => HttpResponse::Ok().json(json!({
            "view": "createaccount",
            "fields": ["username", "email", "password", "confirm_password"],
        })),
    }
}

/// POST /
pub async fn login(state: web::Data<AppState>, form: web::Form<LoginForm>) -> Result<HttpResponse> {
    let input = validate_login(form.into_inner())?;
    let user = state.credentials.authenticate(&input).await?;
    start_session(&state, &user).await
}

/// POST /createaccount
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse> {
    let input = validate_registration(form.into_inner())?;
    let user = state.credentials.register(input).await?;
    start_session(&state, &user).await
}

/// GET|POST /logout
pub async fn logout(state: web::Data<AppState>, principal: Principal) -> Result<HttpResponse> {
    state.auth.logout(&principal).await?;

    Ok(see_other("/").cookie(removal_cookie(&state.session)).finish())
}

async fn start_session(state: &AppState, user: &User) -> Result<HttpResponse> {
    let session = state.auth.login(user).await?;

    Ok(see_other(&format!("/profile/{}", user.id))
        .cookie(session_cookie(&state.session, session.id.to_string()))
        .finish())
}
