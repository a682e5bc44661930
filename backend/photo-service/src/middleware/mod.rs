/// Request authentication for photo-service
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::error::AppError;
use crate::models::Principal;
use crate::state::AppState;

/// Resolves the session cookie into a `Principal`; unauthenticated requests
/// are redirected to the login page
impl FromRequest for Principal {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = state.as_ref().and_then(|state| {
            req.cookie(&state.session.cookie_name)
                .map(|c| c.value().to_string())
        });

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;
            state.auth.require_auth(token.as_deref()).await
        })
    }
}
