/// Shared application state handed to every handler
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::db::{SessionRepository, SocialGraphRepository, UserRepository};
use crate::media::MediaStore;
use crate::services::{
    AuthGate, CredentialService, FeedAssembler, PhotoService, UploadLimits,
};

#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialService,
    pub auth: AuthGate,
    pub photos: PhotoService,
    pub feed: FeedAssembler,
    pub session: SessionConfig,
}

impl AppState {
    /// Wire every service onto one store that backs all three repositories
    pub fn new<S>(
        store: Arc<S>,
        media: Arc<dyn MediaStore>,
        session: SessionConfig,
        limits: UploadLimits,
    ) -> Self
    where
        S: UserRepository + SessionRepository + SocialGraphRepository + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let sessions: Arc<dyn SessionRepository> = store.clone();
        let photos: Arc<dyn SocialGraphRepository> = store;

        Self {
            credentials: CredentialService::new(users.clone()),
            auth: AuthGate::new(sessions, users.clone(), &session),
            photos: PhotoService::new(photos.clone(), media, limits),
            feed: FeedAssembler::new(photos, users),
            session,
        }
    }
}
