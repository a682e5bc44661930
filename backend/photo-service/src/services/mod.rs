//! Business logic between the HTTP handlers and the repositories

pub mod auth;
pub mod credentials;
pub mod feed;
pub mod photos;

pub use auth::AuthGate;
pub use credentials::CredentialService;
pub use feed::FeedAssembler;
pub use photos::{PhotoService, UploadFile, UploadLimits};
