//! Photo Service
//!
//! Accounts, server-side sessions, photo uploads, a global feed, likes and
//! comments. PostgreSQL is the system of record; uploaded files live on the
//! local filesystem.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;
pub mod state;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
