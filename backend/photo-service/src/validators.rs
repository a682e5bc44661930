//! Input validation for submitted forms
//!
//! Every function here is pure: raw form in, validated input or
//! `AppError::Validation` out.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::config::ALLOWED_EXTENSIONS;
use crate::error::{AppError, Result};

pub const MAX_COMMENT_CHARS: usize = 500;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+$").expect("hardcoded username regex is invalid - fix source code")
});

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 20, message = "must be 1-20 characters"))]
    pub username: String,
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "is required"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    pub content: String,
}

/// Registration fields after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login fields after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub fn validate_registration(form: RegisterForm) -> Result<RegisterInput> {
    let form = RegisterForm {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        ..form
    };
    form.validate()?;

    if !USERNAME_REGEX.is_match(&form.username) {
        return Err(AppError::Validation(
            "username: only letters, digits, '_', '.' and '-' are allowed".to_string(),
        ));
    }

    if form.password != form.confirm_password {
        return Err(AppError::Validation(
            "confirm_password: passwords do not match".to_string(),
        ));
    }

    Ok(RegisterInput {
        username: form.username,
        email: form.email,
        password: form.password,
    })
}

pub fn validate_login(form: LoginForm) -> Result<LoginInput> {
    let form = LoginForm {
        email: form.email.trim().to_string(),
        ..form
    };
    form.validate()?;

    Ok(LoginInput {
        email: form.email,
        password: form.password,
    })
}

/// Trim and bound a comment body
pub fn validate_comment(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation(
            "content: comment cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "content: comment must be at most {} characters",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(content.to_string())
}

/// Accept only image extensions we serve
pub fn validate_image_filename(file_name: &str) -> Result<()> {
    if file_name.trim().is_empty() {
        return Err(AppError::Validation("photo: file name is required".to_string()));
    }

    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(AppError::Validation(format!(
            "photo: only image files are allowed ({})",
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}
