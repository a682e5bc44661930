/// Account registration and credential checks
use std::sync::Arc;
use tracing::info;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{hash_password, verify_password};
use crate::validators::{LoginInput, RegisterInput};

#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Hash the password and persist the account.
    ///
    /// Fails with `DuplicateUsername` or `DuplicateEmail` on conflict.
    pub async fn register(&self, input: RegisterInput) -> Result<User> {
        let password_hash = hash_password(&input.password)?;
        let user = self
            .users
            .create_user(&input.username, &input.email, &password_hash)
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Look up by email and verify the password.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn authenticate(&self, input: &LoginInput) -> Result<User> {
        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> CredentialService {
        CredentialService::new(Arc::new(MemoryStore::new()))
    }

    fn input(username: &str, email: &str) -> RegisterInput {
        RegisterInput {
            username: username.into(),
            email: email.into(),
            password: "hunter2".into(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let service = service();
        let user = service
            .register(input("alice", "alice@example.com"))
            .await
            .unwrap();
        assert_ne!(user.password_hash, "hunter2");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_same_email_twice_fails() {
        let service = service();
        service
            .register(input("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = service
            .register(input("alice2", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
        assert!(err.is_duplicate_credential());
    }

    #[tokio::test]
    async fn test_register_same_username_twice_fails() {
        let service = service();
        service
            .register(input("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = service
            .register(input("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
    }

    #[tokio::test]
    async fn test_authenticate_does_not_reveal_cause() {
        let service = service();
        service
            .register(input("alice", "alice@example.com"))
            .await
            .unwrap();

        let ok = service
            .authenticate(&LoginInput {
                email: "alice@example.com".into(),
                password: "hunter2".into(),
            })
            .await
            .unwrap();
        assert_eq!(ok.username, "alice");

        let wrong_password = service
            .authenticate(&LoginInput {
                email: "alice@example.com".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .authenticate(&LoginInput {
                email: "nobody@example.com".into(),
                password: "hunter2".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }
}
