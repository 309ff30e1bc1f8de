use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use assess_core::model::UserId;
use async_trait::async_trait;
use storage::repository::{AccountRepository, NewAccount, StorageError};
use tokio::sync::watch;

use super::{AuthGateway, AuthUser, CurrentUser, Credentials, is_plausible_email, normalize_email};
use crate::error::AuthError;

/// Shortest password accepted on registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Identity provider backed by the local account store.
///
/// Passwords are stored as Argon2 hashes; user ids are random UUIDs.
pub struct LocalAuthGateway {
    accounts: Arc<dyn AccountRepository>,
    current: CurrentUser,
}

impl LocalAuthGateway {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self {
            accounts,
            current: CurrentUser::new(),
        }
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Backend(e.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|e| AuthError::Backend(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[async_trait]
impl AuthGateway for LocalAuthGateway {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthUser, AuthError> {
        let email = normalize_email(&credentials.email);
        let account = self
            .accounts
            .find_account_by_email(&email)
            .await
            .map_err(|e| AuthError::from_storage(&e))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&credentials.password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let user = AuthUser {
            id: account.user_id,
            email: account.email,
        };
        self.current.set(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, AuthError> {
        let email = normalize_email(&credentials.email);
        if !is_plausible_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakCredential(format!(
                "password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let account = NewAccount {
            user_id: UserId::new(uuid::Uuid::new_v4().to_string()),
            email,
            password_hash: hash_password(&credentials.password)?,
        };
        let record = self
            .accounts
            .insert_account(&account)
            .await
            .map_err(|e| match e {
                StorageError::Conflict => AuthError::AccountExists,
                other => AuthError::from_storage(&other),
            })?;

        tracing::info!(user_id = %record.user_id, "registered local account");
        let user = AuthUser {
            id: record.user_id,
            email: record.email,
        };
        self.current.set(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.current.set(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.current.get()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }
}
