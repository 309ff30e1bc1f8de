//! Identity provider contract and adapters.
//!
//! The rest of the crate only ever sees `AuthUser`; talking to the identity
//! backend is confined to implementations of `AuthGateway`.

mod identity_toolkit;
mod local;

use std::fmt;

use assess_core::model::UserId;
use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::AuthError;

pub use identity_toolkit::{IdentityToolkitConfig, IdentityToolkitGateway};
pub use local::{LocalAuthGateway, MIN_PASSWORD_LEN};

/// A signed-in user as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
}

/// Email + password pair. The password is kept out of `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Whether a credential exchange logs in or registers. Chosen by the user,
/// never inferred from the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    Register,
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Log in with an existing account.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidCredentials` for an unknown email or wrong password,
    /// `AuthError::Network` when the backend cannot be reached.
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthUser, AuthError>;

    /// Create an account and log in with it.
    ///
    /// # Errors
    ///
    /// `AuthError::AccountExists`, `AuthError::WeakCredential`,
    /// `AuthError::InvalidEmail`, or `AuthError::Network`.
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, AuthError>;

    /// Drop the current identity.
    ///
    /// # Errors
    ///
    /// `AuthError::Network` if the backend could not be told. The local
    /// identity is cleared regardless.
    async fn sign_out(&self) -> Result<(), AuthError>;

    fn current_user(&self) -> Option<AuthUser>;

    /// Observe sign-in / sign-out changes.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;
}

/// Holder for the signed-in user shared by the gateway implementations.
pub(crate) struct CurrentUser {
    tx: watch::Sender<Option<AuthUser>>,
}

impl CurrentUser {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub(crate) fn set(&self, user: Option<AuthUser>) {
        self.tx.send_replace(user);
    }

    pub(crate) fn get(&self) -> Option<AuthUser> {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.tx.subscribe()
    }
}

/// Trim and lower-case an address so lookups are case-insensitive.
pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("a@b.c", "hunter22");
        let shown = format!("{creds:?}");
        assert!(shown.contains("a@b.c"));
        assert!(!shown.contains("hunter22"));
    }

    #[test]
    fn email_normalization_and_shape() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
        assert!(is_plausible_email("ann@example.com"));
        assert!(!is_plausible_email("ann.example.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("ann@"));
        assert!(!is_plausible_email("a b@example.com"));
    }

    #[tokio::test]
    async fn current_user_notifies_subscribers() {
        let current = CurrentUser::new();
        let mut rx = current.subscribe();
        let user = AuthUser {
            id: UserId::new("u1"),
            email: "a@b.c".into(),
        };

        current.set(Some(user.clone()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().clone(), Some(user));

        current.set(None);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(current.get().is_none());
    }
}
