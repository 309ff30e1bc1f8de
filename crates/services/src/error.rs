//! Shared error types for the services crate.

use thiserror::Error;

use assess_core::CatalogError;
use assess_core::model::{QuestionId, TestCategory};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::session::SessionState;

/// Failures reported by an identity backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account with this email already exists")]
    AccountExists,
    #[error("password is too weak: {0}")]
    WeakCredential(String),
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("identity service unreachable: {0}")]
    Network(String),
    #[error("identity service error: {0}")]
    Backend(String),
}

impl AuthError {
    /// Storage trouble behind the local provider looks like an unreachable backend.
    pub(crate) fn from_storage(err: &StorageError) -> Self {
        AuthError::Network(err.to_string())
    }
}

/// Errors emitted by `SessionEngine` transitions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
    #[error("an authentication request is already in flight")]
    AuthInFlight,
    #[error("answers are locked while the result is being saved")]
    SubmitInFlight,
    #[error("question {0} is not part of this test")]
    UnknownQuestion(QuestionId),
    #[error("question {id} has no option '{token}'")]
    InvalidOption { id: QuestionId, token: char },
    #[error("no test configured for category '{0}'")]
    MissingTest(TestCategory),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("failed to save result: {0}")]
    Persistence(#[from] StorageError),
}

/// Errors emitted while bootstrapping services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
