use std::env;

use assess_core::model::UserId;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::{AuthGateway, AuthUser, CurrentUser, Credentials, normalize_email};
use crate::error::AuthError;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Clone, Debug)]
pub struct IdentityToolkitConfig {
    pub base_url: String,
    pub api_key: String,
}

impl IdentityToolkitConfig {
    /// Read `ASSESS_IDENTITY_API_KEY` / `ASSESS_IDENTITY_BASE_URL`.
    ///
    /// Returns `None` when no API key is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("ASSESS_IDENTITY_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("ASSESS_IDENTITY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Some(Self { base_url, api_key })
    }
}

/// Adapter for an Identity Toolkit style REST backend
/// (`accounts:signInWithPassword`, `accounts:signUp`).
///
/// Sign-out only clears the locally held identity; the backend keeps no
/// session to end.
pub struct IdentityToolkitGateway {
    client: Client,
    config: IdentityToolkitConfig,
    current: CurrentUser,
}

impl IdentityToolkitGateway {
    #[must_use]
    pub fn new(config: IdentityToolkitConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            current: CurrentUser::new(),
        }
    }

    async fn exchange(
        &self,
        endpoint: &str,
        credentials: &Credentials,
    ) -> Result<AuthUser, AuthError> {
        let url = format!(
            "{}/accounts:{endpoint}",
            self.config.base_url.trim_end_matches('/')
        );
        let payload = PasswordRequest {
            email: normalize_email(&credentials.email),
            password: &credentials.password,
            return_secure_token: true,
        };

        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: Option<ErrorEnvelope> = response.json().await.ok();
            let code = body.map(|b| b.error.message).unwrap_or_default();
            tracing::warn!(%status, code = %code, endpoint, "identity backend rejected request");
            return Err(map_error_code(&code, status));
        }

        let body: AccountResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        let user = AuthUser {
            id: UserId::new(body.local_id),
            email: body.email,
        };
        self.current.set(Some(user.clone()));
        Ok(user)
    }
}

/// Backend messages look like `CODE` or `CODE : human readable detail`.
fn map_error_code(message: &str, status: reqwest::StatusCode) -> AuthError {
    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::AccountExists,
        "WEAK_PASSWORD" => AuthError::WeakCredential(if detail.is_empty() {
            "rejected by identity service".into()
        } else {
            detail.to_owned()
        }),
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
        "" => AuthError::Backend(format!("unexpected status {status}")),
        other => AuthError::Backend(other.to_owned()),
    }
}

#[async_trait]
impl AuthGateway for IdentityToolkitGateway {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthUser, AuthError> {
        self.exchange("signInWithPassword", credentials).await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, AuthError> {
        self.exchange("signUp", credentials).await
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: String,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
