use std::sync::Arc;

use assess_core::QuestionBank;
use storage::repository::{ResultRepository, Storage};

use crate::auth::{AuthGateway, IdentityToolkitConfig, IdentityToolkitGateway, LocalAuthGateway};
use crate::error::ServicesError;
use crate::session::SessionEngine;

/// Wires the question bank, identity provider, and result store together.
#[derive(Clone)]
pub struct AppServices {
    bank: Arc<QuestionBank>,
    auth: Arc<dyn AuthGateway>,
    results: Arc<dyn ResultRepository>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Accounts live in the same database unless `identity` points at a
    /// remote identity service.
    ///
    /// # Errors
    ///
    /// Returns `ServicesError` if storage initialization fails or the
    /// built-in catalog is malformed.
    pub async fn new_sqlite(
        db_url: &str,
        identity: Option<IdentityToolkitConfig>,
    ) -> Result<Self, ServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, identity)
    }

    /// Build services on the in-memory store with local accounts.
    ///
    /// # Errors
    ///
    /// Returns `ServicesError::Catalog` if the built-in catalog is malformed.
    pub fn in_memory() -> Result<Self, ServicesError> {
        Self::from_storage(Storage::in_memory(), None)
    }

    fn from_storage(
        storage: Storage,
        identity: Option<IdentityToolkitConfig>,
    ) -> Result<Self, ServicesError> {
        let bank = Arc::new(QuestionBank::builtin()?);
        let auth: Arc<dyn AuthGateway> = match identity {
            Some(config) => {
                tracing::info!(base_url = %config.base_url, "using remote identity service");
                Arc::new(IdentityToolkitGateway::new(config))
            }
            None => Arc::new(LocalAuthGateway::new(Arc::clone(&storage.accounts))),
        };
        Ok(Self {
            bank,
            auth,
            results: storage.results,
        })
    }

    /// A fresh engine for one visit. Call `SessionEngine::enter` before use.
    #[must_use]
    pub fn engine(&self) -> SessionEngine {
        SessionEngine::new(
            Arc::clone(&self.auth),
            Arc::clone(&self.results),
            Arc::clone(&self.bank),
        )
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn results(&self) -> Arc<dyn ResultRepository> {
        Arc::clone(&self.results)
    }
}
