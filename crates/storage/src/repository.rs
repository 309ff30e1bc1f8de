use assess_core::Clock;
use assess_core::model::{NewTestResult, ResultId, TestResult, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Account as handed to the store on registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub user_id: UserId,
    /// Normalized (trimmed, lower-cased) address; unique across accounts.
    pub email: String,
    /// PHC-format password hash. Plain passwords never reach storage.
    pub password_hash: String,
}

/// Persisted account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only store of assessment results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Insert a new result; the store assigns its id and creation timestamp.
    ///
    /// Never updates or replaces an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write does not complete.
    async fn write_result(&self, result: &NewTestResult) -> Result<ResultId, StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: ResultId) -> Result<TestResult, StorageError>;

    /// Results for one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<TestResult>, StorageError>;
}

/// Account lookup for the local identity provider.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered.
    async fn insert_account(&self, account: &NewAccount) -> Result<AccountRecord, StorageError>;

    /// Look up an account by its normalized email.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountRecord>, StorageError>;
}

#[derive(Default)]
struct ResultTable {
    next_id: i64,
    rows: Vec<TestResult>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    clock: Clock,
    results: Arc<Mutex<ResultTable>>,
    accounts: Arc<Mutex<HashMap<String, AccountRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp records with `clock` instead of the system time.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Number of stored results across all users.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn result_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.rows.len())
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn write_result(&self, result: &NewTestResult) -> Result<ResultId, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.next_id += 1;
        let id = ResultId::new(guard.next_id);
        guard
            .rows
            .push(TestResult::from_new(id, result.clone(), self.clock.now()));
        Ok(id)
    }

    async fn get_result(&self, id: ResultId) -> Result<TestResult, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .rows
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<TestResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        // Insertion order doubles as creation order, so reverse for newest first.
        Ok(guard
            .rows
            .iter()
            .rev()
            .filter(|r| r.user_id() == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountRepository for InMemoryRepository {
    async fn insert_account(&self, account: &NewAccount) -> Result<AccountRecord, StorageError> {
        let mut guard = self
            .accounts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&account.email) {
            return Err(StorageError::Conflict);
        }
        let record = AccountRecord {
            user_id: account.user_id.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            created_at: self.clock.now(),
        };
        guard.insert(account.email.clone(), record.clone());
        Ok(record)
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountRecord>, StorageError> {
        let guard = self
            .accounts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(email).cloned())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub results: Arc<dyn ResultRepository>,
    pub accounts: Arc<dyn AccountRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let results: Arc<dyn ResultRepository> = Arc::new(repo.clone());
        let accounts: Arc<dyn AccountRepository> = Arc::new(repo);
        Self { results, accounts }
    }
}
