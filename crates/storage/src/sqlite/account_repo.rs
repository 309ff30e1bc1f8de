use super::SqliteRepository;
use super::mapping::map_account_row;
use crate::repository::{AccountRecord, AccountRepository, NewAccount, StorageError};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl AccountRepository for SqliteRepository {
    async fn insert_account(&self, account: &NewAccount) -> Result<AccountRecord, StorageError> {
        let created_at = self.clock.now();

        sqlx::query(
            r"
                INSERT INTO accounts (user_id, email, password_hash, created_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(account.user_id.as_str())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        Ok(AccountRecord {
            user_id: account.user_id.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            created_at,
        })
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, email, password_hash, created_at
                FROM accounts
                WHERE email = ?1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_account_row).transpose()
    }
}
