use assess_core::model::{NewTestResult, ResultId, TestResult, UserId};

use super::SqliteRepository;
use super::mapping::{answers_to_json, map_result_row};
use crate::repository::{ResultRepository, StorageError};

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn write_result(&self, result: &NewTestResult) -> Result<ResultId, StorageError> {
        let answers = answers_to_json(&result.answers)?;
        let created_at = self.clock.now();

        let res = sqlx::query(
            r"
                INSERT INTO test_results (
                    user_id, category, score, total, percentage, answers, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(result.user_id.as_str())
        .bind(result.category.as_str())
        .bind(i64::from(result.score.correct))
        .bind(i64::from(result.score.total))
        .bind(i64::from(result.score.percentage))
        .bind(answers)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let id = ResultId::new(res.last_insert_rowid());
        tracing::info!(
            result_id = %id,
            user_id = %result.user_id,
            category = %result.category,
            "stored test result"
        );
        Ok(id)
    }

    async fn get_result(&self, id: ResultId) -> Result<TestResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, user_id, category, score, total, percentage, answers, created_at
                FROM test_results
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<TestResult>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, category, score, total, percentage, answers, created_at
                FROM test_results
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}
