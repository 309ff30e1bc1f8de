use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnswerMap, ResultId, TestCategory, UserId};
use crate::scoring::Score;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("result total must be at least 1")]
    ZeroTotal,

    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("percentage {stored} does not match {correct}/{total} (expected {expected})")]
    PercentageMismatch {
        correct: u32,
        total: u32,
        stored: u32,
        expected: u32,
    },
}

/// A result as handed to the store: everything except the store-assigned
/// id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTestResult {
    pub user_id: UserId,
    pub category: TestCategory,
    pub score: Score,
    pub answers: AnswerMap,
}

impl NewTestResult {
    #[must_use]
    pub fn new(user_id: UserId, category: TestCategory, score: Score, answers: AnswerMap) -> Self {
        Self {
            user_id,
            category,
            score,
            answers,
        }
    }
}

/// A stored, immutable result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    id: ResultId,
    user_id: UserId,
    category: TestCategory,
    score: Score,
    answers: AnswerMap,
    created_at: DateTime<Utc>,
}

impl TestResult {
    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the stored counts break `0 <= correct <= total`,
    /// `total >= 1`, or the stored percentage disagrees with the counts.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: ResultId,
        user_id: UserId,
        category: TestCategory,
        correct: u32,
        total: u32,
        percentage: u32,
        answers: AnswerMap,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if total == 0 {
            return Err(ResultError::ZeroTotal);
        }
        if correct > total {
            return Err(ResultError::CorrectExceedsTotal { correct, total });
        }
        let score = Score::from_counts(correct, total);
        if score.percentage != percentage {
            return Err(ResultError::PercentageMismatch {
                correct,
                total,
                stored: percentage,
                expected: score.percentage,
            });
        }

        Ok(Self {
            id,
            user_id,
            category,
            score,
            answers,
            created_at,
        })
    }

    /// Attach store-assigned fields to a freshly written result.
    #[must_use]
    pub fn from_new(id: ResultId, new: NewTestResult, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            category: new.category,
            score: new.score,
            answers: new.answers,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn category(&self) -> TestCategory {
        self.category
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn from_persisted_checks_counts() {
        let ok = TestResult::from_persisted(
            ResultId::new(1),
            UserId::new("u"),
            TestCategory::Kids,
            4,
            5,
            80,
            AnswerMap::new(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(ok.score().percentage, 80);

        let err = TestResult::from_persisted(
            ResultId::new(1),
            UserId::new("u"),
            TestCategory::Kids,
            6,
            5,
            120,
            AnswerMap::new(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ResultError::CorrectExceedsTotal { correct: 6, total: 5 });
    }

    #[test]
    fn from_persisted_rejects_tampered_percentage() {
        let err = TestResult::from_persisted(
            ResultId::new(1),
            UserId::new("u"),
            TestCategory::Adults,
            1,
            2,
            75,
            AnswerMap::new(),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ResultError::PercentageMismatch { expected: 50, .. }));
    }

    #[test]
    fn zero_total_is_rejected_before_division() {
        let err = TestResult::from_persisted(
            ResultId::new(1),
            UserId::new("u"),
            TestCategory::Kids,
            0,
            0,
            0,
            AnswerMap::new(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ResultError::ZeroTotal);
    }
}
