//! Grading of an answer map against a test.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, Test};

/// Outcome of grading one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

impl Score {
    /// Build a score from raw counts, rounding the percentage half-up.
    ///
    /// # Panics
    ///
    /// Panics if `total` is zero. Every `Test` holds at least one question, so
    /// this can only happen with hand-built counts.
    #[must_use]
    pub fn from_counts(correct: u32, total: u32) -> Self {
        debug_assert!(correct <= total, "correct ({correct}) exceeds total ({total})");
        Self {
            correct,
            total,
            percentage: rounded_percentage(correct, total),
        }
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct == self.total
    }
}

/// `round(100 * correct / total)` in integer arithmetic, halves rounding up.
fn rounded_percentage(correct: u32, total: u32) -> u32 {
    let correct = u64::from(correct);
    let total = u64::from(total);
    let rounded = (200 * correct + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Grade `answers` against `test`.
///
/// Every question counts toward the total whether answered or not; a question
/// is correct only when its recorded token equals the question's correct token.
/// Answers for ids that are not part of `test` are ignored.
#[must_use]
pub fn score(test: &Test, answers: &AnswerMap) -> Score {
    let mut correct = 0_u32;
    let mut total = 0_u32;

    for question in test.questions() {
        total = total.saturating_add(1);
        if answers.get(question.id()) == Some(question.correct_token()) {
            correct = correct.saturating_add(1);
        }
    }

    Score::from_counts(correct, total)
}
