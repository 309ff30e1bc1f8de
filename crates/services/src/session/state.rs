use std::fmt;

use assess_core::model::{AnswerMap, OptionToken, QuestionId, ResultId, Test, UserId};
use assess_core::{Score, score};

use crate::error::SessionError;

/// Where the engine is in the assessment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    TestSelected,
    InProgress,
    Submitted,
}

impl SessionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated => "authenticated",
            SessionState::TestSelected => "test selected",
            SessionState::InProgress => "in progress",
            SessionState::Submitted => "submitted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a call to `SessionEngine::submit` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The result was written; the session is now terminal.
    Submitted { result_id: ResultId, score: Score },
    /// The session had already been submitted. Nothing was written.
    AlreadySubmitted,
    /// Another submit for this session is still waiting on the store.
    InFlight,
}

/// Answered vs total questions for the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answered == self.total
    }
}

/// One attempt at one test, from selection until it is discarded.
///
/// Only the engine's active transition writes to it. Callers get clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentSession {
    user_id: UserId,
    test: Test,
    answers: AnswerMap,
    submitted: bool,
    pending_score: Option<Score>,
}

impl AssessmentSession {
    #[must_use]
    pub fn new(user_id: UserId, test: Test) -> Self {
        Self {
            user_id,
            test,
            answers: AnswerMap::new(),
            submitted: false,
            pending_score: None,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn test(&self) -> &Test {
        &self.test
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Score computed by a submit that has not been confirmed yet.
    #[must_use]
    pub fn pending_score(&self) -> Option<Score> {
        self.pending_score
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answers.len(),
            total: self.test.question_count(),
        }
    }

    /// Select `token` for question `id`, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// `SessionError::UnknownQuestion` if `id` is not in this test,
    /// `SessionError::InvalidOption` if the question has no such option.
    pub fn record_answer(
        &mut self,
        id: QuestionId,
        token: OptionToken,
    ) -> Result<(), SessionError> {
        let question = self
            .test
            .question(id)
            .ok_or(SessionError::UnknownQuestion(id))?;
        if !question.has_option(token) {
            return Err(SessionError::InvalidOption {
                id,
                token: token.as_char(),
            });
        }
        self.answers = self.answers.with_answer(id, token);
        self.pending_score = None;
        Ok(())
    }

    /// Score for the current answers, reusing the one from a failed write
    /// while the answers have not changed since.
    pub(crate) fn score_for_submit(&mut self) -> Score {
        match self.pending_score {
            Some(score) => score,
            None => {
                let computed = score(&self.test, &self.answers);
                self.pending_score = Some(computed);
                computed
            }
        }
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.submitted = true;
        self.pending_score = None;
    }
}
