use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use assess_core::QuestionBank;
use assess_core::Score;
use assess_core::model::{NewTestResult, OptionToken, QuestionId, TestCategory};
use storage::repository::ResultRepository;

use super::state::{AssessmentSession, Progress, SessionState, SubmitOutcome};
use crate::auth::{AuthGateway, AuthMode, AuthUser, Credentials};
use crate::error::SessionError;

#[derive(Default)]
struct EngineState {
    state: SessionState,
    mode: AuthMode,
    user: Option<AuthUser>,
    session: Option<AssessmentSession>,
    notice: Option<String>,
    last_score: Option<Score>,
    auth_in_flight: bool,
    submitting: bool,
    /// Bumped on every `enter` and `sign_out`; a pending call only applies
    /// its outcome if the visit it started in is still current.
    visit: u64,
}

impl EngineState {
    /// State for a new visit. Calls still pending from the previous visit
    /// keep their in-flight flags until they resolve.
    fn next_visit(&self) -> Self {
        Self {
            mode: self.mode,
            auth_in_flight: self.auth_in_flight,
            submitting: self.submitting,
            visit: self.visit.wrapping_add(1),
            ..Self::default()
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}

/// Drives one visitor from sign-in to a submitted result.
///
/// Every method takes `&self`; the internal lock is never held across an
/// `.await`, so a second call made while the auth or result write is still
/// pending sees the in-flight flag instead of blocking.
pub struct SessionEngine {
    auth: Arc<dyn AuthGateway>,
    results: Arc<dyn ResultRepository>,
    bank: Arc<QuestionBank>,
    inner: Mutex<EngineState>,
}

impl SessionEngine {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        results: Arc<dyn ResultRepository>,
        bank: Arc<QuestionBank>,
    ) -> Self {
        Self {
            auth,
            results,
            bank,
            inner: Mutex::new(EngineState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Last message meant for the user, if any.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        self.lock().notice.clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.lock().user.clone()
    }

    /// Snapshot of the active session.
    #[must_use]
    pub fn session(&self) -> Option<AssessmentSession> {
        self.lock().session.clone()
    }

    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        self.lock().session.as_ref().map(AssessmentSession::progress)
    }

    /// Score of the most recent confirmed submit.
    #[must_use]
    pub fn last_score(&self) -> Option<Score> {
        self.lock().last_score
    }

    #[must_use]
    pub fn register_mode(&self) -> bool {
        self.lock().mode == AuthMode::Register
    }

    pub fn set_register_mode(&self, register: bool) {
        self.lock().mode = if register {
            AuthMode::Register
        } else {
            AuthMode::SignIn
        };
    }

    /// Flip between sign-in and registration; returns the new mode.
    pub fn toggle_register_mode(&self) -> AuthMode {
        let mut inner = self.lock();
        inner.mode = match inner.mode {
            AuthMode::SignIn => AuthMode::Register,
            AuthMode::Register => AuthMode::SignIn,
        };
        inner.mode
    }

    /// Start a visit: drop whatever identity the gateway still holds, then
    /// wait for credentials.
    ///
    /// A failing sign-out is logged and otherwise ignored.
    pub async fn enter(&self) {
        let visit = {
            let mut inner = self.lock();
            let next = inner.next_visit();
            *inner = next;
            inner.visit
        };

        if let Err(err) = self.auth.sign_out().await {
            tracing::warn!(error = %err, "sign-out on entry failed; continuing");
        }

        let mut inner = self.lock();
        if inner.visit == visit && inner.state == SessionState::Anonymous {
            inner.state = SessionState::Authenticating;
            tracing::info!("awaiting credentials");
        }
    }

    /// Exchange credentials with the identity provider, registering or
    /// signing in according to the current mode.
    ///
    /// # Errors
    ///
    /// `SessionError::Auth` when the provider refuses; the engine stays in
    /// `Authenticating` with the message in `notice()`.
    /// `SessionError::AuthInFlight` if another exchange is pending, including
    /// one started before the last sign-out.
    /// `SessionError::InvalidTransition` if the visit ended while waiting.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<AuthUser, SessionError> {
        let (mode, visit) = {
            let mut inner = self.lock();
            if inner.state != SessionState::Authenticating {
                return Err(inner.invalid("authenticate"));
            }
            if inner.auth_in_flight {
                return Err(SessionError::AuthInFlight);
            }
            inner.auth_in_flight = true;
            inner.notice = None;
            (inner.mode, inner.visit)
        };

        let outcome = match mode {
            AuthMode::SignIn => self.auth.sign_in(&credentials).await,
            AuthMode::Register => self.auth.sign_up(&credentials).await,
        };

        let late = {
            let mut inner = self.lock();
            inner.auth_in_flight = false;
            let current = inner.visit == visit;
            match outcome {
                Ok(user) if current && inner.state == SessionState::Authenticating => {
                    tracing::info!(user_id = %user.id, ?mode, "authenticated");
                    inner.user = Some(user.clone());
                    inner.state = SessionState::Authenticated;
                    return Ok(user);
                }
                // Signed out (and maybe re-entered) while the exchange was pending.
                Ok(_) => inner.invalid("complete authentication"),
                Err(err) => {
                    tracing::warn!(error = %err, ?mode, "authentication failed");
                    if current {
                        inner.notice = Some(err.to_string());
                    }
                    return Err(SessionError::Auth(err));
                }
            }
        };

        if let Err(err) = self.auth.sign_out().await {
            tracing::warn!(error = %err, "discarding late sign-in failed");
        }
        Err(late)
    }

    /// Bind the bank's test for `category` to a fresh session and start
    /// taking answers.
    ///
    /// # Errors
    ///
    /// `SessionError::InvalidTransition` unless authenticated with no active
    /// session, `SessionError::MissingTest` if the bank has no such test.
    pub fn select_test(&self, category: TestCategory) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.state != SessionState::Authenticated {
            return Err(inner.invalid("select a test"));
        }
        let user_id = match &inner.user {
            Some(user) => user.id.clone(),
            None => return Err(inner.invalid("select a test")),
        };
        let test = self
            .bank
            .test(category)
            .ok_or(SessionError::MissingTest(category))?
            .clone();

        let questions = test.question_count();
        inner.session = Some(AssessmentSession::new(user_id, test));
        inner.notice = None;
        // `TestSelected` is passed through within this transition.
        inner.state = SessionState::InProgress;
        tracing::info!(%category, questions, "test selected");
        Ok(())
    }

    /// Record an answer; the latest choice for a question replaces earlier ones.
    ///
    /// # Errors
    ///
    /// `SessionError::InvalidTransition` outside `InProgress`,
    /// `SessionError::SubmitInFlight` while a submit is pending, or the
    /// validation errors of `AssessmentSession::record_answer`.
    pub fn answer(&self, id: QuestionId, token: OptionToken) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.state != SessionState::InProgress {
            return Err(inner.invalid("answer"));
        }
        if inner.submitting {
            return Err(SessionError::SubmitInFlight);
        }
        let state = inner.state;
        let Some(session) = inner.session.as_mut() else {
            return Err(SessionError::InvalidTransition {
                state,
                action: "answer",
            });
        };
        session.record_answer(id, token)?;
        tracing::debug!(question = %id, %token, "answer recorded");
        Ok(())
    }

    /// Grade the session and write its result.
    ///
    /// At most one write is issued per session: a call made while another is
    /// pending returns `InFlight`, and one made after success returns
    /// `AlreadySubmitted`. When the write fails the session stays in
    /// progress and keeps its computed score for the retry.
    ///
    /// A write still pending across a sign-out keeps the gate closed until
    /// it resolves, and its outcome never touches the later visit.
    ///
    /// # Errors
    ///
    /// `SessionError::Persistence` if the store rejects the write,
    /// `SessionError::InvalidTransition` when no test is in progress.
    pub async fn submit(&self) -> Result<SubmitOutcome, SessionError> {
        let (result, score, visit) = {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Submitted => return Ok(SubmitOutcome::AlreadySubmitted),
                SessionState::InProgress => {}
                _ => return Err(inner.invalid("submit")),
            }
            if inner.submitting {
                return Ok(SubmitOutcome::InFlight);
            }
            let Some(session) = inner.session.as_mut() else {
                return Err(SessionError::InvalidTransition {
                    state: SessionState::InProgress,
                    action: "submit",
                });
            };
            let score = session.score_for_submit();
            let result = NewTestResult::new(
                session.user_id().clone(),
                session.test().category(),
                score,
                session.answers().clone(),
            );
            inner.submitting = true;
            (result, score, inner.visit)
        };

        let written = self.results.write_result(&result).await;

        let mut inner = self.lock();
        inner.submitting = false;
        let current = inner.visit == visit;
        match written {
            Ok(result_id) => {
                tracing::info!(
                    %result_id,
                    user_id = %result.user_id,
                    category = %result.category,
                    correct = score.correct,
                    total = score.total,
                    percentage = score.percentage,
                    "result saved"
                );
                if current && inner.state == SessionState::InProgress {
                    inner.last_score = Some(score);
                    if let Some(session) = inner.session.as_mut() {
                        session.mark_submitted();
                    }
                    inner.state = SessionState::Submitted;
                    inner.notice = None;
                }
                Ok(SubmitOutcome::Submitted { result_id, score })
            }
            Err(err) => {
                tracing::warn!(error = %err, "saving result failed; submit can be retried");
                if current {
                    inner.notice = Some(format!("Could not save your result: {err}"));
                }
                Err(SessionError::Persistence(err))
            }
        }
    }

    /// Discard the active session and return to test selection.
    ///
    /// # Errors
    ///
    /// `SessionError::SubmitInFlight` while a submit is pending,
    /// `SessionError::InvalidTransition` if no session is active.
    pub fn back_to_selection(&self) -> Result<(), SessionError> {
        let mut inner = self.lock();
        match inner.state {
            SessionState::TestSelected | SessionState::InProgress | SessionState::Submitted => {}
            _ => return Err(inner.invalid("return to test selection")),
        }
        if inner.submitting {
            return Err(SessionError::SubmitInFlight);
        }
        inner.session = None;
        inner.notice = None;
        inner.state = SessionState::Authenticated;
        tracing::info!("session discarded");
        Ok(())
    }

    /// Drop the identity and any session, from any state.
    ///
    /// A provider failure is reported through `notice()`; the engine is
    /// anonymous either way.
    pub async fn sign_out(&self) {
        let visit = {
            let mut inner = self.lock();
            let next = inner.next_visit();
            *inner = next;
            inner.visit
        };

        if let Err(err) = self.auth.sign_out().await {
            tracing::warn!(error = %err, "sign-out failed");
            let mut inner = self.lock();
            if inner.visit == visit {
                inner.notice = Some(err.to_string());
            }
        }
        tracing::info!("signed out");
    }
}
