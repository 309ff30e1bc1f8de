//! Assessment session lifecycle: sign-in, test selection, answering, submit.

mod engine;
mod state;

pub use engine::SessionEngine;
pub use state::{AssessmentSession, Progress, SessionState, SubmitOutcome};
