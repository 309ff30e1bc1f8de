#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod error;
pub mod session;

pub use app_services::AppServices;
pub use auth::{
    AuthGateway, AuthMode, AuthUser, Credentials, IdentityToolkitConfig, IdentityToolkitGateway,
    LocalAuthGateway,
};
pub use error::{AuthError, ServicesError, SessionError};
pub use session::{AssessmentSession, Progress, SessionEngine, SessionState, SubmitOutcome};
