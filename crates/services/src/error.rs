//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tutor_core::model::{OnboardingStateError, QuizResultError};
use tutor_core::results::ResultsError;

use crate::onboarding::OnboardingStep;

/// Errors emitted by quiz session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("question bank is empty")]
    EmptyBank,
    #[error("a quiz needs at least one question")]
    ZeroQuestionsRequested,
    #[error("no questions match the requested difficulty")]
    NoMatchingQuestions,
    #[error("session already completed")]
    Completed,
    #[error("session state is unavailable: {0}")]
    Poisoned(String),
    #[error(transparent)]
    Results(#[from] ResultsError),
    #[error(transparent)]
    Result(#[from] QuizResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the onboarding wizard and service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OnboardingError {
    #[error("onboarding cannot finish from the {step} step")]
    NotAtConfirmation { step: OnboardingStep },
    #[error("onboarding is incomplete at the {step} step")]
    Incomplete { step: OnboardingStep },
    #[error(transparent)]
    State(#[from] OnboardingStateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
