use thiserror::Error;

use crate::bank::BankError;
use crate::model::{OnboardingStateError, QuestionError, QuizResultError, QuizSettingsError};
use crate::results::ResultsError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Settings(#[from] QuizSettingsError),
    #[error(transparent)]
    Onboarding(#[from] OnboardingStateError),
    #[error(transparent)]
    Results(#[from] ResultsError),
    #[error(transparent)]
    QuizResult(#[from] QuizResultError),
}
