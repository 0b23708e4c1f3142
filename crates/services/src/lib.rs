#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod onboarding;
pub mod quiz;

pub use tutor_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, OnboardingError, SessionError};
pub use onboarding::{OnboardingService, OnboardingStep, OnboardingWizard};
pub use quiz::{
    Advance, QuizLoopService, QuizOptions, QuizProgress, QuizRequest, QuizResultListItem,
    QuizResultsService, QuizSession, SessionTimer, SharedQuizSession, Submission,
};
