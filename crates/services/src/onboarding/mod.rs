mod service;
mod wizard;

pub use crate::error::OnboardingError;
pub use service::OnboardingService;
pub use wizard::{OnboardingStep, OnboardingWizard};
