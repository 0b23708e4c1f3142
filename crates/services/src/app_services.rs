use std::sync::Arc;

use tutor_core::bank::QuestionBank;
use tutor_core::model::QuizSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::onboarding::OnboardingService;
use crate::quiz::{QuizLoopService, QuizResultsService};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    quiz_loop: Arc<QuizLoopService>,
    quiz_results: Arc<QuizResultsService>,
    onboarding: Arc<OnboardingService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        bank: QuestionBank,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, bank, settings))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, bank: QuestionBank, settings: QuizSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, bank, settings)
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        bank: QuestionBank,
        settings: QuizSettings,
    ) -> Self {
        let quiz_loop = Arc::new(QuizLoopService::new(
            clock,
            Arc::new(bank),
            settings,
            Arc::clone(&storage.preferences),
            Arc::clone(&storage.results),
        ));
        let quiz_results = Arc::new(QuizResultsService::new(Arc::clone(&storage.results)));
        let onboarding = Arc::new(OnboardingService::new(
            clock,
            Arc::clone(&storage.preferences),
        ));
        Self {
            clock,
            quiz_loop,
            quiz_results,
            onboarding,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn quiz_results(&self) -> Arc<QuizResultsService> {
        Arc::clone(&self.quiz_results)
    }

    #[must_use]
    pub fn onboarding(&self) -> Arc<OnboardingService> {
        Arc::clone(&self.onboarding)
    }
}
