use std::sync::Arc;

use tracing::info;
use tutor_core::model::{UserId, UserPreferences};

use storage::repository::UserPreferencesRepository;

use super::wizard::OnboardingWizard;
use crate::Clock;
use crate::error::OnboardingError;

/// Hands a finished onboarding over to the preference store.
#[derive(Clone)]
pub struct OnboardingService {
    clock: Clock,
    preferences: Arc<dyn UserPreferencesRepository>,
}

impl OnboardingService {
    #[must_use]
    pub fn new(clock: Clock, preferences: Arc<dyn UserPreferencesRepository>) -> Self {
        Self { clock, preferences }
    }

    /// Persist the wizard's answers for `user_id`, replacing earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::NotAtConfirmation` if the wizard is not on its last
    /// step, or `OnboardingError::Storage` if saving fails.
    pub async fn complete(
        &self,
        user_id: UserId,
        wizard: &OnboardingWizard,
    ) -> Result<UserPreferences, OnboardingError> {
        let preferences = wizard.finish(user_id, self.clock.now())?;
        self.preferences.save_preferences(&preferences).await?;
        info!(
            user = %user_id,
            preferences = preferences.learning_preferences.len(),
            schedule = preferences.schedule.len(),
            courses = preferences.selected_courses.len(),
            "onboarding completed"
        );
        Ok(preferences)
    }

    /// Stored preferences, if the learner finished onboarding before.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::Storage` on repository failures.
    pub async fn load(&self, user_id: UserId) -> Result<Option<UserPreferences>, OnboardingError> {
        Ok(self.preferences.get_preferences(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use storage::repository::InMemoryRepository;
    use tutor_core::model::{CourseId, LearningHours, LearningPreference, SessionDuration};
    use tutor_core::time::{fixed_clock, fixed_now};

    #[tokio::test]
    async fn completed_onboarding_is_stored() {
        let repo = InMemoryRepository::new();
        let service = OnboardingService::new(fixed_clock(), Arc::new(repo.clone()));
        let user = UserId::new(11);

        let mut wizard = OnboardingWizard::new();
        assert!(matches!(
            service.complete(user, &wizard).await,
            Err(OnboardingError::NotAtConfirmation { .. })
        ));

        wizard.toggle_preference(LearningPreference::ReadingWriting);
        wizard.advance();
        wizard.set_learning_hours(Some(LearningHours::Morning));
        wizard.advance();
        let row = wizard.add_schedule_entry();
        wizard.set_schedule_day(row, Weekday::Sat).unwrap();
        wizard
            .set_schedule_duration(row, Some(SessionDuration::TwoHoursPlus))
            .unwrap();
        wizard.advance();
        wizard.toggle_course(CourseId::new("history")).unwrap();
        wizard.advance();

        let stored = service.complete(user, &wizard).await.unwrap();
        assert_eq!(stored.updated_at, fixed_now());
        assert_eq!(service.load(user).await.unwrap(), Some(stored));
        assert!(service.load(UserId::new(12)).await.unwrap().is_none());

        // courses cleared after reaching confirmation: nothing is overwritten
        wizard.toggle_course(CourseId::new("history")).unwrap();
        assert!(matches!(
            service.complete(user, &wizard).await,
            Err(OnboardingError::Incomplete {
                step: crate::onboarding::OnboardingStep::SelectCourses
            })
        ));
        let kept = service.load(user).await.unwrap().unwrap();
        assert!(kept.selected_courses.contains(&CourseId::new("history")));
    }
}
