use chrono::{DateTime, Utc, Weekday};
use std::fmt;
use tracing::debug;

use tutor_core::model::{
    CourseId, LearningHours, LearningPreference, OnboardingState, SessionDuration, UserId,
    UserPreferences,
};

use crate::error::OnboardingError;

/// Screens of the onboarding flow, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OnboardingStep {
    #[default]
    LearningPreference,
    LearningHours,
    SchedulePreferences,
    SelectCourses,
    Confirmation,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 5] = [
        OnboardingStep::LearningPreference,
        OnboardingStep::LearningHours,
        OnboardingStep::SchedulePreferences,
        OnboardingStep::SelectCourses,
        OnboardingStep::Confirmation,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            OnboardingStep::LearningPreference => 0,
            OnboardingStep::LearningHours => 1,
            OnboardingStep::SchedulePreferences => 2,
            OnboardingStep::SelectCourses => 3,
            OnboardingStep::Confirmation => 4,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            OnboardingStep::LearningPreference => "Choose Your Learning Preference(s)",
            OnboardingStep::LearningHours => "When Do You Prefer to Learn?",
            OnboardingStep::SchedulePreferences => "Schedule Preferences",
            OnboardingStep::SelectCourses => "Select Your Courses",
            OnboardingStep::Confirmation => "You're All Set!",
        }
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OnboardingStep::LearningPreference => "learning preference",
            OnboardingStep::LearningHours => "learning hours",
            OnboardingStep::SchedulePreferences => "schedule preferences",
            OnboardingStep::SelectCourses => "select courses",
            OnboardingStep::Confirmation => "confirmation",
        };
        f.write_str(name)
    }
}

/// Linear, gated onboarding flow over an [`OnboardingState`].
///
/// Moving forward requires the current step to be filled in; moving back is
/// always allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    state: OnboardingState,
}

impl OnboardingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    #[must_use]
    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    /// Whether the current step's requirements are met.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.is_satisfied(self.step)
    }

    fn is_satisfied(&self, step: OnboardingStep) -> bool {
        match step {
            OnboardingStep::LearningPreference => self.state.has_preferences(),
            OnboardingStep::LearningHours => self.state.has_learning_hours(),
            OnboardingStep::SchedulePreferences => self.state.has_complete_schedule(),
            OnboardingStep::SelectCourses => self.state.has_courses(),
            OnboardingStep::Confirmation => true,
        }
    }

    /// First step whose requirements are no longer met, if any.
    ///
    /// Edits stay possible after a step was passed, so this is checked again on finish.
    #[must_use]
    pub fn first_incomplete_step(&self) -> Option<OnboardingStep> {
        OnboardingStep::ALL
            .into_iter()
            .find(|step| !self.is_satisfied(*step))
    }

    /// Move to the next step. Returns whether the step changed.
    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            debug!(step = %self.step, "onboarding step incomplete");
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    /// Move to the previous step. Returns whether the step changed.
    pub fn retreat(&mut self) -> bool {
        match self.step.previous() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None => false,
        }
    }

    /// Position through the flow: 0 on the first step, 100 on confirmation.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        let last = OnboardingStep::ALL.len() - 1;
        let pct = self.step.index() * 100 / last;
        u32::try_from(pct).unwrap_or(100)
    }

    pub fn toggle_preference(&mut self, preference: LearningPreference) -> bool {
        self.state.toggle_preference(preference)
    }

    pub fn set_learning_hours(&mut self, hours: Option<LearningHours>) {
        self.state.set_learning_hours(hours);
    }

    pub fn add_schedule_entry(&mut self) -> usize {
        self.state.add_schedule_entry()
    }

    /// # Errors
    ///
    /// Returns `OnboardingError::State` if there is no row at `index`.
    pub fn remove_schedule_entry(&mut self, index: usize) -> Result<(), OnboardingError> {
        self.state.remove_schedule_entry(index)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `OnboardingError::State` for a missing row or a day used by another row.
    pub fn set_schedule_day(&mut self, index: usize, day: Weekday) -> Result<(), OnboardingError> {
        Ok(self.state.set_schedule_day(index, day)?)
    }

    /// # Errors
    ///
    /// Returns `OnboardingError::State` if there is no row at `index`.
    pub fn set_schedule_duration(
        &mut self,
        index: usize,
        duration: Option<SessionDuration>,
    ) -> Result<(), OnboardingError> {
        Ok(self.state.set_schedule_duration(index, duration)?)
    }

    /// # Errors
    ///
    /// Returns `OnboardingError::State` if the course is not in the catalog.
    pub fn toggle_course(&mut self, id: CourseId) -> Result<bool, OnboardingError> {
        Ok(self.state.toggle_course(id)?)
    }

    /// Produce the preferences to hand off. Only valid on the confirmation step.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::NotAtConfirmation` from any earlier step, and
    /// `OnboardingError::Incomplete` if an earlier step was emptied after it was passed.
    pub fn finish(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<UserPreferences, OnboardingError> {
        if self.step != OnboardingStep::Confirmation {
            return Err(OnboardingError::NotAtConfirmation { step: self.step });
        }
        if let Some(step) = self.first_incomplete_step() {
            debug!(%step, "onboarding finish rejected");
            return Err(OnboardingError::Incomplete { step });
        }
        Ok(UserPreferences::from_state(user_id, &self.state, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::OnboardingStateError;
    use tutor_core::time::fixed_now;

    fn wizard_at_schedule() -> OnboardingWizard {
        let mut wizard = OnboardingWizard::new();
        wizard.toggle_preference(LearningPreference::Visual);
        assert!(wizard.advance());
        wizard.set_learning_hours(Some(LearningHours::Evening));
        assert!(wizard.advance());
        assert_eq!(wizard.step(), OnboardingStep::SchedulePreferences);
        wizard
    }

    #[test]
    fn empty_preferences_block_first_step() {
        let mut wizard = OnboardingWizard::new();
        assert!(!wizard.can_advance());
        assert!(!wizard.advance());
        assert_eq!(wizard.step(), OnboardingStep::LearningPreference);

        wizard.toggle_preference(LearningPreference::Auditory);
        wizard.toggle_preference(LearningPreference::Auditory);
        assert!(!wizard.advance());
        assert_eq!(wizard.step(), OnboardingStep::LearningPreference);
    }

    #[test]
    fn unset_duration_blocks_schedule_step() {
        let mut wizard = wizard_at_schedule();
        let row = wizard.add_schedule_entry();
        wizard.set_schedule_day(row, Weekday::Mon).unwrap();
        wizard
            .set_schedule_duration(row, SessionDuration::parse(""))
            .unwrap();

        assert!(!wizard.advance());
        assert_eq!(wizard.step(), OnboardingStep::SchedulePreferences);

        wizard
            .set_schedule_duration(row, SessionDuration::parse("30 mins"))
            .unwrap();
        assert!(wizard.advance());
        assert_eq!(wizard.step(), OnboardingStep::SelectCourses);
        assert_eq!(wizard.step().index(), 3);
    }

    #[test]
    fn empty_schedule_blocks_schedule_step() {
        let mut wizard = wizard_at_schedule();
        assert!(!wizard.advance());
    }

    #[test]
    fn duplicate_day_is_rejected() {
        let mut wizard = wizard_at_schedule();
        let a = wizard.add_schedule_entry();
        let b = wizard.add_schedule_entry();
        wizard.set_schedule_day(a, Weekday::Wed).unwrap();
        let err = wizard.set_schedule_day(b, Weekday::Wed).unwrap_err();
        assert!(matches!(
            err,
            OnboardingError::State(OnboardingStateError::DuplicateDay { day: Weekday::Wed })
        ));
    }

    #[test]
    fn retreat_is_clamped_at_first_step() {
        let mut wizard = wizard_at_schedule();
        assert!(wizard.retreat());
        assert!(wizard.retreat());
        assert!(!wizard.retreat());
        assert_eq!(wizard.step(), OnboardingStep::LearningPreference);
    }

    #[test]
    fn full_flow_reaches_confirmation_and_finishes() {
        let mut wizard = wizard_at_schedule();
        let row = wizard.add_schedule_entry();
        wizard.set_schedule_day(row, Weekday::Fri).unwrap();
        wizard
            .set_schedule_duration(row, Some(SessionDuration::OneHour))
            .unwrap();
        assert!(wizard.advance());

        assert!(!wizard.advance());
        assert!(wizard.toggle_course(CourseId::new("programming")).unwrap());
        assert!(matches!(
            wizard.toggle_course(CourseId::new("astrology")),
            Err(OnboardingError::State(OnboardingStateError::UnknownCourse { .. }))
        ));
        assert!(wizard.advance());
        assert_eq!(wizard.step(), OnboardingStep::Confirmation);
        assert_eq!(wizard.progress_percent(), 100);

        // clamped at the last step
        assert!(!wizard.advance());
        assert_eq!(wizard.step(), OnboardingStep::Confirmation);

        let prefs = wizard.finish(UserId::new(8), fixed_now()).unwrap();
        assert_eq!(prefs.user_id, UserId::new(8));
        assert_eq!(prefs.learning_hours, Some(LearningHours::Evening));
        assert_eq!(prefs.schedule.len(), 1);
        assert!(prefs.selected_courses.contains(&CourseId::new("programming")));
    }

    #[test]
    fn finish_before_confirmation_fails() {
        let wizard = wizard_at_schedule();
        let err = wizard.finish(UserId::new(1), fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            OnboardingError::NotAtConfirmation {
                step: OnboardingStep::SchedulePreferences
            }
        ));
    }

    fn wizard_at_confirmation() -> OnboardingWizard {
        let mut wizard = wizard_at_schedule();
        let row = wizard.add_schedule_entry();
        wizard.set_schedule_day(row, Weekday::Thu).unwrap();
        wizard
            .set_schedule_duration(row, Some(SessionDuration::ThirtyMinutes))
            .unwrap();
        assert!(wizard.advance());
        wizard.toggle_course(CourseId::new("math")).unwrap();
        assert!(wizard.advance());
        assert_eq!(wizard.step(), OnboardingStep::Confirmation);
        wizard
    }

    #[test]
    fn finish_rejects_fields_cleared_on_confirmation() {
        let mut wizard = wizard_at_confirmation();
        assert_eq!(wizard.first_incomplete_step(), None);

        wizard.toggle_preference(LearningPreference::Visual);
        wizard.set_learning_hours(None);
        wizard.remove_schedule_entry(0).unwrap();
        wizard.toggle_course(CourseId::new("math")).unwrap();

        let err = wizard.finish(UserId::new(1), fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            OnboardingError::Incomplete {
                step: OnboardingStep::LearningPreference
            }
        ));
    }

    #[test]
    fn finish_names_the_first_broken_step() {
        let mut wizard = wizard_at_confirmation();
        wizard
            .set_schedule_duration(0, SessionDuration::parse(""))
            .unwrap();
        let err = wizard.finish(UserId::new(1), fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            OnboardingError::Incomplete {
                step: OnboardingStep::SchedulePreferences
            }
        ));

        wizard
            .set_schedule_duration(0, Some(SessionDuration::OneHour))
            .unwrap();
        assert!(wizard.finish(UserId::new(1), fixed_now()).is_ok());
    }

    #[test]
    fn progress_moves_in_quarters() {
        let mut wizard = OnboardingWizard::new();
        assert_eq!(wizard.progress_percent(), 0);
        wizard.toggle_preference(LearningPreference::Kinesthetic);
        wizard.advance();
        assert_eq!(wizard.progress_percent(), 25);
    }
}
