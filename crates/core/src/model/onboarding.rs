use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CourseId, UserId};
use crate::model::question::LearningPreference;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OnboardingStateError {
    #[error("{day} is already scheduled")]
    DuplicateDay { day: Weekday },

    #[error("no schedule entry at index {index}")]
    EntryOutOfRange { index: usize },

    #[error("unknown course: {id}")]
    UnknownCourse { id: CourseId },
}

//
// ─── LEARNING HOURS ────────────────────────────────────────────────────────────
//

/// Preferred part of the day for studying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningHours {
    Morning,
    Noon,
    Evening,
    Night,
}

impl LearningHours {
    pub const ALL: [LearningHours; 4] = [
        LearningHours::Morning,
        LearningHours::Noon,
        LearningHours::Evening,
        LearningHours::Night,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LearningHours::Morning => "morning",
            LearningHours::Noon => "noon",
            LearningHours::Evening => "evening",
            LearningHours::Night => "night",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "noon" => Some(Self::Noon),
            "evening" => Some(Self::Evening),
            "night" => Some(Self::Night),
            _ => None,
        }
    }

    /// Typical clock window for the choice, as shown on confirmation.
    #[must_use]
    pub fn window(self) -> &'static str {
        match self {
            LearningHours::Morning => "9 AM - 12 PM",
            LearningHours::Noon => "12 PM - 3 PM",
            LearningHours::Evening => "5 PM - 8 PM",
            LearningHours::Night => "9 PM - 12 AM",
        }
    }
}

impl fmt::Display for LearningHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── SCHEDULE ──────────────────────────────────────────────────────────────────
//

/// Length of one planned study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionDuration {
    #[serde(rename = "30 mins")]
    ThirtyMinutes,
    #[serde(rename = "45 mins")]
    FortyFiveMinutes,
    #[serde(rename = "1 hr")]
    OneHour,
    #[serde(rename = "2 hrs +")]
    TwoHoursPlus,
}

impl SessionDuration {
    pub const ALL: [SessionDuration; 4] = [
        SessionDuration::ThirtyMinutes,
        SessionDuration::FortyFiveMinutes,
        SessionDuration::OneHour,
        SessionDuration::TwoHoursPlus,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SessionDuration::ThirtyMinutes => "30 mins",
            SessionDuration::FortyFiveMinutes => "45 mins",
            SessionDuration::OneHour => "1 hr",
            SessionDuration::TwoHoursPlus => "2 hrs +",
        }
    }

    /// Parses a duration label. Blank input means "not chosen yet".
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|d| d.label() == raw)
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Full English weekday name.
#[must_use]
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// One row of the weekly study plan. Either half may still be unset while editing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePreference {
    pub day: Option<Weekday>,
    pub duration: Option<SessionDuration>,
}

impl SchedulePreference {
    #[must_use]
    pub fn new(day: Weekday, duration: SessionDuration) -> Self {
        Self {
            day: Some(day),
            duration: Some(duration),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.day.is_some() && self.duration.is_some()
    }
}

impl fmt::Display for SchedulePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.day.map_or("?", weekday_name);
        let duration = self.duration.map_or("?", SessionDuration::label);
        write!(f, "{day} for {duration}")
    }
}

//
// ─── COURSES ───────────────────────────────────────────────────────────────────
//

/// A course a learner can sign up for during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

const COURSES: [CourseOption; 8] = [
    CourseOption {
        id: "math",
        name: "Mathematics",
        description: "Algebra, Geometry, Calculus, etc.",
    },
    CourseOption {
        id: "science",
        name: "Science",
        description: "Physics, Chemistry, Biology.",
    },
    CourseOption {
        id: "history",
        name: "History",
        description: "World History, US History, Ancient Civilizations.",
    },
    CourseOption {
        id: "literature",
        name: "Literature",
        description: "English, World Literature, Creative Writing.",
    },
    CourseOption {
        id: "programming",
        name: "Programming",
        description: "Python, JavaScript, Web Development.",
    },
    CourseOption {
        id: "art",
        name: "Art & Design",
        description: "Drawing, Painting, Digital Art.",
    },
    CourseOption {
        id: "business",
        name: "Business",
        description: "Economics, Marketing, Management.",
    },
    CourseOption {
        id: "engineering",
        name: "Engineering",
        description: "Civil, Mechanical, Electrical, Software.",
    },
];

#[must_use]
pub fn available_courses() -> &'static [CourseOption] {
    &COURSES
}

#[must_use]
pub fn find_course(id: &CourseId) -> Option<&'static CourseOption> {
    COURSES.iter().find(|c| c.id == id.as_str())
}

//
// ─── ONBOARDING STATE ──────────────────────────────────────────────────────────
//

/// Everything the onboarding flow collects before the first session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingState {
    learning_preferences: BTreeSet<LearningPreference>,
    learning_hours: Option<LearningHours>,
    schedule: Vec<SchedulePreference>,
    selected_courses: BTreeSet<CourseId>,
}

impl OnboardingState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn learning_preferences(&self) -> &BTreeSet<LearningPreference> {
        &self.learning_preferences
    }

    #[must_use]
    pub fn learning_hours(&self) -> Option<LearningHours> {
        self.learning_hours
    }

    #[must_use]
    pub fn schedule(&self) -> &[SchedulePreference] {
        &self.schedule
    }

    #[must_use]
    pub fn selected_courses(&self) -> &BTreeSet<CourseId> {
        &self.selected_courses
    }

    /// Adds the preference if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle_preference(&mut self, preference: LearningPreference) -> bool {
        if self.learning_preferences.remove(&preference) {
            false
        } else {
            self.learning_preferences.insert(preference);
            true
        }
    }

    pub fn set_learning_hours(&mut self, hours: Option<LearningHours>) {
        self.learning_hours = hours;
    }

    /// Appends an empty schedule row and returns its index.
    pub fn add_schedule_entry(&mut self) -> usize {
        self.schedule.push(SchedulePreference::default());
        self.schedule.len() - 1
    }

    /// # Errors
    ///
    /// Returns `EntryOutOfRange` if there is no row at `index`.
    pub fn remove_schedule_entry(
        &mut self,
        index: usize,
    ) -> Result<SchedulePreference, OnboardingStateError> {
        if index >= self.schedule.len() {
            return Err(OnboardingStateError::EntryOutOfRange { index });
        }
        Ok(self.schedule.remove(index))
    }

    /// Sets the day of a schedule row.
    ///
    /// # Errors
    ///
    /// Returns `EntryOutOfRange` for a missing row and `DuplicateDay` if another row
    /// already uses `day`.
    pub fn set_schedule_day(
        &mut self,
        index: usize,
        day: Weekday,
    ) -> Result<(), OnboardingStateError> {
        if index >= self.schedule.len() {
            return Err(OnboardingStateError::EntryOutOfRange { index });
        }
        let taken = self
            .schedule
            .iter()
            .enumerate()
            .any(|(i, entry)| i != index && entry.day == Some(day));
        if taken {
            return Err(OnboardingStateError::DuplicateDay { day });
        }
        self.schedule[index].day = Some(day);
        Ok(())
    }

    /// Sets (or clears) the duration of a schedule row.
    ///
    /// # Errors
    ///
    /// Returns `EntryOutOfRange` if there is no row at `index`.
    pub fn set_schedule_duration(
        &mut self,
        index: usize,
        duration: Option<SessionDuration>,
    ) -> Result<(), OnboardingStateError> {
        let entry = self
            .schedule
            .get_mut(index)
            .ok_or(OnboardingStateError::EntryOutOfRange { index })?;
        entry.duration = duration;
        Ok(())
    }

    /// Selects or deselects a course from the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCourse` if the id is not offered.
    pub fn toggle_course(&mut self, id: CourseId) -> Result<bool, OnboardingStateError> {
        if find_course(&id).is_none() {
            return Err(OnboardingStateError::UnknownCourse { id });
        }
        if self.selected_courses.remove(&id) {
            Ok(false)
        } else {
            self.selected_courses.insert(id);
            Ok(true)
        }
    }

    #[must_use]
    pub fn has_preferences(&self) -> bool {
        !self.learning_preferences.is_empty()
    }

    #[must_use]
    pub fn has_learning_hours(&self) -> bool {
        self.learning_hours.is_some()
    }

    #[must_use]
    pub fn has_complete_schedule(&self) -> bool {
        !self.schedule.is_empty() && self.schedule.iter().all(SchedulePreference::is_complete)
    }

    #[must_use]
    pub fn has_courses(&self) -> bool {
        !self.selected_courses.is_empty()
    }
}

//
// ─── USER PREFERENCES ──────────────────────────────────────────────────────────
//

/// Persisted outcome of a finished onboarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreferences {
    pub user_id: UserId,
    pub learning_preferences: BTreeSet<LearningPreference>,
    pub learning_hours: Option<LearningHours>,
    pub schedule: Vec<SchedulePreference>,
    pub selected_courses: BTreeSet<CourseId>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    #[must_use]
    pub fn from_state(user_id: UserId, state: &OnboardingState, updated_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            learning_preferences: state.learning_preferences.clone(),
            learning_hours: state.learning_hours,
            schedule: state.schedule.clone(),
            selected_courses: state.selected_courses.clone(),
            updated_at,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
