use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("time limit must be between 1 and 180 minutes, got {0}")]
    InvalidTimeLimit(u32),

    #[error("question count must be between 1 and 50, got {0}")]
    InvalidQuestionCount(u32),

    #[error("feedback thresholds must be strictly descending percentages <= 100")]
    InvalidThresholds,

    #[error("strength threshold must be <= 100, got {0}")]
    InvalidStrengthThreshold(u32),
}

//
// ─── FEEDBACK THRESHOLDS ───────────────────────────────────────────────────────
//

/// Lower bounds (inclusive) of the overall feedback bands, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackThresholds {
    pub outstanding: u32,
    pub great: u32,
    pub good: u32,
    pub fair: u32,
}

impl Default for FeedbackThresholds {
    fn default() -> Self {
        Self {
            outstanding: 90,
            great: 80,
            good: 70,
            fair: 60,
        }
    }
}

impl FeedbackThresholds {
    fn is_valid(&self) -> bool {
        self.outstanding <= 100
            && self.outstanding > self.great
            && self.great > self.good
            && self.good > self.fair
    }
}

//
// ─── QUIZ SETTINGS ─────────────────────────────────────────────────────────────
//

pub const MAX_TIME_LIMIT_MINUTES: u32 = 180;
pub const MAX_QUESTION_COUNT: u32 = 50;

/// Tunables for quiz sessions and result feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    time_limit_minutes: u32,
    default_question_count: u32,
    thresholds: FeedbackThresholds,
    strength_threshold: u32,
}

impl Default for QuizSettings {
    /// Ten questions in ten minutes.
    fn default() -> Self {
        Self {
            time_limit_minutes: 10,
            default_question_count: 10,
            thresholds: FeedbackThresholds::default(),
            strength_threshold: 70,
        }
    }
}

impl QuizSettings {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError` if a value is out of range or the thresholds are not
    /// strictly descending.
    pub fn new(
        time_limit_minutes: u32,
        default_question_count: u32,
        thresholds: FeedbackThresholds,
        strength_threshold: u32,
    ) -> Result<Self, QuizSettingsError> {
        if !(1..=MAX_TIME_LIMIT_MINUTES).contains(&time_limit_minutes) {
            return Err(QuizSettingsError::InvalidTimeLimit(time_limit_minutes));
        }
        if !(1..=MAX_QUESTION_COUNT).contains(&default_question_count) {
            return Err(QuizSettingsError::InvalidQuestionCount(
                default_question_count,
            ));
        }
        if !thresholds.is_valid() {
            return Err(QuizSettingsError::InvalidThresholds);
        }
        if strength_threshold > 100 {
            return Err(QuizSettingsError::InvalidStrengthThreshold(
                strength_threshold,
            ));
        }
        Ok(Self {
            time_limit_minutes,
            default_question_count,
            thresholds,
            strength_threshold,
        })
    }

    /// Returns a copy with a different time limit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimeLimit` when out of range.
    pub fn with_time_limit(self, minutes: u32) -> Result<Self, QuizSettingsError> {
        Self::new(
            minutes,
            self.default_question_count,
            self.thresholds,
            self.strength_threshold,
        )
    }

    /// Returns a copy with a different default question count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuestionCount` when out of range.
    pub fn with_question_count(self, count: u32) -> Result<Self, QuizSettingsError> {
        Self::new(
            self.time_limit_minutes,
            count,
            self.thresholds,
            self.strength_threshold,
        )
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_minutes * 60
    }

    #[must_use]
    pub fn default_question_count(&self) -> u32 {
        self.default_question_count
    }

    #[must_use]
    pub fn thresholds(&self) -> &FeedbackThresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn strength_threshold(&self) -> u32 {
        self.strength_threshold
    }
}
