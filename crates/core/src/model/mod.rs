mod answer;
mod ids;
pub mod onboarding;
mod question;
mod result;
mod settings;

pub use answer::AnswerRecord;
pub use ids::{CourseId, ParseIdError, QuestionId, SessionId, UserId};
pub use onboarding::{
    CourseOption, LearningHours, OnboardingState, OnboardingStateError, SchedulePreference,
    SessionDuration, UserPreferences, available_courses, weekday_name,
};
pub use question::{
    Answer, CorrectAnswer, Difficulty, LearningPreference, Question, QuestionError, QuestionType,
};
pub use result::{CompletionReason, QuizResult, QuizResultError};
pub use settings::{FeedbackThresholds, QuizSettings, QuizSettingsError};
