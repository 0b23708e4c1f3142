use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::{Answer, LearningPreference};

/// Record of what happened to one question of a session.
///
/// `answer` is `None` when the learner moved on without submitting; such questions
/// count as incorrect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub index: usize,
    pub question_id: QuestionId,
    pub learning_preference: LearningPreference,
    pub answer: Option<Answer>,
    pub is_correct: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AnswerRecord {
    #[must_use]
    pub fn answered(
        index: usize,
        question_id: QuestionId,
        learning_preference: LearningPreference,
        answer: Answer,
        is_correct: bool,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            question_id,
            learning_preference,
            answer: Some(answer),
            is_correct,
            recorded_at,
        }
    }

    #[must_use]
    pub fn skipped(
        index: usize,
        question_id: QuestionId,
        learning_preference: LearningPreference,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            question_id,
            learning_preference,
            answer: None,
            is_correct: false,
            recorded_at,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.answer.is_none()
    }
}
