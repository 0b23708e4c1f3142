use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id}: prompt cannot be empty")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id}: correct answer cannot be empty")]
    EmptyAnswer { id: QuestionId },

    #[error("question {id}: options must contain {answer:?} exactly once (found {found})")]
    AnswerNotInOptions {
        id: QuestionId,
        answer: String,
        found: usize,
    },
}

//
// ─── ENUMS ─────────────────────────────────────────────────────────────────────
//

/// How a learner prefers to take in material. Tags both learners and questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LearningPreference {
    #[serde(rename = "auditory")]
    Auditory,
    #[serde(rename = "visual")]
    Visual,
    #[serde(rename = "kinesthetic")]
    Kinesthetic,
    #[serde(rename = "reading/writing")]
    ReadingWriting,
}

impl LearningPreference {
    pub const ALL: [LearningPreference; 4] = [
        LearningPreference::Auditory,
        LearningPreference::Visual,
        LearningPreference::Kinesthetic,
        LearningPreference::ReadingWriting,
    ];

    /// Stable wire name, also used for storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LearningPreference::Auditory => "auditory",
            LearningPreference::Visual => "visual",
            LearningPreference::Kinesthetic => "kinesthetic",
            LearningPreference::ReadingWriting => "reading/writing",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        match raw.as_str() {
            "auditory" => Some(Self::Auditory),
            "visual" => Some(Self::Visual),
            "kinesthetic" => Some(Self::Kinesthetic),
            "reading/writing" | "reading-writing" | "reading_writing" => {
                Some(Self::ReadingWriting)
            }
            _ => None,
        }
    }

    /// One-line description shown next to the learning style.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            LearningPreference::Visual => {
                "Learn best through images, diagrams, charts, and visual aids"
            }
            LearningPreference::Auditory => {
                "Learn best through listening, music, and verbal communication"
            }
            LearningPreference::Kinesthetic => {
                "Learn best through hands-on activities and physical movement"
            }
            LearningPreference::ReadingWriting => {
                "Learn best through reading texts and writing notes"
            }
        }
    }
}

impl fmt::Display for LearningPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillBlank,
    Matching,
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// The expected answer of a question: one string, or a set for multi-answer types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Single(String),
    Multiple(BTreeSet<String>),
}

/// A learner's submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(BTreeSet<String>),
}

impl Answer {
    #[must_use]
    pub fn single(value: impl Into<String>) -> Self {
        Self::Single(value.into())
    }

    #[must_use]
    pub fn multiple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Multiple(values.into_iter().map(Into::into).collect())
    }
}

impl CorrectAnswer {
    /// Exact comparison: string equality, or set equality for multi-answer questions.
    /// A single answer never matches a set and vice versa.
    #[must_use]
    pub fn matches(&self, answer: &Answer) -> bool {
        match (self, answer) {
            (CorrectAnswer::Single(expected), Answer::Single(given)) => expected == given,
            (CorrectAnswer::Multiple(expected), Answer::Multiple(given)) => expected == given,
            _ => false,
        }
    }

    fn members(&self) -> Vec<&str> {
        match self {
            CorrectAnswer::Single(value) => vec![value.as_str()],
            CorrectAnswer::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for CorrectAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectAnswer::Single(value) => f.write_str(value),
            CorrectAnswer::Multiple(values) => {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                f.write_str(&joined.join(", "))
            }
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single catalog question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: CorrectAnswer,
    pub explanation: String,
    pub difficulty: Difficulty,
    pub learning_preference: LearningPreference,
    pub subject: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl Question {
    /// Checks the structural invariants of a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id, prompt or answer is blank, or if options are
    /// present but do not contain every correct answer exactly once.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.id.as_str().trim().is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt {
                id: self.id.clone(),
            });
        }
        let members = self.correct_answer.members();
        if members.is_empty() || members.iter().any(|m| m.trim().is_empty()) {
            return Err(QuestionError::EmptyAnswer {
                id: self.id.clone(),
            });
        }
        if let Some(options) = &self.options {
            for answer in members {
                let found = options.iter().filter(|o| o.as_str() == answer).count();
                if found != 1 {
                    return Err(QuestionError::AnswerNotInOptions {
                        id: self.id.clone(),
                        answer: answer.to_owned(),
                        found,
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_correct(&self, answer: &Answer) -> bool {
        self.correct_answer.matches(answer)
    }

    #[must_use]
    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.tags.contains(*t))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
