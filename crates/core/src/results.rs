use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnswerRecord, FeedbackThresholds, LearningPreference, Question, QuizSettings};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultsError {
    #[error("session is still in progress")]
    NotCompleted,

    #[error("session has no questions")]
    NoQuestions,

    #[error("answer log refers to question index {index}, but the session has {len}")]
    UnknownIndex { index: usize, len: usize },

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },
}

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Qualitative band for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackBand {
    Outstanding,
    Great,
    Good,
    Fair,
    NeedsPractice,
}

impl FeedbackBand {
    /// Picks the band; every threshold is an inclusive lower bound.
    #[must_use]
    pub fn for_percentage(percentage: u32, thresholds: &FeedbackThresholds) -> Self {
        if percentage >= thresholds.outstanding {
            Self::Outstanding
        } else if percentage >= thresholds.great {
            Self::Great
        } else if percentage >= thresholds.good {
            Self::Good
        } else if percentage >= thresholds.fair {
            Self::Fair
        } else {
            Self::NeedsPractice
        }
    }

    /// Stable kebab-case key, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackBand::Outstanding => "outstanding",
            FeedbackBand::Great => "great",
            FeedbackBand::Good => "good",
            FeedbackBand::Fair => "fair",
            FeedbackBand::NeedsPractice => "needs-practice",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "outstanding" => Some(Self::Outstanding),
            "great" => Some(Self::Great),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "needs-practice" => Some(Self::NeedsPractice),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FeedbackBand::Outstanding => "outstanding",
            FeedbackBand::Great => "great",
            FeedbackBand::Good => "good",
            FeedbackBand::Fair => "fair",
            FeedbackBand::NeedsPractice => "needs practice",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            FeedbackBand::Outstanding => "Outstanding performance!",
            FeedbackBand::Great => "Great work! Keep it up!",
            FeedbackBand::Good => "Good job! You're improving!",
            FeedbackBand::Fair => "Not bad! Keep practicing!",
            FeedbackBand::NeedsPractice => "Keep learning! Every attempt makes you better!",
        }
    }
}

/// Encouragement shown next to a single learning-style group.
#[must_use]
pub fn preference_message(percentage: u32) -> &'static str {
    if percentage >= 90 {
        "Excellent! You're mastering this learning style!"
    } else if percentage >= 80 {
        "Great job! You're doing well with this approach."
    } else if percentage >= 60 {
        "Good effort! Keep practicing this learning style."
    } else {
        "Keep working on this learning style. Practice makes perfect!"
    }
}

/// `round(100 * part / total)`, rounding halves up. Zero when `total` is zero.
#[must_use]
pub fn percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (u64::from(part), u64::from(total));
    let rounded = (200 * part + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Accuracy for the questions tagged with one learning preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceBreakdown {
    pub preference: LearningPreference,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

impl PreferenceBreakdown {
    #[must_use]
    pub fn message(&self) -> &'static str {
        preference_message(self.percentage)
    }
}

/// Aggregated outcome of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub time_spent_secs: u32,
    pub band: FeedbackBand,
    pub breakdown: Vec<PreferenceBreakdown>,
    pub strength_threshold: u32,
}

impl ResultsSummary {
    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total.saturating_sub(self.score)
    }

    /// Groups at or above the strength threshold.
    pub fn strengths(&self) -> impl Iterator<Item = &PreferenceBreakdown> {
        self.breakdown
            .iter()
            .filter(|b| b.percentage >= self.strength_threshold)
    }

    /// Groups below the strength threshold.
    pub fn improvement_areas(&self) -> impl Iterator<Item = &PreferenceBreakdown> {
        self.breakdown
            .iter()
            .filter(|b| b.percentage < self.strength_threshold)
    }

    /// `m:ss`-style rendering of the time spent, e.g. `3m 07s`.
    #[must_use]
    pub fn time_spent_display(&self) -> String {
        format!(
            "{}m {:02}s",
            self.time_spent_secs / 60,
            self.time_spent_secs % 60
        )
    }
}

/// Input of the aggregator: a session that has reached its terminal state.
#[derive(Debug, Clone, Copy)]
pub struct CompletedQuiz<'a> {
    pub questions: &'a [Question],
    pub answers: &'a [AnswerRecord],
    pub score: u32,
    pub time_spent_secs: u32,
}

/// Builds the results summary from the session's answer log.
///
/// Per-preference groups follow the order in which each preference first appears
/// among the session's questions; preferences with no questions are left out.
///
/// # Errors
///
/// Returns `ResultsError::NoQuestions` for an empty session and
/// `ResultsError::UnknownIndex` if the log refers to a question outside the session.
pub fn aggregate(
    quiz: CompletedQuiz<'_>,
    settings: &QuizSettings,
) -> Result<ResultsSummary, ResultsError> {
    if quiz.questions.is_empty() {
        return Err(ResultsError::NoQuestions);
    }
    let total = u32::try_from(quiz.questions.len()).map_err(|_| ResultsError::TooManyQuestions {
        len: quiz.questions.len(),
    })?;

    let mut correct_by_index = vec![false; quiz.questions.len()];
    for record in quiz.answers {
        let slot = correct_by_index
            .get_mut(record.index)
            .ok_or(ResultsError::UnknownIndex {
                index: record.index,
                len: quiz.questions.len(),
            })?;
        *slot = *slot || record.is_correct;
    }

    let mut groups: Vec<(LearningPreference, u32, u32)> = Vec::new();
    for (question, correct) in quiz.questions.iter().zip(&correct_by_index) {
        let pref = question.learning_preference;
        let pos = match groups.iter().position(|(p, _, _)| *p == pref) {
            Some(pos) => pos,
            None => {
                groups.push((pref, 0, 0));
                groups.len() - 1
            }
        };
        let group = &mut groups[pos];
        group.2 += 1;
        if *correct {
            group.1 += 1;
        }
    }

    let breakdown = groups
        .into_iter()
        .filter(|(_, _, total)| *total > 0)
        .map(|(preference, correct, total)| PreferenceBreakdown {
            preference,
            correct,
            total,
            percentage: percentage(correct, total),
        })
        .collect();

    let overall = percentage(quiz.score, total);
    Ok(ResultsSummary {
        score: quiz.score,
        total,
        percentage: overall,
        time_spent_secs: quiz.time_spent_secs,
        band: FeedbackBand::for_percentage(overall, settings.thresholds()),
        breakdown,
        strength_threshold: settings.strength_threshold(),
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
