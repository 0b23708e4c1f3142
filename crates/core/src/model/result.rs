use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{SessionId, UserId};
use crate::results::ResultsSummary;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreOutOfRange { score: u32, total: u32 },

    #[error("breakdown correct counts ({sum}) do not add up to the score ({score})")]
    BreakdownMismatch { score: u32, sum: u32 },
}

/// Why a session reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionReason {
    /// The learner advanced past the last question.
    Finished,
    /// The countdown reached zero first.
    TimedOut,
}

impl CompletionReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionReason::Finished => "finished",
            CompletionReason::TimedOut => "timed-out",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "finished" => Some(Self::Finished),
            "timed-out" => Some(Self::TimedOut),
            _ => None,
        }
    }
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished quiz as handed to the result store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    session_id: SessionId,
    user_id: UserId,
    title: String,
    subject: String,
    reason: CompletionReason,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    summary: ResultsSummary,
}

impl QuizResult {
    /// Builds (or rehydrates) a result, checking that its numbers agree.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if timestamps are inverted, the score exceeds the
    /// question count, or the breakdown does not sum to the score.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: SessionId,
        user_id: UserId,
        title: impl Into<String>,
        subject: impl Into<String>,
        reason: CompletionReason,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        summary: ResultsSummary,
    ) -> Result<Self, QuizResultError> {
        if completed_at < started_at {
            return Err(QuizResultError::InvalidTimeRange);
        }
        if summary.score > summary.total {
            return Err(QuizResultError::ScoreOutOfRange {
                score: summary.score,
                total: summary.total,
            });
        }
        let sum: u32 = summary.breakdown.iter().map(|b| b.correct).sum();
        if sum != summary.score {
            return Err(QuizResultError::BreakdownMismatch {
                score: summary.score,
                sum,
            });
        }
        Ok(Self {
            session_id,
            user_id,
            title: title.into(),
            subject: subject.into(),
            reason,
            started_at,
            completed_at,
            summary,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn reason(&self) -> CompletionReason {
        self.reason
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn summary(&self) -> &ResultsSummary {
        &self.summary
    }
}
