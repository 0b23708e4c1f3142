use chrono::{DateTime, Utc};
use std::sync::Arc;

use storage::repository::{QuizResultRepository, QuizResultRow};
use tutor_core::model::{CompletionReason, QuizResult, SessionId, UserId};
use tutor_core::results::FeedbackBand;

use crate::error::SessionError;

/// Storage identifier for a persisted quiz result.
///
/// NOTE: This is currently `i64` to match `SQLite` row IDs.
pub type QuizResultId = i64;

/// Presentation-agnostic list item for a stored quiz result.
///
/// No pre-formatted strings; callers format timestamps and durations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultListItem {
    pub id: QuizResultId,
    pub session_id: SessionId,
    pub title: String,
    pub completed_at: DateTime<Utc>,
    pub reason: CompletionReason,

    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub time_spent_secs: u32,
    pub band: FeedbackBand,
}

impl QuizResultListItem {
    #[must_use]
    pub fn from_row(row: &QuizResultRow) -> Self {
        let result = &row.result;
        let summary = result.summary();
        Self {
            id: row.id,
            session_id: result.session_id(),
            title: result.title().to_owned(),
            completed_at: result.completed_at(),
            reason: result.reason(),
            score: summary.score,
            total: summary.total,
            percentage: summary.percentage,
            time_spent_secs: summary.time_spent_secs,
            band: summary.band,
        }
    }
}

/// Read side for stored quiz results.
#[derive(Clone)]
pub struct QuizResultsService {
    results: Arc<dyn QuizResultRepository>,
}

impl QuizResultsService {
    #[must_use]
    pub fn new(results: Arc<dyn QuizResultRepository>) -> Self {
        Self { results }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(storage::repository::InMemoryRepository::new()))
    }

    /// A learner's most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizResultListItem>, SessionError> {
        let rows = self.results.list_results(user_id, limit).await?;
        Ok(rows.iter().map(QuizResultListItem::from_row).collect())
    }

    /// Load a full result, including its per-preference breakdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` (`NotFound`) if no such result exists.
    pub async fn get(&self, id: QuizResultId) -> Result<QuizResult, SessionError> {
        Ok(self.results.get_result(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storage::repository::{InMemoryRepository, StorageError};
    use tutor_core::model::LearningPreference;
    use tutor_core::results::{PreferenceBreakdown, ResultsSummary};
    use tutor_core::time::fixed_now;

    fn result(user: u64, minutes_later: i64, score: u32) -> QuizResult {
        QuizResult::new(
            SessionId::generate(),
            UserId::new(user),
            "Adaptive Learning Quiz",
            "Mixed Subjects",
            CompletionReason::Finished,
            fixed_now(),
            fixed_now() + Duration::minutes(minutes_later),
            ResultsSummary {
                score,
                total: 4,
                percentage: score * 25,
                time_spent_secs: 90,
                band: FeedbackBand::Good,
                breakdown: vec![PreferenceBreakdown {
                    preference: LearningPreference::Kinesthetic,
                    correct: score,
                    total: 4,
                    percentage: score * 25,
                }],
                strength_threshold: 70,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn list_recent_is_newest_first() {
        let repo = InMemoryRepository::new();
        repo.append_result(&result(1, 1, 1)).await.unwrap();
        repo.append_result(&result(1, 3, 3)).await.unwrap();
        repo.append_result(&result(1, 2, 2)).await.unwrap();

        let svc = QuizResultsService::new(Arc::new(repo));
        let items = svc.list_recent(UserId::new(1), 10).await.unwrap();
        let scores: Vec<_> = items.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![3, 2, 1]);
        assert_eq!(items[0].percentage, 75);
    }

    #[tokio::test]
    async fn get_missing_result_is_not_found() {
        let svc = QuizResultsService::in_memory();
        let err = svc.get(42).await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(StorageError::NotFound)));
    }
}
