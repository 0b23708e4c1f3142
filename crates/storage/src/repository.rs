use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tutor_core::model::{QuizResult, SessionId, UserId, UserPreferences};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored quiz result together with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultRow {
    pub id: i64,
    pub result: QuizResult,
}

impl QuizResultRow {
    #[must_use]
    pub fn new(id: i64, result: QuizResult) -> Self {
        Self { id, result }
    }
}

/// Where onboarding hands off a learner's preferences.
#[async_trait]
pub trait UserPreferencesRepository: Send + Sync {
    /// Fetch the stored preferences for a learner, if onboarding was completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_preferences(&self, user_id: UserId)
    -> Result<Option<UserPreferences>, StorageError>;

    /// Insert or replace a learner's preferences.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the preferences cannot be stored.
    async fn save_preferences(&self, preferences: &UserPreferences) -> Result<(), StorageError>;
}

/// Sink for completed quiz sessions.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Append a result and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a result for the same session already exists.
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError>;

    /// Fetch a result by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError>;

    /// Look up the result recorded for a session, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<QuizResultRow>, StorageError>;

    /// List a learner's results, newest first (by completion time, then row id).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    preferences: Arc<Mutex<HashMap<UserId, UserPreferences>>>,
    results: Arc<Mutex<Vec<QuizResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            preferences: Arc::new(Mutex::new(HashMap::new())),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl UserPreferencesRepository for InMemoryRepository {
    async fn get_preferences(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserPreferences>, StorageError> {
        let guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&user_id).cloned())
    }

    async fn save_preferences(&self, preferences: &UserPreferences) -> Result<(), StorageError> {
        let mut guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(preferences.user_id, preferences.clone());
        Ok(())
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard
            .iter()
            .any(|row| row.result.session_id() == result.session_id())
        {
            return Err(StorageError::Conflict);
        }
        let id = guard.last().map_or(1, |row| row.id + 1);
        guard.push(QuizResultRow::new(id, result.clone()));
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.result.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<QuizResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .find(|row| row.result.session_id() == session_id)
            .cloned())
    }

    async fn list_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<QuizResultRow> = guard
            .iter()
            .filter(|row| row.result.user_id() == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates the preference and result repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub preferences: Arc<dyn UserPreferencesRepository>,
    pub results: Arc<dyn QuizResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let preferences: Arc<dyn UserPreferencesRepository> = Arc::new(repo.clone());
        let results: Arc<dyn QuizResultRepository> = Arc::new(repo);
        Self {
            preferences,
            results,
        }
    }
}
