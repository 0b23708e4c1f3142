use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};
use tutor_core::bank::QuestionBank;
use tutor_core::model::{Difficulty, LearningPreference, QuizSettings, UserId};
use tutor_core::selector::{RandomSource, ThreadRandom};

use storage::repository::{QuizResultRepository, StorageError, UserPreferencesRepository};

use super::session::{QuizRequest, QuizSession};
use super::timer::SharedQuizSession;
use crate::Clock;
use crate::error::SessionError;

/// Per-run knobs on top of the stored learner preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizOptions {
    /// Falls back to the settings' default question count.
    pub count: Option<usize>,
    pub difficulty: Option<Difficulty>,
    pub title: Option<String>,
    pub subject: Option<String>,
}

/// Orchestrates session start from stored preferences and result persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    settings: QuizSettings,
    preferences: Arc<dyn UserPreferencesRepository>,
    results: Arc<dyn QuizResultRepository>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        settings: QuizSettings,
        preferences: Arc<dyn UserPreferencesRepository>,
        results: Arc<dyn QuizResultRepository>,
    ) -> Self {
        Self {
            clock,
            bank,
            settings,
            preferences,
            results,
        }
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Learning preferences stored for the user; empty when onboarding never ran.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn preferences_for(
        &self,
        user_id: UserId,
    ) -> Result<BTreeSet<LearningPreference>, SessionError> {
        let stored = self.preferences.get_preferences(user_id).await?;
        Ok(stored
            .map(|p| p.learning_preferences)
            .unwrap_or_default())
    }

    /// Start a session for a learner using unseeded randomness.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for storage or session start failures.
    pub async fn start_for_user(
        &self,
        user_id: UserId,
        options: QuizOptions,
    ) -> Result<QuizSession, SessionError> {
        self.start_for_user_with(user_id, options, &mut ThreadRandom)
            .await
    }

    /// Start a session for a learner with an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for storage or session start failures.
    pub async fn start_for_user_with<R: RandomSource + Send>(
        &self,
        user_id: UserId,
        options: QuizOptions,
        rng: &mut R,
    ) -> Result<QuizSession, SessionError> {
        let preferences = self.preferences_for(user_id).await?;
        if preferences.is_empty() {
            debug!(user = %user_id, "no stored preferences; drawing from the whole bank");
        }

        let count = options.count.unwrap_or_else(|| {
            usize::try_from(self.settings.default_question_count()).unwrap_or(usize::MAX)
        });
        let mut request = QuizRequest::new(preferences, count).with_difficulty(options.difficulty);
        if let Some(title) = options.title {
            request = request.with_title(title);
        }
        if let Some(subject) = options.subject {
            request = request.with_subject(subject);
        }

        QuizSession::start(&self.bank, request, self.settings, rng, self.clock.now())
    }

    /// Persist the result of a completed session. Repeated calls return the same id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Results` if the session is still running, or
    /// `SessionError::Storage` if persistence fails.
    pub async fn finish(
        &self,
        user_id: UserId,
        session: &mut QuizSession,
    ) -> Result<i64, SessionError> {
        if let Some(id) = session.result_id() {
            return Ok(id);
        }
        let result = session.to_result(user_id)?;
        let id = self.append_once(&result).await?;
        session.set_result_id(id);
        Ok(id)
    }

    /// Same as [`Self::finish`] for a session shared with a running timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` as for [`Self::finish`], or `SessionError::Poisoned`
    /// if the session lock was poisoned.
    pub async fn finish_shared(
        &self,
        user_id: UserId,
        session: &SharedQuizSession,
    ) -> Result<i64, SessionError> {
        let result = {
            let guard = session
                .lock()
                .map_err(|e| SessionError::Poisoned(e.to_string()))?;
            if let Some(id) = guard.result_id() {
                return Ok(id);
            }
            guard.to_result(user_id)?
        };

        let id = self.append_once(&result).await?;

        session
            .lock()
            .map_err(|e| SessionError::Poisoned(e.to_string()))?
            .set_result_id(id);
        Ok(id)
    }

    async fn append_once(
        &self,
        result: &tutor_core::model::QuizResult,
    ) -> Result<i64, SessionError> {
        match self.results.append_result(result).await {
            Ok(id) => {
                info!(
                    session = %result.session_id(),
                    user = %result.user_id(),
                    result_id = id,
                    percentage = result.summary().percentage,
                    "quiz result stored"
                );
                Ok(id)
            }
            Err(StorageError::Conflict) => {
                let existing = self
                    .results
                    .find_by_session(result.session_id())
                    .await?
                    .ok_or(StorageError::Conflict)?;
                debug!(session = %result.session_id(), result_id = existing.id, "result already stored");
                Ok(existing.id)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use storage::repository::InMemoryRepository;
    use tutor_core::model::{Answer, LearningHours, UserPreferences};
    use tutor_core::selector::FixedOrder;
    use tutor_core::time::{fixed_clock, fixed_now};

    fn service(repo: &InMemoryRepository) -> QuizLoopService {
        QuizLoopService::new(
            fixed_clock(),
            Arc::new(QuestionBank::builtin()),
            QuizSettings::default(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    async fn store_prefs(repo: &InMemoryRepository, user: UserId, prefs: &[LearningPreference]) {
        repo.save_preferences(&UserPreferences {
            user_id: user,
            learning_preferences: prefs.iter().copied().collect(),
            learning_hours: Some(LearningHours::Noon),
            schedule: Vec::new(),
            selected_courses: BTreeSet::new(),
            updated_at: fixed_now(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn stored_preferences_drive_selection() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        store_prefs(&repo, user, &[LearningPreference::Auditory]).await;

        let session = service(&repo)
            .start_for_user_with(user, QuizOptions::default(), &mut FixedOrder)
            .await
            .unwrap();
        assert_eq!(session.total_questions(), 3);
        assert!(
            session
                .questions()
                .iter()
                .all(|q| q.learning_preference == LearningPreference::Auditory)
        );
    }

    #[tokio::test]
    async fn missing_preferences_use_whole_bank() {
        let repo = InMemoryRepository::new();
        let session = service(&repo)
            .start_for_user_with(UserId::new(5), QuizOptions::default(), &mut FixedOrder)
            .await
            .unwrap();
        assert_eq!(session.total_questions(), 10);
        assert_eq!(session.time_remaining_secs(), 600);
    }

    #[tokio::test]
    async fn hard_filter_on_builtin_bank_has_no_matches() {
        let repo = InMemoryRepository::new();
        let options = QuizOptions {
            difficulty: Some(Difficulty::Hard),
            ..QuizOptions::default()
        };
        let err = service(&repo)
            .start_for_user(UserId::new(5), options)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoMatchingQuestions));
    }

    #[tokio::test]
    async fn finish_persists_once() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let user = UserId::new(2);
        let options = QuizOptions {
            count: Some(2),
            ..QuizOptions::default()
        };
        let mut session = svc
            .start_for_user_with(user, options, &mut FixedOrder)
            .await
            .unwrap();

        assert!(matches!(
            svc.finish(user, &mut session).await,
            Err(SessionError::Results(_))
        ));

        while !session.is_completed() {
            session.submit(Answer::single("nope"), fixed_now()).unwrap();
            session.advance(fixed_now()).unwrap();
        }

        let first = svc.finish(user, &mut session).await.unwrap();
        let second = svc.finish(user, &mut session).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.list_results(user, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn finish_shared_recovers_existing_result() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let user = UserId::new(4);
        let mut session = svc
            .start_for_user_with(
                user,
                QuizOptions {
                    count: Some(1),
                    ..QuizOptions::default()
                },
                &mut FixedOrder,
            )
            .await
            .unwrap();
        session.advance(fixed_now()).unwrap();

        // stored out of band, e.g. by an earlier attempt that lost its id
        let result = session.to_result(user).unwrap();
        let stored_id = repo.append_result(&result).await.unwrap();

        let shared = crate::quiz::timer::shared(session);
        let id = svc.finish_shared(user, &shared).await.unwrap();
        assert_eq!(id, stored_id);
        assert_eq!(shared.lock().unwrap().result_id(), Some(stored_id));
    }
}
