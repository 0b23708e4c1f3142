use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

use tutor_core::bank::QuestionBank;
use tutor_core::model::{
    Answer, AnswerRecord, CompletionReason, Difficulty, LearningPreference, Question, QuizResult,
    QuizSettings, SessionId, UserId,
};
use tutor_core::results::{self, CompletedQuiz, ResultsError, ResultsSummary};
use tutor_core::selector::{QuestionSelector, RandomSource};
use tutor_core::time::Countdown;

use super::progress::QuizProgress;
use crate::error::SessionError;

pub const DEFAULT_TITLE: &str = "Adaptive Learning Quiz";
pub const DEFAULT_SUBJECT: &str = "Mixed Subjects";

//
// ─── REQUEST ───────────────────────────────────────────────────────────────────
//

/// What to put into a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub title: String,
    pub subject: String,
    pub preferences: BTreeSet<LearningPreference>,
    pub count: usize,
    pub difficulty: Option<Difficulty>,
}

impl QuizRequest {
    #[must_use]
    pub fn new(preferences: BTreeSet<LearningPreference>, count: usize) -> Self {
        Self {
            title: DEFAULT_TITLE.to_owned(),
            subject: DEFAULT_SUBJECT.to_owned(),
            preferences,
            count,
            difficulty: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Outcome of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The answer was scored and logged.
    Recorded(AnswerRecord),
    /// The current question was already answered; the earlier record is returned untouched.
    Duplicate(AnswerRecord),
}

impl Submission {
    #[must_use]
    pub fn record(&self) -> &AnswerRecord {
        match self {
            Submission::Recorded(r) | Submission::Duplicate(r) => r,
        }
    }

    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Submission::Duplicate(_))
    }
}

/// Where `advance` left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Finished,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed run through a fixed list of questions.
///
/// A value only exists once a session was started successfully; there is no
/// separate "not started" state.
pub struct QuizSession {
    id: SessionId,
    title: String,
    subject: String,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    countdown: Countdown,
    answers: Vec<AnswerRecord>,
    settings: QuizSettings,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    reason: Option<CompletionReason>,
    result_id: Option<i64>,
}

impl QuizSession {
    /// Select questions from `bank` and open a session.
    ///
    /// `now` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` if the bank has no questions,
    /// `SessionError::ZeroQuestionsRequested` for a count of zero, and
    /// `SessionError::NoMatchingQuestions` if the difficulty filter leaves nothing.
    pub fn start<R: RandomSource>(
        bank: &QuestionBank,
        request: QuizRequest,
        settings: QuizSettings,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if bank.is_empty() {
            return Err(SessionError::EmptyBank);
        }
        if request.count == 0 {
            return Err(SessionError::ZeroQuestionsRequested);
        }

        let questions = QuestionSelector::new(bank).select(
            &request.preferences,
            request.count,
            request.difficulty,
            rng,
        );
        if questions.is_empty() {
            return Err(SessionError::NoMatchingQuestions);
        }

        let session = Self {
            id: SessionId::generate(),
            title: request.title,
            subject: request.subject,
            questions,
            current: 0,
            score: 0,
            countdown: Countdown::from_minutes(settings.time_limit_minutes()),
            answers: Vec::new(),
            settings,
            started_at: now,
            completed_at: None,
            reason: None,
            result_id: None,
        };
        info!(
            session = %session.id,
            questions = session.questions.len(),
            time_limit_secs = session.countdown.limit_secs(),
            "quiz session started"
        );
        Ok(session)
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
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
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.settings.time_limit_minutes()
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    /// Remaining time as `m:ss`.
    #[must_use]
    pub fn format_remaining(&self) -> String {
        self.countdown.display()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn completion_reason(&self) -> Option<CompletionReason> {
        self.reason
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn result_id(&self) -> Option<i64> {
        self.result_id
    }

    pub(crate) fn set_result_id(&mut self, id: i64) {
        self.result_id = Some(id);
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_completed() {
            return None;
        }
        self.questions.get(self.current)
    }

    /// The answer given to the current question, if any; drives "show explanation".
    #[must_use]
    pub fn last_answer(&self) -> Option<&AnswerRecord> {
        self.record_for(self.current)
            .filter(|record| !record.is_skipped())
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.questions.len();
        let position = (self.current + 1).min(total);
        QuizProgress {
            index: self.current,
            total,
            answered: self.answers.iter().filter(|r| !r.is_skipped()).count(),
            score: self.score,
            remaining_secs: self.countdown.remaining_secs(),
            percent_through: results::percentage(
                u32::try_from(position).unwrap_or(u32::MAX),
                u32::try_from(total).unwrap_or(u32::MAX),
            ),
            is_completed: self.is_completed(),
        }
    }

    fn record_for(&self, index: usize) -> Option<&AnswerRecord> {
        self.answers.iter().find(|record| record.index == index)
    }

    /// Score the answer to the current question. Does not move to the next question.
    ///
    /// A second submission for the same question returns the first record as
    /// [`Submission::Duplicate`] and leaves the score alone.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session has finished or timed out.
    pub fn submit(&mut self, answer: Answer, now: DateTime<Utc>) -> Result<Submission, SessionError> {
        if self.is_completed() {
            return Err(SessionError::Completed);
        }
        if let Some(previous) = self.record_for(self.current) {
            warn!(session = %self.id, index = self.current, "duplicate answer ignored");
            return Ok(Submission::Duplicate(previous.clone()));
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::Completed)?;

        let is_correct = question.is_correct(&answer);
        let record = AnswerRecord::answered(
            self.current,
            question.id.clone(),
            question.learning_preference,
            answer,
            is_correct,
            now,
        );
        if is_correct {
            self.score += 1;
        }
        debug!(
            session = %self.id,
            index = self.current,
            question = %record.question_id,
            is_correct,
            "answer recorded"
        );
        self.answers.push(record.clone());
        Ok(Submission::Recorded(record))
    }

    /// Move past the current question; on the last one this finishes the session.
    ///
    /// Unanswered questions are logged as skipped and count as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session has finished or timed out.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        if self.is_completed() {
            return Err(SessionError::Completed);
        }

        if self.record_for(self.current).is_none() {
            let question = self
                .questions
                .get(self.current)
                .ok_or(SessionError::Completed)?;
            debug!(session = %self.id, index = self.current, "question skipped");
            self.answers.push(AnswerRecord::skipped(
                self.current,
                question.id.clone(),
                question.learning_preference,
                now,
            ));
        }

        if self.current + 1 >= self.questions.len() {
            self.complete(CompletionReason::Finished, now);
            return Ok(Advance::Finished);
        }

        self.current += 1;
        debug!(session = %self.id, index = self.current, "advanced");
        Ok(Advance::Next {
            index: self.current,
        })
    }

    /// Consume one second of the countdown. Returns `true` if this tick timed the session out.
    ///
    /// Ticks on a completed session are ignored.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_completed() {
            return false;
        }
        if self.countdown.tick() {
            warn!(session = %self.id, index = self.current, "quiz session timed out");
            self.complete(CompletionReason::TimedOut, now);
            return true;
        }
        false
    }

    fn complete(&mut self, reason: CompletionReason, now: DateTime<Utc>) {
        self.completed_at = Some(now);
        self.reason = Some(reason);
        info!(
            session = %self.id,
            %reason,
            score = self.score,
            total = self.questions.len(),
            "quiz session completed"
        );
    }

    /// Aggregate the answer log of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::NotCompleted` (wrapped) while the session is running.
    pub fn results(&self) -> Result<ResultsSummary, SessionError> {
        if !self.is_completed() {
            return Err(ResultsError::NotCompleted.into());
        }
        let summary = results::aggregate(
            CompletedQuiz {
                questions: &self.questions,
                answers: &self.answers,
                score: self.score,
                time_spent_secs: self.countdown.elapsed_secs(),
            },
            &self.settings,
        )?;
        Ok(summary)
    }

    /// Build the persisted hand-off for a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session is still running or its numbers disagree.
    pub fn to_result(&self, user_id: UserId) -> Result<QuizResult, SessionError> {
        let summary = self.results()?;
        let completed_at = self.completed_at.ok_or(ResultsError::NotCompleted)?;
        let reason = self.reason.unwrap_or(CompletionReason::Finished);
        Ok(QuizResult::new(
            self.id,
            user_id,
            self.title.clone(),
            self.subject.clone(),
            reason,
            self.started_at,
            completed_at,
            summary,
        )?)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("remaining_secs", &self.countdown.remaining_secs())
            .field("answers_len", &self.answers.len())
            .field("completed_at", &self.completed_at)
            .field("reason", &self.reason)
            .field("result_id", &self.result_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::{CorrectAnswer, QuestionId, QuestionType};
    use tutor_core::selector::FixedOrder;
    use tutor_core::time::fixed_now;

    fn question(id: &str, pref: LearningPreference) -> Question {
        Question {
            id: QuestionId::new(id),
            kind: QuestionType::MultipleChoice,
            prompt: format!("question {id}"),
            options: Some(vec!["right".into(), "wrong".into()]),
            correct_answer: CorrectAnswer::Single("right".into()),
            explanation: format!("because {id}"),
            difficulty: Difficulty::Easy,
            learning_preference: pref,
            subject: "Test".into(),
            tags: Default::default(),
        }
    }

    fn five_question_bank() -> QuestionBank {
        use LearningPreference::*;
        QuestionBank::new(vec![
            question("q1", Visual),
            question("q2", Visual),
            question("q3", Auditory),
            question("q4", Kinesthetic),
            question("q5", ReadingWriting),
        ])
        .unwrap()
    }

    fn all_prefs() -> BTreeSet<LearningPreference> {
        LearningPreference::ALL.into_iter().collect()
    }

    fn start(bank: &QuestionBank, minutes: u32) -> QuizSession {
        let settings = QuizSettings::default().with_time_limit(minutes).unwrap();
        QuizSession::start(
            bank,
            QuizRequest::new(all_prefs(), 10),
            settings,
            &mut FixedOrder,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn start_initializes_counters() {
        let bank = five_question_bank();
        let session = start(&bank, 10);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.total_questions(), 5);
        assert_eq!(session.time_remaining_secs(), 600);
        assert_eq!(session.format_remaining(), "10:00");
        assert!(!session.is_completed());
        assert_eq!(session.title(), DEFAULT_TITLE);
        assert_eq!(session.current_question().unwrap().id.as_str(), "q1");
    }

    #[test]
    fn start_rejects_empty_bank() {
        let err = QuizSession::start(
            &QuestionBank::empty(),
            QuizRequest::new(all_prefs(), 10),
            QuizSettings::default(),
            &mut FixedOrder,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::EmptyBank));
    }

    #[test]
    fn start_rejects_zero_count() {
        let err = QuizSession::start(
            &five_question_bank(),
            QuizRequest::new(all_prefs(), 0),
            QuizSettings::default(),
            &mut FixedOrder,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::ZeroQuestionsRequested));
    }

    #[test]
    fn start_rejects_difficulty_without_matches() {
        let err = QuizSession::start(
            &five_question_bank(),
            QuizRequest::new(all_prefs(), 10).with_difficulty(Some(Difficulty::Hard)),
            QuizSettings::default(),
            &mut FixedOrder,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::NoMatchingQuestions));
    }

    #[test]
    fn three_correct_of_five_scores_sixty_percent() {
        let bank = five_question_bank();
        let mut session = start(&bank, 10);
        let pattern = [true, false, true, true, false];
        for ok in pattern {
            let answer = if ok { "right" } else { "wrong" };
            session.submit(Answer::single(answer), fixed_now()).unwrap();
            session.advance(fixed_now()).unwrap();
        }
        assert!(session.is_completed());
        assert_eq!(session.completion_reason(), Some(CompletionReason::Finished));

        let summary = session.results().unwrap();
        assert_eq!(summary.score, 3);
        assert_eq!(summary.percentage, 60);
        let sum: u32 = summary.breakdown.iter().map(|b| b.correct).sum();
        assert_eq!(sum, summary.score);
    }

    #[test]
    fn score_never_drops_and_rises_by_at_most_one() {
        let bank = five_question_bank();
        let mut session = start(&bank, 10);
        let answers = ["right", "right", "wrong", "right", "wrong", "right"];
        let mut previous = session.score();
        for (i, raw) in answers.iter().enumerate() {
            let outcome = session.submit(Answer::single(*raw), fixed_now());
            let now = session.score();
            assert!(now >= previous && now - previous <= 1);
            previous = now;
            if outcome.is_ok() && i % 2 == 0 && !session.is_completed() {
                let _ = session.advance(fixed_now());
            }
        }
    }

    #[test]
    fn double_submit_keeps_first_record() {
        let bank = five_question_bank();
        let mut session = start(&bank, 10);

        let first = session.submit(Answer::single("right"), fixed_now()).unwrap();
        assert!(!first.is_duplicate());
        assert_eq!(session.score(), 1);

        let second = session.submit(Answer::single("wrong"), fixed_now()).unwrap();
        assert!(second.is_duplicate());
        assert_eq!(second.record(), first.record());
        assert_eq!(session.score(), 1);
        assert_eq!(session.answers().len(), 1);
        assert!(session.last_answer().unwrap().is_correct);
    }

    #[test]
    fn advance_without_answer_logs_a_skip() {
        let bank = five_question_bank();
        let mut session = start(&bank, 10);
        assert_eq!(session.advance(fixed_now()).unwrap(), Advance::Next { index: 1 });
        assert!(session.answers()[0].is_skipped());
        assert!(session.last_answer().is_none());
        assert_eq!(session.progress().answered, 0);
    }

    #[test]
    fn advance_clears_answer_shown_state() {
        let bank = five_question_bank();
        let mut session = start(&bank, 10);
        session.submit(Answer::single("right"), fixed_now()).unwrap();
        assert!(session.last_answer().is_some());
        session.advance(fixed_now()).unwrap();
        assert!(session.last_answer().is_none());
    }

    #[test]
    fn timer_expiry_completes_and_blocks_answers() {
        let bank = five_question_bank();
        let mut session = start(&bank, 1);
        for _ in 0..59 {
            assert!(!session.tick(fixed_now()));
        }
        assert!(!session.is_completed());
        assert!(session.tick(fixed_now()));
        assert_eq!(session.time_remaining_secs(), 0);
        assert!(session.is_completed());
        assert_eq!(session.completion_reason(), Some(CompletionReason::TimedOut));

        // late ticks are no-ops
        assert!(!session.tick(fixed_now()));
        assert_eq!(session.time_remaining_secs(), 0);

        let err = session
            .submit(Answer::single("right"), fixed_now())
            .unwrap_err();
        assert!(matches!(err, SessionError::Completed));
        assert!(matches!(
            session.advance(fixed_now()),
            Err(SessionError::Completed)
        ));
        assert!(session.current_question().is_none());

        let summary = session.results().unwrap();
        assert_eq!(summary.time_spent_secs, 60);
        assert_eq!(summary.score, 0);
    }

    #[test]
    fn results_require_completion() {
        let bank = five_question_bank();
        let session = start(&bank, 10);
        let err = session.results().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Results(ResultsError::NotCompleted)
        ));
    }

    #[test]
    fn time_spent_counts_elapsed_ticks() {
        let bank = five_question_bank();
        let mut session = start(&bank, 10);
        for _ in 0..42 {
            session.tick(fixed_now());
        }
        for _ in 0..5 {
            session.advance(fixed_now()).unwrap();
        }
        let summary = session.results().unwrap();
        assert_eq!(summary.time_spent_secs, 42);
        assert_eq!(summary.percentage, 0);

        let result = session.to_result(UserId::new(9)).unwrap();
        assert_eq!(result.reason(), CompletionReason::Finished);
        assert_eq!(result.summary().total, 5);
    }

    #[test]
    fn progress_reports_position() {
        let bank = five_question_bank();
        let mut session = start(&bank, 10);
        assert_eq!(session.progress().percent_through, 20);
        session.submit(Answer::single("right"), fixed_now()).unwrap();
        session.advance(fixed_now()).unwrap();
        let progress = session.progress();
        assert_eq!(progress.index, 1);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.score, 1);
        assert_eq!(progress.percent_through, 40);
    }
}
