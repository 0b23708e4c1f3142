use std::collections::BTreeSet;

use chrono::{Duration, Weekday};
use storage::repository::{QuizResultRepository, StorageError, UserPreferencesRepository};
use storage::sqlite::SqliteRepository;
use tutor_core::model::{
    CompletionReason, CourseId, LearningHours, LearningPreference, QuizResult, SchedulePreference,
    SessionDuration, SessionId, UserId, UserPreferences,
};
use tutor_core::results::{FeedbackBand, PreferenceBreakdown, ResultsSummary};
use tutor_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn build_result(user: u64, completed_offset_secs: i64) -> QuizResult {
    let summary = ResultsSummary {
        score: 3,
        total: 5,
        percentage: 60,
        time_spent_secs: 125,
        band: FeedbackBand::Fair,
        breakdown: vec![
            PreferenceBreakdown {
                preference: LearningPreference::Visual,
                correct: 1,
                total: 2,
                percentage: 50,
            },
            PreferenceBreakdown {
                preference: LearningPreference::ReadingWriting,
                correct: 2,
                total: 3,
                percentage: 67,
            },
        ],
        strength_threshold: 70,
    };
    QuizResult::new(
        SessionId::generate(),
        UserId::new(user),
        "Adaptive Learning Quiz",
        "Mixed Subjects",
        CompletionReason::TimedOut,
        fixed_now(),
        fixed_now() + Duration::seconds(completed_offset_secs),
        summary,
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_persists_preferences() {
    let repo = connect("memdb_preferences").await;
    let user = UserId::new(7);
    assert!(repo.get_preferences(user).await.unwrap().is_none());

    let prefs = UserPreferences {
        user_id: user,
        learning_preferences: BTreeSet::from([
            LearningPreference::Visual,
            LearningPreference::ReadingWriting,
        ]),
        learning_hours: Some(LearningHours::Morning),
        schedule: vec![
            SchedulePreference::new(Weekday::Mon, SessionDuration::ThirtyMinutes),
            SchedulePreference::new(Weekday::Fri, SessionDuration::OneHour),
        ],
        selected_courses: BTreeSet::from([CourseId::new("math"), CourseId::new("art")]),
        updated_at: fixed_now(),
    };
    repo.save_preferences(&prefs).await.unwrap();
    assert_eq!(repo.get_preferences(user).await.unwrap(), Some(prefs.clone()));

    let mut updated = prefs;
    updated.learning_hours = None;
    updated.schedule.pop();
    updated.updated_at = fixed_now() + Duration::minutes(5);
    repo.save_preferences(&updated).await.unwrap();
    assert_eq!(repo.get_preferences(user).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn sqlite_lists_results_newest_first() {
    let repo = connect("memdb_results").await;
    let first = build_result(1, 60);
    let second = build_result(1, 120);
    let foreign = build_result(2, 180);

    let first_id = repo.append_result(&first).await.unwrap();
    repo.append_result(&second).await.unwrap();
    repo.append_result(&foreign).await.unwrap();

    let rows = repo.list_results(UserId::new(1), 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].result, second);
    assert_eq!(rows[1].result, first);

    let fetched = repo.get_result(first_id).await.unwrap();
    assert_eq!(fetched.summary().breakdown.len(), 2);
    assert_eq!(fetched.reason(), CompletionReason::TimedOut);

    let limited = repo.list_results(UserId::new(1), 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn sqlite_rejects_second_result_for_session() {
    let repo = connect("memdb_conflict").await;
    let result = build_result(4, 30);
    let id = repo.append_result(&result).await.unwrap();

    let err = repo.append_result(&result).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let row = repo
        .find_by_session(result.session_id())
        .await
        .unwrap()
        .expect("stored row");
    assert_eq!(row.id, id);
    assert!(
        repo.find_by_session(SessionId::generate())
            .await
            .unwrap()
            .is_none()
    );
    assert!(matches!(
        repo.get_result(id + 100).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
