use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use tutor_core::model::{
    CompletionReason, LearningHours, QuizResult, SessionId, UserId, UserPreferences,
};
use tutor_core::results::{FeedbackBand, ResultsSummary};

use crate::repository::{QuizResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn user_id_to_i64(id: UserId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("user_id overflow".into()))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    u64::try_from(v)
        .map(UserId::new)
        .map_err(|_| StorageError::Serialization("user_id sign overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Encodes a list-valued column as JSON text.
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn from_json<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("invalid {field}: {e}")))
}

pub(crate) fn map_preferences_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<UserPreferences, StorageError> {
    let user_id = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;

    let learning_preferences = from_json(
        "learning_preferences",
        &row.try_get::<String, _>("learning_preferences")
            .map_err(ser)?,
    )?;

    let learning_hours = row
        .try_get::<Option<String>, _>("learning_hours")
        .map_err(ser)?
        .map(|raw| {
            LearningHours::parse(&raw)
                .ok_or_else(|| StorageError::Serialization(format!("invalid learning_hours: {raw}")))
        })
        .transpose()?;

    let schedule = from_json(
        "schedule",
        &row.try_get::<String, _>("schedule").map_err(ser)?,
    )?;
    let selected_courses = from_json(
        "selected_courses",
        &row.try_get::<String, _>("selected_courses").map_err(ser)?,
    )?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;

    Ok(UserPreferences {
        user_id,
        learning_preferences,
        learning_hours,
        schedule,
        selected_courses,
        updated_at,
    })
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;

    let session_raw: String = row.try_get("session_id").map_err(ser)?;
    let session_id: SessionId = session_raw.parse().map_err(ser)?;
    let user_id = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;

    let reason_raw: String = row.try_get("reason").map_err(ser)?;
    let reason = CompletionReason::parse(&reason_raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid reason: {reason_raw}")))?;

    let band_raw: String = row.try_get("band").map_err(ser)?;
    let band = FeedbackBand::parse(&band_raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid band: {band_raw}")))?;

    let summary = ResultsSummary {
        score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        total: u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
        percentage: u32_from_i64(
            "percentage",
            row.try_get::<i64, _>("percentage").map_err(ser)?,
        )?,
        time_spent_secs: u32_from_i64(
            "time_spent_secs",
            row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
        )?,
        band,
        breakdown: from_json(
            "breakdown",
            &row.try_get::<String, _>("breakdown").map_err(ser)?,
        )?,
        strength_threshold: u32_from_i64(
            "strength_threshold",
            row.try_get::<i64, _>("strength_threshold").map_err(ser)?,
        )?,
    };

    let result = QuizResult::new(
        session_id,
        user_id,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("subject").map_err(ser)?,
        reason,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        summary,
    )
    .map_err(ser)?;

    Ok(QuizResultRow::new(id, result))
}
