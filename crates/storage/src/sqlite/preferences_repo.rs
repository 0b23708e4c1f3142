use async_trait::async_trait;
use tutor_core::model::{UserId, UserPreferences};

use super::SqliteRepository;
use super::mapping::{map_preferences_row, to_json, user_id_to_i64};
use crate::repository::{StorageError, UserPreferencesRepository};

#[async_trait]
impl UserPreferencesRepository for SqliteRepository {
    async fn get_preferences(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserPreferences>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                user_id,
                learning_preferences,
                learning_hours,
                schedule,
                selected_courses,
                updated_at
            FROM user_preferences
            WHERE user_id = ?1
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        map_preferences_row(&row).map(Some)
    }

    async fn save_preferences(&self, preferences: &UserPreferences) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_preferences (
                user_id,
                learning_preferences,
                learning_hours,
                schedule,
                selected_courses,
                updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                learning_preferences = excluded.learning_preferences,
                learning_hours = excluded.learning_hours,
                schedule = excluded.schedule,
                selected_courses = excluded.selected_courses,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id_to_i64(preferences.user_id)?)
        .bind(to_json(&preferences.learning_preferences)?)
        .bind(preferences.learning_hours.map(|h| h.as_str()))
        .bind(to_json(&preferences.schedule)?)
        .bind(to_json(&preferences.selected_courses)?)
        .bind(preferences.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
