use async_trait::async_trait;
use tutor_core::model::{QuizResult, SessionId, UserId};

use super::SqliteRepository;
use super::mapping::{map_result_row, to_json, user_id_to_i64};
use crate::repository::{QuizResultRepository, QuizResultRow, StorageError};

const RESULT_COLUMNS: &str = r"
    id, session_id, user_id, title, subject, reason,
    started_at, completed_at, score, total, percentage,
    time_spent_secs, band, strength_threshold, breakdown
";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let summary = result.summary();

        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    session_id, user_id, title, subject, reason,
                    started_at, completed_at, score, total, percentage,
                    time_spent_secs, band, strength_threshold, breakdown
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ",
        )
        .bind(result.session_id().to_string())
        .bind(user_id_to_i64(result.user_id())?)
        .bind(result.title())
        .bind(result.subject())
        .bind(result.reason().as_str())
        .bind(result.started_at())
        .bind(result.completed_at())
        .bind(i64::from(summary.score))
        .bind(i64::from(summary.total))
        .bind(i64::from(summary.percentage))
        .bind(i64::from(summary.time_spent_secs))
        .bind(summary.band.as_str())
        .bind(i64::from(summary.strength_threshold))
        .bind(to_json(&summary.breakdown)?)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM quiz_results WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        map_result_row(&row).map(|r| r.result)
    }

    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<QuizResultRow>, StorageError> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM quiz_results WHERE session_id = ?1");
        let row = sqlx::query(&sql)
            .bind(session_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_result_row).transpose()
    }

    async fn list_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM quiz_results
             WHERE user_id = ?1
             ORDER BY completed_at DESC, id DESC
             LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id_to_i64(user_id)?)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}
