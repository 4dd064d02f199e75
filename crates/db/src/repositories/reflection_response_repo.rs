//! Repository for `reflection_tool_responses` and
//! `reflection_tool_mood_ratings`.
//!
//! A submission is keyed by `(user_id, journal_entry_id, tool_id)` and is
//! always replaced as a whole.

use sqlx::PgPool;

use crate::models::reflection::{
    MoodRatingRow, NewMoodRating, NewResponse, ReflectionResponse, SubmissionKey,
};

/// Provides submission replacement and lookup.
pub struct ReflectionResponseRepo;

impl ReflectionResponseRepo {
    /// Replace the responses and ratings stored under `key` in one
    /// transaction.
    pub async fn replace_submission(
        pool: &PgPool,
        key: SubmissionKey,
        responses: &[NewResponse],
        ratings: &[NewMoodRating],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        Self::delete_inner(&mut tx, key).await?;

        for response in responses {
            sqlx::query(
                "INSERT INTO reflection_tool_responses \
                    (user_id, journal_entry_id, tool_id, prompt_id, response) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(key.user_id)
            .bind(key.journal_entry_id)
            .bind(key.tool_id)
            .bind(response.prompt_id)
            .bind(&response.response)
            .execute(&mut *tx)
            .await?;
        }

        for rating in ratings {
            sqlx::query(
                "INSERT INTO reflection_tool_mood_ratings \
                    (user_id, journal_entry_id, tool_id, mood_id, rating_type, value) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(key.user_id)
            .bind(key.journal_entry_id)
            .bind(key.tool_id)
            .bind(rating.mood_id)
            .bind(rating.rating_type.as_str())
            .bind(rating.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// List the responses under `key` in prompt order.
    pub async fn list_responses(
        pool: &PgPool,
        key: SubmissionKey,
    ) -> Result<Vec<ReflectionResponse>, sqlx::Error> {
        sqlx::query_as::<_, ReflectionResponse>(
            "SELECT r.prompt_id, r.response \
             FROM reflection_tool_responses r \
             JOIN reflection_tool_prompts p ON p.id = r.prompt_id \
             WHERE r.user_id = $1 AND r.journal_entry_id = $2 AND r.tool_id = $3 \
             ORDER BY p.sort_order, p.id",
        )
        .bind(key.user_id)
        .bind(key.journal_entry_id)
        .bind(key.tool_id)
        .fetch_all(pool)
        .await
    }

    /// List the ratings under `key`, `before` ratings first.
    pub async fn list_mood_ratings(
        pool: &PgPool,
        key: SubmissionKey,
    ) -> Result<Vec<MoodRatingRow>, sqlx::Error> {
        sqlx::query_as::<_, MoodRatingRow>(
            "SELECT m.name AS mood, mr.rating_type, mr.value \
             FROM reflection_tool_mood_ratings mr \
             JOIN moods m ON m.id = mr.mood_id \
             WHERE mr.user_id = $1 AND mr.journal_entry_id = $2 AND mr.tool_id = $3 \
             ORDER BY mr.rating_type DESC, m.id",
        )
        .bind(key.user_id)
        .bind(key.journal_entry_id)
        .bind(key.tool_id)
        .fetch_all(pool)
        .await
    }

    /// Remove the submission under `key`. Returns `true` if anything was
    /// deleted.
    pub async fn delete_submission(pool: &PgPool, key: SubmissionKey) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let removed = Self::delete_inner(&mut tx, key).await?;
        tx.commit().await?;
        Ok(removed > 0)
    }

    async fn delete_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        key: SubmissionKey,
    ) -> Result<u64, sqlx::Error> {
        let responses = sqlx::query(
            "DELETE FROM reflection_tool_responses \
             WHERE user_id = $1 AND journal_entry_id = $2 AND tool_id = $3",
        )
        .bind(key.user_id)
        .bind(key.journal_entry_id)
        .bind(key.tool_id)
        .execute(&mut **tx)
        .await?;

        let ratings = sqlx::query(
            "DELETE FROM reflection_tool_mood_ratings \
             WHERE user_id = $1 AND journal_entry_id = $2 AND tool_id = $3",
        )
        .bind(key.user_id)
        .bind(key.journal_entry_id)
        .bind(key.tool_id)
        .execute(&mut **tx)
        .await?;

        Ok(responses.rows_affected() + ratings.rows_affected())
    }
}
