//! Repository for the `journal_emotions` table.
//!
//! Write helpers take an open transaction so score sets are only ever
//! replaced atomically with their entry.

use ouramind_core::emotion::EmotionScores;
use ouramind_core::types::DbId;
use sqlx::PgPool;

use crate::models::journal_entry::{DatedScore, StoredScore};

/// Provides score-set persistence and the trend sample query.
pub struct EmotionScoreRepo;

impl EmotionScoreRepo {
    /// Insert one row per score for `entry_id`, resolving emotion ids by name.
    ///
    /// Fails when the catalog table lacks any of the scored emotions, which
    /// rolls back the caller's transaction.
    pub async fn insert_all(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        entry_id: DbId,
        scores: &EmotionScores,
    ) -> Result<(), sqlx::Error> {
        let names: Vec<String> = scores.iter().map(|(e, _)| e.as_str().to_string()).collect();
        let intensities: Vec<f64> = scores.iter().map(|(_, i)| i).collect();

        let result = sqlx::query(
            "INSERT INTO journal_emotions (journal_entry_id, emotion_id, intensity) \
             SELECT $1, e.id, s.intensity \
             FROM UNNEST($2::text[], $3::float8[]) AS s(name, intensity) \
             JOIN emotions e ON e.name = s.name",
        )
        .bind(entry_id)
        .bind(&names)
        .bind(&intensities)
        .execute(&mut **tx)
        .await?;

        let inserted = result.rows_affected();
        if inserted != names.len() as u64 {
            tracing::error!(
                entry_id,
                expected = names.len(),
                inserted,
                "Emotion catalog table is missing classifier emotions",
            );
            return Err(sqlx::Error::Protocol(format!(
                "emotion catalog resolved {inserted} of {} scored emotions",
                names.len()
            )));
        }
        Ok(())
    }

    /// Delete every score row for `entry_id`. Returns the number removed.
    pub async fn delete_for_entry(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        entry_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM journal_emotions WHERE journal_entry_id = $1")
            .bind(entry_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    /// List an entry's scores in catalog order.
    pub async fn list_for_entry(
        pool: &PgPool,
        entry_id: DbId,
    ) -> Result<Vec<StoredScore>, sqlx::Error> {
        sqlx::query_as::<_, StoredScore>(
            "SELECT e.name AS emotion, je.intensity \
             FROM journal_emotions je \
             JOIN emotions e ON e.id = je.emotion_id \
             WHERE je.journal_entry_id = $1 \
             ORDER BY e.sort_order",
        )
        .bind(entry_id)
        .fetch_all(pool)
        .await
    }

    /// Fetch scores for the given entries, restricted to `emotion_names`.
    pub async fn list_dated_for_entries(
        pool: &PgPool,
        entry_ids: &[DbId],
        emotion_names: &[String],
    ) -> Result<Vec<DatedScore>, sqlx::Error> {
        if entry_ids.is_empty() || emotion_names.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, DatedScore>(
            "SELECT j.entry_date, e.name AS emotion, je.intensity \
             FROM journal_emotions je \
             JOIN journal_entries j ON j.id = je.journal_entry_id \
             JOIN emotions e ON e.id = je.emotion_id \
             WHERE je.journal_entry_id = ANY($1) \
               AND e.name = ANY($2) \
             ORDER BY j.entry_date, e.sort_order",
        )
        .bind(entry_ids)
        .bind(emotion_names)
        .fetch_all(pool)
        .await
    }
}
