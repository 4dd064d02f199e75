//! Repository for the `journal_entries` table.
//!
//! Every owner-facing query filters on `(id, user_id)`, so rows belonging
//! to another user are indistinguishable from missing rows.

use ouramind_core::emotion::EmotionScores;
use ouramind_core::types::{DbId, EntryDate};
use sqlx::PgPool;

use crate::models::journal_entry::{EntryDay, JournalEntry};
use crate::repositories::EmotionScoreRepo;

/// Column list for `journal_entries` queries.
const COLUMNS: &str = "\
    id, user_id, text, entry_date, is_public, public_token, created_at, updated_at";

/// Provides entry persistence, owner scoping, and public-share state.
pub struct JournalEntryRepo;

impl JournalEntryRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert an entry and its full score set in one transaction.
    pub async fn create_with_scores(
        pool: &PgPool,
        user_id: DbId,
        ciphertext: &str,
        scores: &EmotionScores,
    ) -> Result<JournalEntry, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO journal_entries (user_id, text) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, JournalEntry>(&query)
            .bind(user_id)
            .bind(ciphertext)
            .fetch_one(&mut *tx)
            .await?;

        EmotionScoreRepo::insert_all(&mut tx, entry.id, scores).await?;

        tx.commit().await?;
        Ok(entry)
    }

    /// Replace an owned entry's text and swap its score set atomically.
    ///
    /// Returns `None` (and writes nothing) if no row matches
    /// `(id, user_id)`. Concurrent readers see either the old score set or
    /// the new one, never a partial set.
    pub async fn update_with_scores(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        ciphertext: &str,
        scores: &EmotionScores,
    ) -> Result<Option<JournalEntry>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE journal_entries SET text = $3 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, JournalEntry>(&query)
            .bind(id)
            .bind(user_id)
            .bind(ciphertext)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(entry) = entry else {
            tx.rollback().await?;
            return Ok(None);
        };

        EmotionScoreRepo::delete_for_entry(&mut tx, entry.id).await?;
        EmotionScoreRepo::insert_all(&mut tx, entry.id, scores).await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    /// Delete an owned entry, removing its scores first in the same
    /// transaction. Returns `true` if the entry existed.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owned: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM journal_entries WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        EmotionScoreRepo::delete_for_entry(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find an entry by id, only if it belongs to `user_id`.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<JournalEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM journal_entries WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, JournalEntry>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's entries, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<JournalEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM journal_entries \
             WHERE user_id = $1 \
             ORDER BY entry_date DESC, id DESC"
        );
        sqlx::query_as::<_, JournalEntry>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Ids and days of a user's entries within `[start, end]`, oldest first.
    pub async fn list_days_in_range(
        pool: &PgPool,
        user_id: DbId,
        start: EntryDate,
        end: EntryDate,
    ) -> Result<Vec<EntryDay>, sqlx::Error> {
        sqlx::query_as::<_, EntryDay>(
            "SELECT id, entry_date FROM journal_entries \
             WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3 \
             ORDER BY entry_date, id",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Public sharing
    // -----------------------------------------------------------------------

    /// Mark an owned entry public.
    ///
    /// An entry that is already public keeps its existing token. Returns the
    /// active token, or `None` if no row matches `(id, user_id)`.
    pub async fn make_public(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        token: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "UPDATE journal_entries \
             SET is_public = true, public_token = COALESCE(public_token, $3) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING public_token",
        )
        .bind(id)
        .bind(user_id)
        .bind(token)
        .fetch_optional(pool)
        .await?;
        Ok(row.and_then(|(token,)| token))
    }

    /// Revoke sharing on an owned entry, clearing its token.
    ///
    /// Returns `true` if a row matched `(id, user_id)`.
    pub async fn make_private(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE journal_entries SET is_public = false, public_token = NULL \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a currently public entry by its share token.
    pub async fn find_public_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<JournalEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM journal_entries \
             WHERE public_token = $1 AND is_public = true"
        );
        sqlx::query_as::<_, JournalEntry>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }
}
