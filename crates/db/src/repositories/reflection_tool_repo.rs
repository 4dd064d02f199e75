//! Repository for `reflection_tools`, `reflection_tool_prompts`, and the
//! `emotion_reflection_tool_map` junction table.

use ouramind_core::emotion::Emotion;
use ouramind_core::types::DbId;
use sqlx::PgPool;

use crate::models::reflection_tool::{
    CreateReflectionTool, ReflectionTool, ToolEmotionLink, ToolPrompt, ToolWithUsage,
    UpdateReflectionTool,
};

/// Column list for the `reflection_tools` table.
const COLUMNS: &str = "id, name, description, instructions, path, created_at, updated_at";

/// Column list for the `reflection_tools` table, qualified with alias `rt`.
const RT_COLUMNS: &str = "rt.id, rt.name, rt.description, rt.instructions, rt.path, \
    rt.created_at, rt.updated_at";

/// Provides tool CRUD along with prompt and emotion-link management.
pub struct ReflectionToolRepo;

impl ReflectionToolRepo {
    // -----------------------------------------------------------------------
    // Tool CRUD
    // -----------------------------------------------------------------------

    /// Insert a tool with its prompts and emotion links in one transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateReflectionTool,
    ) -> Result<ReflectionTool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO reflection_tools (name, description, instructions, path) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let tool = sqlx::query_as::<_, ReflectionTool>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.instructions)
            .bind(&input.path)
            .fetch_one(&mut *tx)
            .await?;

        Self::sync_prompts_inner(&mut tx, tool.id, &input.prompts).await?;
        Self::set_emotions_inner(&mut tx, tool.id, &input.emotions).await?;

        tx.commit().await?;
        Ok(tool)
    }

    /// Update a tool's fields, reconcile its prompts, and replace its emotion
    /// links in one transaction.
    ///
    /// Prompts whose question is unchanged keep their ids and responses.
    /// Returns `None` if no tool with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateReflectionTool,
    ) -> Result<Option<ReflectionTool>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE reflection_tools SET \
                name = $2, description = $3, instructions = $4, path = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let tool = sqlx::query_as::<_, ReflectionTool>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.instructions)
            .bind(&input.path)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(tool) = tool else {
            tx.rollback().await?;
            return Ok(None);
        };

        Self::sync_prompts_inner(&mut tx, tool.id, &input.prompts).await?;
        Self::set_emotions_inner(&mut tx, tool.id, &input.emotions).await?;

        tx.commit().await?;
        Ok(Some(tool))
    }

    /// Delete a tool. Prompts, links, and submissions cascade.
    ///
    /// Returns `true` if a tool was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reflection_tools WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a tool by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReflectionTool>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reflection_tools WHERE id = $1");
        sqlx::query_as::<_, ReflectionTool>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a tool by its URL path.
    pub async fn find_by_path(
        pool: &PgPool,
        path: &str,
    ) -> Result<Option<ReflectionTool>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reflection_tools WHERE path = $1");
        sqlx::query_as::<_, ReflectionTool>(&query)
            .bind(path)
            .fetch_optional(pool)
            .await
    }

    /// List all tools by name with their response counts.
    pub async fn list_with_usage(pool: &PgPool) -> Result<Vec<ToolWithUsage>, sqlx::Error> {
        let query = format!(
            "SELECT {RT_COLUMNS}, COUNT(r.id) AS usage_count \
             FROM reflection_tools rt \
             LEFT JOIN reflection_tool_responses r ON r.tool_id = rt.id \
             GROUP BY rt.id \
             ORDER BY rt.name, rt.id"
        );
        sqlx::query_as::<_, ToolWithUsage>(&query)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Prompts and emotion links
    // -----------------------------------------------------------------------

    /// List a tool's prompts in display order.
    pub async fn list_prompts(
        pool: &PgPool,
        tool_id: DbId,
    ) -> Result<Vec<ToolPrompt>, sqlx::Error> {
        sqlx::query_as::<_, ToolPrompt>(
            "SELECT id, tool_id, question, sort_order \
             FROM reflection_tool_prompts \
             WHERE tool_id = $1 \
             ORDER BY sort_order, id",
        )
        .bind(tool_id)
        .fetch_all(pool)
        .await
    }

    /// Names of the emotions a tool is mapped to, in catalog order.
    pub async fn list_emotion_names(
        pool: &PgPool,
        tool_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT e.name \
             FROM emotions e \
             JOIN emotion_reflection_tool_map m ON m.emotion_id = e.id \
             WHERE m.tool_id = $1 \
             ORDER BY e.sort_order",
        )
        .bind(tool_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// All `(emotion, tool)` links for the given emotions.
    ///
    /// Ordered by emotion, then tool id, so repeated calls with the same
    /// input return the same sequence.
    pub async fn list_links_for_emotions(
        pool: &PgPool,
        emotions: &[Emotion],
    ) -> Result<Vec<ToolEmotionLink>, sqlx::Error> {
        if emotions.is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<&str> = emotions.iter().map(|e| e.as_str()).collect();
        let query = format!(
            "SELECT e.name AS emotion, {RT_COLUMNS} \
             FROM emotion_reflection_tool_map m \
             JOIN emotions e ON e.id = m.emotion_id \
             JOIN reflection_tools rt ON rt.id = m.tool_id \
             WHERE e.name = ANY($1) \
             ORDER BY e.sort_order, rt.id"
        );
        sqlx::query_as::<_, ToolEmotionLink>(&query)
            .bind(&names)
            .fetch_all(pool)
            .await
    }

    /// Distinct tools the user has submitted responses for on one entry.
    pub async fn list_completed_for_entry(
        pool: &PgPool,
        journal_entry_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<ReflectionTool>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT {RT_COLUMNS} \
             FROM reflection_tool_responses r \
             JOIN reflection_tools rt ON rt.id = r.tool_id \
             WHERE r.journal_entry_id = $1 AND r.user_id = $2 \
             ORDER BY rt.id"
        );
        sqlx::query_as::<_, ReflectionTool>(&query)
            .bind(journal_entry_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Transaction helpers
    // -----------------------------------------------------------------------

    /// Reconcile a tool's prompts with `prompts`, numbering them in order.
    ///
    /// An existing prompt with the same question is kept and only moves.
    /// Questions not seen before are inserted. Prompts no longer listed are
    /// removed through [`Self::delete_prompts_inner`].
    async fn sync_prompts_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tool_id: DbId,
        prompts: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut unmatched: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT id, question FROM reflection_tool_prompts \
             WHERE tool_id = $1 \
             ORDER BY sort_order, id",
        )
        .bind(tool_id)
        .fetch_all(&mut **tx)
        .await?;

        for (index, question) in prompts.iter().enumerate() {
            let sort_order = index as i32;
            match unmatched.iter().position(|(_, q)| q == question) {
                Some(pos) => {
                    let (id, _) = unmatched.remove(pos);
                    sqlx::query(
                        "UPDATE reflection_tool_prompts SET sort_order = $2 \
                         WHERE id = $1 AND sort_order <> $2",
                    )
                    .bind(id)
                    .bind(sort_order)
                    .execute(&mut **tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO reflection_tool_prompts (tool_id, question, sort_order) \
                         VALUES ($1, $2, $3)",
                    )
                    .bind(tool_id)
                    .bind(question)
                    .bind(sort_order)
                    .execute(&mut **tx)
                    .await?;
                }
            }
        }

        let stale: Vec<DbId> = unmatched.into_iter().map(|(id, _)| id).collect();
        if !stale.is_empty() {
            Self::delete_prompts_inner(tx, tool_id, &stale).await?;
        }
        Ok(())
    }

    /// Delete prompts along with their responses.
    ///
    /// A submission left without any responses also loses its mood ratings.
    async fn delete_prompts_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tool_id: DbId,
        prompt_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let affected: Vec<(DbId, DbId)> = sqlx::query_as(
            "SELECT DISTINCT user_id, journal_entry_id \
             FROM reflection_tool_responses \
             WHERE prompt_id = ANY($1)",
        )
        .bind(prompt_ids)
        .fetch_all(&mut **tx)
        .await?;

        sqlx::query("DELETE FROM reflection_tool_prompts WHERE id = ANY($1)")
            .bind(prompt_ids)
            .execute(&mut **tx)
            .await?;

        if affected.is_empty() {
            return Ok(());
        }
        let (user_ids, entry_ids): (Vec<DbId>, Vec<DbId>) = affected.into_iter().unzip();
        let ratings = sqlx::query(
            "DELETE FROM reflection_tool_mood_ratings mr \
             USING UNNEST($2::bigint[], $3::bigint[]) AS k(user_id, journal_entry_id) \
             WHERE mr.tool_id = $1 \
               AND mr.user_id = k.user_id \
               AND mr.journal_entry_id = k.journal_entry_id \
               AND NOT EXISTS ( \
                   SELECT 1 FROM reflection_tool_responses r \
                   WHERE r.tool_id = $1 \
                     AND r.user_id = k.user_id \
                     AND r.journal_entry_id = k.journal_entry_id)",
        )
        .bind(tool_id)
        .bind(&user_ids)
        .bind(&entry_ids)
        .execute(&mut **tx)
        .await?;

        tracing::debug!(
            tool_id,
            prompt_count = prompt_ids.len(),
            submission_count = user_ids.len(),
            rating_rows = ratings.rows_affected(),
            "Removed stale reflection prompts",
        );
        Ok(())
    }

    /// Replace a tool's emotion links.
    async fn set_emotions_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tool_id: DbId,
        emotions: &[Emotion],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM emotion_reflection_tool_map WHERE tool_id = $1")
            .bind(tool_id)
            .execute(&mut **tx)
            .await?;

        if emotions.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = emotions.iter().map(|e| e.as_str()).collect();
        sqlx::query(
            "INSERT INTO emotion_reflection_tool_map (emotion_id, tool_id) \
             SELECT e.id, $1 FROM emotions e WHERE e.name = ANY($2) \
             ON CONFLICT (emotion_id, tool_id) DO NOTHING",
        )
        .bind(tool_id)
        .bind(&names)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
