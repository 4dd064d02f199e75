//! Reflection exercises attached to journal entries.
//!
//! A submission holds prompt responses plus before/after mood ratings for
//! one `(user, entry, tool)` triple. Submitting again replaces it.

use std::collections::{BTreeMap, HashMap, HashSet};

use ouramind_core::reflection::{validate_mood_rating, validate_non_blank};
use ouramind_core::types::DbId;
use ouramind_db::models::emotion::Mood;
use ouramind_db::models::reflection::{NewMoodRating, NewResponse, RatingType, SubmissionKey};
use ouramind_db::models::reflection_tool::{ReflectionTool, ToolPrompt};
use ouramind_db::repositories::{EmotionRepo, ReflectionResponseRepo, ReflectionToolRepo};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{invalid, not_found, PipelineResult};
use crate::journal::find_owned_entry;

const TOOL: &str = "ReflectionTool";
const SUBMISSION: &str = "ReflectionSubmission";

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Everything needed to render a tool for one entry.
#[derive(Debug, Clone, Serialize)]
pub struct ToolForm {
    pub tool: ReflectionTool,
    pub prompts: Vec<ToolPrompt>,
    pub moods: Vec<Mood>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MoodPair {
    pub before: i16,
    pub after: i16,
}

/// A user's answers, keyed by prompt id, and ratings, keyed by mood name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReflectionSubmission {
    #[serde(default)]
    pub responses: BTreeMap<DbId, String>,
    #[serde(default)]
    pub moods: BTreeMap<String, MoodPair>,
}

/// Ratings as stored. Either side may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordedMood {
    pub before: Option<i16>,
    pub after: Option<i16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedReflection {
    pub tool: ReflectionTool,
    pub prompts: Vec<ToolPrompt>,
    pub responses: BTreeMap<DbId, String>,
    pub mood_ratings: BTreeMap<String, RecordedMood>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ReflectionService {
    pool: PgPool,
}

impl ReflectionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn form(
        &self,
        path: &str,
        entry_id: DbId,
        user_id: DbId,
    ) -> PipelineResult<ToolForm> {
        let tool = self.tool_by_path(path).await?;
        find_owned_entry(&self.pool, entry_id, user_id).await?;

        let prompts = ReflectionToolRepo::list_prompts(&self.pool, tool.id).await?;
        let moods = EmotionRepo::list_moods(&self.pool).await?;
        Ok(ToolForm {
            tool,
            prompts,
            moods,
        })
    }

    /// Validate and store a submission, replacing any earlier one.
    pub async fn submit(
        &self,
        path: &str,
        entry_id: DbId,
        user_id: DbId,
        submission: ReflectionSubmission,
    ) -> PipelineResult<()> {
        let tool = self.tool_by_path(path).await?;
        find_owned_entry(&self.pool, entry_id, user_id).await?;

        if submission.responses.is_empty() && submission.moods.is_empty() {
            return Err(invalid("Submission has no responses or mood ratings"));
        }

        let prompt_ids: HashSet<DbId> = ReflectionToolRepo::list_prompts(&self.pool, tool.id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let mut responses = Vec::with_capacity(submission.responses.len());
        for (prompt_id, response) in submission.responses {
            if !prompt_ids.contains(&prompt_id) {
                return Err(invalid(format!(
                    "Prompt {prompt_id} does not belong to tool '{}'",
                    tool.path
                )));
            }
            let response = response.trim().to_string();
            validate_non_blank(&format!("response to prompt {prompt_id}"), &response)?;
            responses.push(NewResponse {
                prompt_id,
                response,
            });
        }

        let mood_ids: HashMap<String, i16> = EmotionRepo::list_moods(&self.pool)
            .await?
            .into_iter()
            .map(|m| (m.name, m.id))
            .collect();
        let mut ratings = Vec::with_capacity(submission.moods.len() * 2);
        for (mood, pair) in &submission.moods {
            let mood_id = *mood_ids
                .get(mood.as_str())
                .ok_or_else(|| invalid(format!("Unknown mood: '{mood}'")))?;
            validate_mood_rating(mood, pair.before)?;
            validate_mood_rating(mood, pair.after)?;
            ratings.push(NewMoodRating {
                mood_id,
                rating_type: RatingType::Before,
                value: pair.before,
            });
            ratings.push(NewMoodRating {
                mood_id,
                rating_type: RatingType::After,
                value: pair.after,
            });
        }

        let key = SubmissionKey {
            user_id,
            journal_entry_id: entry_id,
            tool_id: tool.id,
        };
        ReflectionResponseRepo::replace_submission(&self.pool, key, &responses, &ratings).await?;

        tracing::info!(
            entry_id,
            user_id,
            tool_id = tool.id,
            response_count = responses.len(),
            rating_count = ratings.len(),
            "Reflection submitted",
        );
        Ok(())
    }

    /// The stored submission for one entry and tool.
    pub async fn completed(
        &self,
        path: &str,
        entry_id: DbId,
        user_id: DbId,
    ) -> PipelineResult<CompletedReflection> {
        let tool = self.tool_by_path(path).await?;
        find_owned_entry(&self.pool, entry_id, user_id).await?;

        let key = SubmissionKey {
            user_id,
            journal_entry_id: entry_id,
            tool_id: tool.id,
        };
        let responses = ReflectionResponseRepo::list_responses(&self.pool, key).await?;
        let ratings = ReflectionResponseRepo::list_mood_ratings(&self.pool, key).await?;
        if responses.is_empty() && ratings.is_empty() {
            return Err(not_found(SUBMISSION, path));
        }

        let mut mood_ratings: BTreeMap<String, RecordedMood> = BTreeMap::new();
        for row in ratings {
            let slot = mood_ratings.entry(row.mood).or_default();
            match row.rating_type.as_str() {
                "before" => slot.before = Some(row.value),
                "after" => slot.after = Some(row.value),
                other => tracing::warn!(rating_type = other, "Skipping unknown rating type"),
            }
        }

        let prompts = ReflectionToolRepo::list_prompts(&self.pool, tool.id).await?;
        Ok(CompletedReflection {
            tool,
            prompts,
            responses: responses.into_iter().map(|r| (r.prompt_id, r.response)).collect(),
            mood_ratings,
        })
    }

    /// Delete the stored submission for one entry and tool.
    pub async fn remove(&self, path: &str, entry_id: DbId, user_id: DbId) -> PipelineResult<()> {
        let tool = self.tool_by_path(path).await?;
        find_owned_entry(&self.pool, entry_id, user_id).await?;

        let key = SubmissionKey {
            user_id,
            journal_entry_id: entry_id,
            tool_id: tool.id,
        };
        if !ReflectionResponseRepo::delete_submission(&self.pool, key).await? {
            return Err(not_found(SUBMISSION, path));
        }
        tracing::info!(entry_id, user_id, tool_id = tool.id, "Reflection removed");
        Ok(())
    }

    async fn tool_by_path(&self, path: &str) -> PipelineResult<ReflectionTool> {
        ReflectionToolRepo::find_by_path(&self.pool, path)
            .await?
            .ok_or_else(|| not_found(TOOL, path))
    }
}
