//! Reflection submission models: prompt responses and mood ratings.

use ouramind_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// When a mood rating was taken relative to the exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingType {
    Before,
    After,
}

impl RatingType {
    pub fn as_str(self) -> &'static str {
        match self {
            RatingType::Before => "before",
            RatingType::After => "after",
        }
    }
}

/// A row from the `reflection_tool_responses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReflectionResponse {
    pub prompt_id: DbId,
    pub response: String,
}

/// A mood rating joined to its mood name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MoodRatingRow {
    pub mood: String,
    pub rating_type: String,
    pub value: i16,
}

/// One response to persist.
#[derive(Debug, Clone)]
pub struct NewResponse {
    pub prompt_id: DbId,
    pub response: String,
}

/// One rating to persist.
#[derive(Debug, Clone, Copy)]
pub struct NewMoodRating {
    pub mood_id: i16,
    pub rating_type: RatingType,
    pub value: i16,
}

/// Keys identifying one user's submission of one tool for one entry.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionKey {
    pub user_id: DbId,
    pub journal_entry_id: DbId,
    pub tool_id: DbId,
}
