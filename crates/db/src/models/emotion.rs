//! Emotion and mood catalog rows.

use ouramind_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `emotions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmotionRow {
    pub id: i16,
    pub name: String,
    pub sort_order: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `moods` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Mood {
    pub id: i16,
    pub name: String,
}
