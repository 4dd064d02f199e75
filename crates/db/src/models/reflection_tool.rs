//! Reflection tool models and DTOs.

use ouramind_core::emotion::Emotion;
use ouramind_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `reflection_tools` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ReflectionTool {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub path: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A tool with the number of prompt responses recorded against it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ToolWithUsage {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tool: ReflectionTool,
    pub usage_count: i64,
}

/// A row from the `reflection_tool_prompts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ToolPrompt {
    pub id: DbId,
    pub tool_id: DbId,
    pub question: String,
    pub sort_order: i32,
}

/// A tool joined to one emotion it is mapped to.
#[derive(Debug, Clone, FromRow)]
pub struct ToolEmotionLink {
    pub emotion: String,
    #[sqlx(flatten)]
    pub tool: ReflectionTool,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// DTO for creating a tool together with its prompts and emotion links.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReflectionTool {
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub path: String,
    /// Prompt questions, stored in the given order.
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default)]
    pub emotions: Vec<Emotion>,
}

/// DTO for a full update of a tool.
///
/// Emotion links are replaced wholesale. Prompts are matched by question:
/// unchanged questions keep their ids and responses, and prompts that are
/// dropped take their responses with them.
pub type UpdateReflectionTool = CreateReflectionTool;
