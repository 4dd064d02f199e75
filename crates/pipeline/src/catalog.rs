//! Administration of the reflection tool catalog.

use ouramind_core::reflection::{validate_non_blank, validate_tool_path};
use ouramind_core::types::DbId;
use ouramind_db::models::emotion::EmotionRow;
use ouramind_db::models::reflection_tool::{
    CreateReflectionTool, ReflectionTool, ToolPrompt, ToolWithUsage, UpdateReflectionTool,
};
use ouramind_db::repositories::{EmotionRepo, ReflectionToolRepo};
use sqlx::PgPool;

use crate::error::{not_found, PipelineResult};

const TOOL: &str = "ReflectionTool";

/// Create, edit, and inspect reflection tools.
#[derive(Clone)]
pub struct ToolCatalogService {
    pool: PgPool,
}

impl ToolCatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All tools by name, each with its response count.
    pub async fn list(&self) -> PipelineResult<Vec<ToolWithUsage>> {
        Ok(ReflectionToolRepo::list_with_usage(&self.pool).await?)
    }

    pub async fn get(&self, tool_id: DbId) -> PipelineResult<ReflectionTool> {
        ReflectionToolRepo::find_by_id(&self.pool, tool_id)
            .await?
            .ok_or_else(|| not_found(TOOL, tool_id))
    }

    pub async fn get_by_path(&self, path: &str) -> PipelineResult<ReflectionTool> {
        ReflectionToolRepo::find_by_path(&self.pool, path)
            .await?
            .ok_or_else(|| not_found(TOOL, path))
    }

    pub async fn create(&self, input: CreateReflectionTool) -> PipelineResult<ReflectionTool> {
        let input = normalize(input)?;
        let tool = ReflectionToolRepo::create(&self.pool, &input).await?;
        tracing::info!(
            tool_id = tool.id,
            path = %tool.path,
            prompt_count = input.prompts.len(),
            emotion_count = input.emotions.len(),
            "Reflection tool created",
        );
        Ok(tool)
    }

    /// Update a tool's fields, reconcile its prompts, and replace its emotion links.
    pub async fn update(
        &self,
        tool_id: DbId,
        input: UpdateReflectionTool,
    ) -> PipelineResult<ReflectionTool> {
        let input = normalize(input)?;
        let tool = ReflectionToolRepo::update(&self.pool, tool_id, &input)
            .await?
            .ok_or_else(|| not_found(TOOL, tool_id))?;
        tracing::info!(tool_id, path = %tool.path, "Reflection tool updated");
        Ok(tool)
    }

    pub async fn delete(&self, tool_id: DbId) -> PipelineResult<()> {
        if !ReflectionToolRepo::delete(&self.pool, tool_id).await? {
            return Err(not_found(TOOL, tool_id));
        }
        tracing::info!(tool_id, "Reflection tool deleted");
        Ok(())
    }

    pub async fn prompts(&self, tool_id: DbId) -> PipelineResult<Vec<ToolPrompt>> {
        self.get(tool_id).await?;
        Ok(ReflectionToolRepo::list_prompts(&self.pool, tool_id).await?)
    }

    /// Names of the emotions linked to a tool, in catalog order.
    pub async fn emotions(&self, tool_id: DbId) -> PipelineResult<Vec<String>> {
        self.get(tool_id).await?;
        Ok(ReflectionToolRepo::list_emotion_names(&self.pool, tool_id).await?)
    }

    /// The emotion catalog, for building link pickers.
    pub async fn list_emotions(&self) -> PipelineResult<Vec<EmotionRow>> {
        Ok(EmotionRepo::list(&self.pool).await?)
    }
}

/// Trim and validate a tool payload. Duplicate emotions are collapsed.
fn normalize(mut input: CreateReflectionTool) -> PipelineResult<CreateReflectionTool> {
    input.name = input.name.trim().to_string();
    input.path = input.path.trim().to_string();
    validate_non_blank("name", &input.name)?;
    validate_tool_path(&input.path)?;

    for (index, prompt) in input.prompts.iter_mut().enumerate() {
        *prompt = prompt.trim().to_string();
        validate_non_blank(&format!("prompt {}", index + 1), prompt)?;
    }

    let mut emotions = Vec::with_capacity(input.emotions.len());
    for emotion in input.emotions {
        if !emotions.contains(&emotion) {
            emotions.push(emotion);
        }
    }
    input.emotions = emotions;

    input.description = non_blank(input.description);
    input.instructions = non_blank(input.instructions);
    Ok(input)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
