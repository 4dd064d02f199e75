//! Repository for the `emotions` and `moods` lookup tables.

use sqlx::PgPool;

use crate::models::emotion::{EmotionRow, Mood};

/// Read-only access to the seeded emotion and mood catalogs.
pub struct EmotionRepo;

impl EmotionRepo {
    /// List all emotions in catalog order.
    pub async fn list(pool: &PgPool) -> Result<Vec<EmotionRow>, sqlx::Error> {
        sqlx::query_as::<_, EmotionRow>(
            "SELECT id, name, sort_order, created_at, updated_at \
             FROM emotions ORDER BY sort_order, id",
        )
        .fetch_all(pool)
        .await
    }

    /// List all moods in id order.
    pub async fn list_moods(pool: &PgPool) -> Result<Vec<Mood>, sqlx::Error> {
        sqlx::query_as::<_, Mood>("SELECT id, name FROM moods ORDER BY id")
            .fetch_all(pool)
            .await
    }
}
