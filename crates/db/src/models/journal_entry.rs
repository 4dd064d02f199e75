//! Journal entry and emotion score models.

use ouramind_core::types::{DbId, EntryDate, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `journal_entries` table. `text` is the cipher token.
#[derive(Debug, Clone, FromRow)]
pub struct JournalEntry {
    pub id: DbId,
    pub user_id: DbId,
    pub text: String,
    pub entry_date: EntryDate,
    pub is_public: bool,
    pub public_token: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One persisted score, joined to its emotion name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredScore {
    pub emotion: String,
    pub intensity: f64,
}

/// A score row tagged with its entry's day, used for trend bucketing.
#[derive(Debug, Clone, FromRow)]
pub struct DatedScore {
    pub entry_date: EntryDate,
    pub emotion: String,
    pub intensity: f64,
}

/// An entry's id and day, used to anchor trend buckets.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct EntryDay {
    pub id: DbId,
    pub entry_date: EntryDate,
}
