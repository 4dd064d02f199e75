//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Multi-statement writes run in a
//! single transaction.

pub mod emotion_repo;
pub mod emotion_score_repo;
pub mod journal_entry_repo;
pub mod reflection_response_repo;
pub mod reflection_tool_repo;

pub use emotion_repo::EmotionRepo;
pub use emotion_score_repo::EmotionScoreRepo;
pub use journal_entry_repo::JournalEntryRepo;
pub use reflection_response_repo::ReflectionResponseRepo;
pub use reflection_tool_repo::ReflectionToolRepo;
