//! Row structs and DTOs, one module per table group.

pub mod emotion;
pub mod journal_entry;
pub mod reflection;
pub mod reflection_tool;
