//! Journal pipeline: validates, classifies, encrypts, and persists entries,
//! and serves the read paths built on top of them (views, trends, public
//! sharing, reflection tools).

pub mod catalog;
pub mod config;
pub mod error;
pub mod journal;
pub mod reflection;

pub use catalog::ToolCatalogService;
pub use config::{ConfigError, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use journal::{JournalService, JournalSettings};
pub use reflection::ReflectionService;
