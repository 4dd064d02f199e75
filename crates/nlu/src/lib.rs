//! HTTP client for the emotion-analysis endpoint of a Watson-compatible
//! natural language understanding service.

pub mod api;

pub use api::{NluApiError, NluClient, NluConfig, DEFAULT_API_VERSION};
