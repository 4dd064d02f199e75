//! Domain logic for the journal pipeline.
//!
//! Nothing here touches the database or the network. Shared by the
//! repository, classifier, and pipeline crates.

pub mod cipher;
pub mod classifier;
pub mod emotion;
pub mod error;
pub mod journal;
pub mod reflection;
pub mod share;
pub mod suggestion;
pub mod trend;
pub mod types;
