//! Contract for the external emotion-classification service.
//!
//! Implementations perform one outbound call per text and never retry.
//! Callers bound each call with [`classify_with_timeout`].

use std::time::Duration;

use async_trait::async_trait;

use crate::emotion::EmotionScores;

/// Failure of the classification boundary.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The service was unreachable or answered with an error.
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    /// The service did not answer within the configured timeout.
    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered, but not with a usable score map.
    #[error("Classifier returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Derives per-emotion intensities from free text.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<EmotionScores, ClassifierError>;
}

/// Run `classifier` against `text`, failing with [`ClassifierError::Timeout`]
/// if it does not finish within `timeout`.
pub async fn classify_with_timeout(
    classifier: &dyn EmotionClassifier,
    text: &str,
    timeout: Duration,
) -> Result<EmotionScores, ClassifierError> {
    match tokio::time::timeout(timeout, classifier.classify(text)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Classifier call timed out");
            Err(ClassifierError::Timeout(timeout))
        }
    }
}
