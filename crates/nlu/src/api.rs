//! REST client for `POST /v1/analyze` with the `emotion` feature.
//!
//! Each call is a single request. Retries and overall deadlines belong to
//! the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use ouramind_core::classifier::{ClassifierError, EmotionClassifier};
use ouramind_core::emotion::EmotionScores;
use serde::Deserialize;

/// API version sent when none is configured.
pub const DEFAULT_API_VERSION: &str = "2022-04-07";

/// Username half of the service's basic-auth credential pair.
const API_KEY_USERNAME: &str = "apikey";

/// Connection settings for one NLU service instance.
#[derive(Clone)]
pub struct NluConfig {
    /// Instance base URL, without the `/v1/analyze` suffix.
    pub api_url: String,
    pub api_key: String,
    pub api_version: String,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout: Duration,
}

impl fmt::Debug for NluConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NluConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Errors from the NLU REST layer.
#[derive(Debug, thiserror::Error)]
pub enum NluApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("NLU API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The body was JSON but lacked the document emotion map.
    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

impl From<NluApiError> for ClassifierError {
    fn from(err: NluApiError) -> Self {
        match err {
            NluApiError::Shape(msg) => ClassifierError::InvalidResponse(msg),
            other => ClassifierError::ClassificationFailed(other.to_string()),
        }
    }
}

// ---- wire types ----

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    emotion: Option<EmotionFeature>,
}

#[derive(Debug, Deserialize)]
struct EmotionFeature {
    document: Option<DocumentEmotion>,
}

#[derive(Debug, Deserialize)]
struct DocumentEmotion {
    emotion: Option<BTreeMap<String, f64>>,
}

/// HTTP client for a single NLU instance.
pub struct NluClient {
    client: reqwest::Client,
    config: NluConfig,
}

impl NluClient {
    /// Build a client with its own connection pool and request timeout.
    pub fn new(config: NluConfig) -> Result<Self, NluApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Build a client around an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: NluConfig) -> Self {
        Self { client, config }
    }

    /// Analyze `text` and return the document-level emotion map as sent.
    pub async fn analyze_emotions(
        &self,
        text: &str,
    ) -> Result<BTreeMap<String, f64>, NluApiError> {
        let body = serde_json::json!({
            "text": text,
            "features": { "emotion": {} },
        });

        let response = self
            .client
            .post(self.analyze_url())
            .query(&[("version", self.config.api_version.as_str())])
            .basic_auth(API_KEY_USERNAME, Some(&self.config.api_key))
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let parsed: AnalyzeResponse = response.json().await?;
        extract_document_emotions(parsed)
    }

    fn analyze_url(&self) -> String {
        format!("{}/v1/analyze", self.config.api_url.trim_end_matches('/'))
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx status, otherwise an
    /// [`NluApiError::ApiError`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, NluApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NluApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl EmotionClassifier for NluClient {
    async fn classify(&self, text: &str) -> Result<EmotionScores, ClassifierError> {
        tracing::debug!(text_len = text.len(), "Requesting emotion analysis");
        let named = self.analyze_emotions(text).await.map_err(|e| {
            tracing::warn!(error = %e, "Emotion analysis request failed");
            ClassifierError::from(e)
        })?;
        EmotionScores::from_classifier(named)
    }
}

fn extract_document_emotions(
    response: AnalyzeResponse,
) -> Result<BTreeMap<String, f64>, NluApiError> {
    response
        .emotion
        .and_then(|feature| feature.document)
        .and_then(|document| document.emotion)
        .ok_or_else(|| NluApiError::Shape("missing emotion.document.emotion".to_string()))
}
