//! Core `TextGenerator` trait and the Gemini `generateContent` client.
//!
//! The client sends one composed prompt with the sampling parameters from
//! [`TextConfig`] and returns the text of the first candidate.  It does not
//! look inside that text; JSON recovery is the refiner's job.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::TextConfig;
use crate::http::{client_with_timeout, ensure_success, BackendError};

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for structured-text generation back-ends.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate free-form text for `prompt`.
    ///
    /// `Err` means the call itself failed (transport or non-success status).
    /// [`BackendError::EmptyResponse`] means the call succeeded but carried
    /// no candidate text.
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// GeminiTextGenerator
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/v1beta/models/{model}:generateContent`.
///
/// All connection details come from [`TextConfig`]; the API key is passed as
/// the `key` query parameter.
pub struct GeminiTextGenerator {
    client: reqwest::Client,
    config: TextConfig,
    api_key: String,
}

impl GeminiTextGenerator {
    /// Build a generator from config and an API key.
    pub fn from_config(config: &TextConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: client_with_timeout(config.timeout_secs),
            config: config.clone(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature":     self.config.temperature,
                "topK":            self.config.top_k,
                "topP":            self.config.top_p,
                "maxOutputTokens": self.config.max_output_tokens
            }
        })
    }
}

/// Concatenated text parts of the first candidate, if any.
fn first_candidate_text(json: &Value) -> Option<String> {
    let parts = json["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        log::debug!(
            "text: requesting {} (prompt len={})",
            self.config.model,
            prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let response = ensure_success(response).await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let text = first_candidate_text(&json).ok_or(BackendError::EmptyResponse)?;
        log::trace!("text: raw candidate = {text:?}");
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
