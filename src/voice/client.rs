//! `SoundGenerator` trait and the ElevenLabs sound-generation client.
//!
//! The sound-effect endpoint is used for all three audio channels: the
//! character's voice line, the ambient loop and the narration.  It takes a
//! text description and a duration and answers with MP3 bytes.

use async_trait::async_trait;

use crate::config::VoiceConfig;
use crate::http::{client_with_timeout, ensure_success, BackendError};

// ---------------------------------------------------------------------------
// SoundGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for short-audio back-ends.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn SoundGenerator>`.
#[async_trait]
pub trait SoundGenerator: Send + Sync {
    /// Generate `duration_secs` of audio described by `text`.
    async fn generate(&self, text: &str, duration_secs: f32) -> Result<Vec<u8>, BackendError>;
}

// ---------------------------------------------------------------------------
// ElevenLabsSfx
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/v1/sound-generation` with the `xi-api-key` header.
pub struct ElevenLabsSfx {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ElevenLabsSfx {
    pub fn from_config(config: &VoiceConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: client_with_timeout(config.timeout_secs),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SoundGenerator for ElevenLabsSfx {
    async fn generate(&self, text: &str, duration_secs: f32) -> Result<Vec<u8>, BackendError> {
        log::debug!("voice: requesting {duration_secs}s clip (text len={})", text.len());

        let body = serde_json::json!({
            "text": text,
            "duration_seconds": duration_secs,
        });

        let response = self
            .client
            .post(format!("{}/v1/sound-generation", self.base_url))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        log::debug!("voice: received {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> VoiceConfig {
        VoiceConfig {
            base_url: server.uri(),
            ..VoiceConfig::default()
        }
    }

    #[tokio::test]
    async fn posts_text_and_duration_with_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/sound-generation"))
            .and(header("xi-api-key", "sk-test"))
            .and(body_json(json!({
                "text": "speaking in the style of male dwarf warrior \"Hold!\"",
                "duration_seconds": 5.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let sfx = ElevenLabsSfx::from_config(&config_for(&server), "sk-test");
        let audio = sfx
            .generate("speaking in the style of male dwarf warrior \"Hold!\"", 5.0)
            .await
            .unwrap();
        assert_eq!(audio, b"ID3audio");
    }

    #[tokio::test]
    async fn unauthorised_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let sfx = ElevenLabsSfx::from_config(&config_for(&server), "bad");
        match sfx.generate("x", 5.0).await {
            Err(BackendError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_body_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let sfx = ElevenLabsSfx::from_config(&config_for(&server), "k");
        assert!(matches!(
            sfx.generate("x", 5.0).await,
            Err(BackendError::EmptyResponse)
        ));
    }
}
