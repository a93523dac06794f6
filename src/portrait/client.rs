//! `ImageGenerator` trait and the Imagen `predict` client.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

use crate::config::ImageConfig;
use crate::http::{client_with_timeout, ensure_success, BackendError};

// ---------------------------------------------------------------------------
// ImageGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for image-synthesis back-ends.
///
/// Returns the decoded image bytes.  Implementors must be `Send + Sync`.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, BackendError>;
}

// ---------------------------------------------------------------------------
// ImagenGenerator
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/v1beta/models/{model}:predict`.
pub struct ImagenGenerator {
    client: reqwest::Client,
    config: ImageConfig,
    api_key: String,
}

impl ImagenGenerator {
    pub fn from_config(config: &ImageConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: client_with_timeout(config.timeout_secs),
            config: config.clone(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:predict",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "instances": [ { "prompt": prompt } ],
            "parameters": {
                "sampleCount":             self.config.sample_count,
                "aspectRatio":             self.config.aspect_ratio,
                "sampleImageSize":         self.config.sample_image_size,
                "includeSafetyAttributes": self.config.include_safety_attributes
            }
        })
    }
}

/// The base64 payload of the first prediction.
///
/// Accepts `bytesBase64Encoded`, then `image`, then the prediction itself
/// when it is a bare string.
fn first_prediction_payload(json: &Value) -> Option<&str> {
    let prediction = json["predictions"].as_array()?.first()?;
    prediction["bytesBase64Encoded"]
        .as_str()
        .or_else(|| prediction["image"].as_str())
        .or_else(|| prediction.as_str())
}

/// Strip an optional `data:<mime>;base64,` prefix and decode.
///
/// ```
/// use character_forge::portrait::client::decode_payload;
///
/// assert_eq!(decode_payload("aGk=").unwrap(), b"hi");
/// assert_eq!(decode_payload("data:image/png;base64,aGk=").unwrap(), b"hi");
/// ```
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, BackendError> {
    let payload = payload.trim();
    let data = if payload.starts_with("data:") {
        payload
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| BackendError::Decode("data URL without payload".into()))?
    } else {
        payload
    };
    BASE64
        .decode(data)
        .map_err(|e| BackendError::Decode(format!("invalid base64 image: {e}")))
}

#[async_trait]
impl ImageGenerator for ImagenGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, BackendError> {
        log::debug!("image: requesting {} (prompt len={})", self.config.model, prompt.len());

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

        let payload = first_prediction_payload(&json).ok_or(BackendError::EmptyResponse)?;
        let bytes = decode_payload(payload)?;
        if bytes.is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        log::debug!("image: received {} bytes", bytes.len());
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ImageConfig {
        ImageConfig {
            base_url: server.uri(),
            model: "imagen-test".into(),
            ..ImageConfig::default()
        }
    }

    async fn server_answering(body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn sends_prompt_and_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/imagen-test:predict"))
            .and(query_param("key", "AIza-test"))
            .and(body_partial_json(json!({
                "instances": [ { "prompt": "a dwarf" } ],
                "parameters": {
                    "sampleCount": 1,
                    "aspectRatio": "1:1",
                    "sampleImageSize": "1024",
                    "includeSafetyAttributes": false
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [ { "bytesBase64Encoded": "iVBORw==" } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = ImagenGenerator::from_config(&config_for(&server), "AIza-test");
        let bytes = generator.generate("a dwarf").await.unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn accepts_image_field_with_data_url() {
        let server = server_answering(json!({
            "predictions": [ { "image": "data:image/png;base64,aGk=" } ]
        }))
        .await;
        let generator = ImagenGenerator::from_config(&config_for(&server), "k");
        assert_eq!(generator.generate("p").await.unwrap(), b"hi");
    }

    #[tokio::test]
    async fn accepts_bare_string_prediction() {
        let server = server_answering(json!({ "predictions": [ "aGk=" ] })).await;
        let generator = ImagenGenerator::from_config(&config_for(&server), "k");
        assert_eq!(generator.generate("p").await.unwrap(), b"hi");
    }

    #[tokio::test]
    async fn empty_predictions_is_empty_response() {
        let server = server_answering(json!({ "predictions": [] })).await;
        let generator = ImagenGenerator::from_config(&config_for(&server), "k");
        assert!(matches!(
            generator.generate("p").await,
            Err(BackendError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn invalid_base64_is_decode_error() {
        let server = server_answering(json!({
            "predictions": [ { "bytesBase64Encoded": "not base64!!" } ]
        }))
        .await;
        let generator = ImagenGenerator::from_config(&config_for(&server), "k");
        assert!(matches!(
            generator.generate("p").await,
            Err(BackendError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("quota"))
            .mount(&server)
            .await;
        let generator = ImagenGenerator::from_config(&config_for(&server), "k");
        assert!(matches!(
            generator.generate("p").await,
            Err(BackendError::Status { status: 400, .. })
        ));
    }

    #[test]
    fn data_url_without_comma_is_rejected() {
        assert!(matches!(
            decode_payload("data:image/png;base64"),
            Err(BackendError::Decode(_))
        ));
    }
}
