//! Back-end test doubles shared by the pipeline and controller tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::http::BackendError;
use crate::llm::TextGenerator;
use crate::portrait::{placeholder, ImageGenerator};
use crate::voice::SoundGenerator;

/// Counts calls; shared with the test through `Arc`.
#[derive(Debug, Default)]
pub struct Calls(AtomicUsize);

impl Calls {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Holds a back-end call until the test releases it.
#[derive(Debug, Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Answers every prompt with the same text.
pub struct TextOk {
    pub text: String,
    pub calls: Arc<Calls>,
    pub gate: Option<Arc<Gate>>,
}

impl TextOk {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.into(),
            calls: Arc::default(),
            gate: None,
        }
    }

    pub fn gated(text: &str, gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(text)
        }
    }
}

#[async_trait]
impl TextGenerator for TextOk {
    async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
        self.calls.bump();
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        Ok(self.text.clone())
    }
}

/// Fails every call with a 503.
#[derive(Default)]
pub struct TextFails {
    pub calls: Arc<Calls>,
}

#[async_trait]
impl TextGenerator for TextFails {
    async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
        self.calls.bump();
        Err(BackendError::Status {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

/// A well-formed model answer for the given name.
pub fn profile_json(name: &str) -> String {
    format!(
        r#"Here you go:
```json
{{"name": "{name}", "gender": "female", "race": "Elf", "class": "Ranger",
  "age": "young", "alignment": "Neutral Good",
  "description": "Tall and watchful.", "background": "Raised in the wilds.",
  "personality": "Quiet", "quote": "The forest remembers.",
  "imagePrompt": "elf ranger with a longbow", "location": "forest"}}
```"#
    )
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// Returns a real PNG.
#[derive(Default)]
pub struct ImageOk {
    pub calls: Arc<Calls>,
    pub gate: Option<Arc<Gate>>,
}

#[async_trait]
impl ImageGenerator for ImageOk {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, BackendError> {
        self.calls.bump();
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        placeholder::render_png("Remote").map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Fails every call with a timeout.
#[derive(Default)]
pub struct ImageFails {
    pub calls: Arc<Calls>,
}

#[async_trait]
impl ImageGenerator for ImageFails {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, BackendError> {
        self.calls.bump();
        Err(BackendError::Timeout)
    }
}

// ---------------------------------------------------------------------------
// Sound
// ---------------------------------------------------------------------------

/// Returns a few fake MP3 bytes.
#[derive(Default)]
pub struct SoundOk {
    pub calls: Arc<Calls>,
    pub gate: Option<Arc<Gate>>,
}

#[async_trait]
impl SoundGenerator for SoundOk {
    async fn generate(&self, _text: &str, _secs: f32) -> Result<Vec<u8>, BackendError> {
        self.calls.bump();
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        Ok(b"ID3fake-mp3".to_vec())
    }
}

/// Fails every call with a 500.
#[derive(Default)]
pub struct SoundFails {
    pub calls: Arc<Calls>,
}

#[async_trait]
impl SoundGenerator for SoundFails {
    async fn generate(&self, _text: &str, _secs: f32) -> Result<Vec<u8>, BackendError> {
        self.calls.bump();
        Err(BackendError::Status {
            status: 500,
            body: "sound back-end down".into(),
        })
    }
}
