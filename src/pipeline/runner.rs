//! Pipeline orchestrator: text → portrait → voice.
//!
//! [`PipelineOrchestrator::generate`] runs the three stages strictly in
//! order and applies a different failure policy to each:
//!
//! ```text
//! RefiningText       PromptRefiner::refine      Err ⇒ Failed + Upstream
//! SynthesizingImage  ImageSynthesizer::synthesize   never fails
//! SynthesizingVoice  VoiceSynthesizer::synthesize   Err ⇒ voice = None
//! Complete
//! ```
//!
//! Only one create request may be in flight.  The point operations
//! (portrait, voice, ambient, narration) each have their own guard, so they
//! can overlap with each other and with a create request but not with
//! themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;

use super::state::{PipelineEvent, PipelineState};
use crate::character::CharacterRecord;
use crate::config::{AppConfig, Credentials};
use crate::http::BackendError;
use crate::llm::{GeminiTextGenerator, PromptRefiner};
use crate::media::{ImageHandle, ImageOrigin, VoiceHandle};
use crate::portrait::{ImageSynthesizer, ImagenGenerator};
use crate::voice::{ClipDurations, ElevenLabsSfx, VoiceSynthesizer};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The caller's input was rejected before any work started.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A required API key is missing.
    #[error("missing credentials: {0}")]
    Precondition(String),

    /// A back-end call failed.
    #[error("upstream back-end failed: {0}")]
    Upstream(#[from] BackendError),

    /// The same operation is already running.
    #[error("{0} is already in progress")]
    Busy(&'static str),
}

// ---------------------------------------------------------------------------
// GenerationResult
// ---------------------------------------------------------------------------

/// Everything one create request produced.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub record: CharacterRecord,
    pub image: ImageHandle,
    pub voice: Option<VoiceHandle>,
    /// `true` when the portrait is a local fallback rather than the back-end's.
    pub image_stage_failed: bool,
    pub voice_stage_failed: bool,
}

// ---------------------------------------------------------------------------
// Busy guards
// ---------------------------------------------------------------------------

/// Clears its flag on drop, so an early return or panic releases the slot.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool, what: &'static str) -> Result<Self, PipelineError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("pipeline: {what} rejected, already running");
            return Err(PipelineError::Busy(what));
        }
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct Guards {
    create: AtomicBool,
    image: AtomicBool,
    voice: AtomicBool,
    ambient: AtomicBool,
    narration: AtomicBool,
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Sequences the three generation stages.
///
/// ```rust,no_run
/// use character_forge::config::AppConfig;
/// use character_forge::pipeline::PipelineOrchestrator;
///
/// # async fn example() {
/// let mut config = AppConfig::default();
/// config.credentials.apply_env();
///
/// let (tx, mut rx) = tokio::sync::mpsc::channel(32);
/// let orchestrator = PipelineOrchestrator::from_config(&config).with_events(tx);
/// tokio::spawn(async move {
///     while let Some(event) = rx.recv().await {
///         println!("{event:?}");
///     }
/// });
///
/// let result = orchestrator.generate("grizzled dwarf blacksmith").await.unwrap();
/// println!("{}", result.record.name);
/// # }
/// ```
pub struct PipelineOrchestrator {
    refiner: PromptRefiner,
    images: ImageSynthesizer,
    voices: VoiceSynthesizer,
    credentials: Credentials,
    state: Mutex<PipelineState>,
    guards: Guards,
    events: Option<mpsc::Sender<PipelineEvent>>,
}

impl PipelineOrchestrator {
    /// Assemble an orchestrator from its stages.
    ///
    /// `credentials` are only checked, never used here; the stages already
    /// hold whatever keys their clients need.
    pub fn new(
        refiner: PromptRefiner,
        images: ImageSynthesizer,
        voices: VoiceSynthesizer,
        credentials: Credentials,
    ) -> Self {
        Self {
            refiner,
            images,
            voices,
            credentials,
            state: Mutex::new(PipelineState::Idle),
            guards: Guards::default(),
            events: None,
        }
    }

    /// Build the production stages (Gemini, Imagen, ElevenLabs) from config.
    ///
    /// Missing keys are passed as empty strings; [`generate`](Self::generate)
    /// refuses to run until both are present.
    pub fn from_config(config: &AppConfig) -> Self {
        let credentials = config.credentials.clone();
        let gemini = credentials.gemini().unwrap_or_default().to_string();
        let elevenlabs = credentials.elevenlabs().unwrap_or_default().to_string();

        let text = GeminiTextGenerator::from_config(&config.text, gemini.clone());
        let image = ImagenGenerator::from_config(&config.image, gemini);
        let sound = ElevenLabsSfx::from_config(&config.voice, elevenlabs);

        Self::new(
            PromptRefiner::new(Arc::new(text)),
            ImageSynthesizer::new(Arc::new(image), config.image.style.clone()),
            VoiceSynthesizer::new(Arc::new(sound), ClipDurations::from(&config.voice)),
            credentials,
        )
    }

    /// Publish [`PipelineEvent`]s on `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Current state of the create pipeline.
    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Turn `prompt` into a [`GenerationResult`].
    pub async fn generate(&self, prompt: &str) -> Result<GenerationResult, PipelineError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PipelineError::Validation("prompt must not be empty".into()));
        }

        let _guard = BusyGuard::acquire(&self.guards.create, "character creation")?;

        if let Err(e) = self.require_all_keys() {
            self.fail(&e);
            return Err(e);
        }

        // ── 1. Text ──────────────────────────────────────────────────────
        self.transition(PipelineState::RefiningText);
        let record = match self.refiner.refine(prompt).await {
            Ok(record) => record,
            Err(e) => {
                let e = PipelineError::Upstream(e);
                self.fail(&e);
                return Err(e);
            }
        };
        log::info!("pipeline: record ready for {:?}", record.name);
        self.emit(PipelineEvent::RecordReady(record.clone()));

        // ── 2. Portrait ──────────────────────────────────────────────────
        self.transition(PipelineState::SynthesizingImage);
        let image = self.images.synthesize(&record).await;
        let image_stage_failed = image.origin() != ImageOrigin::Remote;
        if image_stage_failed {
            log::warn!("pipeline: using {} portrait", image.origin().label());
        }
        self.emit(PipelineEvent::ImageReady {
            origin: image.origin(),
        });

        // ── 3. Voice ─────────────────────────────────────────────────────
        self.transition(PipelineState::SynthesizingVoice);
        let voice = match self.voices.synthesize(&record).await {
            Ok(voice) => {
                self.emit(PipelineEvent::VoiceReady);
                Some(voice)
            }
            Err(e) => {
                log::warn!("pipeline: voice stage failed ({e}), continuing without voice");
                self.emit(PipelineEvent::VoiceSkipped {
                    reason: e.to_string(),
                });
                None
            }
        };

        self.transition(PipelineState::Complete);
        Ok(GenerationResult {
            voice_stage_failed: voice.is_none(),
            record,
            image,
            voice,
            image_stage_failed,
        })
    }

    // -----------------------------------------------------------------------
    // Point operations
    // -----------------------------------------------------------------------

    /// Produce a new portrait for `record`.  Never fails once started.
    pub async fn regenerate_image(
        &self,
        record: &CharacterRecord,
    ) -> Result<ImageHandle, PipelineError> {
        let _guard = BusyGuard::acquire(&self.guards.image, "portrait regeneration")?;
        if self.credentials.gemini().is_none() {
            return Err(PipelineError::Precondition("Gemini API key is not set".into()));
        }
        Ok(self.images.synthesize(record).await)
    }

    /// Produce a new voice line for `record`.
    pub async fn regenerate_voice(
        &self,
        record: &CharacterRecord,
    ) -> Result<VoiceHandle, PipelineError> {
        let _guard = BusyGuard::acquire(&self.guards.voice, "voice regeneration")?;
        self.require_sound_key()?;
        Ok(self.voices.synthesize(record).await?)
    }

    /// Produce the ambient loop for `record`'s location.
    pub async fn generate_ambient(
        &self,
        record: &CharacterRecord,
    ) -> Result<VoiceHandle, PipelineError> {
        let _guard = BusyGuard::acquire(&self.guards.ambient, "ambient sound")?;
        self.require_sound_key()?;
        Ok(self.voices.ambient(record).await?)
    }

    /// Produce a narrated introduction of `record`.
    pub async fn generate_narration(
        &self,
        record: &CharacterRecord,
    ) -> Result<VoiceHandle, PipelineError> {
        let _guard = BusyGuard::acquire(&self.guards.narration, "narration")?;
        self.require_sound_key()?;
        Ok(self.voices.narration(record).await?)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_all_keys(&self) -> Result<(), PipelineError> {
        let mut missing = Vec::new();
        if self.credentials.gemini().is_none() {
            missing.push(Credentials::GEMINI_ENV);
        }
        if self.credentials.elevenlabs().is_none() {
            missing.push(Credentials::ELEVENLABS_ENV);
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Precondition(format!("{} not set", missing.join(", "))))
        }
    }

    fn require_sound_key(&self) -> Result<(), PipelineError> {
        match self.credentials.elevenlabs() {
            Some(_) => Ok(()),
            None => Err(PipelineError::Precondition("ElevenLabs API key is not set".into())),
        }
    }

    fn transition(&self, next: PipelineState) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            log::debug!("pipeline: {:?} → {:?}", *state, next);
            *state = next;
        }
        self.emit(PipelineEvent::StateChanged(next));
    }

    fn fail(&self, error: &PipelineError) {
        log::error!("pipeline: {error}");
        self.transition(PipelineState::Failed);
        self.emit(PipelineEvent::Failed {
            message: error.to_string(),
        });
    }

    /// Best-effort send; a full or closed channel never stalls the pipeline.
    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.try_send(event) {
                log::debug!("pipeline: event dropped ({e})");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
