//! Generation pipeline: prompt → record → portrait → voice.
//!
//! # Architecture
//!
//! ```text
//! CharacterForge::create(prompt)
//!        │
//!        ▼
//! PipelineOrchestrator::generate()
//!        │
//!        ├─ PromptRefiner::refine          → RefiningText
//!        ├─ ImageSynthesizer::synthesize   → SynthesizingImage
//!        ├─ VoiceSynthesizer::synthesize   → SynthesizingVoice
//!        └─ GenerationResult               → Complete
//!
//! PipelineEvent (mpsc) ───▶ any subscriber (CLI progress, UI)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use character_forge::config::Credentials;
//! use character_forge::llm::{GeminiTextGenerator, PromptRefiner};
//! use character_forge::pipeline::PipelineOrchestrator;
//! use character_forge::portrait::ImageSynthesizer;
//! use character_forge::voice::{ClipDurations, ElevenLabsSfx, VoiceSynthesizer};
//! use character_forge::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let text = GeminiTextGenerator::from_config(&config.text, "AIza...");
//!     let sound = ElevenLabsSfx::from_config(&config.voice, "sk_...");
//!
//!     // Portraits are rendered locally in this example.
//!     let orchestrator = PipelineOrchestrator::new(
//!         PromptRefiner::new(Arc::new(text)),
//!         ImageSynthesizer::offline(),
//!         VoiceSynthesizer::new(Arc::new(sound), ClipDurations::from(&config.voice)),
//!         Credentials::new("AIza...", "sk_..."),
//!     );
//!
//!     let result = orchestrator.generate("shy gnome alchemist").await.unwrap();
//!     println!("{} ({:?} portrait)", result.record.name, result.image.origin());
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{GenerationResult, PipelineError, PipelineOrchestrator};
pub use state::{PipelineEvent, PipelineState};
