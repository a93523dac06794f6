//! Audio stage: voice line, ambient loop and narration.
//!
//! All three clips come from the same [`SoundGenerator`]; they differ only
//! in prompt and duration.

pub mod client;
pub mod prompt;
pub mod synthesizer;

pub use client::{ElevenLabsSfx, SoundGenerator};
pub use prompt::{ambient_prompt, narration_prompt, voice_descriptor, voice_prompt};
pub use synthesizer::{ClipDurations, VoiceSynthesizer};
