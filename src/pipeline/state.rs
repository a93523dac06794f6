//! Pipeline state machine and the events the orchestrator emits.
//!
//! [`PipelineState`] tracks where a create request is.  Every transition is
//! also published as a [`PipelineEvent::StateChanged`] so a front-end can
//! follow progress without polling.

use crate::character::CharacterRecord;
use crate::media::ImageOrigin;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// States of the create pipeline.
///
/// ```text
/// Idle ──generate──▶ RefiningText ──record──▶ SynthesizingImage
///                         │                          │
///                     text failed                 (never fails)
///                         ▼                          ▼
///                       Failed               SynthesizingVoice ──▶ Complete
///
/// missing credentials ──▶ Failed
/// Complete / Failed ──next generate──▶ RefiningText
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// No create request has run yet.
    #[default]
    Idle,

    /// Waiting for the text back-end; the record does not exist yet.
    RefiningText,

    /// The record is complete; the portrait is being produced.
    SynthesizingImage,

    /// The portrait is ready; the voice line is being requested.
    SynthesizingVoice,

    /// A result was produced, possibly without a voice line.
    Complete,

    /// The request stopped before a record was produced.
    Failed,
}

impl PipelineState {
    /// Returns `true` while a create request is in flight.
    ///
    /// ```
    /// use character_forge::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::RefiningText.is_busy());
    /// assert!(PipelineState::SynthesizingImage.is_busy());
    /// assert!(PipelineState::SynthesizingVoice.is_busy());
    /// assert!(!PipelineState::Complete.is_busy());
    /// assert!(!PipelineState::Failed.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::RefiningText
                | PipelineState::SynthesizingImage
                | PipelineState::SynthesizingVoice
        )
    }

    /// A short human-readable label for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::RefiningText => "Forging character",
            PipelineState::SynthesizingImage => "Painting portrait",
            PipelineState::SynthesizingVoice => "Finding their voice",
            PipelineState::Complete => "Done",
            PipelineState::Failed => "Failed",
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineEvent
// ---------------------------------------------------------------------------

/// Progress notifications from [`PipelineOrchestrator`](super::PipelineOrchestrator).
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StateChanged(PipelineState),
    /// The text stage produced a complete record.
    RecordReady(CharacterRecord),
    ImageReady { origin: ImageOrigin },
    VoiceReady,
    /// The voice stage failed; the result carries no voice line.
    VoiceSkipped { reason: String },
    /// The request failed before producing a result.
    Failed { message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
