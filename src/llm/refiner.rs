//! Turns a user concept into a complete [`CharacterRecord`].
//!
//! The refiner composes the prompt, calls the [`TextGenerator`], then runs
//! the answer through [`TextExtractor`] and [`SchemaFiller`].  Its failure
//! policy is asymmetric:
//!
//! * the call itself fails (transport, non-success status) → `Err`, the
//!   pipeline stops;
//! * the call succeeds but the text is unusable → the canned record from
//!   [`canned_record`], the pipeline continues.

use std::sync::Arc;

use crate::character::{CharacterRecord, SchemaFiller};
use crate::http::BackendError;
use crate::llm::client::TextGenerator;
use crate::llm::extract::TextExtractor;
use crate::llm::fallback::canned_record;
use crate::llm::prompt::PromptBuilder;

// ---------------------------------------------------------------------------
// RecordSource
// ---------------------------------------------------------------------------

/// Where a refined record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Parsed from the model's answer.
    Model,
    /// The model answered but its output could not be parsed.
    Canned,
}

// ---------------------------------------------------------------------------
// PromptRefiner
// ---------------------------------------------------------------------------

/// Text stage of the pipeline.
pub struct PromptRefiner {
    generator: Arc<dyn TextGenerator>,
    prompt: PromptBuilder,
    filler: SchemaFiller,
}

impl PromptRefiner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            prompt: PromptBuilder::new(),
            filler: SchemaFiller::new(),
        }
    }

    /// Refine `concept` into a record.
    pub async fn refine(&self, concept: &str) -> Result<CharacterRecord, BackendError> {
        self.refine_with_source(concept).await.map(|(record, _)| record)
    }

    /// Refine `concept`, also reporting whether the canned record was used.
    pub async fn refine_with_source(
        &self,
        concept: &str,
    ) -> Result<(CharacterRecord, RecordSource), BackendError> {
        let prompt = self.prompt.build(concept);

        let text = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(BackendError::EmptyResponse) => {
                log::warn!("refiner: back-end returned no text, using canned record");
                return Ok((canned_record(), RecordSource::Canned));
            }
            Err(e) => return Err(e),
        };

        match TextExtractor::extract(&text) {
            Ok(object) => Ok((self.filler.fill(&object), RecordSource::Model)),
            Err(e) => {
                log::warn!("refiner: {e}; using canned record");
                Ok((canned_record(), RecordSource::Canned))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
