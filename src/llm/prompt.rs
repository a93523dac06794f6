//! Prompt builder for the character-refinement call.
//!
//! The text model receives a single composed prompt: the user's concept, a
//! JSON template listing every field of a
//! [`CharacterRecord`](crate::character::CharacterRecord), and a short
//! closing instruction.  The field names in the template are the wire names
//! [`SchemaFiller`](crate::character::SchemaFiller) reads back.

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

const PROFILE_TEMPLATE: &str = r#"{
    "name": "A unique fantasy name",
    "gender": "The character's gender (male, female, or non-binary)",
    "race": "The character's race",
    "class": "The character's class/profession",
    "age": "Their age",
    "alignment": "Their moral alignment",
    "description": "A vivid physical description (2-3 sentences)",
    "background": "A brief background story (2-3 sentences)",
    "personality": "Key personality traits",
    "quote": "A characteristic quote they might say (max 10 words)",
    "imagePrompt": "A detailed prompt for generating their portrait image, focusing on appearance, clothing, expression, and fantasy art style",
    "location": "The kind of place they are usually found, in one or two words (e.g. tavern, forest, forge)"
}"#;

const CLOSING_INSTRUCTION: &str =
    "Make it creative and engaging. The quote should capture their essence. \
     Reply with the JSON object only.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the refinement prompt for a user concept.
///
/// # Example
/// ```rust
/// use character_forge::llm::PromptBuilder;
///
/// let prompt = PromptBuilder::new().build("grizzled dwarf blacksmith");
/// assert!(prompt.contains("\"grizzled dwarf blacksmith\""));
/// assert!(prompt.contains("\"imagePrompt\""));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Compose the full prompt around `concept`.
    ///
    /// Double quotes inside the concept are replaced with single quotes so
    /// the concept cannot close its own quotation early.
    pub fn build(&self, concept: &str) -> String {
        let concept = concept.trim().replace('"', "'");
        let mut prompt = String::with_capacity(1024);
        prompt.push_str(&format!("Based on this character concept: \"{concept}\"\n\n"));
        prompt.push_str(
            "Create a detailed fantasy character profile with the following information in JSON format:\n",
        );
        prompt.push_str(PROFILE_TEMPLATE);
        prompt.push_str("\n\n");
        prompt.push_str(CLOSING_INSTRUCTION);
        prompt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
