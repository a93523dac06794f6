//! Canned character used when the text model's output cannot be parsed.
//!
//! A confused back-end should not stop the pipeline, so
//! [`PromptRefiner`](crate::llm::PromptRefiner) substitutes this complete
//! profile instead of surfacing a parse error.  It already satisfies every
//! field default, so passing it through the schema filler leaves it unchanged.

use crate::character::{CharacterRecord, Gender};

/// The fallback profile: Grimbold Ironforge, dwarf warrior.
pub fn canned_record() -> CharacterRecord {
    CharacterRecord {
        name: "Grimbold Ironforge".into(),
        gender: Gender::Male,
        race: "Dwarf".into(),
        class: "Warrior".into(),
        age: "147 years".into(),
        alignment: "Lawful Good".into(),
        description: "A stout dwarf with a magnificent braided beard, wearing battle-worn armor. \
                      His eyes gleam with determination beneath bushy eyebrows."
            .into(),
        background: "Once a master blacksmith, Grimbold took up arms to defend his clan's \
                     mountain hold. He now wanders the realm, seeking to right wrongs with his \
                     ancestral warhammer."
            .into(),
        personality: "Gruff but kind-hearted, values honor and loyalty above all".into(),
        quote: "By my beard, justice will prevail!".into(),
        image_prompt: "Grizzled dwarf warrior with braided beard, battle-worn armor, holding a \
                       warhammer, determined expression, fantasy art style"
            .into(),
        location: "tavern".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{SchemaFiller, REQUIRED_FIELDS};

    #[test]
    fn canned_record_is_complete() {
        let value = serde_json::to_value(canned_record()).unwrap();
        for field in REQUIRED_FIELDS {
            let text = value[field].as_str().unwrap_or_default();
            assert!(!text.is_empty(), "{field} must be set");
        }
    }

    #[test]
    fn schema_filler_leaves_canned_record_unchanged() {
        let value = serde_json::to_value(canned_record()).unwrap();
        let refilled = SchemaFiller::new().fill(value.as_object().unwrap());
        assert_eq!(refilled, canned_record());
    }

    #[test]
    fn canned_initials_are_gi() {
        assert_eq!(canned_record().initials(), "GI");
    }

    #[test]
    fn line_continuations_keep_single_spaces() {
        let record = canned_record();
        assert!(!record.description.contains("  "));
        assert!(record.description.contains("armor. His eyes"));
    }
}
