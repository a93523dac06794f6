//! Sound prompts derived from a character record.
//!
//! The sound-effect back-end produces speech only when the words are quoted
//! literally, so [`voice_prompt`] always wraps the quote in `"` characters.

use crate::character::{CharacterRecord, Gender};

/// `gender age race class`, lower-cased and trimmed.
///
/// The gender token is left out for non-binary characters.  The age
/// qualifier is the first of `young`, `old` (also for "ancient") or
/// `middle aged` found in the age text.
pub fn voice_descriptor(record: &CharacterRecord) -> String {
    let mut descriptor = String::new();

    if record.gender != Gender::NonBinary {
        descriptor.push_str(record.gender.as_str());
        descriptor.push(' ');
    }

    let age = record.age.to_lowercase();
    if age.contains("young") {
        descriptor.push_str("young ");
    } else if age.contains("old") || age.contains("ancient") {
        descriptor.push_str("old ");
    } else if age.contains("middle") {
        descriptor.push_str("middle aged ");
    }

    descriptor.push_str(&record.race.to_lowercase());
    descriptor.push(' ');
    descriptor.push_str(&record.class.to_lowercase());
    descriptor.trim().to_string()
}

/// `speaking in the style of {descriptor} "{quote}"`
///
/// ```
/// use character_forge::llm::canned_record;
/// use character_forge::voice::voice_prompt;
///
/// assert_eq!(
///     voice_prompt(&canned_record()),
///     "speaking in the style of male dwarf warrior \"By my beard, justice will prevail!\""
/// );
/// ```
pub fn voice_prompt(record: &CharacterRecord) -> String {
    format!(
        "speaking in the style of {} \"{}\"",
        voice_descriptor(record),
        record.quote
    )
}

/// Background ambience for the place the character is usually found.
pub fn ambient_prompt(record: &CharacterRecord) -> String {
    format!(
        "ambient background sounds of a fantasy {}, atmospheric, immersive, no speech",
        record.location.trim().to_lowercase()
    )
}

/// A storyteller introducing the character.
pub fn narration_prompt(record: &CharacterRecord) -> String {
    format!(
        "deep dramatic storyteller voice narrating \"Behold {}, the {} {}. {}\"",
        record.name,
        record.race.to_lowercase(),
        record.class.to_lowercase(),
        record.description
    )
}
