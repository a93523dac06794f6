//! Normalises a loosely-shaped JSON object into a complete [`CharacterRecord`].
//!
//! Model output is unreliable: fields go missing, come back empty, or arrive
//! as numbers and lists.  [`SchemaFiller`] never fails; every required field
//! that is absent or falsy is replaced by its default, and `gender` is
//! inferred from the text when the model did not give a usable value.

use serde_json::{Map, Value};

use super::gender::infer_gender;
use super::record::{CharacterRecord, Gender};

/// Field names every record must carry, in the order they are filled.
pub const REQUIRED_FIELDS: [&str; 12] = [
    "name",
    "gender",
    "race",
    "class",
    "age",
    "alignment",
    "description",
    "background",
    "personality",
    "quote",
    "imagePrompt",
    "location",
];

/// Default for a missing `name`.
pub const DEFAULT_NAME: &str = "Unknown Hero";
/// Default for a missing `location`.
pub const DEFAULT_LOCATION: &str = "tavern";
/// Default for every other missing text field.
pub const DEFAULT_TEXT: &str = "Unknown";

// ---------------------------------------------------------------------------
// SchemaFiller
// ---------------------------------------------------------------------------

/// Builds complete records from raw model objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaFiller;

impl SchemaFiller {
    pub fn new() -> Self {
        Self
    }

    /// Fill `raw` into a record, backfilling defaults.
    ///
    /// ```
    /// use character_forge::character::{Gender, SchemaFiller};
    ///
    /// let raw = serde_json::json!({ "race": "Dwarf" });
    /// let record = SchemaFiller::new().fill(raw.as_object().unwrap());
    ///
    /// assert_eq!(record.name, "Unknown Hero");
    /// assert_eq!(record.race, "Dwarf");
    /// assert_eq!(record.location, "tavern");
    /// assert_eq!(record.gender, Gender::NonBinary);
    /// ```
    pub fn fill(&self, raw: &Map<String, Value>) -> CharacterRecord {
        let text = |field: &str| field_text(raw.get(field));
        let or_unknown = |field: &str| text(field).unwrap_or_else(|| DEFAULT_TEXT.to_string());

        let name = text("name").unwrap_or_else(|| DEFAULT_NAME.to_string());

        let gender = match text("gender").as_deref().and_then(Gender::parse) {
            Some(g) => g,
            None => {
                let description = text("description").unwrap_or_default();
                let background = text("background").unwrap_or_default();
                let inferred = infer_gender(&name, &description, &background);
                log::debug!("schema: gender missing or unrecognised, inferred {inferred}");
                inferred
            }
        };

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| text(*f).is_none())
            .collect();
        if !missing.is_empty() {
            log::debug!("schema: backfilled fields {missing:?}");
        }

        CharacterRecord {
            name,
            gender,
            race: or_unknown("race"),
            class: or_unknown("class"),
            age: or_unknown("age"),
            alignment: or_unknown("alignment"),
            description: or_unknown("description"),
            background: or_unknown("background"),
            personality: or_unknown("personality"),
            quote: or_unknown("quote"),
            image_prompt: or_unknown("imagePrompt"),
            location: text("location").unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        }
    }

    /// Re-check a typed record, e.g. one read back from disk, and backfill
    /// any blank fields.  A complete record comes back unchanged apart from
    /// surrounding whitespace.
    pub fn complete(&self, record: CharacterRecord) -> CharacterRecord {
        match serde_json::to_value(&record) {
            Ok(Value::Object(map)) => self.fill(&map),
            _ => record,
        }
    }
}

/// Truthy text of a JSON value, or `None` when it should be defaulted.
///
/// Strings are trimmed; numbers other than zero are kept in their JSON form;
/// lists of scalars are joined with `", "`.  `null`, booleans, objects, `0`
/// and blank strings all count as missing.
fn field_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if n.as_f64() == Some(0.0) {
                return None;
            }
            n.to_string()
        }
        Value::Array(items) => items
            .iter()
            .filter_map(|item| field_text(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Bool(_) | Value::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
