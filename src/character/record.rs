//! The canonical character record and its gender enum.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Gender of a character, serialised as `"male"`, `"female"` or
/// `"non-binary"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
}

impl Gender {
    /// Lenient parse of a model-supplied gender string.
    ///
    /// Returns `None` for anything that is not clearly one of the three
    /// values (e.g. `"unknown"`, `"mysterious"`), so the caller can fall back
    /// to the inference heuristic.
    ///
    /// ```
    /// use character_forge::character::Gender;
    ///
    /// assert_eq!(Gender::parse(" Female "), Some(Gender::Female));
    /// assert_eq!(Gender::parse("nonbinary"), Some(Gender::NonBinary));
    /// assert_eq!(Gender::parse("unknown"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" | "man" | "m" => Some(Self::Male),
            "female" | "woman" | "f" => Some(Self::Female),
            "non-binary" | "nonbinary" | "non binary" | "nb" | "enby" => Some(Self::NonBinary),
            _ => None,
        }
    }

    /// Lower-case wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::NonBinary => "non-binary",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CharacterRecord
// ---------------------------------------------------------------------------

/// A fully populated character profile.
///
/// Only [`SchemaFiller`](crate::character::SchemaFiller) and the canned
/// fallback construct records from model output, so every field is non-empty
/// by the time a record reaches image/voice synthesis or the session store.
/// The JSON form uses the camel-case names the text model is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub name: String,
    pub gender: Gender,
    pub race: String,
    pub class: String,
    pub age: String,
    pub alignment: String,
    pub description: String,
    pub background: String,
    pub personality: String,
    pub quote: String,
    pub image_prompt: String,
    pub location: String,
}

impl CharacterRecord {
    /// Up to two upper-case initials from the first words of the name.
    ///
    /// Returns `"?"` when the name is empty or the `"Unknown"` placeholder.
    ///
    /// ```
    /// use character_forge::character::CharacterRecord;
    ///
    /// assert_eq!(CharacterRecord::initials_of("Grimbold Ironforge"), "GI");
    /// assert_eq!(CharacterRecord::initials_of("Lyra of the Silver Wood"), "LO");
    /// assert_eq!(CharacterRecord::initials_of("Unknown"), "?");
    /// ```
    pub fn initials_of(name: &str) -> String {
        let name = name.trim();
        if name.is_empty() || name == "Unknown" {
            return "?".to_string();
        }
        let initials: String = name
            .split(' ')
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect();
        if initials.is_empty() {
            "?".to_string()
        } else {
            initials
        }
    }

    /// Initials of this record's name.
    pub fn initials(&self) -> String {
        Self::initials_of(&self.name)
    }

    /// Name reduced to `[A-Za-z0-9_]` for use in file names.
    pub fn file_stem(&self) -> String {
        crate::media::sanitize_file_stem(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::fixtures::sample;

    #[test]
    fn json_uses_camel_case_and_kebab_gender() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["imagePrompt"], "half-elf bard with a lute");
        assert_eq!(json["class"], "Bard");
        assert_eq!(json["gender"], "female");
        assert!(json.get("image_prompt").is_none());
    }

    #[test]
    fn non_binary_serialises_with_hyphen() {
        let mut rec = sample();
        rec.gender = Gender::NonBinary;
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["gender"], "non-binary");
    }

    #[test]
    fn initials_take_at_most_two_words() {
        assert_eq!(CharacterRecord::initials_of("anna bella carla"), "AB");
        assert_eq!(CharacterRecord::initials_of("Zed"), "Z");
        assert_eq!(CharacterRecord::initials_of(""), "?");
    }

    #[test]
    fn initials_skip_empty_words() {
        assert_eq!(CharacterRecord::initials_of("Grim  Iron"), "GI");
    }

    #[test]
    fn file_stem_replaces_non_alphanumerics() {
        let mut rec = sample();
        rec.name = "Grimbold Ironforge-the 2nd!".into();
        assert_eq!(rec.file_stem(), "Grimbold_Ironforge_the_2nd_");
    }

    #[test]
    fn gender_parse_rejects_unknown() {
        assert_eq!(Gender::parse("Male"), Some(Gender::Male));
        assert_eq!(Gender::parse("mysterious"), None);
        assert_eq!(Gender::parse(""), None);
    }
}
