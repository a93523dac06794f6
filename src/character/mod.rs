//! Character records and their validation.
//!
//! * [`CharacterRecord`] / [`Gender`] — the canonical profile produced by the
//!   text stage and consumed by image/voice synthesis and the session store.
//! * [`SchemaFiller`] — turns a loose JSON object into a complete record.
//! * [`infer_gender`] — pure keyword heuristic used when gender is missing.

pub mod gender;
pub mod record;
pub mod schema;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use gender::infer_gender;
pub use record::{CharacterRecord, Gender};
pub use schema::{SchemaFiller, REQUIRED_FIELDS};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{CharacterRecord, Gender};

    /// A complete record for tests that do not care about its content.
    pub(crate) fn sample() -> CharacterRecord {
        CharacterRecord {
            name: "Seraphina Vale".into(),
            gender: Gender::Female,
            race: "Half-Elf".into(),
            class: "Bard".into(),
            age: "Young adult".into(),
            alignment: "Chaotic Good".into(),
            description: "A lithe figure in travelling leathers.".into(),
            background: "Raised among wandering players.".into(),
            personality: "Witty, restless".into(),
            quote: "Every tavern has a song, if you listen.".into(),
            image_prompt: "half-elf bard with a lute".into(),
            location: "tavern".into(),
        }
    }

    /// Same as [`sample`] with a different name.
    pub(crate) fn named(name: &str) -> CharacterRecord {
        CharacterRecord {
            name: name.into(),
            ..sample()
        }
    }
}
