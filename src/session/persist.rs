//! On-disk form of the roster: a JSON array of `{ "data": record, "id": n }`.
//!
//! Only records travel; portraits and audio are regenerated after a load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SessionError;
use crate::character::{CharacterRecord, SchemaFiller};

/// One persisted roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub data: CharacterRecord,
    pub id: u64,
}

/// Save to `path`, creating parent directories as needed.
pub fn save_to(path: &Path, entries: &[PersistedEntry]) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, content)?;
    log::debug!("session: saved {} entries to {}", entries.len(), path.display());
    Ok(())
}

/// Result of reading a session file.
#[derive(Debug, Default, PartialEq)]
pub struct LoadedSession {
    pub entries: Vec<PersistedEntry>,
    /// Entries that could not be used at all (no object `data`, bad `id`).
    pub skipped: usize,
}

/// Load from `path`.  A missing file is an empty roster.
///
/// Each record goes through [`SchemaFiller`], so older files with missing
/// or blank fields load with defaults.  Entries without usable `data` or
/// `id` are skipped and counted.  Only a file that is not a JSON array
/// fails as a whole.
pub fn load_from(path: &Path) -> Result<LoadedSession, SessionError> {
    if !path.exists() {
        return Ok(LoadedSession::default());
    }
    let content = std::fs::read_to_string(path)?;
    let raw: Vec<Value> = serde_json::from_str(&content)?;

    let filler = SchemaFiller::new();
    let mut loaded = LoadedSession::default();
    for (index, item) in raw.iter().enumerate() {
        match parse_entry(item, &filler) {
            Some(entry) => loaded.entries.push(entry),
            None => {
                log::warn!("session: entry {index} in {} is unusable, skipping", path.display());
                loaded.skipped += 1;
            }
        }
    }
    Ok(loaded)
}

fn parse_entry(item: &Value, filler: &SchemaFiller) -> Option<PersistedEntry> {
    let id = item.get("id")?.as_u64()?;
    let data = item.get("data")?.as_object()?;
    Some(PersistedEntry {
        data: filler.fill(data),
        id,
    })
}
