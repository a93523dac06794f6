//! Bounded, ordered roster of generated characters.
//!
//! The store is the only session-wide mutable state.  It enforces:
//!
//! * `len() <= capacity()` at all times; a full store rejects `add` without
//!   changing anything;
//! * the selection, when present, always points at an existing entry;
//! * entry ids are unique and strictly increasing, and are never reused after
//!   a delete.

use std::time::{SystemTime, UNIX_EPOCH};

use super::persist::PersistedEntry;
use super::SessionError;
use crate::character::{CharacterRecord, SchemaFiller};
use crate::media::{ImageHandle, VoiceHandle};
use crate::pipeline::GenerationResult;

/// Default roster size.
pub const DEFAULT_CAPACITY: usize = 10;

/// Largest id accepted from a session file (2^53, the largest integer a
/// JSON number carries exactly).
pub const MAX_ENTRY_ID: u64 = 1 << 53;

// ---------------------------------------------------------------------------
// SessionEntry
// ---------------------------------------------------------------------------

/// One character with whatever media has been produced for it.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub id: u64,
    pub record: CharacterRecord,
    pub image: Option<ImageHandle>,
    pub voice: Option<VoiceHandle>,
    pub ambient: Option<VoiceHandle>,
    pub narration: Option<VoiceHandle>,
}

impl SessionEntry {
    fn new(id: u64, record: CharacterRecord) -> Self {
        Self {
            id,
            record,
            image: None,
            voice: None,
            ambient: None,
            narration: None,
        }
    }

    /// `true` when the portrait is missing, e.g. after a restore.
    pub fn needs_media(&self) -> bool {
        self.image.is_none()
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// The roster plus its selection pointer.
#[derive(Debug)]
pub struct SessionStore {
    entries: Vec<SessionEntry>,
    selected: Option<usize>,
    capacity: usize,
    last_id: u64,
    media_regeneration_required: bool,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SessionStore {
    /// An empty store holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.max(1)),
            selected: None,
            capacity: capacity.max(1),
            last_id: 0,
            media_regeneration_required: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&SessionEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    pub fn get(&self, id: u64) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// `true` after [`restore`](Self::restore) until every restored entry
    /// has a portrait again.
    pub fn media_regeneration_required(&self) -> bool {
        self.media_regeneration_required
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append a generation result and select it.
    ///
    /// # Errors
    /// [`SessionError::Capacity`] when the store is full; the store is left
    /// unchanged.
    pub fn add(&mut self, result: GenerationResult) -> Result<u64, SessionError> {
        if self.is_full() {
            return Err(SessionError::Capacity {
                capacity: self.capacity,
            });
        }
        let id = self.next_id();
        let mut entry = SessionEntry::new(id, result.record);
        entry.image = Some(result.image);
        entry.voice = result.voice;
        self.entries.push(entry);
        self.selected = Some(self.entries.len() - 1);
        log::debug!("session: added entry {id} ({} of {})", self.len(), self.capacity);
        Ok(id)
    }

    /// Point the selection at `index`.
    pub fn select(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.entries.len() {
            return Err(SessionError::Range {
                index,
                len: self.entries.len(),
            });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Remove the entry at `index` and return it.
    ///
    /// If it was selected, the previous entry (or the new first entry) is
    /// selected instead; the selection is cleared when the store empties.
    pub fn delete(&mut self, index: usize) -> Result<SessionEntry, SessionError> {
        if index >= self.entries.len() {
            return Err(SessionError::Range {
                index,
                len: self.entries.len(),
            });
        }
        let removed = self.entries.remove(index);

        self.selected = match self.selected {
            _ if self.entries.is_empty() => None,
            Some(sel) if sel == index => Some(index.saturating_sub(1)),
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };
        log::debug!("session: deleted entry {}", removed.id);
        self.refresh_media_flag();
        Ok(removed)
    }

    /// Replace the selected record's quote.  No other field changes.
    pub fn edit_quote(&mut self, quote: &str) -> Result<(), SessionError> {
        let quote = quote.trim();
        if quote.is_empty() {
            return Err(SessionError::Validation("quote must not be empty".into()));
        }
        let index = self.selected.ok_or(SessionError::NoSelection)?;
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(SessionError::NoSelection)?;
        entry.record.quote = quote.to_string();
        Ok(())
    }

    /// Attach a portrait to entry `id`.  Returns `false` if it no longer exists.
    pub fn attach_image(&mut self, id: u64, image: ImageHandle) -> bool {
        let attached = self.with_entry(id, |e| e.image = Some(image));
        self.refresh_media_flag();
        attached
    }

    /// Attach a voice line to entry `id`.  Returns `false` if it no longer exists.
    pub fn attach_voice(&mut self, id: u64, voice: VoiceHandle) -> bool {
        self.with_entry(id, |e| e.voice = Some(voice))
    }

    pub fn attach_ambient(&mut self, id: u64, ambient: VoiceHandle) -> bool {
        self.with_entry(id, |e| e.ambient = Some(ambient))
    }

    pub fn attach_narration(&mut self, id: u64, narration: VoiceHandle) -> bool {
        self.with_entry(id, |e| e.narration = Some(narration))
    }

    // -----------------------------------------------------------------------
    // Persistence boundary
    // -----------------------------------------------------------------------

    /// Records and ids only; media is never serialised.
    pub fn serialize(&self) -> Vec<PersistedEntry> {
        self.entries
            .iter()
            .map(|e| PersistedEntry {
                data: e.record.clone(),
                id: e.id,
            })
            .collect()
    }

    /// Replace the contents with persisted records.
    ///
    /// Records are re-checked with [`SchemaFiller`] so blank fields get
    /// their defaults.  Entries beyond capacity, repeated ids and ids above
    /// [`MAX_ENTRY_ID`] are dropped.  Restored entries have no media, so
    /// [`media_regeneration_required`] is set when any were loaded.  The most
    /// recent entry is selected.
    ///
    /// [`media_regeneration_required`]: Self::media_regeneration_required
    pub fn restore(&mut self, persisted: Vec<PersistedEntry>) {
        self.entries.clear();
        self.selected = None;

        let filler = SchemaFiller::new();
        for item in persisted {
            if self.is_full() {
                log::warn!("session: persisted roster exceeds capacity, dropping the rest");
                break;
            }
            if self.entries.iter().any(|e| e.id == item.id) {
                log::warn!("session: skipping duplicate id {}", item.id);
                continue;
            }
            if item.id > MAX_ENTRY_ID {
                log::warn!("session: skipping out-of-range id {}", item.id);
                continue;
            }
            self.entries.push(SessionEntry::new(item.id, filler.complete(item.data)));
        }

        self.last_id = self.entries.iter().map(|e| e.id).max().unwrap_or(self.last_id);
        if !self.entries.is_empty() {
            self.selected = Some(self.entries.len() - 1);
        }
        self.media_regeneration_required = !self.entries.is_empty();
        log::info!("session: restored {} entries", self.entries.len());
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Creation time in milliseconds, bumped past the last id if the clock
    /// has not moved or went backwards.
    fn next_id(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.last_id = now.max(self.last_id.saturating_add(1));
        self.last_id
    }

    fn with_entry(&mut self, id: u64, f: impl FnOnce(&mut SessionEntry)) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                f(entry);
                true
            }
            None => {
                log::debug!("session: entry {id} is gone, dropping media");
                false
            }
        }
    }

    fn refresh_media_flag(&mut self) {
        if self.media_regeneration_required {
            self.media_regeneration_required = self.entries.iter().any(SessionEntry::needs_media);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
