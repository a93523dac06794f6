//! Session roster: bounded character collection, selection and persistence.
//!
//! * [`SessionStore`] — in-memory roster (capacity 10 by default).
//! * [`persist`] — JSON save/load of the record-only form.

pub mod persist;
pub mod store;

use thiserror::Error;

pub use persist::{LoadedSession, PersistedEntry};
pub use store::{SessionEntry, SessionStore, DEFAULT_CAPACITY, MAX_ENTRY_ID};

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Errors returned by roster operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The roster is full.
    #[error("roster is full ({capacity} characters); delete one first")]
    Capacity { capacity: usize },

    /// An index did not name an entry.
    #[error("no character at index {index} (roster has {len})")]
    Range { index: usize, len: usize },

    /// Rejected user input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The operation needs a selected character.
    #[error("no character is selected")]
    NoSelection,

    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}
