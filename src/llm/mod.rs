//! Text stage: structured character generation.
//!
//! This module provides:
//! * [`TextGenerator`] — async trait implemented by text back-ends.
//! * [`GeminiTextGenerator`] — Gemini `generateContent` client.
//! * [`PromptBuilder`] — composes the refinement prompt.
//! * [`TextExtractor`] / [`ParseError`] — JSON-object recovery from prose.
//! * [`PromptRefiner`] — prompt → record, with the canned fallback.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use character_forge::config::AppConfig;
//! use character_forge::llm::{GeminiTextGenerator, PromptRefiner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let generator = GeminiTextGenerator::from_config(&config.text, "AIza...");
//!     let refiner = PromptRefiner::new(Arc::new(generator));
//!
//!     let record = refiner.refine("grizzled dwarf blacksmith").await.unwrap();
//!     println!("{} the {}", record.name, record.class);
//! }
//! ```

pub mod client;
pub mod extract;
pub mod fallback;
pub mod prompt;
pub mod refiner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{GeminiTextGenerator, TextGenerator};
pub use extract::{ParseError, TextExtractor};
pub use fallback::canned_record;
pub use prompt::PromptBuilder;
pub use refiner::{PromptRefiner, RecordSource};
