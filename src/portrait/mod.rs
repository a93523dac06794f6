//! Portrait stage: remote image synthesis with a deterministic fallback.
//!
//! * [`ImageGenerator`] / [`ImagenGenerator`] — the remote back-end.
//! * [`placeholder`] — name-seeded PNG renderer.
//! * [`ImageSynthesizer`] — ordered [`ImageStrategy`] list ending in a
//!   static glyph, so portrait synthesis never fails.

pub mod client;
mod glyphs;
pub mod placeholder;
pub mod synthesizer;

pub use client::{ImageGenerator, ImagenGenerator};
pub use placeholder::{PlaceholderError, Palette, PALETTE};
pub use synthesizer::{
    build_prompt, static_glyph, Attempt, ImageStrategy, ImageSynthesizer, PlaceholderStrategy,
    RemoteStrategy,
};
