//! Character Forge: turn a one-line concept into a fantasy character with a
//! structured profile, a portrait and a voice line.
//!
//! See [`app::CharacterForge`] for the controller and [`pipeline`] for the
//! generation stages.

pub mod app;
pub mod character;
pub mod config;
pub mod http;
pub mod llm;
pub mod media;
pub mod pipeline;
pub mod playback;
pub mod portrait;
pub mod session;
pub mod voice;

#[cfg(test)]
mod testing;
