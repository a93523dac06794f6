//! Configuration module for character-forge.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each back-end,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, Credentials, ImageConfig, SessionConfig, TextConfig, VoiceConfig,
};
