//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Opaque API keys for the two provider families.
///
/// The Gemini key covers both text and image generation; the ElevenLabs key
/// covers sound generation.  Empty strings count as absent.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Key for the text + image provider.
    pub gemini_api_key: Option<String>,
    /// Key for the sound-effect provider.
    pub elevenlabs_api_key: Option<String>,
}

impl Credentials {
    /// Environment variable that overrides [`Credentials::gemini_api_key`].
    pub const GEMINI_ENV: &'static str = "GEMINI_API_KEY";
    /// Environment variable that overrides [`Credentials::elevenlabs_api_key`].
    pub const ELEVENLABS_ENV: &'static str = "ELEVENLABS_API_KEY";

    /// Build from explicit key values.
    pub fn new(gemini: impl Into<String>, elevenlabs: impl Into<String>) -> Self {
        Self {
            gemini_api_key: Some(gemini.into()),
            elevenlabs_api_key: Some(elevenlabs.into()),
        }
    }

    /// The Gemini key, if configured and non-empty.
    pub fn gemini(&self) -> Option<&str> {
        non_empty(self.gemini_api_key.as_deref())
    }

    /// The ElevenLabs key, if configured and non-empty.
    pub fn elevenlabs(&self) -> Option<&str> {
        non_empty(self.elevenlabs_api_key.as_deref())
    }

    /// Returns `true` when both keys are present.
    pub fn is_complete(&self) -> bool {
        self.gemini().is_some() && self.elevenlabs().is_some()
    }

    /// Replace keys with values from the environment, where set.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(Self::GEMINI_ENV) {
            if !key.trim().is_empty() {
                self.gemini_api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var(Self::ELEVENLABS_ENV) {
            if !key.trim().is_empty() {
                self.elevenlabs_api_key = Some(key);
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: Option<&str>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("gemini_api_key", &mask(self.gemini()))
            .field("elevenlabs_api_key", &mask(self.elevenlabs()))
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// TextConfig
// ---------------------------------------------------------------------------

/// Settings for the structured-text generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// Model identifier used in the `:generateContent` path.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Top-k sampling cut-off.
    pub top_k: u32,
    /// Nucleus sampling cut-off.
    pub top_p: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-2.0-flash-exp".into(),
            temperature: 0.9,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// ImageConfig
// ---------------------------------------------------------------------------

/// Settings for the portrait synthesis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// Model identifier used in the `:predict` path.
    pub model: String,
    /// Style descriptor appended to every portrait prompt.
    pub style: String,
    /// Number of samples requested (only the first is used).
    pub sample_count: u32,
    /// Aspect ratio, e.g. `"1:1"`.
    pub aspect_ratio: String,
    /// Requested edge length in pixels, as the API expects it (a string).
    pub sample_image_size: String,
    /// Whether the API should attach safety attributes to predictions.
    pub include_safety_attributes: bool,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: "imagen-3.0-generate-002".into(),
            style: "fantasy character portrait, digital art style".into(),
            sample_count: 1,
            aspect_ratio: "1:1".into(),
            sample_image_size: "1024".into(),
            include_safety_attributes: false,
            timeout_secs: 90,
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Settings for the sound-effect generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Base URL of the ElevenLabs API.
    pub base_url: String,
    /// Length of the character voice line in seconds.
    pub duration_secs: f32,
    /// Length of the ambient loop in seconds.
    pub ambient_duration_secs: f32,
    /// Length of a narration clip in seconds.
    pub narration_duration_secs: f32,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            duration_secs: 5.0,
            ambient_duration_secs: 15.0,
            narration_duration_secs: 10.0,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings for the in-memory character roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of characters held at once.
    pub capacity: usize,
    /// Persist record data after every mutation.
    pub autosave: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            autosave: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use character_forge::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// assert_eq!(config.session.capacity, 10);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API keys.
    pub credentials: Credentials,
    /// Text-generation settings.
    pub text: TextConfig,
    /// Image-generation settings.
    pub image: ImageConfig,
    /// Sound-generation settings.
    pub voice: VoiceConfig,
    /// Roster settings.
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
