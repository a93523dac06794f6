//! Image stage of the pipeline: an ordered strategy list that never fails.
//!
//! ```text
//! RemoteStrategy ──TryNext──▶ PlaceholderStrategy ──TryNext──▶ static glyph
//! ```
//!
//! Each [`ImageStrategy`] either produces a handle or explains why the next
//! one should be tried.  The terminal static glyph is not a strategy; it is
//! a constant, so [`ImageSynthesizer::synthesize`] always returns a handle.

use std::sync::Arc;

use async_trait::async_trait;

use super::client::ImageGenerator;
use super::placeholder;
use crate::character::CharacterRecord;
use crate::media::{ImageHandle, ImageOrigin};

/// Qualifiers appended to every remote image prompt.
const QUALITY_QUALIFIERS: &str = "detailed, atmospheric lighting, high quality";

/// Last-resort portrait: a brown square with a gold question mark.
const STATIC_GLYPH_SVG: &str = r##"<svg width="400" height="400" xmlns="http://www.w3.org/2000/svg">
<rect width="400" height="400" fill="#8B4513"/>
<text x="200" y="200" font-family="Arial" font-size="120" fill="#D4AF37" text-anchor="middle" dominant-baseline="middle">?</text>
</svg>
"##;

/// The static single-glyph image.
pub fn static_glyph() -> ImageHandle {
    ImageHandle::new(
        STATIC_GLYPH_SVG.as_bytes().to_vec(),
        "image/svg+xml",
        ImageOrigin::Static,
    )
}

/// Full remote prompt: the record's image prompt, the style descriptor and
/// the quality qualifiers.
///
/// ```
/// use character_forge::portrait::synthesizer::build_prompt;
///
/// let prompt = build_prompt("elf archer", "fantasy character portrait, digital art style");
/// assert_eq!(
///     prompt,
///     "elf archer, fantasy character portrait, digital art style, \
///      detailed, atmospheric lighting, high quality"
/// );
/// ```
pub fn build_prompt(image_prompt: &str, style: &str) -> String {
    let style = style.trim();
    if style.is_empty() {
        format!("{}, {QUALITY_QUALIFIERS}", image_prompt.trim())
    } else {
        format!("{}, {style}, {QUALITY_QUALIFIERS}", image_prompt.trim())
    }
}

// ---------------------------------------------------------------------------
// ImageStrategy
// ---------------------------------------------------------------------------

/// Outcome of one strategy.
#[derive(Debug)]
pub enum Attempt {
    Produced(ImageHandle),
    /// Skip to the next strategy, with a reason for the log.
    TryNext(String),
}

/// One way of producing a portrait for a record.
#[async_trait]
pub trait ImageStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, record: &CharacterRecord) -> Attempt;
}

/// Ask the image back-end.
pub struct RemoteStrategy {
    generator: Arc<dyn ImageGenerator>,
    style: String,
}

impl RemoteStrategy {
    pub fn new(generator: Arc<dyn ImageGenerator>, style: impl Into<String>) -> Self {
        Self {
            generator,
            style: style.into(),
        }
    }
}

#[async_trait]
impl ImageStrategy for RemoteStrategy {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn attempt(&self, record: &CharacterRecord) -> Attempt {
        let prompt = build_prompt(&record.image_prompt, &self.style);
        let bytes = match self.generator.generate(&prompt).await {
            Ok(bytes) => bytes,
            Err(e) => return Attempt::TryNext(e.to_string()),
        };
        match image::guess_format(&bytes) {
            Ok(format) => Attempt::Produced(ImageHandle::new(
                bytes,
                format.to_mime_type(),
                ImageOrigin::Remote,
            )),
            Err(_) => Attempt::TryNext(format!("unrecognised image payload ({} bytes)", bytes.len())),
        }
    }
}

/// Render the deterministic placeholder from the record's name.
pub struct PlaceholderStrategy;

#[async_trait]
impl ImageStrategy for PlaceholderStrategy {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn attempt(&self, record: &CharacterRecord) -> Attempt {
        match placeholder::render_png(&record.name) {
            Ok(png) => Attempt::Produced(ImageHandle::new(png, "image/png", ImageOrigin::Placeholder)),
            Err(e) => Attempt::TryNext(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// ImageSynthesizer
// ---------------------------------------------------------------------------

/// Runs the strategies in order and falls back to [`static_glyph`].
pub struct ImageSynthesizer {
    strategies: Vec<Box<dyn ImageStrategy>>,
}

impl ImageSynthesizer {
    /// Remote back-end first, then the placeholder.
    pub fn new(generator: Arc<dyn ImageGenerator>, style: impl Into<String>) -> Self {
        Self::with_strategies(vec![
            Box::new(RemoteStrategy::new(generator, style)),
            Box::new(PlaceholderStrategy),
        ])
    }

    /// Placeholder only; no network.
    pub fn offline() -> Self {
        Self::with_strategies(vec![Box::new(PlaceholderStrategy)])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ImageStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn synthesize(&self, record: &CharacterRecord) -> ImageHandle {
        for strategy in &self.strategies {
            match strategy.attempt(record).await {
                Attempt::Produced(handle) => {
                    log::debug!("image: {} strategy produced {:?}", strategy.name(), handle);
                    return handle;
                }
                Attempt::TryNext(reason) => {
                    log::warn!("image: {} strategy failed ({reason}), trying next", strategy.name());
                }
            }
        }
        log::warn!("image: all strategies failed, using static glyph");
        static_glyph()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
