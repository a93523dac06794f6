//! In-memory media handles and export to disk.
//!
//! [`ImageHandle`] and [`VoiceHandle`] wrap their bytes in an `Arc<[u8]>`, so
//! cloning a handle into the session store, the playback transport, or an
//! export task shares the payload rather than copying it.  Handles are never
//! serialised; a restored session carries records only.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// ImageOrigin
// ---------------------------------------------------------------------------

/// Which image strategy produced a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Decoded from the image back-end's response.
    Remote,
    /// Rendered locally from the character's name.
    Placeholder,
    /// The fixed single-glyph image used when everything else failed.
    Static,
}

impl ImageOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            ImageOrigin::Remote => "remote",
            ImageOrigin::Placeholder => "placeholder",
            ImageOrigin::Static => "static",
        }
    }
}

// ---------------------------------------------------------------------------
// ImageHandle
// ---------------------------------------------------------------------------

/// Encoded image bytes plus their MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandle {
    bytes: Arc<[u8]>,
    mime: &'static str,
    origin: ImageOrigin,
}

impl ImageHandle {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: &'static str, origin: ImageOrigin) -> Self {
        Self {
            bytes: bytes.into(),
            mime,
            origin,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }

    /// `true` if both handles share the same allocation.
    pub fn shares_bytes_with(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("mime", &self.mime)
            .field("origin", &self.origin)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// VoiceHandle
// ---------------------------------------------------------------------------

/// Encoded audio bytes (MP3 from the sound back-end).
#[derive(Clone, PartialEq, Eq)]
pub struct VoiceHandle {
    bytes: Arc<[u8]>,
    mime: &'static str,
}

impl VoiceHandle {
    pub fn mp3(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: "audio/mpeg",
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn shares_bytes_with(&self, other: &VoiceHandle) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for VoiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceHandle")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Replace every character outside `[A-Za-z0-9]` with `_`.
///
/// ```
/// use character_forge::media::sanitize_file_stem;
///
/// assert_eq!(sanitize_file_stem("Grimbold Ironforge"), "Grimbold_Ironforge");
/// assert_eq!(sanitize_file_stem("Zoë d'Arc"), "Zo__d_Arc");
/// ```
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `<dir>/<Name>_voice.mp3`
pub fn voice_file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}_voice.mp3", sanitize_file_stem(name)))
}

/// `<dir>/<Name>_portrait.<ext>`
pub fn portrait_file_path(dir: &Path, name: &str, image: &ImageHandle) -> PathBuf {
    dir.join(format!(
        "{}_portrait.{}",
        sanitize_file_stem(name),
        image.extension()
    ))
}

/// Write the voice clip for `name` into `dir`, returning the path written.
pub fn export_voice(dir: &Path, name: &str, voice: &VoiceHandle) -> std::io::Result<PathBuf> {
    let path = voice_file_path(dir, name);
    std::fs::write(&path, voice.bytes())?;
    log::info!("media: wrote {}", path.display());
    Ok(path)
}

/// Write the portrait for `name` into `dir`, returning the path written.
pub fn export_portrait(dir: &Path, name: &str, image: &ImageHandle) -> std::io::Result<PathBuf> {
    let path = portrait_file_path(dir, name, image);
    std::fs::write(&path, image.bytes())?;
    log::info!("media: wrote {}", path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn clones_share_bytes() {
        let image = ImageHandle::new(vec![1u8, 2, 3], "image/png", ImageOrigin::Remote);
        let copy = image.clone();
        assert!(image.shares_bytes_with(&copy));

        let voice = VoiceHandle::mp3(vec![9u8; 4]);
        assert!(voice.shares_bytes_with(&voice.clone()));
    }

    #[test]
    fn extension_follows_mime() {
        let png = ImageHandle::new(Vec::<u8>::new(), "image/png", ImageOrigin::Placeholder);
        let svg = ImageHandle::new(Vec::<u8>::new(), "image/svg+xml", ImageOrigin::Static);
        assert_eq!(png.extension(), "png");
        assert_eq!(svg.extension(), "svg");
    }

    #[test]
    fn debug_omits_payload() {
        let image = ImageHandle::new(vec![0u8; 2048], "image/png", ImageOrigin::Remote);
        let text = format!("{image:?}");
        assert!(text.contains("len: 2048"));
        assert!(!text.contains("[0, 0"));
    }

    #[test]
    fn file_names_are_sanitised() {
        let dir = Path::new("/tmp");
        assert_eq!(
            voice_file_path(dir, "Grimbold Ironforge"),
            dir.join("Grimbold_Ironforge_voice.mp3")
        );
        let png = ImageHandle::new(Vec::<u8>::new(), "image/png", ImageOrigin::Remote);
        assert_eq!(
            portrait_file_path(dir, "Lyra/Vane", &png),
            dir.join("Lyra_Vane_portrait.png")
        );
    }

    #[test]
    fn export_writes_bytes() {
        let dir = TempDir::new().unwrap();
        let voice = VoiceHandle::mp3(b"ID3fake".to_vec());
        let path = export_voice(dir.path(), "Pip", &voice).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"ID3fake");

        let image = ImageHandle::new(b"PNGfake".to_vec(), "image/png", ImageOrigin::Placeholder);
        let path = export_portrait(dir.path(), "Pip", &image).unwrap();
        assert!(path.ends_with("Pip_portrait.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"PNGfake");
    }
}
