//! Voice stage of the pipeline plus the ambient and narration clips.

use std::sync::Arc;

use super::client::SoundGenerator;
use super::prompt::{ambient_prompt, narration_prompt, voice_prompt};
use crate::character::CharacterRecord;
use crate::config::VoiceConfig;
use crate::http::BackendError;
use crate::media::VoiceHandle;

/// Clip lengths for the three audio channels, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipDurations {
    pub voice: f32,
    pub ambient: f32,
    pub narration: f32,
}

impl From<&VoiceConfig> for ClipDurations {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            voice: config.duration_secs,
            ambient: config.ambient_duration_secs,
            narration: config.narration_duration_secs,
        }
    }
}

impl Default for ClipDurations {
    fn default() -> Self {
        Self::from(&VoiceConfig::default())
    }
}

/// Turns records into audio through a [`SoundGenerator`].
///
/// Unlike the portrait stage there is no fallback: a back-end failure is
/// returned to the caller, which decides whether it is fatal.
pub struct VoiceSynthesizer {
    generator: Arc<dyn SoundGenerator>,
    durations: ClipDurations,
}

impl VoiceSynthesizer {
    pub fn new(generator: Arc<dyn SoundGenerator>, durations: ClipDurations) -> Self {
        Self {
            generator,
            durations,
        }
    }

    /// The character's voice line.
    pub async fn synthesize(&self, record: &CharacterRecord) -> Result<VoiceHandle, BackendError> {
        let prompt = voice_prompt(record);
        log::debug!("voice: prompt = {prompt:?}");
        self.clip(&prompt, self.durations.voice).await
    }

    /// Ambient loop for the character's usual location.
    pub async fn ambient(&self, record: &CharacterRecord) -> Result<VoiceHandle, BackendError> {
        self.clip(&ambient_prompt(record), self.durations.ambient).await
    }

    /// Narrated introduction of the character.
    pub async fn narration(&self, record: &CharacterRecord) -> Result<VoiceHandle, BackendError> {
        self.clip(&narration_prompt(record), self.durations.narration).await
    }

    async fn clip(&self, prompt: &str, duration_secs: f32) -> Result<VoiceHandle, BackendError> {
        let bytes = self.generator.generate(prompt, duration_secs).await?;
        Ok(VoiceHandle::mp3(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::fixtures::sample;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the request back as the "audio" and remembers it.
    #[derive(Default)]
    struct Echo {
        calls: Mutex<Vec<(String, f32)>>,
    }

    #[async_trait]
    impl SoundGenerator for Echo {
        async fn generate(&self, text: &str, duration_secs: f32) -> Result<Vec<u8>, BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), duration_secs));
            Ok(text.as_bytes().to_vec())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl SoundGenerator for AlwaysFails {
        async fn generate(&self, _text: &str, _secs: f32) -> Result<Vec<u8>, BackendError> {
            Err(BackendError::Timeout)
        }
    }

    #[tokio::test]
    async fn voice_uses_templated_prompt_and_voice_duration() {
        let echo = Arc::new(Echo::default());
        let synth = VoiceSynthesizer::new(echo.clone(), ClipDurations::default());

        let handle = synth.synthesize(&sample()).await.unwrap();
        assert_eq!(handle.mime(), "audio/mpeg");

        let calls = echo.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            "speaking in the style of female young half-elf bard \"Every tavern has a song, if you listen.\""
        );
        assert_eq!(calls[0].1, 5.0);
    }

    #[tokio::test]
    async fn ambient_and_narration_use_their_own_durations() {
        let echo = Arc::new(Echo::default());
        let durations = ClipDurations {
            voice: 5.0,
            ambient: 12.0,
            narration: 8.0,
        };
        let synth = VoiceSynthesizer::new(echo.clone(), durations);

        synth.ambient(&sample()).await.unwrap();
        synth.narration(&sample()).await.unwrap();

        let calls = echo.calls.lock().unwrap();
        assert!(calls[0].0.contains("tavern"));
        assert_eq!(calls[0].1, 12.0);
        assert!(calls[1].0.contains("Seraphina Vale"));
        assert_eq!(calls[1].1, 8.0);
    }

    #[tokio::test]
    async fn backend_failure_is_returned() {
        let synth = VoiceSynthesizer::new(Arc::new(AlwaysFails), ClipDurations::default());
        assert!(matches!(
            synth.synthesize(&sample()).await,
            Err(BackendError::Timeout)
        ));
    }
}
