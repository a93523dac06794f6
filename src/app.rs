//! `CharacterForge` — the controller that owns the session.
//!
//! # Architecture
//!
//! [`CharacterForge`] ties the pieces together and is the only thing a
//! front-end needs to hold:
//!
//! * an `Arc<PipelineOrchestrator>` that talks to the back-ends;
//! * the [`SessionStore`] behind `Arc<Mutex<…>>`;
//! * the audio [`Transport`] behind `Arc<Mutex<…>>`;
//! * an optional session file that is rewritten after every record change.
//!
//! Locks are held only for short critical sections and never across an
//! `.await`: an operation copies what it needs out of the store, awaits the
//! back-end, then attaches the result by entry id.  If the entry was deleted
//! in the meantime the result is dropped.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::character::CharacterRecord;
use crate::config::{AppConfig, AppPaths, SessionConfig};
use crate::media::VoiceHandle;
use crate::pipeline::{PipelineError, PipelineOrchestrator};
use crate::playback::{Channel, PlaybackError, Transport, TransportState};
use crate::session::{persist, SessionError, SessionStore};

// ---------------------------------------------------------------------------
// ForgeError
// ---------------------------------------------------------------------------

/// Errors returned by controller operations.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

// ---------------------------------------------------------------------------
// CharacterForge
// ---------------------------------------------------------------------------

pub struct CharacterForge {
    orchestrator: Arc<PipelineOrchestrator>,
    session: Arc<Mutex<SessionStore>>,
    transport: Arc<Mutex<Transport>>,
    session_file: Option<PathBuf>,
}

impl CharacterForge {
    /// A controller with an empty roster of `capacity` and no autosave.
    pub fn new(orchestrator: PipelineOrchestrator, capacity: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            session: Arc::new(Mutex::new(SessionStore::new(capacity))),
            transport: Arc::new(Mutex::new(Transport::new())),
            session_file: None,
        }
    }

    /// Production controller: real back-ends plus [`for_session`](Self::for_session).
    pub fn from_config(config: &AppConfig) -> Self {
        Self::for_session(PipelineOrchestrator::from_config(config), &config.session)
    }

    /// Configured capacity, and autosave to the platform `session.json`
    /// when enabled.
    pub fn for_session(orchestrator: PipelineOrchestrator, session: &SessionConfig) -> Self {
        let forge = Self::new(orchestrator, session.capacity);
        if session.autosave {
            forge.with_session_file(AppPaths::new().session_file)
        } else {
            forge
        }
    }

    /// Rewrite `path` after every record change.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    /// Lock the roster for reading.  Do not hold the guard across `.await`.
    pub fn session(&self) -> MutexGuard<'_, SessionStore> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the transport.  Do not hold the guard across `.await`.
    pub fn transport(&self) -> MutexGuard<'_, Transport> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Load the session file, if one is configured.  Returns the number of
    /// restored characters.
    ///
    /// When the file cannot be read, or some of its entries do not make it
    /// into the roster, it is first copied to `<file>.bak` so the next
    /// autosave cannot lose them.
    pub fn restore(&self) -> Result<usize, SessionError> {
        let Some(path) = &self.session_file else {
            return Ok(0);
        };
        let loaded = match persist::load_from(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                backup(path);
                return Err(e);
            }
        };

        let on_disk = loaded.entries.len() + loaded.skipped;
        let mut store = self.session();
        store.restore(loaded.entries);
        if store.len() < on_disk {
            log::warn!(
                "forge: kept {} of {on_disk} saved characters",
                store.len()
            );
            backup(path);
        }
        Ok(store.len())
    }

    /// Write the session file now, if one is configured.
    pub fn save(&self) -> Result<(), SessionError> {
        let Some(path) = &self.session_file else {
            return Ok(());
        };
        let entries = self.session().serialize();
        persist::save_to(path, &entries)
    }

    fn autosave(&self) {
        if let Err(e) = self.save() {
            log::warn!("forge: autosave failed: {e}");
        }
    }

    // -----------------------------------------------------------------------
    // Roster operations
    // -----------------------------------------------------------------------

    /// Generate a character from `prompt` and add it to the roster.
    ///
    /// A full roster is rejected before any back-end is called.  Returns the
    /// new entry's id.
    pub async fn create(&self, prompt: &str) -> Result<u64, ForgeError> {
        {
            let store = self.session();
            if store.is_full() {
                return Err(SessionError::Capacity {
                    capacity: store.capacity(),
                }
                .into());
            }
        }

        let result = self.orchestrator.generate(prompt).await?;
        let voice = result.voice.clone();
        let id = self.session().add(result)?;

        {
            let mut transport = self.transport();
            transport.stop_all();
            if let Some(voice) = voice {
                transport.load(Channel::Voice, voice);
            }
        }
        self.autosave();
        Ok(id)
    }

    /// Select the entry at `index`.  Playback of the previous character stops.
    pub fn select(&self, index: usize) -> Result<(), ForgeError> {
        let voice = {
            let mut store = self.session();
            store.select(index)?;
            store.selected().and_then(|e| e.voice.clone())
        };
        self.reload_transport(voice);
        Ok(())
    }

    /// Delete the entry at `index`.
    pub fn delete(&self, index: usize) -> Result<(), ForgeError> {
        let voice = {
            let mut store = self.session();
            store.delete(index)?;
            store.selected().and_then(|e| e.voice.clone())
        };
        self.reload_transport(voice);
        self.autosave();
        Ok(())
    }

    /// Replace the selected character's quote.
    pub fn edit_quote(&self, quote: &str) -> Result<(), ForgeError> {
        self.session().edit_quote(quote)?;
        self.autosave();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Point operations on the selected character
    // -----------------------------------------------------------------------

    /// New portrait for the selected character.
    ///
    /// Returns `false` if the character was deleted before it arrived.
    pub async fn regenerate_image(&self) -> Result<bool, ForgeError> {
        let (id, record) = self.selected_record()?;
        let image = self.orchestrator.regenerate_image(&record).await?;
        Ok(self.session().attach_image(id, image))
    }

    /// New voice line for the selected character.  Voice playback stops
    /// first.
    pub async fn regenerate_voice(&self) -> Result<bool, ForgeError> {
        let (id, record) = self.selected_record()?;
        self.transport().stop(Channel::Voice);

        let voice = self.orchestrator.regenerate_voice(&record).await?;
        let attached = self.session().attach_voice(id, voice.clone());
        if attached && self.is_selected(id) {
            self.transport().load(Channel::Voice, voice);
        }
        Ok(attached)
    }

    /// Play or pause the selected character's voice line.
    pub fn toggle_voice(&self) -> Result<TransportState, ForgeError> {
        Ok(self.transport().toggle(Channel::Voice)?)
    }

    /// Play or pause the ambient loop, generating it on first use.
    pub async fn toggle_ambient(&self) -> Result<TransportState, ForgeError> {
        if self.transport().clip(Channel::Ambient).is_some() {
            return Ok(self.transport().toggle(Channel::Ambient)?);
        }

        let (id, record) = self.selected_record()?;
        let ambient = self.orchestrator.generate_ambient(&record).await?;
        self.session().attach_ambient(id, ambient.clone());
        self.start_if_selected(id, Channel::Ambient, ambient)
    }

    /// Generate and start a narrated introduction of the selected character.
    pub async fn generate_narration(&self) -> Result<TransportState, ForgeError> {
        let (id, record) = self.selected_record()?;
        self.transport().stop(Channel::Narration);

        let narration = self.orchestrator.generate_narration(&record).await?;
        self.session().attach_narration(id, narration.clone());
        self.start_if_selected(id, Channel::Narration, narration)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn selected_record(&self) -> Result<(u64, CharacterRecord), SessionError> {
        let store = self.session();
        let entry = store.selected().ok_or(SessionError::NoSelection)?;
        Ok((entry.id, entry.record.clone()))
    }

    fn is_selected(&self, id: u64) -> bool {
        self.session().selected().is_some_and(|e| e.id == id)
    }

    fn start_if_selected(
        &self,
        id: u64,
        channel: Channel,
        clip: VoiceHandle,
    ) -> Result<TransportState, ForgeError> {
        if !self.is_selected(id) {
            log::debug!("forge: selection changed, not playing {}", channel.label());
            return Ok(TransportState::Stopped);
        }
        let mut transport = self.transport();
        transport.load(channel, clip);
        Ok(transport.toggle(channel)?)
    }

    fn reload_transport(&self, voice: Option<VoiceHandle>) {
        let mut transport = self.transport();
        transport.stop_all();
        if let Some(voice) = voice {
            transport.load(Channel::Voice, voice);
        }
    }
}

/// `session.json` → `session.json.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn backup(path: &Path) {
    let target = backup_path(path);
    match std::fs::copy(path, &target) {
        Ok(_) => log::warn!("forge: previous session kept at {}", target.display()),
        Err(e) => log::error!("forge: could not back up {}: {e}", path.display()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::llm::PromptRefiner;
    use crate::media::ImageOrigin;
    use crate::portrait::ImageSynthesizer;
    use crate::session::PersistedEntry;
    use crate::testing::{profile_json, Calls, Gate, ImageFails, SoundOk, TextOk};
    use crate::voice::{ClipDurations, VoiceSynthesizer};
    use tempfile::tempdir;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    struct Rig {
        forge: Arc<CharacterForge>,
        text_calls: Arc<Calls>,
        sound_calls: Arc<Calls>,
    }

    fn rig_with(capacity: usize, sound: SoundOk) -> Rig {
        let text = TextOk::new(&profile_json("Lirael Dawnwhisper"));
        let text_calls = Arc::clone(&text.calls);
        let sound_calls = Arc::clone(&sound.calls);
        let orchestrator = PipelineOrchestrator::new(
            PromptRefiner::new(Arc::new(text)),
            ImageSynthesizer::new(Arc::new(ImageFails::default()), "style"),
            VoiceSynthesizer::new(Arc::new(sound), ClipDurations::default()),
            Credentials::new("AIza-test", "sk-test"),
        );
        Rig {
            forge: Arc::new(CharacterForge::new(orchestrator, capacity)),
            text_calls,
            sound_calls,
        }
    }

    fn rig(capacity: usize) -> Rig {
        rig_with(capacity, SoundOk::default())
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_adds_selects_and_loads_voice() {
        let rig = rig(10);
        let id = rig.forge.create("elf ranger").await.unwrap();

        let store = rig.forge.session();
        let entry = store.selected().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.record.name, "Lirael Dawnwhisper");
        assert_eq!(entry.image.as_ref().unwrap().origin(), ImageOrigin::Placeholder);
        drop(store);

        assert!(rig.forge.transport().clip(Channel::Voice).is_some());
        assert_eq!(rig.forge.toggle_voice().unwrap(), TransportState::Playing);
    }

    #[tokio::test]
    async fn full_roster_rejects_before_calling_backends() {
        let rig = rig(1);
        rig.forge.create("first").await.unwrap();
        assert_eq!(rig.text_calls.get(), 1);

        let err = rig.forge.create("second").await.unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Session(SessionError::Capacity { capacity: 1 })
        ));
        assert_eq!(rig.text_calls.get(), 1);
        assert_eq!(rig.forge.session().len(), 1);
    }

    #[tokio::test]
    async fn autosave_tracks_creates_edits_and_deletes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let rig = rig(10);
        let forge = Arc::try_unwrap(rig.forge)
            .ok()
            .unwrap()
            .with_session_file(&path);

        forge.create("elf ranger").await.unwrap();
        forge.create("elf ranger again").await.unwrap();
        assert_eq!(persist::load_from(&path).unwrap().entries.len(), 2);

        forge.edit_quote("Victory or death").unwrap();
        let saved = persist::load_from(&path).unwrap().entries;
        assert_eq!(saved[1].data.quote, "Victory or death");
        assert_eq!(saved[0].data.quote, "The forest remembers.");

        forge.delete(0).unwrap();
        assert_eq!(persist::load_from(&path).unwrap().entries.len(), 1);
    }

    #[tokio::test]
    async fn restore_loads_records_without_media() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let record = crate::llm::canned_record();
        persist::save_to(&path, &[PersistedEntry { data: record.clone(), id: 99 }]).unwrap();

        let rig = rig(10);
        let forge = Arc::try_unwrap(rig.forge).ok().unwrap().with_session_file(&path);
        assert_eq!(forge.restore().unwrap(), 1);

        let store = forge.session();
        assert!(store.media_regeneration_required());
        assert_eq!(store.selected().unwrap().record, record);
        assert!(store.selected().unwrap().image.is_none());
    }

    fn forge_at(path: &Path) -> CharacterForge {
        Arc::try_unwrap(rig(10).forge).ok().unwrap().with_session_file(path)
    }

    #[tokio::test]
    async fn older_session_file_survives_restore_and_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"[
                {"data": {"name": "Brom", "race": "Dwarf", "class": "Smith",
                          "quote": "Hammer first.", "location": "forge"}, "id": 1},
                {"data": {"name": "Ilse", "gender": "elf-kin", "race": "Elf",
                          "quote": "Quietly."}, "id": 2}
            ]"#,
        )
        .unwrap();

        let forge = forge_at(&path);
        assert_eq!(forge.restore().unwrap(), 2);
        assert_eq!(forge.session().get(2).unwrap().record.location, "tavern");

        forge.create("elf ranger").await.unwrap();
        let saved = persist::load_from(&path).unwrap().entries;
        let names: Vec<_> = saved.iter().map(|e| e.data.name.as_str()).collect();
        assert_eq!(names, ["Brom", "Ilse", "Lirael Dawnwhisper"]);
        assert!(!backup_path(&path).exists());
    }

    #[tokio::test]
    async fn unreadable_session_file_is_backed_up_before_autosave() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let original = r#"{"not": "a roster"}"#;
        std::fs::write(&path, original).unwrap();

        let forge = forge_at(&path);
        assert!(matches!(forge.restore(), Err(SessionError::Serialization(_))));

        forge.create("elf ranger").await.unwrap();
        assert_eq!(persist::load_from(&path).unwrap().entries.len(), 1);
        assert_eq!(std::fs::read_to_string(backup_path(&path)).unwrap(), original);
    }

    #[tokio::test]
    async fn skipped_entries_are_backed_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let original = r#"[{"data": {"name": "Brom"}, "id": 1}, {"data": null, "id": 2}]"#;
        std::fs::write(&path, original).unwrap();

        let forge = forge_at(&path);
        assert_eq!(forge.restore().unwrap(), 1);
        assert_eq!(std::fs::read_to_string(backup_path(&path)).unwrap(), original);
    }

    #[test]
    fn from_config_applies_session_settings() {
        let mut config = AppConfig::default();
        config.session.capacity = 3;
        config.session.autosave = false;

        let forge = CharacterForge::from_config(&config);
        assert_eq!(forge.session().capacity(), 3);
        assert_eq!(forge.restore().unwrap(), 0);
    }

    #[test]
    fn backup_sits_next_to_the_session_file() {
        assert_eq!(
            backup_path(Path::new("/tmp/forge/session.json")),
            Path::new("/tmp/forge/session.json.bak")
        );
    }

    #[tokio::test]
    async fn regenerated_portrait_clears_the_media_flag() {
        let rig = rig(10);
        rig.forge
            .session()
            .restore(vec![PersistedEntry { data: crate::llm::canned_record(), id: 1 }]);

        assert!(rig.forge.regenerate_image().await.unwrap());
        let store = rig.forge.session();
        assert!(!store.media_regeneration_required());
        assert_eq!(store.get(1).unwrap().image.as_ref().unwrap().origin(), ImageOrigin::Placeholder);
    }

    #[tokio::test]
    async fn select_out_of_range_is_reported() {
        let rig = rig(10);
        assert!(matches!(
            rig.forge.select(0),
            Err(ForgeError::Session(SessionError::Range { .. }))
        ));
    }

    // -----------------------------------------------------------------------
    // Point operations
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn point_operations_need_a_selection() {
        let rig = rig(10);
        assert!(matches!(
            rig.forge.regenerate_voice().await,
            Err(ForgeError::Session(SessionError::NoSelection))
        ));
    }

    #[tokio::test]
    async fn voice_for_a_deleted_character_is_dropped() {
        let gate = Gate::new();
        let rig = rig_with(
            10,
            SoundOk {
                gate: Some(gate.clone()),
                ..SoundOk::default()
            },
        );

        // Create with the gate open, then close it for the regeneration.
        let create = {
            let forge = Arc::clone(&rig.forge);
            tokio::spawn(async move { forge.create("elf ranger").await })
        };
        gate.entered.notified().await;
        gate.release.notify_one();
        create.await.unwrap().unwrap();

        let regen = {
            let forge = Arc::clone(&rig.forge);
            tokio::spawn(async move { forge.regenerate_voice().await })
        };
        gate.entered.notified().await;
        rig.forge.delete(0).unwrap();
        gate.release.notify_one();

        assert!(!regen.await.unwrap().unwrap());
        assert!(rig.forge.session().is_empty());
        assert!(rig.forge.transport().clip(Channel::Voice).is_none());
    }

    #[tokio::test]
    async fn ambient_is_generated_once_then_toggled() {
        let rig = rig(10);
        rig.forge.create("elf ranger").await.unwrap();
        let before = rig.sound_calls.get();

        assert_eq!(rig.forge.toggle_ambient().await.unwrap(), TransportState::Playing);
        assert_eq!(rig.forge.toggle_ambient().await.unwrap(), TransportState::Paused);
        assert_eq!(rig.sound_calls.get(), before + 1);

        let store = rig.forge.session();
        assert!(store.selected().unwrap().ambient.is_some());
    }

    #[tokio::test]
    async fn narration_starts_playing() {
        let rig = rig(10);
        rig.forge.create("elf ranger").await.unwrap();
        assert_eq!(rig.forge.generate_narration().await.unwrap(), TransportState::Playing);
        assert_eq!(
            rig.forge.transport().state(Channel::Narration),
            TransportState::Playing
        );
    }

    #[tokio::test]
    async fn selecting_another_character_stops_playback() {
        let rig = rig(10);
        rig.forge.create("one").await.unwrap();
        rig.forge.create("two").await.unwrap();
        rig.forge.toggle_voice().unwrap();

        rig.forge.select(0).unwrap();
        assert_eq!(rig.forge.transport().state(Channel::Voice), TransportState::Stopped);
        assert!(rig.forge.transport().clip(Channel::Voice).is_some());
    }
}
