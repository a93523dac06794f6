//! Application entry point — Character Forge.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and overlay
//!    API keys from the environment.
//! 3. Build the orchestrator with an event channel and spawn a task that
//!    logs progress.
//! 4. Restore the persisted roster.
//! 5. With a prompt on the command line: generate, export the portrait and
//!    voice line to the current directory, print the record as JSON.
//!    Without one: list the roster.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;

use character_forge::{
    app::CharacterForge,
    config::{AppConfig, AppPaths, Credentials},
    media,
    pipeline::{PipelineEvent, PipelineOrchestrator},
};

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

async fn log_events(mut rx: mpsc::Receiver<PipelineEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::StateChanged(state) => log::info!("{}", state.label()),
            PipelineEvent::RecordReady(record) => {
                log::info!("profile ready: {} ({} {})", record.name, record.race, record.class)
            }
            PipelineEvent::ImageReady { origin } => log::info!("portrait ready ({})", origin.label()),
            PipelineEvent::VoiceReady => log::info!("voice line ready"),
            PipelineEvent::VoiceSkipped { reason } => log::warn!("voice line skipped: {reason}"),
            PipelineEvent::Failed { message } => log::error!("generation failed: {message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.credentials.apply_env();
    if !config.credentials.is_complete() {
        log::warn!(
            "API keys missing; set {} and {} or edit {}",
            Credentials::GEMINI_ENV,
            Credentials::ELEVENLABS_ENV,
            AppPaths::new().settings_file.display()
        );
    }

    // 3. Orchestrator + progress logging
    let (tx, rx) = mpsc::channel::<PipelineEvent>(32);
    tokio::spawn(log_events(rx));
    let orchestrator = PipelineOrchestrator::from_config(&config).with_events(tx);

    let forge = CharacterForge::for_session(orchestrator, &config.session);

    // 4. Restore
    match forge.restore() {
        Ok(0) => {}
        Ok(n) => log::info!("restored {n} character(s)"),
        Err(e) => log::warn!("could not restore session ({e}); starting a new one"),
    }

    // 5. Generate or list
    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        list(&forge);
        return Ok(());
    }

    forge.create(&prompt).await.context("character generation failed")?;
    export_selected(&forge, Path::new("."))?;
    Ok(())
}

fn list(forge: &CharacterForge) {
    let store = forge.session();
    if store.is_empty() {
        println!("No characters yet. Usage: character-forge <concept>");
        return;
    }
    for (i, entry) in store.entries().iter().enumerate() {
        let marker = if store.selected_index() == Some(i) { '*' } else { ' ' };
        let r = &entry.record;
        println!("{marker} {i}: {} the {} {} ({})", r.name, r.race, r.class, r.location);
    }
}

fn export_selected(forge: &CharacterForge, dir: &Path) -> Result<()> {
    let store = forge.session();
    let Some(entry) = store.selected() else {
        bail!("no character selected after generation");
    };

    if let Some(image) = &entry.image {
        let path = media::export_portrait(dir, &entry.record.name, image)
            .context("writing portrait")?;
        log::info!("portrait saved to {}", path.display());
    }
    if let Some(voice) = &entry.voice {
        let path =
            media::export_voice(dir, &entry.record.name, voice).context("writing voice line")?;
        log::info!("voice line saved to {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&entry.record)?);
    Ok(())
}
