//! Play/pause transport for the three audio channels.
//!
//! Each [`Channel`] is an independent state machine:
//!
//! ```text
//! Stopped ──toggle──▶ Playing ──toggle──▶ Paused ──toggle──▶ Playing
//!    ▲                   │                  │
//!    └──────stop─────────┴───────stop───────┘   (stop releases the clip)
//! ```
//!
//! The transport only tracks state and owns the loaded clip; decoding and
//! output belong to whatever front-end drives it.

use thiserror::Error;

use crate::media::VoiceHandle;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Independent audio channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Voice,
    Ambient,
    Narration,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Voice, Channel::Ambient, Channel::Narration];

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Voice => "voice",
            Channel::Ambient => "ambient",
            Channel::Narration => "narration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no {} clip is loaded", .0.label())]
    NothingLoaded(Channel),
}

#[derive(Debug, Default)]
struct Slot {
    state: TransportState,
    clip: Option<VoiceHandle>,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// State of all three channels.
#[derive(Debug, Default)]
pub struct Transport {
    voice: Slot,
    ambient: Slot,
    narration: Slot,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, channel: Channel) -> &Slot {
        match channel {
            Channel::Voice => &self.voice,
            Channel::Ambient => &self.ambient,
            Channel::Narration => &self.narration,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Slot {
        match channel {
            Channel::Voice => &mut self.voice,
            Channel::Ambient => &mut self.ambient,
            Channel::Narration => &mut self.narration,
        }
    }

    pub fn state(&self, channel: Channel) -> TransportState {
        self.slot(channel).state
    }

    pub fn clip(&self, channel: Channel) -> Option<&VoiceHandle> {
        self.slot(channel).clip.as_ref()
    }

    /// Load `clip` into `channel`, replacing and stopping whatever was there.
    pub fn load(&mut self, channel: Channel, clip: VoiceHandle) {
        let slot = self.slot_mut(channel);
        slot.clip = Some(clip);
        slot.state = TransportState::Stopped;
    }

    /// Play if stopped or paused, pause if playing.
    pub fn toggle(&mut self, channel: Channel) -> Result<TransportState, PlaybackError> {
        let slot = self.slot_mut(channel);
        if slot.clip.is_none() {
            return Err(PlaybackError::NothingLoaded(channel));
        }
        slot.state = match slot.state {
            TransportState::Playing => TransportState::Paused,
            TransportState::Stopped | TransportState::Paused => TransportState::Playing,
        };
        log::debug!("playback: {} → {:?}", channel.label(), slot.state);
        Ok(slot.state)
    }

    /// Stop `channel` and release its clip.  Stopping an empty channel is a
    /// no-op.
    pub fn stop(&mut self, channel: Channel) {
        let slot = self.slot_mut(channel);
        slot.state = TransportState::Stopped;
        slot.clip = None;
    }

    /// Stop every channel.
    pub fn stop_all(&mut self) {
        for channel in Channel::ALL {
            self.stop(channel);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
