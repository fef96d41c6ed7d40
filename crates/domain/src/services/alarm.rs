//! Audible alarm channel.
//!
//! One channel per alert sink. The channel owns every active sound handle,
//! so at most one logical alarm is audible at a time.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why an alarm is sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    /// Session opened by entering a danger zone.
    ZoneEmergency,
    /// Session opened by an explicit help request.
    ManualEmergency,
}

impl std::fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlarmKind::ZoneEmergency => write!(f, "zone_emergency"),
            AlarmKind::ManualEmergency => write!(f, "manual_emergency"),
        }
    }
}

/// A playable sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// File path or URL understood by the player.
    Asset(String),
    /// Generated tone, always available as a last resort.
    Tone { frequency_hz: u32 },
}

impl std::fmt::Display for SoundSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoundSource::Asset(location) => write!(f, "asset:{location}"),
            SoundSource::Tone { frequency_hz } => write!(f, "tone:{frequency_hz}Hz"),
        }
    }
}

/// Ordered fallbacks tried by [`AlarmChannel::play`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundSet {
    pub primary: Option<SoundSource>,
    pub secondary: Option<SoundSource>,
    pub inline: SoundSource,
}

impl Default for SoundSet {
    fn default() -> Self {
        Self {
            primary: None,
            secondary: None,
            inline: SoundSource::Tone { frequency_hz: 880 },
        }
    }
}

impl SoundSet {
    fn candidates(&self) -> impl Iterator<Item = (&'static str, &SoundSource)> {
        [
            ("primary", self.primary.as_ref()),
            ("secondary", self.secondary.as_ref()),
            ("inline", Some(&self.inline)),
        ]
        .into_iter()
        .filter_map(|(label, source)| source.map(|s| (label, s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Sound source unavailable: {0}")]
    Unavailable(String),

    #[error("Playback failed: {0}")]
    Failed(String),
}

/// A sound that is currently playing.
pub trait SoundHandle: Send {
    /// Stops playback. Must tolerate being called on a finished sound.
    fn stop(&mut self);
}

/// Starts looping playback of a source.
pub trait AlarmPlayer: Send {
    fn start(
        &mut self,
        kind: AlarmKind,
        source: &SoundSource,
    ) -> Result<Box<dyn SoundHandle>, PlaybackError>;
}

/// Owns the player and the handles it produced.
pub struct AlarmChannel {
    player: Box<dyn AlarmPlayer>,
    sounds: SoundSet,
    active: Vec<Box<dyn SoundHandle>>,
    active_kind: Option<AlarmKind>,
}

impl AlarmChannel {
    pub fn new(player: Box<dyn AlarmPlayer>, sounds: SoundSet) -> Self {
        Self {
            player,
            sounds,
            active: Vec::new(),
            active_kind: None,
        }
    }

    /// Starts the alarm, trying each source in order.
    ///
    /// Returns whether a sound is playing. Never errors; if a sound is
    /// already playing no second source is started.
    pub fn play(&mut self, kind: AlarmKind) -> bool {
        if !self.active.is_empty() {
            debug!(kind = %kind, "Alarm already sounding, not starting another source");
            return true;
        }

        for (label, source) in self.sounds.candidates() {
            match self.player.start(kind, source) {
                Ok(handle) => {
                    info!(kind = %kind, source = %source, fallback = label, "Alarm started");
                    self.active.push(handle);
                    self.active_kind = Some(kind);
                    return true;
                }
                Err(e) => {
                    warn!(kind = %kind, source = %source, fallback = label, error = %e, "Alarm source failed");
                }
            }
        }

        error!(kind = %kind, "No alarm source could be played; escalation continues silently");
        false
    }

    /// Stops every active sound. Safe to call when nothing is playing.
    pub fn stop(&mut self) {
        if self.active.is_empty() {
            return;
        }
        for mut handle in self.active.drain(..) {
            handle.stop();
        }
        info!(kind = ?self.active_kind.take(), "Alarm stopped");
    }

    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_sources(&self) -> usize {
        self.active.len()
    }
}

impl Drop for AlarmChannel {
    fn drop(&mut self) {
        self.stop();
    }
}
