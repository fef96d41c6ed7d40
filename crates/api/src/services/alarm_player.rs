//! Alarm players.
//!
//! The console player only logs and rings the terminal bell. The command
//! player runs an external audio program per sound and kills it on stop;
//! generated tones fall back to the console.

use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use domain::services::{AlarmKind, AlarmPlayer, PlaybackError, SoundHandle, SoundSource};

use crate::config::AlarmConfig;

/// Placeholder in command arguments replaced by the sound location.
const SOURCE_PLACEHOLDER: &str = "{source}";

/// Logs alarm start and stop.
#[derive(Debug, Default)]
pub struct ConsoleAlarmPlayer;

struct ConsoleHandle {
    kind: AlarmKind,
    source: String,
    stopped: bool,
}

impl SoundHandle for ConsoleHandle {
    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            tracing::info!(kind = %self.kind, source = %self.source, "Console alarm silenced");
        }
    }
}

impl AlarmPlayer for ConsoleAlarmPlayer {
    fn start(
        &mut self,
        kind: AlarmKind,
        source: &SoundSource,
    ) -> Result<Box<dyn SoundHandle>, PlaybackError> {
        tracing::warn!(kind = %kind, source = %source, "ALARM: console alarm sounding");
        let _ = std::io::stderr().write_all(b"\x07");
        Ok(Box::new(ConsoleHandle {
            kind,
            source: source.to_string(),
            stopped: false,
        }))
    }
}

/// Runs `command args...` for each asset. The program is expected to loop
/// the sound until killed.
#[derive(Debug)]
pub struct CommandAlarmPlayer {
    command: String,
    args: Vec<String>,
    tone_fallback: ConsoleAlarmPlayer,
}

struct ProcessHandle {
    child: Child,
    source: String,
}

impl SoundHandle for ProcessHandle {
    fn stop(&mut self) {
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            _ => {
                if let Err(e) = self.child.kill() {
                    tracing::warn!(source = %self.source, error = %e, "Failed to kill alarm process");
                }
                let _ = self.child.wait();
            }
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl CommandAlarmPlayer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            tone_fallback: ConsoleAlarmPlayer,
        }
    }

    fn arguments(&self, location: &str) -> Vec<String> {
        if self.args.is_empty() {
            return vec![location.to_string()];
        }
        self.args
            .iter()
            .map(|arg| arg.replace(SOURCE_PLACEHOLDER, location))
            .collect()
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl AlarmPlayer for CommandAlarmPlayer {
    fn start(
        &mut self,
        kind: AlarmKind,
        source: &SoundSource,
    ) -> Result<Box<dyn SoundHandle>, PlaybackError> {
        let location = match source {
            SoundSource::Asset(location) => location,
            SoundSource::Tone { .. } => return self.tone_fallback.start(kind, source),
        };

        if !is_remote(location) && !Path::new(location).exists() {
            return Err(PlaybackError::Unavailable(location.clone()));
        }

        let child = Command::new(&self.command)
            .args(self.arguments(location))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlaybackError::Failed(format!("{}: {e}", self.command)))?;

        tracing::debug!(kind = %kind, pid = child.id(), source = %location, "Alarm process started");
        Ok(Box::new(ProcessHandle {
            child,
            source: location.clone(),
        }))
    }
}

/// Builds the configured alarm player.
pub fn build_alarm_player(config: &AlarmConfig) -> Box<dyn AlarmPlayer> {
    match config.player.as_str() {
        "command" => Box::new(CommandAlarmPlayer::new(
            config.command.clone(),
            config.args.clone(),
        )),
        _ => Box::new(ConsoleAlarmPlayer),
    }
}
