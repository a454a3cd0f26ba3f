//! Bounded pool of short sound effects plus a single looping music slot.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "playback")]
mod rodio_backend;
#[cfg(feature = "playback")]
pub use rodio_backend::RodioBackend;

pub const MAX_CONCURRENT_CHIMES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Played once per revealed winner.
    WinnerChime,
    /// Played when the draw stops.
    EndChime,
    /// Looping background music while drawing.
    DrumRoll,
}

impl Cue {
    pub fn volume(self) -> f32 {
        match self {
            Self::WinnerChime => 0.8,
            Self::EndChime => 1.0,
            Self::DrumRoll => 0.7,
        }
    }

    pub fn is_looping(self) -> bool {
        matches!(self, Self::DrumRoll)
    }

    fn nominal_length(self) -> Option<Duration> {
        match self {
            Self::WinnerChime => Some(Duration::from_millis(1500)),
            Self::EndChime => Some(Duration::from_millis(2000)),
            Self::DrumRoll => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Ended,
    Failed,
}

/// A clip the backend is playing. Backends may flip a handle to `Failed`
/// at any time (blocked output device, decode error).
pub trait PlaybackHandle {
    fn status(&self) -> PlaybackStatus;
    fn stop(&mut self);
}

pub trait AudioBackend {
    fn play(&mut self, cue: Cue) -> Result<Box<dyn PlaybackHandle>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioAssets {
    pub winner_chime: PathBuf,
    pub end_chime: PathBuf,
    pub drum_roll: PathBuf,
}

impl Default for AudioAssets {
    fn default() -> Self {
        Self {
            winner_chime: PathBuf::from("assets/audio/enter.wav"),
            end_chime: PathBuf::from("assets/audio/end.mp3"),
            drum_roll: PathBuf::from("assets/audio/worldcup.mp3"),
        }
    }
}

impl AudioAssets {
    pub fn path(&self, cue: Cue) -> &PathBuf {
        match cue {
            Cue::WinnerChime => &self.winner_chime,
            Cue::EndChime => &self.end_chime,
            Cue::DrumRoll => &self.drum_roll,
        }
    }
}

/// Output-less backend for headless hosts. Clips "play" for their nominal
/// length; loops play until stopped.
#[derive(Debug, Default)]
pub struct SilentBackend;

struct SilentClip {
    ends_at: Option<Instant>,
    stopped: bool,
}

impl PlaybackHandle for SilentClip {
    fn status(&self) -> PlaybackStatus {
        match self.ends_at {
            _ if self.stopped => PlaybackStatus::Ended,
            Some(ends_at) if Instant::now() >= ends_at => PlaybackStatus::Ended,
            _ => PlaybackStatus::Playing,
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

impl AudioBackend for SilentBackend {
    fn play(&mut self, cue: Cue) -> Result<Box<dyn PlaybackHandle>> {
        Ok(Box::new(SilentClip {
            ends_at: cue.nominal_length().map(|len| Instant::now() + len),
            stopped: false,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// Chime cap reached; the request is discarded, not queued.
    Dropped,
    Muted,
    Failed,
}

struct TrackedClip {
    cue: Cue,
    handle: Box<dyn PlaybackHandle>,
}

pub struct AudioPool {
    backend: Box<dyn AudioBackend>,
    effects: Vec<TrackedClip>,
    music: Option<Box<dyn PlaybackHandle>>,
    muted: bool,
    max_chimes: usize,
}

impl AudioPool {
    pub fn new(backend: Box<dyn AudioBackend>, muted: bool) -> Self {
        Self::with_limit(backend, muted, MAX_CONCURRENT_CHIMES)
    }

    pub fn with_limit(backend: Box<dyn AudioBackend>, muted: bool, max_chimes: usize) -> Self {
        Self {
            backend,
            effects: Vec::new(),
            music: None,
            muted,
            max_chimes,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Drops every effect handle whose playback ended or failed.
    pub fn prune(&mut self) {
        let before = self.effects.len();
        self.effects
            .retain(|clip| clip.handle.status() == PlaybackStatus::Playing);
        let released = before - self.effects.len();
        if released > 0 {
            debug!(released, remaining = self.effects.len(), "released finished clips");
        }
    }

    pub fn play_chime(&mut self) -> PlayOutcome {
        if self.muted {
            return PlayOutcome::Muted;
        }
        self.prune();
        if self.active_chimes() >= self.max_chimes {
            debug!(limit = self.max_chimes, "chime limit reached; dropping request");
            return PlayOutcome::Dropped;
        }
        self.start_effect(Cue::WinnerChime)
    }

    pub fn play_end_chime(&mut self) -> PlayOutcome {
        if self.muted {
            return PlayOutcome::Muted;
        }
        self.prune();
        self.start_effect(Cue::EndChime)
    }

    fn start_effect(&mut self, cue: Cue) -> PlayOutcome {
        match self.backend.play(cue) {
            Ok(handle) if handle.status() == PlaybackStatus::Failed => {
                warn!(?cue, "clip failed on start; releasing handle");
                PlayOutcome::Failed
            }
            Ok(handle) => {
                self.effects.push(TrackedClip { cue, handle });
                PlayOutcome::Started
            }
            Err(err) => {
                warn!(?cue, error = %err, "audio playback unavailable");
                PlayOutcome::Failed
            }
        }
    }

    /// Replaces whatever music is playing with a fresh drum roll.
    pub fn start_music(&mut self) -> PlayOutcome {
        if self.muted {
            return PlayOutcome::Muted;
        }
        self.stop_music();
        match self.backend.play(Cue::DrumRoll) {
            Ok(handle) => {
                self.music = Some(handle);
                PlayOutcome::Started
            }
            Err(err) => {
                warn!(error = %err, "failed to start draw music");
                PlayOutcome::Failed
            }
        }
    }

    pub fn stop_music(&mut self) {
        if self.muted {
            return;
        }
        if let Some(mut music) = self.music.take() {
            music.stop();
        }
    }

    pub fn is_music_playing(&self) -> bool {
        self.music
            .as_ref()
            .is_some_and(|music| music.status() == PlaybackStatus::Playing)
    }

    pub fn active_chimes(&self) -> usize {
        self.effects
            .iter()
            .filter(|clip| clip.cue == Cue::WinnerChime)
            .count()
    }

    pub fn tracked_effects(&self) -> usize {
        self.effects.len()
    }

    /// Stops the music and every tracked effect.
    pub fn reset(&mut self) {
        if self.muted {
            return;
        }
        self.stop_music();
        for clip in &mut self.effects {
            if clip.handle.status() == PlaybackStatus::Playing {
                clip.handle.stop();
            }
        }
        self.effects.clear();
    }

    /// Teardown pass: stops and releases everything, muted or not.
    pub fn dispose(&mut self) {
        if let Some(mut music) = self.music.take() {
            music.stop();
        }
        for mut clip in self.effects.drain(..) {
            clip.handle.stop();
        }
        debug!("audio pool disposed");
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
