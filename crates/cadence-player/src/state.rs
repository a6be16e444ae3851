//! Read-only view of the engine's playback state.

use cadence_core::{format_position, Track, Volume};
use serde::Serialize;

/// Snapshot handed to the rendering layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaybackState {
    /// Track currently loaded.
    pub current_track: Option<Track>,
    /// Tracks that next/previous walk through.
    pub queue: Vec<Track>,
    /// Position of `current_track` within `queue`.
    pub current_index: usize,
    pub is_playing: bool,
    /// Playback position in seconds.
    pub current_time: f64,
    /// Duration in seconds (catalog hint until the sink reports metadata).
    pub duration: f64,
    pub volume: Volume,
    /// Last saved position for the current track, used to seed the initial seek.
    pub resume_position: f64,
}

impl PlaybackState {
    pub fn has_next(&self) -> bool {
        self.current_index + 1 < self.queue.len()
    }

    /// Fraction of the track played, 0.0 when the duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 && self.duration.is_finite() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// "1:05 / 3:30" style position readout.
    pub fn position_display(&self) -> String {
        format!(
            "{} / {}",
            format_position(self.current_time),
            format_position(self.duration)
        )
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            queue: Vec::new(),
            current_index: 0,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: Volume::DEFAULT,
            resume_position: 0.0,
        }
    }
}
