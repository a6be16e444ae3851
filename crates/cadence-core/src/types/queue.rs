//! Play queue: the ordered tracks that next/previous navigate.

use serde::{Deserialize, Serialize};

use super::Track;

/// The playback queue.
///
/// Navigation is strictly linear: `advance` stops at the last item and
/// `retreat` stops at the first, neither wraps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayQueue {
    /// All items in the queue.
    items: Vec<Track>,
    /// Current playback index.
    current_index: usize,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue with `tracks` (or just `track` when `tracks` is empty)
    /// and point at `track`. Falls back to index 0 when `track` is not in the list.
    pub fn load(&mut self, track: &Track, tracks: Vec<Track>) -> usize {
        self.items = if tracks.is_empty() {
            vec![track.clone()]
        } else {
            tracks
        };
        self.current_index = self.position_of(&track.id).unwrap_or(0);
        self.current_index
    }

    /// Get all items in the queue.
    pub fn items(&self) -> &[Track] {
        &self.items
    }

    /// Get the track at the current index.
    pub fn current(&self) -> Option<&Track> {
        self.items.get(self.current_index)
    }

    /// Get the current index.
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Get the number of items in the queue.
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty.
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the first track with this id.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|t| t.id == id)
    }

    pub const fn has_next(&self) -> bool {
        self.current_index + 1 < self.items.len()
    }

    pub const fn has_previous(&self) -> bool {
        self.current_index > 0 && !self.items.is_empty()
    }

    /// Move to the next track. Returns `None` and stays put at the end.
    pub fn advance(&mut self) -> Option<&Track> {
        if !self.has_next() {
            return None;
        }
        self.current_index += 1;
        self.items.get(self.current_index)
    }

    /// Move to the previous track. Returns `None` and stays put at the start.
    pub fn retreat(&mut self) -> Option<&Track> {
        if !self.has_previous() {
            return None;
        }
        self.current_index -= 1;
        self.items.get(self.current_index)
    }
}
