//! Track type representing a single song or podcast episode.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Duration;

/// What kind of record a track is, so history writes reach the right table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A music track.
    #[default]
    Track,
    /// A podcast episode.
    Episode,
}

impl MediaKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Episode => "podcast",
        }
    }
}

/// A single playable item (song or episode).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    /// Canonical identifier, unique within a queue.
    pub id: String,
    /// Track title.
    pub title: String,
    /// Artist for songs, host for episodes.
    pub artist: String,
    /// Song or episode.
    #[serde(default)]
    pub kind: MediaKind,
    /// Playable audio URL.
    pub media_url: String,
    /// Cover art URL (if available).
    pub cover_url: Option<String>,
    /// Album name (songs only).
    pub album: Option<String>,
    /// Catalog duration hint. The media sink is authoritative once loaded.
    #[serde(default)]
    pub duration: Duration,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: String::new(),
            kind: MediaKind::Track,
            media_url: media_url.into(),
            cover_url: None,
            album: None,
            duration: Duration::default(),
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_cover(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, seconds: u64) -> Self {
        self.duration = Duration::from_seconds(seconds);
        self
    }

    pub const fn is_episode(&self) -> bool {
        matches!(self.kind, MediaKind::Episode)
    }

    /// Identity this track's listening position is stored under.
    pub fn history_key(&self) -> HistoryKey {
        HistoryKey::new(self.id.clone(), self.kind)
    }

    /// "Title - Artist", or just the title when the artist is unknown.
    pub fn display_name(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.artist)
        }
    }
}

/// Identity of a history record: the item id plus which record type it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub id: String,
    pub kind: MediaKind,
}

impl HistoryKey {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn track(id: impl Into<String>) -> Self {
        Self::new(id, MediaKind::Track)
    }

    pub fn episode(id: impl Into<String>) -> Self {
        Self::new(id, MediaKind::Episode)
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}
