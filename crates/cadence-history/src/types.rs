//! History API wire types.

use cadence_core::{HistoryKey, MediaKind, Track};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::TrackRecord;

/// One row of the listener's history, with its song or episode resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// History row id (used for deletion).
    pub id: String,
    pub track: Track,
    /// Last saved position in seconds.
    pub last_position: f64,
    pub play_count: u32,
    pub last_played_at: Option<DateTime<Utc>>,
}

/// `{ success, message, ...body }` envelope every endpoint answers with.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResumeBody {
    #[serde(default)]
    pub position: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryListBody {
    #[serde(default)]
    pub history: Vec<HistoryEntryRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Empty {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryEntryRecord {
    pub id: Value,
    #[serde(default)]
    pub content: Option<TrackRecord>,
    #[serde(default)]
    pub last_position: Option<f64>,
    #[serde(default)]
    pub play_count: Option<u32>,
    #[serde(default)]
    pub last_played_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl HistoryEntryRecord {
    /// Resolve into an entry. Rows whose song or episode is gone yield `None`.
    pub fn into_entry(self) -> Option<HistoryEntry> {
        let id = match self.id {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let kind = match self.kind.as_deref() {
            Some("podcast") => Some(MediaKind::Episode),
            Some("track") => Some(MediaKind::Track),
            _ => None,
        };
        let track = self.content?.into_track(kind).ok()?;

        Some(HistoryEntry {
            id,
            track,
            last_position: self.last_position.unwrap_or(0.0),
            play_count: self.play_count.unwrap_or(0),
            last_played_at: self.last_played_at,
        })
    }
}

/// Body of `POST /api/history`: exactly one of the ids is set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SavePositionRequest<'a> {
    pub track_id: Option<&'a str>,
    pub podcast_id: Option<&'a str>,
    pub position: f64,
}

impl<'a> SavePositionRequest<'a> {
    pub fn new(key: &'a HistoryKey, position: f64) -> Self {
        let id = Some(key.id.as_str());
        match key.kind {
            MediaKind::Track => Self {
                track_id: id,
                podcast_id: None,
                position,
            },
            MediaKind::Episode => Self {
                track_id: None,
                podcast_id: id,
                position,
            },
        }
    }
}
