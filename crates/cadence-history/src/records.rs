//! Mapping of backend song and episode records onto [`Track`].
//!
//! The API serves rows from two stores with different shapes: document
//! records carry `_id` and camelCase fields, relational rows carry `id`
//! and snake_case fields. Episodes are told apart by a `host` field.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use cadence_core::{Error, MediaKind, Result, Track};
use serde::Deserialize;
use serde_json::Value;

/// A song or episode as the API returns it, in either store's shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, rename = "_id")]
    object_id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(default, rename = "audioUrl")]
    audio_url_camel: Option<String>,
    #[serde(default)]
    cover_image: Option<String>,
    #[serde(default, rename = "coverImage")]
    cover_image_camel: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    duration: Option<Value>,
}

impl TrackRecord {
    /// Canonical id: `id` when present, otherwise the document `_id`.
    pub fn id(&self) -> Option<String> {
        self.id
            .as_ref()
            .and_then(id_string)
            .or_else(|| self.object_id.as_ref().and_then(id_string))
    }

    /// Episodes carry a host instead of an artist.
    pub const fn kind(&self) -> MediaKind {
        if self.host.is_some() {
            MediaKind::Episode
        } else {
            MediaKind::Track
        }
    }

    /// Convert into a [`Track`], forcing `kind` when the caller already knows it.
    pub fn into_track(self, kind: Option<MediaKind>) -> Result<Track> {
        let kind = kind.unwrap_or_else(|| self.kind());
        let id = self
            .id()
            .ok_or_else(|| Error::InvalidRecord("record has no id".into()))?;
        let media_url = first_non_empty([self.audio_url, self.audio_url_camel])
            .ok_or_else(|| Error::InvalidRecord(format!("record {id} has no audio URL")))?;

        let title = first_non_empty([self.title, self.name]).unwrap_or_default();
        let artist = first_non_empty([self.artist, self.host]).unwrap_or_default();
        let cover = first_non_empty([self.cover_image, self.cover_image_camel, self.image_url]);
        let duration = self.duration.as_ref().and_then(seconds).unwrap_or(0);

        let mut track = Track::new(id, title, media_url)
            .with_artist(artist)
            .with_kind(kind)
            .with_duration(duration);
        track.cover_url = cover;
        track.album = first_non_empty([self.album]);
        Ok(track)
    }
}

impl TryFrom<TrackRecord> for Track {
    type Error = Error;

    fn try_from(record: TrackRecord) -> Result<Self> {
        record.into_track(None)
    }
}

/// Parse a JSON array of records, e.g. a playlist's song list.
pub fn tracks_from_json(json: &str) -> Result<Vec<Track>> {
    let records: Vec<TrackRecord> = serde_json::from_str(json)?;
    records.into_iter().map(Track::try_from).collect()
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // Extended JSON object ids: {"$oid": "..."}
        Value::Object(map) => map.get("$oid").and_then(id_string),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds(value: &Value) -> Option<u64> {
    let secs = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (secs.is_finite() && secs >= 0.0).then(|| secs.round() as u64)
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}
