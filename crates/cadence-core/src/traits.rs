//! Collaborator contracts consumed by the playback engine.
//!
//! The engine never touches audio or the network itself. It drives a
//! [`MediaSink`] (something that can load a URL and play it) and reports
//! listening progress to a [`HistoryStore`].

use std::future::Future;

use crate::{HistoryKey, Result, Volume};

/// Notifications a media sink emits while it plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkEvent {
    /// Playback position advanced (in seconds).
    TimeUpdate(f64),
    /// Enough of the media is loaded to know its duration and to seek.
    MetadataLoaded { duration: f64 },
    /// The loaded media played to its end.
    Ended,
}

/// The host's media playback primitive.
///
/// Implementations must not call back into the engine from these methods;
/// notifications are delivered as [`SinkEvent`]s instead.
pub trait MediaSink: Send + Sync + 'static {
    /// Replace the loaded media.
    fn load(&self, url: &str) -> Result<()>;

    /// Start or resume playback. May be refused by the host.
    fn play(&self) -> Result<()>;

    fn pause(&self);

    /// Seek to a position in seconds.
    fn seek(&self, position: f64);

    fn set_volume(&self, volume: Volume);

    /// Live playback position in seconds.
    fn current_time(&self) -> f64;

    /// Duration of the loaded media, once known.
    fn duration(&self) -> Option<f64>;

    /// Called with every notification before the engine reacts to it, so
    /// sinks that mirror host state can keep their getters current.
    fn observe(&self, _event: &SinkEvent) {}
}

/// Where listening positions are remembered between sessions.
///
/// Both calls must be safe for an anonymous listener: a store without
/// credentials answers `Ok(None)` and skips saves.
pub trait HistoryStore: Send + Sync + 'static {
    /// Last saved position for `key`, or `None` when nothing useful is stored.
    fn resume_position(&self, key: &HistoryKey)
        -> impl Future<Output = Result<Option<f64>>> + Send;

    /// Record that `key` was last heard at `position` seconds.
    fn save_position(&self, key: &HistoryKey, position: f64)
        -> impl Future<Output = Result<()>> + Send;
}
