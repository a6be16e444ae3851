//! Channel-backed media sink.
//!
//! For hosts that own the real audio element (a webview, a native player):
//! the engine's commands are queued on a channel the host drains, and the
//! host's notifications are mirrored back so the getters stay current.

use cadence_core::{Error, MediaSink, Result, SinkEvent, Volume};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use tracing::{trace, warn};

/// Commands forwarded to the host media element.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCommand {
    /// Replace the loaded media with this URL.
    Load(String),
    /// Start or resume playback.
    Play,
    /// Pause playback.
    Pause,
    /// Seek to a position in seconds.
    Seek(f64),
    /// Set volume (0.0 to 1.0).
    SetVolume(Volume),
}

/// A [`MediaSink`] that forwards every call as a [`SinkCommand`].
pub struct CommandSink {
    command_tx: Sender<SinkCommand>,
    /// URL of the last load the host accepted.
    source: RwLock<Option<String>>,
    position: RwLock<f64>,
    duration: RwLock<Option<f64>>,
}

impl CommandSink {
    /// Create a sink and the receiver the host drains commands from.
    pub fn new() -> (Self, Receiver<SinkCommand>) {
        let (command_tx, command_rx) = unbounded();
        let sink = Self {
            command_tx,
            source: RwLock::new(None),
            position: RwLock::new(0.0),
            duration: RwLock::new(None),
        };
        (sink, command_rx)
    }

    fn send(&self, command: SinkCommand) -> Result<()> {
        trace!("Sink command: {command:?}");
        self.command_tx
            .send(command)
            .map_err(|e| Error::Sink(format!("Failed to send command: {e}")))
    }

    fn send_or_warn(&self, command: SinkCommand) {
        if let Err(e) = self.send(command) {
            warn!("{e}");
        }
    }
}

impl MediaSink for CommandSink {
    fn load(&self, url: &str) -> Result<()> {
        *self.position.write() = 0.0;
        *self.duration.write() = None;
        let sent = self.send(SinkCommand::Load(url.to_string()));
        *self.source.write() = sent.is_ok().then(|| url.to_string());
        sent
    }

    fn play(&self) -> Result<()> {
        if self.source.read().is_none() {
            return Err(Error::PlaybackBlocked("no media loaded".to_string()));
        }
        self.send(SinkCommand::Play)
    }

    fn pause(&self) {
        self.send_or_warn(SinkCommand::Pause);
    }

    fn seek(&self, position: f64) {
        *self.position.write() = position;
        self.send_or_warn(SinkCommand::Seek(position));
    }

    fn set_volume(&self, volume: Volume) {
        self.send_or_warn(SinkCommand::SetVolume(volume));
    }

    fn current_time(&self) -> f64 {
        *self.position.read()
    }

    fn duration(&self) -> Option<f64> {
        *self.duration.read()
    }

    fn observe(&self, event: &SinkEvent) {
        match *event {
            SinkEvent::TimeUpdate(position) => *self.position.write() = position,
            SinkEvent::MetadataLoaded { duration } => *self.duration.write() = Some(duration),
            SinkEvent::Ended => {}
        }
    }
}
