//! Simulated media element.
//!
//! Stands in for a real audio element: it drains the engine's sink commands,
//! advances a virtual playhead on a tokio interval, and reports back the
//! events a browser `<audio>` element would fire.

use std::collections::HashMap;
use std::time::Duration;

use cadence_core::{SinkEvent, Track};
use cadence_player::SinkCommand;
use crossbeam_channel::{Receiver, TryRecvError};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Length assumed for media the catalog has no duration for.
const FALLBACK_DURATION_SECS: f64 = 180.0;

#[derive(Debug, Default)]
pub struct SimulatedPlayer {
    /// Known durations by media URL.
    durations: HashMap<String, f64>,
    /// Duration of the loaded media, `None` before the first load.
    loaded: Option<f64>,
    position: f64,
    playing: bool,
}

impl SimulatedPlayer {
    pub fn new<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> Self {
        let durations = tracks
            .into_iter()
            .filter(|t| t.duration.as_seconds() > 0)
            .map(|t| (t.media_url.clone(), t.duration.as_secs_f64()))
            .collect();
        Self {
            durations,
            ..Self::default()
        }
    }

    /// Drive the playhead until either channel closes.
    pub async fn run(
        mut self,
        commands: Receiver<SinkCommand>,
        events: UnboundedSender<SinkEvent>,
        tick: Duration,
    ) {
        info!("Simulated player started ({tick:?} tick)");
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            loop {
                match commands.try_recv() {
                    Ok(command) => {
                        if let Some(event) = self.handle_command(command) {
                            if events.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        debug!("Command channel closed, shutting down");
                        return;
                    }
                }
            }

            for event in self.advance(tick.as_secs_f64()) {
                if events.send(event).is_err() {
                    debug!("Event channel closed, shutting down");
                    return;
                }
            }
        }
    }

    fn handle_command(&mut self, command: SinkCommand) -> Option<SinkEvent> {
        match command {
            SinkCommand::Load(url) => {
                let duration = self
                    .durations
                    .get(&url)
                    .copied()
                    .unwrap_or(FALLBACK_DURATION_SECS);
                debug!("Loaded {url} ({duration}s)");
                self.loaded = Some(duration);
                self.position = 0.0;
                self.playing = false;
                Some(SinkEvent::MetadataLoaded { duration })
            }
            SinkCommand::Play => {
                self.playing = self.loaded.is_some();
                None
            }
            SinkCommand::Pause => {
                self.playing = false;
                None
            }
            SinkCommand::Seek(position) => {
                let end = self.loaded.unwrap_or(0.0);
                self.position = position.clamp(0.0, end);
                Some(SinkEvent::TimeUpdate(self.position))
            }
            SinkCommand::SetVolume(_) => None,
        }
    }

    fn advance(&mut self, elapsed: f64) -> Vec<SinkEvent> {
        let Some(duration) = self.loaded else {
            return Vec::new();
        };
        if !self.playing {
            return Vec::new();
        }

        self.position += elapsed;
        if self.position >= duration {
            self.position = duration;
            self.playing = false;
            vec![SinkEvent::TimeUpdate(duration), SinkEvent::Ended]
        } else {
            vec![SinkEvent::TimeUpdate(self.position)]
        }
    }
}
