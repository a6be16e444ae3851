//! Playback engine coordinating the queue, the media sink, and listening history.

use std::sync::Arc;

use cadence_core::{Error, HistoryKey, HistoryStore, MediaSink, PlayQueue, Result, SinkEvent};
use cadence_core::{Track, Volume};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::PlayerConfig;
use crate::persist::PersistTimer;
use crate::state::PlaybackState;

/// Session-wide playback engine.
///
/// Cloning is cheap and every clone drives the same state. All mutations are
/// serialized behind one lock; history calls run as detached tasks on the
/// runtime captured at construction and never hold the lock across an await.
pub struct PlaybackEngine<S, H> {
    inner: Arc<Mutex<Inner>>,
    sink: Arc<S>,
    history: Arc<H>,
    config: PlayerConfig,
    runtime: Handle,
    state_tx: Arc<watch::Sender<PlaybackState>>,
}

impl<S, H> Clone for PlaybackEngine<S, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            sink: Arc::clone(&self.sink),
            history: Arc::clone(&self.history),
            config: self.config,
            runtime: self.runtime.clone(),
            state_tx: Arc::clone(&self.state_tx),
        }
    }
}

#[derive(Debug)]
struct Inner {
    queue: PlayQueue,
    current_track: Option<Track>,
    is_playing: bool,
    current_time: f64,
    duration: f64,
    volume: Volume,
    resume_position: f64,
    /// Bumped on every track switch; late async results compare against it.
    generation: u64,
    /// The sink reported metadata for the current load, so seeking is safe.
    media_ready: bool,
    /// Resume position waiting for `media_ready`.
    pending_resume: Option<f64>,
    /// The listener seeked since the current load; a late resume must not override it.
    user_seeked: bool,
    persist: PersistTimer,
}

impl Inner {
    fn new(volume: Volume) -> Self {
        Self {
            queue: PlayQueue::new(),
            current_track: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume,
            resume_position: 0.0,
            generation: 0,
            media_ready: false,
            pending_resume: None,
            user_seeked: false,
            persist: PersistTimer::default(),
        }
    }

    fn is_current(&self, generation: u64, id: &str) -> bool {
        self.generation == generation
            && self.current_track.as_ref().is_some_and(|t| t.id == id)
    }

    fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            current_track: self.current_track.clone(),
            queue: self.queue.items().to_vec(),
            current_index: self.queue.current_index(),
            is_playing: self.is_playing,
            current_time: self.current_time,
            duration: self.duration,
            volume: self.volume,
            resume_position: self.resume_position,
        }
    }
}

impl<S: MediaSink, H: HistoryStore> PlaybackEngine<S, H> {
    /// Create an engine on the current tokio runtime.
    pub fn new(sink: S, history: H, config: PlayerConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        Ok(Self::with_runtime(sink, history, config, runtime))
    }

    /// Create an engine that spawns its background work on `runtime`.
    pub fn with_runtime(sink: S, history: H, config: PlayerConfig, runtime: Handle) -> Self {
        let volume = config.initial_volume();
        sink.set_volume(volume);

        let inner = Inner::new(volume);
        let (state_tx, _) = watch::channel(inner.snapshot());

        Self {
            inner: Arc::new(Mutex::new(inner)),
            sink: Arc::new(sink),
            history: Arc::new(history),
            config,
            runtime,
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Current playback state.
    pub fn snapshot(&self) -> PlaybackState {
        self.inner.lock().snapshot()
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    /// Play `track` now, with `queue` as the surrounding list (album, playlist,
    /// search results). An empty `queue` queues just the track.
    pub fn play_track(&self, track: Track, queue: Vec<Track>) {
        let (key, generation) = {
            let mut inner = self.inner.lock();
            inner.queue.load(&track, queue);
            inner.is_playing = true;
            let key = track.history_key();
            self.switch_to(&mut inner, track);
            self.apply_transport(&mut inner);
            self.publish(&inner);
            (key, inner.generation)
        };

        self.spawn_resume_lookup(key, generation);
    }

    /// Flip between playing and paused. Does nothing with no track loaded.
    pub fn toggle_play_pause(&self) {
        let mut inner = self.inner.lock();
        if inner.current_track.is_none() {
            return;
        }

        inner.is_playing = !inner.is_playing;
        self.apply_transport(&mut inner);
        self.publish(&inner);
    }

    /// Advance to the next queued track. Stays put at the end of the queue.
    pub fn play_next(&self) {
        let mut inner = self.inner.lock();
        let Some(next) = inner.queue.advance().cloned() else {
            trace!("Already at the end of the queue");
            return;
        };

        self.switch_to(&mut inner, next);
        self.apply_transport(&mut inner);
        self.publish(&inner);
    }

    /// Restart the current track if it is past the restart threshold,
    /// otherwise step back one track. Stays put at the start of the queue.
    pub fn play_previous(&self) {
        let mut inner = self.inner.lock();
        if inner.current_track.is_none() {
            return;
        }

        if inner.current_time > self.config.restart_threshold_secs {
            debug!("Restarting current track");
            self.sink.seek(0.0);
            inner.current_time = 0.0;
            inner.user_seeked = true;
            inner.pending_resume = None;
        } else if let Some(previous) = inner.queue.retreat().cloned() {
            self.switch_to(&mut inner, previous);
            self.apply_transport(&mut inner);
        } else {
            return;
        }
        self.publish(&inner);
    }

    /// Seek to `position` seconds. The new time is reflected immediately,
    /// without waiting for the sink to report it.
    pub fn seek(&self, position: f64) {
        let mut inner = self.inner.lock();
        if inner.current_track.is_none() {
            return;
        }

        let position = if position.is_nan() { 0.0 } else { position.max(0.0) };
        self.sink.seek(position);
        inner.current_time = position;
        inner.user_seeked = true;
        inner.pending_resume = None;
        self.publish(&inner);
    }

    /// Set the volume (clamped to 0.0..=1.0) and pass it to the sink.
    pub fn change_volume(&self, volume: f32) {
        let mut inner = self.inner.lock();
        let volume = Volume::new(volume);
        inner.volume = volume;
        self.sink.set_volume(volume);
        self.publish(&inner);
    }

    /// React to a notification from the media sink.
    pub fn handle_sink_event(&self, event: SinkEvent) {
        self.sink.observe(&event);

        let mut inner = self.inner.lock();
        match event {
            SinkEvent::TimeUpdate(position) => {
                if inner.current_track.is_none() {
                    return;
                }
                inner.current_time = position;
                self.schedule_persist(&mut inner, position);
            }
            SinkEvent::MetadataLoaded { duration } => {
                if duration.is_finite() && duration > 0.0 {
                    inner.duration = duration;
                } else if let Some(duration) = self.sink.duration() {
                    inner.duration = duration;
                }
                inner.media_ready = true;
                if let Some(position) = inner.pending_resume.take() {
                    debug!("Resuming at {position:.1}s");
                    self.sink.seek(position);
                    inner.current_time = position;
                }
            }
            SinkEvent::Ended => self.finish_track(&mut inner),
        }
        self.publish(&inner);
    }

    /// Feed sink notifications from `events` into the engine until the channel closes.
    pub fn attach(&self, mut events: mpsc::UnboundedReceiver<SinkEvent>) -> JoinHandle<()> {
        let engine = self.clone();
        self.runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                engine.handle_sink_event(event);
            }
            debug!("Sink event channel closed");
        })
    }

    /// Make `track` current and load it into the sink. Leaves `is_playing`
    /// false when the sink cannot load it.
    fn switch_to(&self, inner: &mut Inner, track: Track) {
        if inner.persist.cancel() {
            trace!("Dropped pending position save for previous track");
        }
        inner.generation += 1;
        inner.current_time = 0.0;
        inner.duration = track.duration.as_secs_f64();
        inner.resume_position = 0.0;
        inner.pending_resume = None;
        inner.media_ready = false;
        inner.user_seeked = false;

        info!("Now playing: {}", track.display_name());
        if let Err(e) = self.sink.load(&track.media_url) {
            warn!("Failed to load {}: {e}", track.media_url);
            inner.is_playing = false;
        }
        inner.current_track = Some(track);
    }

    /// Bring the sink in line with `is_playing`.
    fn apply_transport(&self, inner: &mut Inner) {
        if inner.is_playing {
            if let Err(e) = self.sink.play() {
                warn!("Playback did not start: {e}");
                inner.is_playing = false;
            }
        } else {
            self.sink.pause();
        }
    }

    fn finish_track(&self, inner: &mut Inner) {
        if inner.current_track.is_none() {
            return;
        }
        if let Some(next) = inner.queue.advance().cloned() {
            inner.is_playing = true;
            self.switch_to(inner, next);
            self.apply_transport(inner);
            return;
        }

        // A persist task may already be past its sleep and waiting on the lock,
        // where abort cannot reach it. Retire the load so it finds itself stale.
        inner.persist.cancel();
        inner.generation += 1;
        inner.is_playing = false;
        inner.current_time = 0.0;
        self.sink.pause();
        self.sink.seek(0.0);

        if let Some(track) = &inner.current_track {
            debug!("Reached end of queue, resetting position for {}", track.id);
            self.spawn_save(track.history_key(), 0.0);
        }
    }

    /// Restart the debounce: persist `position` once updates go quiet.
    fn schedule_persist(&self, inner: &mut Inner, position: f64) {
        let Some(track) = &inner.current_track else {
            return;
        };
        let key = track.history_key();
        let generation = inner.generation;
        let delay = self.config.persist_debounce();
        let engine = self.clone();

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            engine.persist_if_current(key, generation, position);
        });
        inner.persist.restart(handle);
    }

    fn persist_if_current(&self, key: HistoryKey, generation: u64, position: f64) {
        if !self.inner.lock().is_current(generation, &key.id) {
            trace!("Skipping stale position save for {key}");
            return;
        }
        self.spawn_save(key, position);
    }

    fn spawn_save(&self, key: HistoryKey, position: f64) {
        let history = Arc::clone(&self.history);
        self.runtime.spawn(async move {
            match history.save_position(&key, position).await {
                Ok(()) => debug!("Saved position {position:.1}s for {key}"),
                Err(e) => warn!("Failed to save playback position for {key}: {e}"),
            }
        });
    }

    fn spawn_resume_lookup(&self, key: HistoryKey, generation: u64) {
        let engine = self.clone();
        self.runtime.spawn(async move {
            match engine.history.resume_position(&key).await {
                Ok(Some(position)) if position > 0.0 => {
                    engine.apply_resume(&key, generation, position);
                }
                Ok(_) => trace!("No saved position for {key}"),
                Err(e) => debug!("Resume lookup for {key} failed: {e}"),
            }
        });
    }

    fn apply_resume(&self, key: &HistoryKey, generation: u64, position: f64) {
        let mut inner = self.inner.lock();
        if !inner.is_current(generation, &key.id) {
            debug!("Ignoring resume position for {key}, track changed");
            return;
        }

        inner.resume_position = position;
        if inner.user_seeked {
            debug!("Listener already seeked, not resuming {key}");
        } else if inner.media_ready {
            debug!("Resuming {key} at {position:.1}s");
            self.sink.seek(position);
            inner.current_time = position;
        } else {
            inner.pending_resume = Some(position);
        }
        self.publish(&inner);
    }

    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.snapshot());
    }
}

#[cfg(test)]
mod tests;
