#![allow(clippy::unwrap_used, clippy::float_cmp)]

use super::*;
use crate::sink::SinkCommand;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Default)]
struct RecordingSink {
    commands: Mutex<Vec<SinkCommand>>,
    position: Mutex<f64>,
    refuse_play: AtomicBool,
    fail_load: AtomicBool,
    /// `set_volume` stalls, keeping the engine lock held by the caller.
    slow_volume: AtomicBool,
}

impl RecordingSink {
    fn commands(&self) -> Vec<SinkCommand> {
        self.commands.lock().clone()
    }

    fn seeks(&self) -> Vec<f64> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                SinkCommand::Seek(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn last(&self) -> Option<SinkCommand> {
        self.commands.lock().last().cloned()
    }
}

impl MediaSink for RecordingSink {
    fn load(&self, url: &str) -> Result<()> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(Error::Sink("unsupported media".into()));
        }
        *self.position.lock() = 0.0;
        self.commands.lock().push(SinkCommand::Load(url.to_string()));
        Ok(())
    }

    fn play(&self) -> Result<()> {
        if self.refuse_play.load(Ordering::SeqCst) {
            return Err(Error::PlaybackBlocked("autoplay policy".into()));
        }
        self.commands.lock().push(SinkCommand::Play);
        Ok(())
    }

    fn pause(&self) {
        self.commands.lock().push(SinkCommand::Pause);
    }

    fn seek(&self, position: f64) {
        *self.position.lock() = position;
        self.commands.lock().push(SinkCommand::Seek(position));
    }

    fn set_volume(&self, volume: Volume) {
        if self.slow_volume.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }
        self.commands.lock().push(SinkCommand::SetVolume(volume));
    }

    fn current_time(&self) -> f64 {
        *self.position.lock()
    }

    fn duration(&self) -> Option<f64> {
        None
    }

    fn observe(&self, event: &SinkEvent) {
        if let SinkEvent::TimeUpdate(position) = event {
            *self.position.lock() = *position;
        }
    }
}

#[derive(Default)]
struct FakeHistory {
    positions: Mutex<HashMap<HistoryKey, f64>>,
    saves: Mutex<Vec<(HistoryKey, f64)>>,
    resume_delay: Duration,
    failing: bool,
}

impl FakeHistory {
    fn with_position(self, id: &str, position: f64) -> Self {
        self.positions.lock().insert(HistoryKey::track(id), position);
        self
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.resume_delay = delay;
        self
    }

    fn saves(&self) -> Vec<(HistoryKey, f64)> {
        self.saves.lock().clone()
    }
}

impl HistoryStore for FakeHistory {
    async fn resume_position(&self, key: &HistoryKey) -> Result<Option<f64>> {
        if !self.resume_delay.is_zero() {
            tokio::time::sleep(self.resume_delay).await;
        }
        if self.failing {
            return Err(Error::Network("history unreachable".into()));
        }
        Ok(self.positions.lock().get(key).copied())
    }

    async fn save_position(&self, key: &HistoryKey, position: f64) -> Result<()> {
        if self.failing {
            return Err(Error::Network("history unreachable".into()));
        }
        self.saves.lock().push((key.clone(), position));
        Ok(())
    }
}

type TestEngine = PlaybackEngine<RecordingSink, FakeHistory>;

fn track(id: &str) -> Track {
    Track::new(id, format!("Song {id}"), format!("https://cdn.example/{id}.mp3"))
        .with_artist("Band")
        .with_duration(200)
}

fn abc() -> Vec<Track> {
    vec![track("a"), track("b"), track("c")]
}

fn engine_with(history: FakeHistory) -> TestEngine {
    PlaybackEngine::new(RecordingSink::default(), history, PlayerConfig::default()).unwrap()
}

fn engine() -> TestEngine {
    engine_with(FakeHistory::default())
}

/// Let spawned tasks run without moving the paused clock.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn current_id(engine: &TestEngine) -> Option<String> {
    engine.snapshot().current_track.map(|t| t.id)
}

#[tokio::test]
async fn test_play_track_sets_queue_and_index() {
    let engine = engine();
    engine.play_track(track("b"), abc());

    let state = engine.snapshot();
    assert_eq!(current_id(&engine).as_deref(), Some("b"));
    assert_eq!(state.queue, abc());
    assert_eq!(state.current_index, 1);
    assert!(state.is_playing);
    assert_eq!(state.duration, 200.0);

    let commands = engine.sink().commands();
    assert!(commands.contains(&SinkCommand::Load("https://cdn.example/b.mp3".into())));
    assert_eq!(engine.sink().last(), Some(SinkCommand::Play));
}

#[tokio::test]
async fn test_play_track_without_queue_queues_single_track() {
    let engine = engine();
    engine.play_track(track("a"), abc());
    engine.play_track(track("z"), Vec::new());

    let state = engine.snapshot();
    assert_eq!(state.queue, vec![track("z")]);
    assert_eq!(state.current_index, 0);
    assert_eq!(current_id(&engine).as_deref(), Some("z"));
}

#[tokio::test]
async fn test_play_track_missing_from_queue_falls_back_to_zero() {
    let engine = engine();
    engine.play_track(track("z"), abc());

    let state = engine.snapshot();
    assert_eq!(state.current_index, 0);
    assert_eq!(current_id(&engine).as_deref(), Some("z"));
}

#[tokio::test]
async fn test_next_walks_queue_and_stops_at_end() {
    let engine = engine();
    engine.play_track(track("b"), abc());

    engine.play_next();
    assert_eq!(current_id(&engine).as_deref(), Some("c"));
    assert_eq!(engine.snapshot().current_index, 2);
    assert_eq!(engine.sink().last(), Some(SinkCommand::Play));

    let before = engine.sink().commands().len();
    engine.play_next();
    assert_eq!(current_id(&engine).as_deref(), Some("c"));
    assert_eq!(engine.snapshot().current_index, 2);
    assert_eq!(engine.sink().commands().len(), before);
}

#[tokio::test]
async fn test_next_resets_time_and_keeps_paused_state() {
    let engine = engine();
    engine.play_track(track("a"), abc());
    engine.handle_sink_event(SinkEvent::TimeUpdate(50.0));
    engine.toggle_play_pause();

    engine.play_next();
    let state = engine.snapshot();
    assert_eq!(state.current_time, 0.0);
    assert!(!state.is_playing);
    assert_eq!(engine.sink().last(), Some(SinkCommand::Pause));
}

#[tokio::test]
async fn test_previous_at_start_is_noop() {
    let engine = engine();
    engine.play_track(track("a"), abc());
    engine.handle_sink_event(SinkEvent::TimeUpdate(2.0));
    let before = engine.snapshot();

    engine.play_previous();
    assert_eq!(engine.snapshot(), before);
}

#[tokio::test]
async fn test_previous_restarts_past_threshold() {
    let engine = engine();
    engine.play_track(track("b"), abc());
    engine.handle_sink_event(SinkEvent::TimeUpdate(10.0));

    engine.play_previous();
    let state = engine.snapshot();
    assert_eq!(state.current_time, 0.0);
    assert_eq!(state.current_index, 1);
    assert_eq!(current_id(&engine).as_deref(), Some("b"));
    assert_eq!(engine.sink().last(), Some(SinkCommand::Seek(0.0)));
}

#[tokio::test]
async fn test_previous_steps_back_near_start() {
    let engine = engine();
    engine.play_track(track("b"), abc());
    engine.handle_sink_event(SinkEvent::TimeUpdate(3.0));

    engine.play_previous();
    let state = engine.snapshot();
    assert_eq!(state.current_index, 0);
    assert_eq!(current_id(&engine).as_deref(), Some("a"));
    assert_eq!(state.current_time, 0.0);
}

#[tokio::test]
async fn test_seek_is_reflected_immediately() {
    let engine = engine();
    engine.play_track(track("a"), Vec::new());

    engine.seek(45.0);
    assert_eq!(engine.snapshot().current_time, 45.0);
    assert_eq!(engine.sink().last(), Some(SinkCommand::Seek(45.0)));

    engine.seek(-3.0);
    assert_eq!(engine.snapshot().current_time, 0.0);
}

#[tokio::test]
async fn test_transport_without_track_is_noop() {
    let engine = engine();
    let before = engine.sink().commands();

    engine.toggle_play_pause();
    engine.seek(30.0);
    engine.play_next();
    engine.play_previous();
    engine.handle_sink_event(SinkEvent::Ended);

    assert_eq!(engine.snapshot(), PlaybackState::default());
    assert_eq!(engine.sink().commands(), before);
}

#[tokio::test]
async fn test_toggle_play_pause() {
    let engine = engine();
    engine.play_track(track("a"), Vec::new());

    engine.toggle_play_pause();
    assert!(!engine.snapshot().is_playing);
    assert_eq!(engine.sink().last(), Some(SinkCommand::Pause));

    engine.toggle_play_pause();
    assert!(engine.snapshot().is_playing);
    assert_eq!(engine.sink().last(), Some(SinkCommand::Play));
}

#[tokio::test]
async fn test_change_volume_clamps_and_propagates() {
    let engine = engine();
    assert_eq!(
        engine.sink().commands(),
        vec![SinkCommand::SetVolume(Volume::MAX)]
    );

    engine.change_volume(0.25);
    assert_eq!(engine.snapshot().volume, Volume::new(0.25));
    assert_eq!(
        engine.sink().last(),
        Some(SinkCommand::SetVolume(Volume::new(0.25)))
    );

    engine.change_volume(7.0);
    assert_eq!(engine.snapshot().volume, Volume::MAX);
}

#[tokio::test]
async fn test_metadata_updates_duration() {
    let engine = engine();
    engine.play_track(track("a"), Vec::new());
    engine.handle_sink_event(SinkEvent::MetadataLoaded { duration: 187.5 });
    assert_eq!(engine.snapshot().duration, 187.5);

    engine.handle_sink_event(SinkEvent::MetadataLoaded {
        duration: f64::INFINITY,
    });
    assert_eq!(engine.snapshot().duration, 187.5);
}

#[tokio::test]
async fn test_ended_mid_queue_advances_and_plays() {
    let engine = engine();
    engine.play_track(track("a"), abc());
    engine.toggle_play_pause();

    engine.handle_sink_event(SinkEvent::Ended);
    let state = engine.snapshot();
    assert_eq!(state.current_index, 1);
    assert_eq!(current_id(&engine).as_deref(), Some("b"));
    assert!(state.is_playing);
    assert_eq!(engine.sink().last(), Some(SinkCommand::Play));
}

#[tokio::test(start_paused = true)]
async fn test_ended_at_final_index_stops_and_resets_position() {
    let engine = engine();
    engine.play_track(track("a"), vec![track("a")]);
    settle().await;

    engine.handle_sink_event(SinkEvent::TimeUpdate(199.0));
    engine.handle_sink_event(SinkEvent::Ended);
    settle().await;

    let state = engine.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.current_time, 0.0);
    assert_eq!(engine.history().saves(), vec![(HistoryKey::track("a"), 0.0)]);

    // The debounced save of 199s must not land after the reset.
    tokio::time::advance(Duration::from_secs(6)).await;
    settle().await;
    assert_eq!(engine.history().saves(), vec![(HistoryKey::track("a"), 0.0)]);
}

// The debounce fires while another thread holds the engine lock, so its task
// is already waiting on the lock when `Ended` queues up behind it.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ended_beats_save_waiting_on_lock() {
    let config = PlayerConfig::default().with_persist_debounce(Duration::from_millis(50));
    let engine =
        PlaybackEngine::new(RecordingSink::default(), FakeHistory::default(), config).unwrap();
    engine.play_track(track("a"), vec![track("a")]);
    engine.handle_sink_event(SinkEvent::TimeUpdate(199.0));

    engine.sink().slow_volume.store(true, Ordering::SeqCst);
    let holder = {
        let engine = engine.clone();
        std::thread::spawn(move || engine.change_volume(0.5))
    };
    let ender = {
        let engine = engine.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(15));
            engine.handle_sink_event(SinkEvent::Ended);
        })
    };
    holder.join().unwrap();
    ender.join().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let saves = engine.history().saves();
    assert_eq!(saves.last(), Some(&(HistoryKey::track("a"), 0.0)));
    assert!(!engine.snapshot().is_playing);
}

#[tokio::test(start_paused = true)]
async fn test_time_updates_are_debounced() {
    let engine = engine();
    engine.play_track(track("a"), Vec::new());
    settle().await;

    for i in 1..=5 {
        engine.handle_sink_event(SinkEvent::TimeUpdate(f64::from(i)));
        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;
    }
    assert!(engine.history().saves().is_empty());

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(engine.history().saves(), vec![(HistoryKey::track("a"), 5.0)]);
    assert_eq!(engine.snapshot().current_time, 5.0);
}

#[tokio::test(start_paused = true)]
async fn test_track_switch_cancels_pending_save() {
    let engine = engine();
    engine.play_track(track("a"), abc());
    engine.handle_sink_event(SinkEvent::TimeUpdate(30.0));

    engine.play_next();
    tokio::time::advance(Duration::from_secs(6)).await;
    settle().await;
    assert!(engine.history().saves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_episode_positions_are_saved_under_episode_key() {
    let engine = engine();
    let episode = track("ep").with_kind(cadence_core::MediaKind::Episode);
    engine.play_track(episode, Vec::new());
    engine.handle_sink_event(SinkEvent::TimeUpdate(12.0));
    settle().await;

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(engine.history().saves(), vec![(HistoryKey::episode("ep"), 12.0)]);
}

#[tokio::test(start_paused = true)]
async fn test_resume_waits_for_metadata() {
    let engine = engine_with(FakeHistory::default().with_position("a", 42.0));
    engine.play_track(track("a"), Vec::new());
    settle().await;

    let state = engine.snapshot();
    assert_eq!(state.resume_position, 42.0);
    assert_eq!(state.current_time, 0.0);
    assert!(engine.sink().seeks().is_empty());

    engine.handle_sink_event(SinkEvent::MetadataLoaded { duration: 200.0 });
    assert_eq!(engine.snapshot().current_time, 42.0);
    assert_eq!(engine.sink().seeks(), vec![42.0]);
}

#[tokio::test(start_paused = true)]
async fn test_resume_seeks_at_once_when_media_is_ready() {
    let history = FakeHistory::default()
        .with_position("a", 42.0)
        .delayed(Duration::from_secs(1));
    let engine = engine_with(history);
    engine.play_track(track("a"), Vec::new());
    engine.handle_sink_event(SinkEvent::MetadataLoaded { duration: 200.0 });
    settle().await;

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(engine.snapshot().current_time, 42.0);
    assert_eq!(engine.sink().seeks(), vec![42.0]);
}

#[tokio::test(start_paused = true)]
async fn test_late_resume_does_not_touch_new_track() {
    let history = FakeHistory::default()
        .with_position("a", 42.0)
        .delayed(Duration::from_secs(1));
    let engine = engine_with(history);
    engine.play_track(track("a"), abc());
    engine.play_next();
    engine.handle_sink_event(SinkEvent::MetadataLoaded { duration: 200.0 });

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    let state = engine.snapshot();
    assert_eq!(current_id(&engine).as_deref(), Some("b"));
    assert_eq!(state.current_time, 0.0);
    assert_eq!(state.resume_position, 0.0);
    assert!(engine.sink().seeks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_seek_before_resume_wins() {
    let history = FakeHistory::default()
        .with_position("a", 42.0)
        .delayed(Duration::from_secs(1));
    let engine = engine_with(history);
    engine.play_track(track("a"), Vec::new());
    engine.handle_sink_event(SinkEvent::MetadataLoaded { duration: 200.0 });
    engine.seek(10.0);
    settle().await;

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    let state = engine.snapshot();
    assert_eq!(state.current_time, 10.0);
    assert_eq!(state.resume_position, 42.0);
    assert_eq!(engine.sink().seeks(), vec![10.0]);
}

#[tokio::test(start_paused = true)]
async fn test_failing_history_does_not_affect_playback() {
    let engine = engine_with(FakeHistory {
        failing: true,
        ..FakeHistory::default()
    });
    engine.play_track(track("a"), abc());
    engine.handle_sink_event(SinkEvent::MetadataLoaded { duration: 200.0 });
    engine.handle_sink_event(SinkEvent::TimeUpdate(20.0));
    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    let state = engine.snapshot();
    assert!(state.is_playing);
    assert_eq!(state.current_time, 20.0);
    assert_eq!(state.resume_position, 0.0);

    engine.play_next();
    engine.handle_sink_event(SinkEvent::Ended);
    assert_eq!(current_id(&engine).as_deref(), Some("c"));
    assert!(engine.snapshot().is_playing);
}

#[tokio::test]
async fn test_refused_play_leaves_engine_paused() {
    let sink = RecordingSink::default();
    sink.refuse_play.store(true, Ordering::SeqCst);
    let engine =
        PlaybackEngine::new(sink, FakeHistory::default(), PlayerConfig::default()).unwrap();

    engine.play_track(track("a"), Vec::new());
    let state = engine.snapshot();
    assert!(!state.is_playing);
    assert_eq!(current_id(&engine).as_deref(), Some("a"));

    engine.sink().refuse_play.store(false, Ordering::SeqCst);
    engine.toggle_play_pause();
    assert!(engine.snapshot().is_playing);
}

#[tokio::test]
async fn test_failed_load_leaves_engine_stopped() {
    let sink = RecordingSink::default();
    sink.fail_load.store(true, Ordering::SeqCst);
    let engine =
        PlaybackEngine::new(sink, FakeHistory::default(), PlayerConfig::default()).unwrap();

    engine.play_track(track("a"), Vec::new());
    assert!(!engine.snapshot().is_playing);
    assert_eq!(engine.sink().last(), Some(SinkCommand::Pause));
}

#[tokio::test]
async fn test_subscribers_see_changes() {
    let engine = engine();
    let mut rx = engine.subscribe();
    assert!(rx.borrow().current_track.is_none());

    engine.play_track(track("a"), Vec::new());
    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.current_track.map(|t| t.id).as_deref(), Some("a"));
}

#[tokio::test]
async fn test_attach_pumps_sink_events() {
    let engine = engine();
    engine.play_track(track("a"), Vec::new());

    let (tx, rx) = mpsc::unbounded_channel();
    let pump = engine.attach(rx);
    tx.send(SinkEvent::MetadataLoaded { duration: 180.0 }).unwrap();
    tx.send(SinkEvent::TimeUpdate(12.0)).unwrap();
    drop(tx);
    pump.await.unwrap();

    let state = engine.snapshot();
    assert_eq!(state.duration, 180.0);
    assert_eq!(state.current_time, 12.0);
    assert_eq!(engine.sink().current_time(), 12.0);
}

#[test]
fn test_new_requires_runtime() {
    let result = PlaybackEngine::new(
        RecordingSink::default(),
        FakeHistory::default(),
        PlayerConfig::default(),
    );
    assert!(matches!(result, Err(Error::Runtime(_))));
}

proptest! {
    #[test]
    fn prop_play_track_index_invariant(len in 1usize..10, pick in 0usize..14) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let engine = PlaybackEngine::with_runtime(
            RecordingSink::default(),
            FakeHistory::default(),
            PlayerConfig::default(),
            runtime.handle().clone(),
        );
        let queue: Vec<Track> = (0..len).map(|i| track(&i.to_string())).collect();
        let target = track(&pick.to_string());

        engine.play_track(target.clone(), queue.clone());
        let state = engine.snapshot();
        prop_assert_eq!(state.current_track.as_ref().map(|t| &t.id), Some(&target.id));
        prop_assert_eq!(&state.queue, &queue);
        prop_assert_eq!(state.current_index, if pick < len { pick } else { 0 });
        if pick < len {
            prop_assert_eq!(&state.queue[state.current_index].id, &target.id);
        }
    }
}
