//! Integration tests for the playback session
//!
//! These tests drive full session scenarios through the public surface:
//! queue replacement, the preparation cycle, error classification, catalog
//! side effects, and the command runtime.

use aria_core::{EntityStore, MemoryStore, SoundQuality, Track};
use aria_session::player::{
    CacheCheck, Collaborators, MediaPlayer, NetworkPolicy, PlayerEvent, PlayerFactory, UriResolver,
};
use aria_session::{
    PlayMode, PlaybackPhase, PlaybackSession, Playlist, ResolutionError, SessionConfig,
    SessionEvent, SessionRuntime,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Test collaborators =====

#[derive(Default)]
struct PlayerLog {
    prepared_uris: Vec<String>,
    position_ms: u64,
}

struct MockPlayer {
    log: Arc<Mutex<PlayerLog>>,
}

impl MediaPlayer for MockPlayer {
    fn prepare(&mut self, uri: &str) {
        self.log.lock().unwrap().prepared_uris.push(uri.to_string());
    }

    fn start(&mut self) {}
    fn pause(&mut self) {}
    fn stop(&mut self) {}

    fn seek_to(&mut self, position_ms: u64) {
        self.log.lock().unwrap().position_ms = position_ms;
    }

    fn position_ms(&self) -> u64 {
        self.log.lock().unwrap().position_ms
    }

    fn release(&mut self) {}
}

struct MockPlatform {
    log: Arc<Mutex<PlayerLog>>,
    resolver_fails: Arc<AtomicBool>,
    cached: Arc<AtomicBool>,
    wifi_only: Arc<AtomicBool>,
    network_up: Arc<AtomicBool>,
}

impl MockPlatform {
    fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(PlayerLog::default())),
            resolver_fails: Arc::new(AtomicBool::new(false)),
            cached: Arc::new(AtomicBool::new(true)),
            wifi_only: Arc::new(AtomicBool::new(false)),
            network_up: Arc::new(AtomicBool::new(true)),
        }
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            player_factory: Box::new(Factory {
                log: self.log.clone(),
            }),
            resolver: Box::new(Resolver {
                fails: self.resolver_fails.clone(),
            }),
            cache: Box::new(Cache {
                cached: self.cached.clone(),
            }),
            network: Box::new(Network {
                wifi_only: self.wifi_only.clone(),
                network_up: self.network_up.clone(),
            }),
        }
    }

    fn prepared_uris(&self) -> Vec<String> {
        self.log.lock().unwrap().prepared_uris.clone()
    }
}

struct Factory {
    log: Arc<Mutex<PlayerLog>>,
}

impl PlayerFactory for Factory {
    fn create(&self) -> Box<dyn MediaPlayer> {
        Box::new(MockPlayer {
            log: self.log.clone(),
        })
    }
}

struct Resolver {
    fails: Arc<AtomicBool>,
}

impl UriResolver for Resolver {
    fn resolve(
        &self,
        track: &Track,
        _quality: SoundQuality,
    ) -> Result<String, ResolutionError> {
        if self.fails.load(Ordering::SeqCst) {
            Err(ResolutionError::PlayerError)
        } else {
            Ok(track.uri.clone())
        }
    }
}

struct Cache {
    cached: Arc<AtomicBool>,
}

impl CacheCheck for Cache {
    fn is_cached(&self, _track: &Track, _quality: SoundQuality) -> bool {
        self.cached.load(Ordering::SeqCst)
    }
}

struct Network {
    wifi_only: Arc<AtomicBool>,
    network_up: Arc<AtomicBool>,
}

impl NetworkPolicy for Network {
    fn wifi_only_restriction_active(&self) -> bool {
        self.wifi_only.load(Ordering::SeqCst)
    }

    fn network_available(&self) -> bool {
        self.network_up.load(Ordering::SeqCst)
    }
}

// ===== Helpers =====

fn fresh_session() -> (PlaybackSession, MockPlatform) {
    fresh_session_with(SessionConfig::default())
}

fn fresh_session_with(config: SessionConfig) -> (PlaybackSession, MockPlatform) {
    let platform = MockPlatform::new();
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let session = PlaybackSession::new(store, platform.collaborators(), config);
    (session, platform)
}

fn stored_track(session: &mut PlaybackSession, title: &str) -> Track {
    let mut track = Track::new(title, format!("file:///music/{title}.mp3"))
        .with_artist("Test Artist")
        .with_duration(Duration::from_secs(180));
    session.catalog().put_track(&mut track).unwrap();
    track
}

fn queue_of(session: &mut PlaybackSession, titles: &[&str]) -> Vec<Track> {
    titles
        .iter()
        .map(|title| stored_track(session, title))
        .collect()
}

fn fire_ready(session: &mut PlaybackSession) {
    let epoch = session.epoch();
    session.handle_player_event(epoch, PlayerEvent::Ready);
}

// ===== Scenario tests =====

#[test]
fn fresh_queue_play_skip_records_history() {
    let (mut session, _platform) = fresh_session();
    let tracks = queue_of(&mut session, &["A", "B", "C"]);

    let playlist = Playlist::builder().append_all(tracks).build();
    session.set_queue(playlist, 0, false).unwrap();

    session.play().unwrap();
    assert_eq!(session.snapshot().phase, PlaybackPhase::Preparing);

    fire_ready(&mut session);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Playing);
    assert_eq!(snapshot.track.unwrap().title, "A");

    let titles: Vec<String> = session.history().iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["A".to_string()]);

    session.skip_to_next().unwrap();
    assert_eq!(session.snapshot().phase, PlaybackPhase::Preparing);

    fire_ready(&mut session);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Playing);
    assert_eq!(snapshot.track.unwrap().title, "B");

    // Most-recent-first read order
    let titles: Vec<String> = session.history().iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["B".to_string(), "A".to_string()]);
}

#[test]
fn set_queue_during_preparation_drops_the_stale_ready() {
    let (mut session, platform) = fresh_session();
    let old = queue_of(&mut session, &["old"]);
    let new = queue_of(&mut session, &["new"]);

    session
        .set_queue(Playlist::builder().append_all(old).build(), 0, true)
        .unwrap();
    let stale_epoch = session.epoch();

    session
        .set_queue(Playlist::builder().append_all(new).build(), 0, true)
        .unwrap();

    // The delayed ready for the cancelled preparation arrives late
    session.handle_player_event(stale_epoch, PlayerEvent::Ready);
    assert_eq!(session.snapshot().phase, PlaybackPhase::Preparing);

    fire_ready(&mut session);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Playing);
    assert_eq!(snapshot.track.unwrap().title, "new");

    // The most recent preparation belongs to the new queue
    let uris = platform.prepared_uris();
    assert_eq!(uris.last().unwrap(), "file:///music/new.mp3");
}

#[test]
fn favorite_toggle_notifies_listeners_off_the_command_context() {
    let (mut session, _platform) = fresh_session();
    let track = stored_track(&mut session, "liked");

    let (tx, rx) = channel();
    let command_thread = std::thread::current().id();
    session.subscribe(move |event| {
        if matches!(event, SessionEvent::FavoriteChanged) {
            tx.send(std::thread::current().id()).unwrap();
        }
    });

    session.toggle_favorite(&track);
    assert!(session.is_favorite(track.id));

    session.toggle_favorite(&track);
    assert!(!session.is_favorite(track.id));

    let delivery = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_ne!(delivery, command_thread);
    rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn history_capacity_from_config_is_enforced() {
    let (mut session, _platform) = fresh_session_with(SessionConfig {
        history_capacity: 3,
        ..SessionConfig::default()
    });

    let tracks = queue_of(&mut session, &["1", "2", "3", "4"]);
    for track in &tracks {
        session.catalog().add_history(track);
    }

    let titles: Vec<String> = session.history().iter().map(|t| t.title.clone()).collect();
    assert_eq!(
        titles,
        vec!["4".to_string(), "3".to_string(), "2".to_string()]
    );
}

#[test]
fn resolution_failures_surface_through_the_hub_not_the_command() {
    let (mut session, platform) = fresh_session();
    let tracks = queue_of(&mut session, &["remote"]);

    let (tx, rx) = channel();
    session.subscribe(move |event| {
        if let SessionEvent::PlaybackError { classification } = event {
            tx.send(*classification).unwrap();
        }
    });

    platform.cached.store(false, Ordering::SeqCst);
    platform.wifi_only.store(true, Ordering::SeqCst);

    // The command itself succeeds; the failure is asynchronous
    session
        .set_queue(Playlist::builder().append_all(tracks).build(), 0, true)
        .unwrap();

    assert_eq!(session.snapshot().phase, PlaybackPhase::Error);
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap(),
        ResolutionError::WifiOnlyRestricted
    );

    // Lifting the restriction and retrying recovers
    platform.wifi_only.store(false, Ordering::SeqCst);
    session.retry().unwrap();
    fire_ready(&mut session);
    assert_eq!(session.snapshot().phase, PlaybackPhase::Playing);
}

#[test]
fn progress_events_support_extrapolation() {
    let (mut session, platform) = fresh_session();
    let tracks = queue_of(&mut session, &["long"]);

    let (tx, rx) = channel();
    session.subscribe(move |event| {
        if let SessionEvent::Progress {
            position_ms,
            captured_at,
            ..
        } = event
        {
            tx.send((*position_ms, *captured_at)).unwrap();
        }
    });

    session
        .set_queue(Playlist::builder().append_all(tracks).build(), 0, true)
        .unwrap();
    fire_ready(&mut session);

    platform.log.lock().unwrap().position_ms = 30_000;
    session.progress_tick();

    let (position_ms, captured_at) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(position_ms, 30_000);

    let later = captured_at + Duration::from_millis(500);
    let extrapolated = position_ms + later.duration_since(captured_at).as_millis() as u64;
    assert_eq!(extrapolated, 30_500);
}

#[test]
fn sequential_queue_end_reports_queue_ended() {
    let (mut session, _platform) = fresh_session();
    let tracks = queue_of(&mut session, &["only"]);

    let (tx, rx) = channel();
    session.subscribe(move |event| {
        if matches!(event, SessionEvent::QueueEnded) {
            tx.send(()).unwrap();
        }
    });

    session
        .set_queue(Playlist::builder().append_all(tracks).build(), 0, true)
        .unwrap();
    fire_ready(&mut session);

    let epoch = session.epoch();
    session.handle_player_event(epoch, PlayerEvent::Completed);

    assert_eq!(session.snapshot().phase, PlaybackPhase::Idle);
    rx.recv_timeout(Duration::from_secs(2)).unwrap();
}

#[test]
fn loop_all_queue_cycles_forever() {
    let (mut session, _platform) = fresh_session();
    let tracks = queue_of(&mut session, &["x", "y"]);

    session
        .set_queue(Playlist::builder().append_all(tracks).build(), 1, true)
        .unwrap();
    session.set_play_mode(PlayMode::LoopAll);
    fire_ready(&mut session);

    let epoch = session.epoch();
    session.handle_player_event(epoch, PlayerEvent::Completed);
    fire_ready(&mut session);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Playing);
    assert_eq!(snapshot.track.unwrap().title, "x");
}

// ===== Runtime tests =====

fn wait_for_phase(
    handle: &aria_session::SessionHandle,
    phase: PlaybackPhase,
) -> aria_session::PlaybackSnapshot {
    for _ in 0..100 {
        if let Some(snapshot) = handle.snapshot() {
            if snapshot.phase == phase {
                return snapshot;
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("session never reached {phase:?}");
}

#[test]
fn runtime_serializes_commands_on_its_own_thread() {
    let platform = MockPlatform::new();
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let mut session = PlaybackSession::new(
        store,
        platform.collaborators(),
        SessionConfig {
            progress_interval: Duration::from_millis(20),
            ..SessionConfig::default()
        },
    );
    let tracks = queue_of(&mut session, &["A", "B"]);

    let runtime = SessionRuntime::spawn(session);
    let handle = runtime.handle();

    handle
        .set_queue(Playlist::builder().append_all(tracks).build(), 0, true)
        .unwrap();

    let snapshot = wait_for_phase(&handle, PlaybackPhase::Preparing);
    handle.player_event(snapshot.epoch, PlayerEvent::Ready);

    let snapshot = wait_for_phase(&handle, PlaybackPhase::Playing);
    assert_eq!(snapshot.track.unwrap().title, "A");

    // The ticker runs while playing and keeps refreshing progress
    platform.log.lock().unwrap().position_ms = 7_000;
    std::thread::sleep(Duration::from_millis(100));
    let snapshot = handle.snapshot().unwrap();
    assert_eq!(snapshot.progress.unwrap().position_ms, 7_000);

    handle.pause();
    wait_for_phase(&handle, PlaybackPhase::Paused);

    handle.skip_to_next();
    let snapshot = wait_for_phase(&handle, PlaybackPhase::Preparing);
    handle.player_event(snapshot.epoch, PlayerEvent::Ready);

    let snapshot = wait_for_phase(&handle, PlaybackPhase::Playing);
    assert_eq!(snapshot.track.unwrap().title, "B");

    let titles: Vec<String> = handle.history().iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["B".to_string(), "A".to_string()]);
}

#[test]
fn runtime_set_queue_reports_validation_errors_synchronously() {
    let platform = MockPlatform::new();
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let session = PlaybackSession::new(store, platform.collaborators(), SessionConfig::default());

    let runtime = SessionRuntime::spawn(session);
    let handle = runtime.handle();

    let playlist = Playlist::builder()
        .append(Track::new("unpersisted", "file:///x.mp3"))
        .build();

    assert!(handle.set_queue(playlist, 0, false).is_err());
}

#[test]
fn runtime_shutdown_is_clean_on_drop() {
    let platform = MockPlatform::new();
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let session = PlaybackSession::new(store, platform.collaborators(), SessionConfig::default());

    let runtime = SessionRuntime::spawn(session);
    let handle = runtime.handle();
    drop(runtime);

    // Commands against a stopped session are dropped, reads degrade
    handle.play();
    assert!(handle.snapshot().is_none());
    assert!(handle.history().is_empty());
}
