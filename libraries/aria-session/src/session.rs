//! Playback session composition
//!
//! Wires the state machine to the active queue, the catalogs, and the
//! notification hub, and exposes the public command surface. A session is an
//! explicitly constructed object owned by its caller; commands are expected
//! to arrive on a single command context (see `runtime`), which is the only
//! synchronization discipline.

use crate::catalog::{Catalog, QUEUE_LIST};
use crate::error::Result;
use crate::events::SessionEvent;
use crate::hub::{ListenerId, NotificationHub};
use crate::machine::{PlaybackSnapshot, PlaybackStateMachine};
use crate::player::{Collaborators, PlayerEvent};
use crate::playlist::Playlist;
use crate::tracklist::OrderedTrackList;
use crate::types::{PlayMode, PlaybackPhase, SessionConfig};
use aria_core::{EntityStore, SoundQuality, StoreError, Track, TrackId, TrackListRecord};
use std::sync::Arc;
use tracing::debug;

/// A background media-playback session.
///
/// Composes the playback state machine, the active queue, and the
/// favorites/history catalogs over one entity store and one notification
/// hub.
pub struct PlaybackSession {
    store: Arc<dyn EntityStore>,
    hub: Arc<NotificationHub>,
    machine: PlaybackStateMachine,
    catalog: Catalog,
    queue: Playlist,
    config: SessionConfig,
}

impl PlaybackSession {
    /// Create a session over the given store and collaborator set
    pub fn new(
        store: Arc<dyn EntityStore>,
        collaborators: Collaborators,
        config: SessionConfig,
    ) -> Self {
        let hub = Arc::new(NotificationHub::new());
        let catalog =
            Catalog::with_history_capacity(store.clone(), hub.clone(), config.history_capacity);

        let mut machine = PlaybackStateMachine::new(collaborators);
        machine.set_play_mode(config.play_mode);
        machine.set_quality(config.quality);

        Self {
            store,
            hub,
            machine,
            catalog,
            queue: Playlist::builder().token(QUEUE_LIST).build(),
            config,
        }
    }

    // ===== Listeners =====

    /// Register a listener for session events
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.hub.subscribe(listener)
    }

    /// Remove a previously registered listener
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// The notification hub, for wiring into other components
    pub fn hub(&self) -> Arc<NotificationHub> {
        self.hub.clone()
    }

    // ===== Queue =====

    /// Replace the active queue.
    ///
    /// Every track must already carry a durable identity; the queue ordering
    /// is persisted under the reserved `__queue` record before the machine
    /// is reset. Auto-plays from `start_index` when requested.
    pub fn set_queue(
        &mut self,
        playlist: Playlist,
        start_index: usize,
        play_immediately: bool,
    ) -> Result<()> {
        if let Some(track) = playlist.iter().find(|t| !t.is_persisted()) {
            return Err(StoreError::invalid_argument(format!(
                "track '{}' has no durable identity and cannot be queued",
                track.title
            ))
            .into());
        }

        self.persist_queue(&playlist)?;

        let tracks = playlist.all_tracks();
        self.queue = playlist;
        self.machine.set_queue(tracks, start_index, play_immediately);
        self.drain_machine_events();
        Ok(())
    }

    /// Rebuild the active queue from the persisted `__queue` record.
    ///
    /// Returns false when nothing was persisted. The machine is reset to
    /// `Idle`; playback does not start.
    pub fn restore_queue(&mut self) -> Result<bool> {
        let Some(record) = self.store.get_list_by_name(QUEUE_LIST) else {
            return Ok(false);
        };

        let natural: Vec<Track> = record
            .members
            .iter()
            .filter_map(|&id| self.store.get_track(id))
            .collect();
        let list = OrderedTrackList::from_parts(natural, &record.ordering);

        let playlist = Playlist::builder()
            .token(QUEUE_LIST)
            .append_all(list.to_vec())
            .build();

        let tracks = playlist.all_tracks();
        self.queue = playlist;
        self.machine.set_queue(tracks, 0, false);
        self.drain_machine_events();
        Ok(true)
    }

    /// The active queue
    pub fn queue(&self) -> &Playlist {
        &self.queue
    }

    fn persist_queue(&self, playlist: &Playlist) -> Result<()> {
        let mut record = self
            .store
            .get_list_by_name(QUEUE_LIST)
            .unwrap_or_else(|| TrackListRecord::new(QUEUE_LIST, ""));

        let mut list = OrderedTrackList::new();
        list.add_all(playlist.all_tracks());
        record.members = list.ids();
        record.ordering = list.encode_ordering();

        self.store.put_list(&mut record)?;
        Ok(())
    }

    // ===== Playback commands =====

    /// Start or resume playback
    pub fn play(&mut self) -> Result<()> {
        let result = self.machine.play();
        self.drain_machine_events();
        result
    }

    /// Pause playback; no-op outside `Playing`/`Stalled`
    pub fn pause(&mut self) {
        self.machine.pause();
        self.drain_machine_events();
    }

    /// Skip to the next track per the active play mode
    pub fn skip_to_next(&mut self) -> Result<()> {
        let result = self.machine.skip_to_next();
        self.drain_machine_events();
        result
    }

    /// Skip to the previous track per the active play mode
    pub fn skip_to_previous(&mut self) -> Result<()> {
        let result = self.machine.skip_to_previous();
        self.drain_machine_events();
        result
    }

    /// Skip to an explicit queue position
    pub fn skip_to(&mut self, index: usize) -> Result<()> {
        let result = self.machine.skip_to(index);
        self.drain_machine_events();
        result
    }

    /// Seek within the current track
    pub fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        let result = self.machine.seek_to(position_ms);
        self.drain_machine_events();
        result
    }

    /// Re-run preparation for the current track after an error
    pub fn retry(&mut self) -> Result<()> {
        let result = self.machine.retry();
        self.drain_machine_events();
        result
    }

    /// Set the play mode
    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.machine.set_play_mode(mode);
    }

    /// Set the sound quality preference
    pub fn set_quality(&mut self, quality: SoundQuality) {
        self.machine.set_quality(quality);
    }

    // ===== Asynchronous callbacks =====

    /// Feed a player callback into the machine; stale epochs are dropped
    pub fn handle_player_event(&mut self, epoch: u64, event: PlayerEvent) {
        self.machine.handle_player_event(epoch, event);
        self.drain_machine_events();
    }

    /// Sample playback progress
    pub fn progress_tick(&mut self) {
        self.machine.progress_tick();
        self.drain_machine_events();
    }

    /// Whether the progress ticker should currently run
    pub fn should_tick(&self) -> bool {
        matches!(
            self.machine.phase(),
            PlaybackPhase::Playing | PlaybackPhase::Stalled
        )
    }

    // ===== Catalogs =====

    /// Toggle the favorite state of a track.
    ///
    /// A no-op for tracks without a durable identity.
    pub fn toggle_favorite(&mut self, track: &Track) {
        if !track.is_persisted() {
            debug!(title = %track.title, "ignoring favorite toggle for unpersisted track");
            return;
        }

        self.catalog.toggle_favorite(track);
    }

    /// Whether the track with the given identity is a favorite
    pub fn is_favorite(&self, id: TrackId) -> bool {
        self.catalog.is_favorite(id)
    }

    /// The full history, most-recent-first
    pub fn history(&mut self) -> Vec<Track> {
        self.catalog.history()
    }

    /// The catalog surface (favorites, history, user lists, track store)
    pub fn catalog(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    // ===== State queries =====

    /// Immutable snapshot of the machine state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.machine.snapshot()
    }

    /// Current preparation epoch, for tagging player callbacks
    pub fn epoch(&self) -> u64 {
        self.machine.epoch()
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fan out machine events and apply their session-level side effects.
    ///
    /// A track entering `Playing` for the first time since becoming current
    /// is recorded in history, after the start event itself is posted.
    fn drain_machine_events(&mut self) {
        for event in self.machine.take_events() {
            let started = match &event {
                SessionEvent::TrackStarted { track, .. } => Some(track.clone()),
                _ => None,
            };

            self.hub.post(event);

            if let Some(track) = started {
                self.catalog.add_history(&track);
            }
        }
    }
}
