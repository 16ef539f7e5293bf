//! Playback state machine
//!
//! Owns the current track pointer, playback phase, progress clock, epoch
//! counter, and failure classification. Consumes the injected collaborator
//! set (player factory, URI resolver, cache check, network policy) and never
//! touches a platform directly.
//!
//! Preparation is the only asynchronous step: the machine records
//! `Preparing` and returns; the transition resumes when the player's
//! `Ready`/`Error` callback arrives through [`Self::handle_player_event`],
//! tagged with the epoch handed out at preparation time. Callbacks for a
//! superseded epoch are dropped.
//!
//! The machine accumulates [`SessionEvent`]s; the owning session drains them
//! with [`Self::take_events`] after every command and fans them out.

use crate::error::{ResolutionError, Result, SessionError};
use crate::events::SessionEvent;
use crate::mode;
use crate::player::{Collaborators, MediaPlayer, PlayerEvent};
use crate::types::{PlayMode, PlaybackPhase, ProgressMark};
use aria_core::{SoundQuality, Track};
use tracing::{debug, warn};

/// Immutable view of the machine state, safe to ship across threads
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    /// Current playback phase
    pub phase: PlaybackPhase,

    /// Current queue index, if any
    pub index: Option<usize>,

    /// Current track, if any
    pub track: Option<Track>,

    /// Last progress sample, if any
    pub progress: Option<ProgressMark>,

    /// Active play mode
    pub play_mode: PlayMode,

    /// Active sound quality preference
    pub quality: SoundQuality,

    /// Current preparation epoch
    pub epoch: u64,

    /// Queue length
    pub queue_len: usize,

    /// Whether playback starts as soon as the in-flight preparation is ready
    pub play_on_prepared: bool,

    /// Classification of the last failure, while in `Error`
    pub last_error: Option<ResolutionError>,
}

/// The playback session state machine
pub struct PlaybackStateMachine {
    tracks: Vec<Track>,
    current_index: Option<usize>,
    phase: PlaybackPhase,

    /// Monotonic counter identifying the current track/preparation; bumped
    /// on every track change so stale asynchronous callbacks are detected
    epoch: u64,

    player: Option<Box<dyn MediaPlayer>>,
    collaborators: Collaborators,

    quality: SoundQuality,
    play_mode: PlayMode,
    play_on_prepared: bool,
    progress: Option<ProgressMark>,
    last_error: Option<ResolutionError>,

    /// Whether the current track has already entered `Playing` once
    started_current: bool,

    pending_events: Vec<SessionEvent>,
}

impl PlaybackStateMachine {
    /// Create an idle machine around the injected collaborator set
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            tracks: Vec::new(),
            current_index: None,
            phase: PlaybackPhase::Idle,
            epoch: 0,
            player: None,
            collaborators,
            quality: SoundQuality::default(),
            play_mode: PlayMode::default(),
            play_on_prepared: false,
            progress: None,
            last_error: None,
            started_current: false,
            pending_events: Vec::new(),
        }
    }

    // ===== Queue =====

    /// Replace the active queue.
    ///
    /// Cancels any in-flight preparation (epoch bump), tears down the player,
    /// and resets to `Idle`; auto-plays from `start_index` when requested.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize, play_immediately: bool) {
        self.epoch += 1;
        self.teardown_player();

        self.current_index = if tracks.is_empty() {
            None
        } else {
            Some(start_index.min(tracks.len() - 1))
        };
        self.tracks = tracks;

        self.play_on_prepared = false;
        self.progress = None;
        self.last_error = None;
        self.started_current = false;
        self.set_phase(PlaybackPhase::Idle);

        self.emit(SessionEvent::QueueChanged {
            length: self.tracks.len(),
        });
        self.emit_track_changed();

        if play_immediately && self.current_index.is_some() {
            self.prepare_current(true);
        }
    }

    // ===== Playback commands =====

    /// Start or resume playback
    pub fn play(&mut self) -> Result<()> {
        match self.phase {
            PlaybackPhase::Playing => Ok(()),
            PlaybackPhase::Preparing => {
                // Preparation already in flight: record the intent
                self.play_on_prepared = true;
                Ok(())
            }
            PlaybackPhase::Paused | PlaybackPhase::Stalled | PlaybackPhase::Prepared => {
                if let Some(player) = &mut self.player {
                    player.start();
                }
                self.enter_playing();
                Ok(())
            }
            PlaybackPhase::Idle | PlaybackPhase::Error => {
                if self.current_index.is_none() {
                    return Err(SessionError::QueueEmpty);
                }
                self.prepare_current(true);
                Ok(())
            }
        }
    }

    /// Pause playback; valid only from `Playing`/`Stalled`, otherwise no-op
    pub fn pause(&mut self) {
        if !matches!(self.phase, PlaybackPhase::Playing | PlaybackPhase::Stalled) {
            return;
        }

        if let Some(player) = &mut self.player {
            let position = player.position_ms();
            player.pause();
            self.progress = Some(ProgressMark::now(position));
        }

        self.set_phase(PlaybackPhase::Paused);
    }

    /// Skip to the next track per the active play mode.
    ///
    /// Reports `QueueEmpty` on an empty queue instead of transitioning.
    pub fn skip_to_next(&mut self) -> Result<()> {
        let Some(index) = mode::next_index(
            self.play_mode,
            self.current_index,
            self.tracks.len(),
            &mut rand::thread_rng(),
        ) else {
            return Err(SessionError::QueueEmpty);
        };

        self.jump_to(index);
        Ok(())
    }

    /// Skip to the previous track per the active play mode
    pub fn skip_to_previous(&mut self) -> Result<()> {
        let Some(index) = mode::previous_index(
            self.play_mode,
            self.current_index,
            self.tracks.len(),
            &mut rand::thread_rng(),
        ) else {
            return Err(SessionError::QueueEmpty);
        };

        self.jump_to(index);
        Ok(())
    }

    /// Skip to an explicit queue position
    pub fn skip_to(&mut self, index: usize) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(SessionError::QueueEmpty);
        }
        if index >= self.tracks.len() {
            return Err(SessionError::IndexOutOfBounds(index));
        }

        self.jump_to(index);
        Ok(())
    }

    /// Re-run the preparation cycle for the current track.
    ///
    /// The explicit recovery command after an `Error`; the machine never
    /// auto-retries a failed track.
    pub fn retry(&mut self) -> Result<()> {
        if self.current_index.is_none() {
            return Err(SessionError::QueueEmpty);
        }

        self.prepare_current(true);
        Ok(())
    }

    /// Seek within the current track
    pub fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        let Some(player) = &mut self.player else {
            return Err(SessionError::NoTrackLoaded);
        };

        player.seek_to(position_ms);
        let mark = ProgressMark::now(position_ms);
        self.progress = Some(mark);

        if let Some(track) = self.current_track() {
            let track_id = track.id;
            self.emit(SessionEvent::Progress {
                track_id,
                position_ms: mark.position_ms,
                captured_at: mark.captured_at,
            });
        }

        Ok(())
    }

    // ===== Asynchronous callbacks =====

    /// Feed a player callback into the machine.
    ///
    /// `epoch` must be the value of [`Self::epoch`] at preparation time;
    /// callbacks for a superseded epoch are silently dropped.
    pub fn handle_player_event(&mut self, epoch: u64, event: PlayerEvent) {
        if epoch != self.epoch {
            debug!(stale = epoch, current = self.epoch, ?event, "dropping stale player callback");
            return;
        }

        match event {
            PlayerEvent::Ready => self.handle_ready(),
            PlayerEvent::Error(classification) => self.enter_error(classification),
            PlayerEvent::Stalled { stalled } => self.handle_stalled(stalled),
            PlayerEvent::Completed => self.handle_completed(),
        }
    }

    /// Sample progress; called on the session's fixed interval.
    ///
    /// Only `Playing`/`Stalled` produce samples; the ticker itself is scoped
    /// to those phases by the session runtime.
    pub fn progress_tick(&mut self) {
        if !matches!(self.phase, PlaybackPhase::Playing | PlaybackPhase::Stalled) {
            return;
        }

        let Some(player) = &self.player else {
            return;
        };

        let mark = ProgressMark::now(player.position_ms());
        self.progress = Some(mark);

        if let Some(track) = self.current_track() {
            let track_id = track.id;
            self.emit(SessionEvent::Progress {
                track_id,
                position_ms: mark.position_ms,
                captured_at: mark.captured_at,
            });
        }
    }

    // ===== Settings =====

    /// Set the play mode; applies from the next selection
    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
    }

    /// Active play mode
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Set the sound quality preference; applies from the next preparation
    pub fn set_quality(&mut self, quality: SoundQuality) {
        self.quality = quality;
    }

    /// Active sound quality preference
    pub fn quality(&self) -> SoundQuality {
        self.quality
    }

    // ===== State queries =====

    /// Current playback phase
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Current queue index
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Current track
    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.tracks.get(i))
    }

    /// Current preparation epoch; platform wiring tags player callbacks
    /// with this value
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Queue length
    pub fn queue_len(&self) -> usize {
        self.tracks.len()
    }

    /// Last progress sample
    pub fn progress(&self) -> Option<ProgressMark> {
        self.progress
    }

    /// Classification of the last failure, while in `Error`
    pub fn last_error(&self) -> Option<ResolutionError> {
        self.last_error
    }

    /// Immutable snapshot of the whole machine state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase,
            index: self.current_index,
            track: self.current_track().cloned(),
            progress: self.progress,
            play_mode: self.play_mode,
            quality: self.quality,
            epoch: self.epoch,
            queue_len: self.tracks.len(),
            play_on_prepared: self.play_on_prepared,
            last_error: self.last_error,
        }
    }

    /// Drain the events accumulated since the last call
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Transitions =====

    fn handle_ready(&mut self) {
        if self.phase != PlaybackPhase::Preparing {
            debug!(phase = ?self.phase, "ready callback outside preparation ignored");
            return;
        }

        self.set_phase(PlaybackPhase::Prepared);

        if self.play_on_prepared {
            if let Some(player) = &mut self.player {
                player.start();
            }
            self.enter_playing();
        }
    }

    fn handle_stalled(&mut self, stalled: bool) {
        if stalled {
            if self.phase == PlaybackPhase::Playing {
                if let Some(player) = &self.player {
                    self.progress = Some(ProgressMark::now(player.position_ms()));
                }
                self.set_phase(PlaybackPhase::Stalled);
            }
        } else if self.phase == PlaybackPhase::Stalled {
            if let Some(player) = &self.player {
                self.progress = Some(ProgressMark::now(player.position_ms()));
            }
            self.set_phase(PlaybackPhase::Playing);
        }
    }

    fn handle_completed(&mut self) {
        let next = mode::completion_index(
            self.play_mode,
            self.current_index,
            self.tracks.len(),
            &mut rand::thread_rng(),
        );

        match next {
            None => {
                // Sequential queue played through its last track
                self.teardown_player();
                self.play_on_prepared = false;
                self.progress = None;
                self.set_phase(PlaybackPhase::Idle);
                self.emit(SessionEvent::QueueEnded);
            }
            Some(index) if Some(index) == self.current_index => {
                // Loop-one replay: the prepared player is reused
                if let Some(player) = &mut self.player {
                    player.seek_to(0);
                    player.start();
                }
                self.started_current = false;
                self.enter_playing();
            }
            Some(index) => self.jump_to(index),
        }
    }

    /// Tear down the current player and restart the preparation cycle at
    /// the given index, with the intent to play when ready
    fn jump_to(&mut self, index: usize) {
        self.current_index = Some(index);
        self.started_current = false;
        self.progress = None;
        self.emit_track_changed();
        self.prepare_current(true);
    }

    /// Run the preparation cycle for the current track.
    ///
    /// Bumps the epoch first so an in-flight preparation is cancelled: its
    /// late callbacks will carry the superseded epoch and be dropped.
    fn prepare_current(&mut self, play_when_ready: bool) {
        let Some(track) = self.current_track().cloned() else {
            return;
        };

        self.epoch += 1;
        self.teardown_player();
        self.play_on_prepared = play_when_ready;
        self.last_error = None;
        self.set_phase(PlaybackPhase::Preparing);

        // A locally cached track bypasses all network policy checks
        if !self.collaborators.cache.is_cached(&track, self.quality) {
            if self.collaborators.network.wifi_only_restriction_active() {
                self.enter_error(ResolutionError::WifiOnlyRestricted);
                return;
            }
            if !self.collaborators.network.network_available() {
                self.enter_error(ResolutionError::NetworkUnavailable);
                return;
            }
        }

        match self.collaborators.resolver.resolve(&track, self.quality) {
            Ok(uri) => {
                let mut player = self.collaborators.player_factory.create();
                player.prepare(&uri);
                self.player = Some(player);
            }
            Err(classification) => self.enter_error(classification),
        }
    }

    fn enter_playing(&mut self) {
        let position = self.player.as_ref().map_or(0, |p| p.position_ms());
        self.progress = Some(ProgressMark::now(position));
        self.set_phase(PlaybackPhase::Playing);

        if !self.started_current {
            self.started_current = true;
            if let (Some(index), Some(track)) = (self.current_index, self.current_track().cloned())
            {
                self.emit(SessionEvent::TrackStarted { index, track });
            }
        }
    }

    fn enter_error(&mut self, classification: ResolutionError) {
        warn!(?classification, "playback failed, awaiting explicit retry or skip");

        self.teardown_player();
        self.play_on_prepared = false;
        self.last_error = Some(classification);
        self.set_phase(PlaybackPhase::Error);
        self.emit(SessionEvent::PlaybackError { classification });
    }

    fn teardown_player(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.stop();
            player.release();
        }
    }

    fn set_phase(&mut self, phase: PlaybackPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.emit(SessionEvent::PhaseChanged { phase });
        }
    }

    fn emit_track_changed(&mut self) {
        let event = SessionEvent::TrackChanged {
            index: self.current_index,
            track: self.current_track().cloned(),
        };
        self.emit(event);
    }

    fn emit(&mut self, event: SessionEvent) {
        self.pending_events.push(event);
    }
}
