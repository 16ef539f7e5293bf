//! Session command runtime
//!
//! One long-lived session runs on a dedicated single-threaded command
//! context: every public command is funneled through one channel and
//! executes to completion without interleaving, which is the sole
//! synchronization discipline. Player callbacks are posted into the same
//! channel tagged with their epoch, so a state transition is never observed
//! half-applied and stale callbacks are dropped inside the machine.
//!
//! The progress ticker is the command loop's receive timeout: it only runs
//! while the session reports `Playing`/`Stalled`, and a tick can never fire
//! concurrently with a command.

use crate::error::{Result, SessionError};
use crate::machine::PlaybackSnapshot;
use crate::player::PlayerEvent;
use crate::playlist::Playlist;
use crate::session::PlaybackSession;
use crate::types::PlayMode;
use aria_core::{SoundQuality, Track};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use tracing::debug;

enum SessionCommand {
    Play,
    Pause,
    SkipNext,
    SkipPrevious,
    SkipTo(usize),
    SeekTo(u64),
    Retry,
    SetQueue {
        playlist: Playlist,
        start_index: usize,
        play_immediately: bool,
        reply: Sender<Result<()>>,
    },
    SetPlayMode(PlayMode),
    SetQuality(SoundQuality),
    ToggleFavorite(Track),
    PlayerEvent {
        epoch: u64,
        event: PlayerEvent,
    },
    Snapshot {
        reply: Sender<PlaybackSnapshot>,
    },
    History {
        reply: Sender<Vec<Track>>,
    },
    Shutdown,
}

/// Cheap, cloneable command sender for a running session.
///
/// Commands are fire-and-forget: conditions like an empty queue are
/// no-ops reported through the hub or the log, not errors thrown back at
/// the caller. `set_queue` is the exception; its argument validation is
/// reported synchronously.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Sender<SessionCommand>,
}

impl SessionHandle {
    /// Start or resume playback
    pub fn play(&self) {
        self.send(SessionCommand::Play);
    }

    /// Pause playback
    pub fn pause(&self) {
        self.send(SessionCommand::Pause);
    }

    /// Skip to the next track
    pub fn skip_to_next(&self) {
        self.send(SessionCommand::SkipNext);
    }

    /// Skip to the previous track
    pub fn skip_to_previous(&self) {
        self.send(SessionCommand::SkipPrevious);
    }

    /// Skip to an explicit queue position
    pub fn skip_to(&self, index: usize) {
        self.send(SessionCommand::SkipTo(index));
    }

    /// Seek within the current track
    pub fn seek_to(&self, position_ms: u64) {
        self.send(SessionCommand::SeekTo(position_ms));
    }

    /// Re-run preparation for the current track after an error
    pub fn retry(&self) {
        self.send(SessionCommand::Retry);
    }

    /// Replace the active queue; validation errors are returned
    pub fn set_queue(
        &self,
        playlist: Playlist,
        start_index: usize,
        play_immediately: bool,
    ) -> Result<()> {
        let (reply, rx) = mpsc::channel();
        self.send(SessionCommand::SetQueue {
            playlist,
            start_index,
            play_immediately,
            reply,
        });

        rx.recv()
            .map_err(|_| SessionError::InvalidOperation("session stopped".into()))?
    }

    /// Set the play mode
    pub fn set_play_mode(&self, mode: PlayMode) {
        self.send(SessionCommand::SetPlayMode(mode));
    }

    /// Set the sound quality preference
    pub fn set_quality(&self, quality: SoundQuality) {
        self.send(SessionCommand::SetQuality(quality));
    }

    /// Toggle the favorite state of a track
    pub fn toggle_favorite(&self, track: Track) {
        self.send(SessionCommand::ToggleFavorite(track));
    }

    /// Post a player callback, tagged with its preparation epoch
    pub fn player_event(&self, epoch: u64, event: PlayerEvent) {
        self.send(SessionCommand::PlayerEvent { epoch, event });
    }

    /// Thread-safe snapshot of the session state; `None` once stopped
    pub fn snapshot(&self) -> Option<PlaybackSnapshot> {
        let (reply, rx) = mpsc::channel();
        self.send(SessionCommand::Snapshot { reply });
        rx.recv().ok()
    }

    /// Thread-safe history snapshot, most-recent-first; empty once stopped
    pub fn history(&self) -> Vec<Track> {
        let (reply, rx) = mpsc::channel();
        self.send(SessionCommand::History { reply });
        rx.recv().unwrap_or_default()
    }

    fn send(&self, command: SessionCommand) {
        if self.tx.send(command).is_err() {
            debug!("session command channel closed, command dropped");
        }
    }
}

/// Owns the session's command thread; dropping it shuts the session down
pub struct SessionRuntime {
    handle: SessionHandle,
    worker: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    /// Move the session onto its dedicated command thread
    pub fn spawn(session: PlaybackSession) -> Self {
        let (tx, rx) = mpsc::channel();

        let worker = std::thread::Builder::new()
            .name("aria-session".into())
            .spawn(move || run_loop(session, &rx))
            .expect("failed to spawn session command thread");

        Self {
            handle: SessionHandle { tx },
            worker: Some(worker),
        }
    }

    /// A command handle onto the running session
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        let _ = self.handle.tx.send(SessionCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_loop(mut session: PlaybackSession, rx: &mpsc::Receiver<SessionCommand>) {
    let interval = session.config().progress_interval;

    loop {
        let command = if session.should_tick() {
            match rx.recv_timeout(interval) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => {
                    session.progress_tick();
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(command) => command,
                Err(_) => break,
            }
        };

        match command {
            SessionCommand::Play => log_outcome("play", session.play()),
            SessionCommand::Pause => session.pause(),
            SessionCommand::SkipNext => log_outcome("skip_to_next", session.skip_to_next()),
            SessionCommand::SkipPrevious => {
                log_outcome("skip_to_previous", session.skip_to_previous());
            }
            SessionCommand::SkipTo(index) => log_outcome("skip_to", session.skip_to(index)),
            SessionCommand::SeekTo(position_ms) => {
                log_outcome("seek_to", session.seek_to(position_ms));
            }
            SessionCommand::Retry => log_outcome("retry", session.retry()),
            SessionCommand::SetQueue {
                playlist,
                start_index,
                play_immediately,
                reply,
            } => {
                let result = session.set_queue(playlist, start_index, play_immediately);
                let _ = reply.send(result);
            }
            SessionCommand::SetPlayMode(mode) => session.set_play_mode(mode),
            SessionCommand::SetQuality(quality) => session.set_quality(quality),
            SessionCommand::ToggleFavorite(track) => session.toggle_favorite(&track),
            SessionCommand::PlayerEvent { epoch, event } => {
                session.handle_player_event(epoch, event);
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(session.snapshot());
            }
            SessionCommand::History { reply } => {
                let _ = reply.send(session.history());
            }
            SessionCommand::Shutdown => break,
        }
    }
}

fn log_outcome(command: &str, result: Result<()>) {
    if let Err(error) = result {
        debug!(command, %error, "command was a no-op");
    }
}
