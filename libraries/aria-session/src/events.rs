//! Session events
//!
//! Events fanned out to listeners through the notification hub. Favorites
//! changes carry no payload (listeners re-query state); history changes
//! carry a full current-order snapshot since consumers render the whole
//! list.

use crate::error::ResolutionError;
use crate::types::PlaybackPhase;
use aria_core::{Track, TrackId};
use std::time::Instant;

/// Events emitted by the playback session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Playback phase changed
    PhaseChanged {
        /// The new phase
        phase: PlaybackPhase,
    },

    /// The current track pointer moved
    TrackChanged {
        /// New current index, if any
        index: Option<usize>,
        /// New current track, if any
        track: Option<Track>,
    },

    /// A track entered `Playing` for the first time since becoming current
    TrackStarted {
        /// Queue index of the track
        index: usize,
        /// The track that started
        track: Track,
    },

    /// Periodic progress sample.
    ///
    /// Consumers extrapolate the live position as
    /// `position_ms + (now - captured_at)` between samples.
    Progress {
        /// Track the sample belongs to
        track_id: TrackId,
        /// Playback offset at capture time
        position_ms: u64,
        /// When the offset was captured
        captured_at: Instant,
    },

    /// Asynchronous preparation or playback failure
    PlaybackError {
        /// Failure classification
        classification: ResolutionError,
    },

    /// The queue was replaced
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Natural play-through reached the end of a sequential queue
    QueueEnded,

    /// The favorites catalog changed; listeners re-query state
    FavoriteChanged,

    /// The history catalog changed
    HistoryChanged {
        /// Full current history, most-recent-first
        snapshot: Vec<Track>,
    },
}
