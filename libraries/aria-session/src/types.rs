//! Core types for the playback session

use aria_core::SoundQuality;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Playback phase of the state machine.
///
/// `Idle` and `Error` are the only phases with no live player instance.
/// There is no terminal phase: the machine always accepts a new
/// `set_queue`/`skip`/`play` command to re-enter `Preparing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No player instance, nothing prepared
    Idle,

    /// Resolving the current track and handing it to the player primitive
    Preparing,

    /// The player primitive reported ready; not yet started
    Prepared,

    /// Audio is playing
    Playing,

    /// Mid-track, player paused
    Paused,

    /// Buffering underrun while playing; returns to `Playing` on recovery
    Stalled,

    /// Preparation or playback failed; awaiting an explicit retry or skip
    Error,
}

/// Track selection policy for next/previous/completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    /// Play the queue in order, stop after the last track
    #[default]
    Sequential,

    /// Loop the current track
    LoopOne,

    /// Loop the entire queue
    LoopAll,

    /// Random order, never landing on the current track twice in a row
    Shuffle,
}

/// Configuration for a playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum history catalog size (default: 500)
    pub history_capacity: usize,

    /// Progress sampling interval while playing (default: 1s)
    pub progress_interval: Duration,

    /// Initial sound quality preference
    pub quality: SoundQuality,

    /// Initial play mode
    pub play_mode: PlayMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: 500,
            progress_interval: Duration::from_secs(1),
            quality: SoundQuality::Standard,
            play_mode: PlayMode::Sequential,
        }
    }
}

/// A progress sample: position plus the instant it was captured.
///
/// Both fields are retained (rather than a derived continuous position) so
/// consumers can extrapolate `position + (now - captured_at)` between
/// samples without the session re-reporting every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressMark {
    /// Playback offset at capture time, in milliseconds
    pub position_ms: u64,

    /// When the offset was captured
    pub captured_at: Instant,
}

impl ProgressMark {
    /// Capture a progress mark at the current instant
    pub fn now(position_ms: u64) -> Self {
        Self {
            position_ms,
            captured_at: Instant::now(),
        }
    }

    /// Extrapolated position assuming playback kept running since capture
    pub fn extrapolate(&self, now: Instant) -> u64 {
        self.position_ms + now.saturating_duration_since(self.captured_at).as_millis() as u64
    }
}
