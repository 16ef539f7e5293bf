//! Collaborator seams for the playback state machine
//!
//! The machine never talks to a platform directly: the player primitive, URI
//! resolution, cache probing, and network policy are injected at construction
//! behind these traits. Test and platform variants are different
//! implementations, not subclasses.

use crate::error::ResolutionError;
use aria_core::{SoundQuality, Track};

/// Platform audio player primitive.
///
/// One instance drives one prepared URI. `prepare` is asynchronous: outcomes
/// arrive later as [`PlayerEvent`]s tagged with the epoch the machine handed
/// out at preparation time.
pub trait MediaPlayer: Send {
    /// Begin preparing the given URI for playback
    fn prepare(&mut self, uri: &str);

    /// Start or resume playback
    fn start(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Stop playback
    fn stop(&mut self);

    /// Seek to the given offset
    fn seek_to(&mut self, position_ms: u64);

    /// Current playback offset
    fn position_ms(&self) -> u64;

    /// Release all player resources; the instance is dead afterwards
    fn release(&mut self);
}

/// Factory creating fresh player primitive instances.
///
/// The machine tears the player down on every track change and asks the
/// factory for a new one, so primitives never carry state across tracks.
pub trait PlayerFactory: Send {
    /// Create a new, unprepared player instance
    fn create(&self) -> Box<dyn MediaPlayer>;
}

/// Asynchronous callbacks from the player primitive.
///
/// Events must be handed back to the machine together with the epoch that
/// was current when the player was prepared; stale epochs are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Preparation finished; the player can be started
    Ready,

    /// The player failed
    Error(ResolutionError),

    /// Buffering underrun began (`true`) or recovered (`false`)
    Stalled {
        /// Whether the player is currently stalled
        stalled: bool,
    },

    /// The current track played through to its end
    Completed,
}

/// Resolves a track reference to a playable URI
pub trait UriResolver: Send {
    /// Resolve the playback URI for a track at the given quality
    fn resolve(
        &self,
        track: &Track,
        quality: SoundQuality,
    ) -> std::result::Result<String, ResolutionError>;
}

/// Answers whether a track is already cached locally.
///
/// A cached track bypasses all network policy checks before resolution.
pub trait CacheCheck: Send {
    /// Whether the track is cached at the given quality
    fn is_cached(&self, track: &Track, quality: SoundQuality) -> bool;
}

/// Network availability and restriction policy
pub trait NetworkPolicy: Send {
    /// Whether the wifi-only restriction currently forbids cellular streaming
    fn wifi_only_restriction_active(&self) -> bool;

    /// Whether any network is currently available
    fn network_available(&self) -> bool;
}

/// The full collaborator set injected into the state machine
pub struct Collaborators {
    /// Player primitive factory
    pub player_factory: Box<dyn PlayerFactory>,

    /// URI resolver
    pub resolver: Box<dyn UriResolver>,

    /// Local cache probe
    pub cache: Box<dyn CacheCheck>,

    /// Network policy
    pub network: Box<dyn NetworkPolicy>,
}
