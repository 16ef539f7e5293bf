//! Aria Player - Playback Session
//!
//! Background media-playback session engine for Aria Player.
//!
//! This crate provides:
//! - A playback state machine (prepare/play/pause/stall/error) driving one
//!   player primitive at a time, with epoch-guarded cancellation of stale
//!   asynchronous callbacks
//! - Next/previous track selection (sequential, loop-one, loop-all, shuffle)
//! - A deduplicated, explicitly ordered queue with persisted ordering
//! - Favorites and bounded history catalogs over an entity store
//! - Single-threaded listener fan-out decoupled from mutators
//! - A dedicated command thread serializing the whole public surface
//!
//! # Architecture
//!
//! `aria-session` is platform-agnostic: audio decoding, URI resolution,
//! cache probing, and network policy are injected behind traits (see
//! [`player`]), and persistence goes through `aria_core::EntityStore`.
//! Variants for tests or platforms are different implementations of those
//! traits, never subclasses.
//!
//! # Example
//!
//! ```rust
//! use aria_core::{MemoryStore, SoundQuality, Track};
//! use aria_session::player::{
//!     CacheCheck, Collaborators, MediaPlayer, NetworkPolicy, PlayerFactory, UriResolver,
//! };
//! use aria_session::{Playlist, PlaybackSession, ResolutionError, SessionConfig};
//! use std::sync::Arc;
//!
//! struct SilentPlayer;
//!
//! impl MediaPlayer for SilentPlayer {
//!     fn prepare(&mut self, _uri: &str) {}
//!     fn start(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn seek_to(&mut self, _position_ms: u64) {}
//!     fn position_ms(&self) -> u64 { 0 }
//!     fn release(&mut self) {}
//! }
//!
//! struct Platform;
//!
//! impl PlayerFactory for Platform {
//!     fn create(&self) -> Box<dyn MediaPlayer> { Box::new(SilentPlayer) }
//! }
//!
//! impl UriResolver for Platform {
//!     fn resolve(&self, track: &Track, _quality: SoundQuality) -> Result<String, ResolutionError> {
//!         Ok(track.uri.clone())
//!     }
//! }
//!
//! impl CacheCheck for Platform {
//!     fn is_cached(&self, _track: &Track, _quality: SoundQuality) -> bool { true }
//! }
//!
//! impl NetworkPolicy for Platform {
//!     fn wifi_only_restriction_active(&self) -> bool { false }
//!     fn network_available(&self) -> bool { true }
//! }
//!
//! let store = Arc::new(MemoryStore::new());
//! let collaborators = Collaborators {
//!     player_factory: Box::new(Platform),
//!     resolver: Box::new(Platform),
//!     cache: Box::new(Platform),
//!     network: Box::new(Platform),
//! };
//!
//! let mut session = PlaybackSession::new(store, collaborators, SessionConfig::default());
//!
//! let mut track = Track::new("My Favorite Song", "file:///music/song.mp3");
//! session.catalog().put_track(&mut track).unwrap();
//!
//! let playlist = Playlist::builder().append(track.clone()).build();
//! session.set_queue(playlist, 0, true).unwrap();
//! session.toggle_favorite(&track);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod error;
mod events;
mod hub;
mod machine;
mod mode;
pub mod player;
mod playlist;
mod runtime;
mod session;
mod tracklist;
pub mod types;

// Public exports
pub use catalog::{is_built_in_name, Catalog, CatalogList, FAVORITES_LIST, HISTORY_LIST, MAX_HISTORY_SIZE, QUEUE_LIST};
pub use error::{ResolutionError, Result, SessionError};
pub use events::SessionEvent;
pub use hub::{ListenerId, NotificationHub};
pub use machine::{PlaybackSnapshot, PlaybackStateMachine};
pub use player::{Collaborators, PlayerEvent};
pub use playlist::{Playlist, PlaylistBuilder};
pub use runtime::{SessionHandle, SessionRuntime};
pub use session::PlaybackSession;
pub use tracklist::OrderedTrackList;
pub use types::{PlayMode, PlaybackPhase, ProgressMark, SessionConfig};
