//! Aria Player Core
//!
//! Domain types, the entity-store seam, and error handling for Aria Player.
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `SoundQuality`
//! - **Store Seam**: the `EntityStore` trait the session engine persists
//!   through, plus an in-memory reference implementation
//! - **Error Handling**: unified `StoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use aria_core::store::{EntityStore, MemoryStore};
//! use aria_core::types::Track;
//!
//! let store = MemoryStore::new();
//!
//! let mut track = Track::new("My Favorite Song", "file:///music/song.mp3");
//! let id = store.put_track(&mut track).unwrap();
//!
//! assert!(id.is_persisted());
//! assert_eq!(store.get_track(id).unwrap().title, "My Favorite Song");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Result, StoreError};
pub use store::{EntityStore, MemoryStore, TrackListRecord};
pub use types::{SoundQuality, Track, TrackId};
