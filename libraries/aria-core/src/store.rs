//! Entity-store seam for Aria Player
//!
//! The session engine persists tracks and named track-list records through
//! the [`EntityStore`] trait and never touches a database directly. Storage
//! backends live behind this seam; [`MemoryStore`] is the reference
//! implementation used by the session's tests and by embedders that do not
//! need durability.

use crate::error::{Result, StoreError};
use crate::types::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Persisted form of a named track list.
///
/// `members` is the unordered backing membership in natural (insertion)
/// order; `ordering` is the separately persisted explicit ordering, encoded
/// as a raw sequence of fixed-width big-endian signed identities. The two
/// must name exactly the same identities; decoders treat any mismatch as
/// corruption and fall back to `members` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackListRecord {
    /// Durable record identity (zero until first persisted)
    pub id: i64,

    /// List name (unique per store)
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Membership in natural insertion order
    pub members: Vec<TrackId>,

    /// Encoded explicit ordering (empty = use natural order)
    pub ordering: Vec<u8>,
}

impl TrackListRecord {
    /// Create a new, not-yet-persisted record
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            members: Vec::new(),
            ordering: Vec::new(),
        }
    }
}

/// Durable entity store consumed by the session engine.
///
/// Implementations are synchronous from the command context's perspective
/// and callable through a shared reference; interior synchronization is the
/// implementation's concern.
pub trait EntityStore: Send + Sync {
    // ===== Tracks =====

    /// Store or update a track, assigning a durable identity if it has none.
    ///
    /// The assigned identity is written back into `track` and returned.
    fn put_track(&self, track: &mut Track) -> Result<TrackId>;

    /// Store or update several tracks, assigning identities where missing
    fn put_tracks(&self, tracks: &mut [Track]) -> Result<()> {
        for track in tracks.iter_mut() {
            self.put_track(track)?;
        }
        Ok(())
    }

    /// Get a track by identity
    fn get_track(&self, id: TrackId) -> Option<Track>;

    /// Get every stored track
    fn all_tracks(&self) -> Vec<Track>;

    /// Get stored tracks within the given offset/limit window
    fn all_tracks_range(&self, offset: usize, limit: usize) -> Vec<Track>;

    /// Number of stored tracks
    fn track_count(&self) -> usize;

    /// Remove a track; also strips it from every list record.
    ///
    /// Returns false if the track was never stored.
    fn remove_track(&self, id: TrackId) -> bool;

    /// Remove several tracks
    fn remove_tracks(&self, ids: &[TrackId]) {
        for &id in ids {
            self.remove_track(id);
        }
    }

    /// Distinct artist names across all stored tracks
    fn artists(&self) -> Vec<String>;

    /// Distinct album names across all stored tracks
    fn albums(&self) -> Vec<String>;

    /// All tracks by the given artist
    fn tracks_by_artist(&self, artist: &str) -> Vec<Track>;

    /// All tracks on the given album
    fn tracks_by_album(&self, album: &str) -> Vec<Track>;

    // ===== List records =====

    /// Store or update a list record, assigning an identity if it has none
    fn put_list(&self, record: &mut TrackListRecord) -> Result<i64>;

    /// Get a list record by identity
    fn get_list(&self, id: i64) -> Option<TrackListRecord>;

    /// Get a list record by name
    fn get_list_by_name(&self, name: &str) -> Option<TrackListRecord>;

    /// Whether a list with the given name exists
    fn list_exists(&self, name: &str) -> bool {
        self.get_list_by_name(name).is_some()
    }

    /// Remove a list record by name; false if absent
    fn remove_list_by_name(&self, name: &str) -> bool;

    /// Every stored list record
    fn all_lists(&self) -> Vec<TrackListRecord>;

    /// Existence query: is the track a member of the named list?
    ///
    /// This is the membership test catalogs use; implementations should
    /// answer it from an index, not by scanning the member sequence.
    fn list_contains(&self, name: &str, id: TrackId) -> bool;
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    tracks: HashMap<i64, Track>,
    next_track_id: i64,
    lists: HashMap<i64, TrackListRecord>,
    member_index: HashMap<i64, HashSet<TrackId>>,
    next_list_id: i64,
}

/// In-memory reference implementation of [`EntityStore`].
///
/// Backed by hash maps behind a mutex; membership queries hit a per-list
/// identity index rather than scanning member sequences.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for MemoryStore {
    fn put_track(&self, track: &mut Track) -> Result<TrackId> {
        let mut inner = self.inner.lock().expect("store poisoned");

        if !track.id.is_persisted() {
            inner.next_track_id += 1;
            track.id = TrackId::new(inner.next_track_id);
        }

        inner.tracks.insert(track.id.raw(), track.clone());
        Ok(track.id)
    }

    fn get_track(&self, id: TrackId) -> Option<Track> {
        self.inner
            .lock()
            .expect("store poisoned")
            .tracks
            .get(&id.raw())
            .cloned()
    }

    fn all_tracks(&self) -> Vec<Track> {
        let inner = self.inner.lock().expect("store poisoned");
        let mut tracks: Vec<Track> = inner.tracks.values().cloned().collect();
        tracks.sort_by_key(|t| t.id);
        tracks
    }

    fn all_tracks_range(&self, offset: usize, limit: usize) -> Vec<Track> {
        self.all_tracks().into_iter().skip(offset).take(limit).collect()
    }

    fn track_count(&self) -> usize {
        self.inner.lock().expect("store poisoned").tracks.len()
    }

    fn remove_track(&self, id: TrackId) -> bool {
        let mut inner = self.inner.lock().expect("store poisoned");
        let removed = inner.tracks.remove(&id.raw()).is_some();

        if removed {
            // Track removal cascades into every list record
            for record in inner.lists.values_mut() {
                record.members.retain(|&m| m != id);
            }
            for index in inner.member_index.values_mut() {
                index.remove(&id);
            }
        }

        removed
    }

    fn artists(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("store poisoned");
        let mut artists: Vec<String> = inner
            .tracks
            .values()
            .map(|t| t.artist.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        artists.sort();
        artists
    }

    fn albums(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("store poisoned");
        let mut albums: Vec<String> = inner
            .tracks
            .values()
            .map(|t| t.album.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        albums.sort();
        albums
    }

    fn tracks_by_artist(&self, artist: &str) -> Vec<Track> {
        let mut tracks: Vec<Track> = self
            .inner
            .lock()
            .expect("store poisoned")
            .tracks
            .values()
            .filter(|t| t.artist == artist)
            .cloned()
            .collect();
        tracks.sort_by_key(|t| t.id);
        tracks
    }

    fn tracks_by_album(&self, album: &str) -> Vec<Track> {
        let mut tracks: Vec<Track> = self
            .inner
            .lock()
            .expect("store poisoned")
            .tracks
            .values()
            .filter(|t| t.album == album)
            .cloned()
            .collect();
        tracks.sort_by_key(|t| t.id);
        tracks
    }

    fn put_list(&self, record: &mut TrackListRecord) -> Result<i64> {
        if record.name.is_empty() {
            return Err(StoreError::invalid_argument("list name must not be empty"));
        }

        let mut inner = self.inner.lock().expect("store poisoned");

        if record.id <= 0 {
            inner.next_list_id += 1;
            record.id = inner.next_list_id;
        }

        inner
            .member_index
            .insert(record.id, record.members.iter().copied().collect());
        inner.lists.insert(record.id, record.clone());
        Ok(record.id)
    }

    fn get_list(&self, id: i64) -> Option<TrackListRecord> {
        self.inner
            .lock()
            .expect("store poisoned")
            .lists
            .get(&id)
            .cloned()
    }

    fn get_list_by_name(&self, name: &str) -> Option<TrackListRecord> {
        self.inner
            .lock()
            .expect("store poisoned")
            .lists
            .values()
            .find(|r| r.name == name)
            .cloned()
    }

    fn remove_list_by_name(&self, name: &str) -> bool {
        let mut inner = self.inner.lock().expect("store poisoned");
        let id = inner.lists.values().find(|r| r.name == name).map(|r| r.id);

        match id {
            Some(id) => {
                inner.lists.remove(&id);
                inner.member_index.remove(&id);
                true
            }
            None => false,
        }
    }

    fn all_lists(&self) -> Vec<TrackListRecord> {
        let inner = self.inner.lock().expect("store poisoned");
        let mut lists: Vec<TrackListRecord> = inner.lists.values().cloned().collect();
        lists.sort_by_key(|r| r.id);
        lists
    }

    fn list_contains(&self, name: &str, id: TrackId) -> bool {
        let inner = self.inner.lock().expect("store poisoned");
        inner
            .lists
            .values()
            .find(|r| r.name == name)
            .and_then(|r| inner.member_index.get(&r.id))
            .is_some_and(|index| index.contains(&id))
    }
}
