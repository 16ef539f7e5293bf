/// Track domain type
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Durable track identifier assigned by the entity store.
///
/// Zero means "not yet persisted". A track must be persisted (and so carry a
/// positive identity) before it may be referenced from any queue or catalog,
/// otherwise ordering persistence cannot name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(i64);

impl TrackId {
    /// Sentinel identity of a track that has never been stored
    pub const UNSAVED: TrackId = TrackId(0);

    /// Create a track ID from a raw store identity
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identity value
    pub fn raw(self) -> i64 {
        self.0
    }

    /// Whether this identity has been durably assigned (positive)
    pub fn is_persisted(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audio track
///
/// An immutable playable item. Once a track has been persisted, equality is
/// keyed on its identity alone: two `Track` values with the same positive id
/// are interchangeable regardless of metadata drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Durable identity (zero until first persisted)
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Media URI for playback
    pub uri: String,

    /// Artwork URI
    pub artwork_uri: String,

    /// Track duration in milliseconds
    pub duration_ms: u64,

    /// When the track was added to the library
    pub added_at: DateTime<Utc>,
}

impl Track {
    /// Create a new, not-yet-persisted track with minimal metadata
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: TrackId::UNSAVED,
            title: title.into(),
            artist: String::new(),
            album: String::new(),
            uri: uri.into(),
            artwork_uri: String::new(),
            duration_ms: 0,
            added_at: Utc::now(),
        }
    }

    /// Set the artist name (builder style)
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the album name (builder style)
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    /// Set the artwork URI (builder style)
    pub fn with_artwork_uri(mut self, artwork_uri: impl Into<String>) -> Self {
        self.artwork_uri = artwork_uri.into();
        self
    }

    /// Set the duration (builder style)
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    /// Get the track duration as a `Duration`
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Whether this track carries a durable identity
    pub fn is_persisted(&self) -> bool {
        self.id.is_persisted()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        if self.id.is_persisted() && other.id.is_persisted() {
            return self.id == other.id;
        }

        // Unpersisted tracks fall back to structural comparison
        self.id == other.id
            && self.title == other.title
            && self.artist == other.artist
            && self.album == other.album
            && self.uri == other.uri
            && self.artwork_uri == other.artwork_uri
            && self.duration_ms == other.duration_ms
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Identity-only hash stays consistent with identity-keyed equality
        self.id.hash(state);
    }
}
