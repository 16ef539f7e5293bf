//! Active play queue value
//!
//! A `Playlist` is the immutable, token-identified snapshot of tracks handed
//! to `set_queue`. Duplicates (by identity) are silently dropped at build
//! time, preserving first-seen order.

use aria_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token-identified, deduplicated play queue snapshot.
///
/// Equality covers the token, elements, and editability; the opaque `extra`
/// metadata is excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    token: String,
    tracks: Vec<Track>,
    editable: bool,
    extra: Option<serde_json::Value>,
}

impl Playlist {
    /// Create a playlist, dropping duplicate tracks by identity
    pub fn new(
        token: impl Into<String>,
        tracks: Vec<Track>,
        editable: bool,
        extra: Option<serde_json::Value>,
    ) -> Self {
        Self {
            token: token.into(),
            tracks: exclude_repeats(tracks),
            editable,
            extra,
        }
    }

    /// Start building a playlist
    pub fn builder() -> PlaylistBuilder {
        PlaylistBuilder::new()
    }

    /// The playlist token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether the playlist may be edited by the session owner
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Membership test by identity
    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.iter().any(|t| t.id == id)
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Position of the first occurrence of the given identity
    pub fn index_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Whether the playlist has no elements
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Iterate elements in order
    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    /// Copy all elements out in order
    pub fn all_tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    /// Opaque extra metadata carried alongside the queue
    pub fn extra(&self) -> Option<&serde_json::Value> {
        self.extra.as_ref()
    }
}

impl PartialEq for Playlist {
    fn eq(&self, other: &Self) -> bool {
        // extra metadata intentionally excluded
        self.token == other.token
            && self.tracks == other.tracks
            && self.editable == other.editable
    }
}

impl Eq for Playlist {}

impl<'a> IntoIterator for &'a Playlist {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

fn exclude_repeats(tracks: Vec<Track>) -> Vec<Track> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::with_capacity(tracks.len());

    for track in tracks {
        if seen.insert(track.id) {
            unique.push(track);
        }
    }

    unique
}

/// Builder for [`Playlist`]
#[derive(Debug)]
pub struct PlaylistBuilder {
    token: Option<String>,
    tracks: Vec<Track>,
    editable: bool,
    extra: Option<serde_json::Value>,
}

impl PlaylistBuilder {
    /// Create a builder for an editable playlist with a generated token
    pub fn new() -> Self {
        Self {
            token: None,
            tracks: Vec::new(),
            editable: true,
            extra: None,
        }
    }

    /// Set the playlist token (a random one is generated otherwise)
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set whether the playlist is editable
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Append one track
    pub fn append(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    /// Append several tracks
    pub fn append_all(mut self, tracks: impl IntoIterator<Item = Track>) -> Self {
        self.tracks.extend(tracks);
        self
    }

    /// Remove a track by identity
    pub fn remove(mut self, id: TrackId) -> Self {
        self.tracks.retain(|t| t.id != id);
        self
    }

    /// Set the opaque extra metadata
    pub fn extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Build the playlist; repeated tracks are excluded here
    pub fn build(self) -> Playlist {
        let token = self
            .token
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Playlist::new(token, self.tracks, self.editable, self.extra)
    }
}

impl Default for PlaylistBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64, title: &str) -> Track {
        let mut track = Track::new(title, format!("file:///music/{id}.mp3"));
        track.id = TrackId::new(id);
        track
    }

    #[test]
    fn build_drops_duplicates_preserving_first_seen_order() {
        let playlist = Playlist::builder()
            .append(track(1, "a"))
            .append(track(2, "b"))
            .append(track(1, "a again"))
            .append(track(3, "c"))
            .build();

        assert_eq!(playlist.len(), 3);
        assert_eq!(playlist.get(0).unwrap().title, "a");
        assert_eq!(playlist.get(1).unwrap().title, "b");
        assert_eq!(playlist.get(2).unwrap().title, "c");
    }

    #[test]
    fn equality_excludes_extra_metadata() {
        let a = Playlist::builder()
            .token("mix")
            .append(track(1, "a"))
            .extra(serde_json::json!({"origin": "album"}))
            .build();
        let b = Playlist::builder().token("mix").append(track(1, "a")).build();

        assert_eq!(a, b);

        let c = Playlist::builder().token("other").append(track(1, "a")).build();
        assert_ne!(a, c);
    }

    #[test]
    fn generated_tokens_are_unique() {
        let a = Playlist::builder().build();
        let b = Playlist::builder().build();
        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn builder_carries_editability_and_extra() {
        let playlist = Playlist::builder()
            .editable(false)
            .append(track(1, "a"))
            .extra(serde_json::json!({"origin": "album", "album_id": 42}))
            .build();

        assert!(!playlist.is_editable());
        assert_eq!(playlist.extra().unwrap()["album_id"], 42);
    }

    #[test]
    fn index_of_finds_first_occurrence() {
        let playlist = Playlist::builder()
            .append(track(1, "a"))
            .append(track(2, "b"))
            .build();

        assert_eq!(playlist.index_of(TrackId::new(2)), Some(1));
        assert_eq!(playlist.index_of(TrackId::new(9)), None);
        assert!(playlist.contains(TrackId::new(1)));
    }
}
