//! Deduplicated, explicitly ordered track container
//!
//! Backs the active queue and the catalogs. Owns an ordered element sequence
//! plus an identity membership index kept in lockstep, so `contains` reflects
//! every mutation immediately and no track can appear twice.

use aria_core::{Track, TrackId};
use std::collections::HashSet;
use tracing::warn;

/// Width of one encoded identity in the persisted ordering
const ORDERING_ENTRY_BYTES: usize = 8;

/// A deduplicated, explicitly ordered sequence of tracks.
///
/// The explicit ordering is persisted separately from membership as a raw
/// sequence of fixed-width big-endian signed identities; decoding falls back
/// to natural membership order when the stored ordering is corrupt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedTrackList {
    tracks: Vec<Track>,
    membership: HashSet<TrackId>,
}

impl OrderedTrackList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize a list from its persisted parts.
    ///
    /// `natural` is the membership in natural (insertion) order; `ordering`
    /// is the encoded explicit ordering. If the ordering is empty, references
    /// an identity missing from membership, contains a non-positive identity,
    /// or disagrees with membership about size, it is discarded and the list
    /// falls back to natural order. Corruption is never surfaced to callers.
    pub fn from_parts(natural: Vec<Track>, ordering: &[u8]) -> Self {
        if ordering.is_empty() {
            return Self::from_natural(natural);
        }

        let Some(ids) = decode_ordering(ordering) else {
            warn!("discarding corrupt ordering, rebuilding from natural order");
            return Self::from_natural(natural);
        };

        let encoded: HashSet<TrackId> = ids.iter().copied().collect();
        let members: HashSet<TrackId> = natural.iter().map(|t| t.id).collect();

        if ids.len() != natural.len() || encoded.len() != ids.len() || encoded != members {
            warn!(
                encoded = ids.len(),
                members = natural.len(),
                "stored ordering does not match membership, rebuilding from natural order"
            );
            return Self::from_natural(natural);
        }

        let mut by_id: std::collections::HashMap<TrackId, Track> =
            natural.into_iter().map(|t| (t.id, t)).collect();

        let tracks: Vec<Track> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        let membership = tracks.iter().map(|t| t.id).collect();
        Self { tracks, membership }
    }

    fn from_natural(natural: Vec<Track>) -> Self {
        let mut list = Self::new();
        list.add_all(natural);
        list
    }

    /// Append a track; returns false (without mutating) if already present
    pub fn add(&mut self, track: Track) -> bool {
        if self.membership.contains(&track.id) {
            return false;
        }

        self.membership.insert(track.id);
        self.tracks.push(track);
        true
    }

    /// Append several tracks, silently dropping duplicates within the input
    /// and against existing membership.
    ///
    /// Returns true iff at least one element was actually added.
    pub fn add_all(&mut self, tracks: Vec<Track>) -> bool {
        let mut added = false;
        for track in tracks {
            added |= self.add(track);
        }
        added
    }

    /// Replace the element at `index`, returning the previous occupant.
    ///
    /// If `track` already exists elsewhere in the list, that old occurrence
    /// is removed after the positional write, so a transient duplicate is
    /// never observably iterable.
    pub fn set(&mut self, index: usize, track: Track) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }

        let duplicate_at = self.position_of(track.id).filter(|&pos| pos != index);

        let new_id = track.id;
        let replaced = std::mem::replace(&mut self.tracks[index], track);
        if self.position_of(replaced.id).is_none() {
            self.membership.remove(&replaced.id);
        }
        self.membership.insert(new_id);

        if let Some(pos) = duplicate_at {
            self.tracks.remove(pos);
        }

        Some(replaced)
    }

    /// Insert a track at `index`.
    ///
    /// If the track already exists elsewhere, its old occurrence is removed
    /// after the insert: the net effect is "move to index", never a duplicate.
    pub fn insert(&mut self, index: usize, track: Track) {
        let existing = self.position_of(track.id);
        let index = index.min(self.tracks.len());

        self.membership.insert(track.id);
        self.tracks.insert(index, track);

        if let Some(old) = existing {
            let old = if old >= index { old + 1 } else { old };
            self.tracks.remove(old);
        }
    }

    /// Remove a track by identity; false if absent
    pub fn remove(&mut self, id: TrackId) -> bool {
        match self.position_of(id) {
            Some(pos) => {
                self.tracks.remove(pos);
                self.membership.remove(&id);
                true
            }
            None => false,
        }
    }

    /// Remove the element at `index`
    pub fn remove_at(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }

        let track = self.tracks.remove(index);
        self.membership.remove(&track.id);
        Some(track)
    }

    /// Remove every listed identity; true if anything was removed
    pub fn remove_all(&mut self, ids: &[TrackId]) -> bool {
        let before = self.tracks.len();
        let doomed: HashSet<TrackId> = ids.iter().copied().collect();

        self.tracks.retain(|t| !doomed.contains(&t.id));
        for id in &doomed {
            self.membership.remove(id);
        }

        self.tracks.len() != before
    }

    /// Retain only the listed identities; true if anything was removed
    pub fn retain_all(&mut self, ids: &[TrackId]) -> bool {
        let before = self.tracks.len();
        let kept: HashSet<TrackId> = ids.iter().copied().collect();

        self.tracks.retain(|t| kept.contains(&t.id));
        self.membership.retain(|id| kept.contains(id));

        self.tracks.len() != before
    }

    /// Remove every element
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.membership.clear();
    }

    /// Membership test by identity
    pub fn contains(&self, id: TrackId) -> bool {
        self.membership.contains(&id)
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Position of the given identity
    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Iterate elements in order
    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    /// Copy the elements out in order
    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    /// Member identities in element order
    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    /// Encode the current order as a raw sequence of fixed-width big-endian
    /// signed identities
    pub fn encode_ordering(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.tracks.len() * ORDERING_ENTRY_BYTES);
        for track in &self.tracks {
            bytes.extend_from_slice(&track.id.raw().to_be_bytes());
        }
        bytes
    }
}

impl<'a> IntoIterator for &'a OrderedTrackList {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

/// Decode a persisted ordering into identities.
///
/// Returns `None` when the bytes are structurally corrupt: truncated entries
/// or any non-positive identity (the sentinel of a never-persisted track).
pub fn decode_ordering(bytes: &[u8]) -> Option<Vec<TrackId>> {
    if bytes.len() % ORDERING_ENTRY_BYTES != 0 {
        return None;
    }

    let mut ids = Vec::with_capacity(bytes.len() / ORDERING_ENTRY_BYTES);
    for chunk in bytes.chunks_exact(ORDERING_ENTRY_BYTES) {
        let raw = i64::from_be_bytes(chunk.try_into().expect("chunk width"));
        if raw <= 0 {
            return None;
        }
        ids.push(TrackId::new(raw));
    }

    Some(ids)
}
