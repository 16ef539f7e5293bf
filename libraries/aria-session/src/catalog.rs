//! Named track catalogs
//!
//! The catalog owns the built-in favorites and history lists plus
//! user-created lists, all persisted through the entity store. Favorites
//! membership is answered by a store existence query; history is bounded and
//! keeps most-recent-last in storage (most-recent-first in the public read
//! order). Every successful mutation of a built-in catalog posts a
//! notification through the hub.

use crate::error::Result;
use crate::events::SessionEvent;
use crate::hub::NotificationHub;
use crate::tracklist::OrderedTrackList;
use aria_core::{EntityStore, StoreError, Track, TrackId, TrackListRecord};
use std::sync::Arc;
use tracing::debug;

/// Reserved name of the favorites catalog
pub const FAVORITES_LIST: &str = "__favorite";

/// Reserved name of the history catalog
pub const HISTORY_LIST: &str = "__history";

/// Reserved name of the persisted play queue record
pub const QUEUE_LIST: &str = "__queue";

/// Default history capacity
pub const MAX_HISTORY_SIZE: usize = 500;

/// Whether a name is reserved and cannot be user-created, renamed, or
/// deleted. The check is case-insensitive.
pub fn is_built_in_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(FAVORITES_LIST)
        || name.eq_ignore_ascii_case(HISTORY_LIST)
        || name.eq_ignore_ascii_case(QUEUE_LIST)
}

/// A named track list bound to its persisted record.
///
/// Elements are lazily materialized from the store on the first call to
/// [`Self::elements`] and cached; mutations are flushed back into the record
/// by [`Catalog::update_list`].
pub struct CatalogList {
    store: Arc<dyn EntityStore>,
    record: TrackListRecord,
    elements: Option<OrderedTrackList>,
}

impl CatalogList {
    fn open(store: Arc<dyn EntityStore>, record: TrackListRecord) -> Self {
        Self {
            store,
            record,
            elements: None,
        }
    }

    /// Record identity
    pub fn id(&self) -> i64 {
        self.record.id
    }

    /// List name
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Rename the list.
    ///
    /// Errors on an empty name; silently ignored for built-in lists.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(StoreError::invalid_argument("name must not be empty").into());
        }

        if self.is_built_in() {
            return Ok(());
        }

        self.record.name = name;
        Ok(())
    }

    /// List description
    pub fn description(&self) -> &str {
        &self.record.description
    }

    /// Set the list description
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.record.description = description.into();
    }

    /// Whether this is a built-in list (favorites, history, queue record)
    pub fn is_built_in(&self) -> bool {
        is_built_in_name(&self.record.name)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match &self.elements {
            Some(elements) => elements.len(),
            None => self.record.members.len(),
        }
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element view, materialized from the store on first access.
    ///
    /// Mutations are applied to the cached view; call
    /// [`Catalog::update_list`] to flush them to the store.
    pub fn elements(&mut self) -> &mut OrderedTrackList {
        if self.elements.is_none() {
            let natural: Vec<Track> = self
                .record
                .members
                .iter()
                .filter_map(|&id| self.store.get_track(id))
                .collect();

            self.elements = Some(OrderedTrackList::from_parts(natural, &self.record.ordering));
        }

        self.elements.as_mut().expect("just materialized")
    }

    /// Flush the cached element view back into the persisted record
    fn apply_changes(&mut self) {
        if let Some(elements) = &self.elements {
            self.record.members = elements.ids();
            self.record.ordering = elements.encode_ordering();
        }
    }

    fn record_mut(&mut self) -> &mut TrackListRecord {
        &mut self.record
    }
}

impl std::fmt::Debug for CatalogList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogList")
            .field("id", &self.record.id)
            .field("name", &self.record.name)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Catalog surface over the entity store
pub struct Catalog {
    store: Arc<dyn EntityStore>,
    hub: Arc<NotificationHub>,
    history_capacity: usize,
    history: Option<CatalogList>,
}

impl Catalog {
    /// Create a catalog with the default history capacity
    pub fn new(store: Arc<dyn EntityStore>, hub: Arc<NotificationHub>) -> Self {
        Self::with_history_capacity(store, hub, MAX_HISTORY_SIZE)
    }

    /// Create a catalog with a custom history capacity
    pub fn with_history_capacity(
        store: Arc<dyn EntityStore>,
        hub: Arc<NotificationHub>,
        history_capacity: usize,
    ) -> Self {
        Self {
            store,
            hub,
            history_capacity,
            history: None,
        }
    }

    // ===== Tracks =====

    /// Store or update a track, assigning a durable identity if missing.
    ///
    /// A track must be stored before it can be referenced from any list,
    /// otherwise ordering persistence cannot name it.
    pub fn put_track(&self, track: &mut Track) -> Result<TrackId> {
        Ok(self.store.put_track(track)?)
    }

    /// Store or update several tracks
    pub fn put_tracks(&self, tracks: &mut [Track]) -> Result<()> {
        Ok(self.store.put_tracks(tracks)?)
    }

    /// Get a track by identity
    pub fn get_track(&self, id: TrackId) -> Option<Track> {
        self.store.get_track(id)
    }

    /// Every stored track
    pub fn all_tracks(&self) -> Vec<Track> {
        self.store.all_tracks()
    }

    /// Stored tracks within the given offset/limit window
    pub fn all_tracks_range(&self, offset: usize, limit: usize) -> Vec<Track> {
        self.store.all_tracks_range(offset, limit)
    }

    /// Number of stored tracks
    pub fn track_count(&self) -> usize {
        self.store.track_count()
    }

    /// Remove a track from the store and from every list
    pub fn remove_track(&mut self, id: TrackId) -> bool {
        let removed = self.store.remove_track(id);
        if removed {
            // Drop the cached history materialization; it may name the track
            self.history = None;
        }
        removed
    }

    /// Distinct artist names
    pub fn artists(&self) -> Vec<String> {
        self.store.artists()
    }

    /// Distinct album names
    pub fn albums(&self) -> Vec<String> {
        self.store.albums()
    }

    /// All tracks by the given artist
    pub fn tracks_by_artist(&self, artist: &str) -> Vec<Track> {
        self.store.tracks_by_artist(artist)
    }

    /// All tracks on the given album
    pub fn tracks_by_album(&self, album: &str) -> Vec<Track> {
        self.store.tracks_by_album(album)
    }

    // ===== User lists =====

    /// Create a new named list; returns the existing list if the name is
    /// already taken.
    ///
    /// Errors with `InvalidArgument` on an empty name or a name that
    /// conflicts (case-insensitively) with a built-in.
    pub fn create_list(&self, name: &str) -> Result<CatalogList> {
        self.create_list_with_description(name, "")
    }

    /// Create a new named list with a description
    pub fn create_list_with_description(&self, name: &str, description: &str) -> Result<CatalogList> {
        if name.is_empty() {
            return Err(StoreError::invalid_argument("name must not be empty").into());
        }

        if is_built_in_name(name) {
            return Err(StoreError::invalid_argument(
                "illegal list name, conflicts with built-in name",
            )
            .into());
        }

        if let Some(existing) = self.list(name) {
            return Ok(existing);
        }

        let mut record = TrackListRecord::new(name, description);
        self.store.put_list(&mut record)?;
        Ok(CatalogList::open(self.store.clone(), record))
    }

    /// Get a user list by name; `None` for absent names and built-ins
    pub fn list(&self, name: &str) -> Option<CatalogList> {
        if is_built_in_name(name) {
            return None;
        }

        self.store
            .get_list_by_name(name)
            .map(|record| CatalogList::open(self.store.clone(), record))
    }

    /// Every user list (built-ins excluded)
    pub fn all_lists(&self) -> Vec<CatalogList> {
        self.store
            .all_lists()
            .into_iter()
            .filter(|record| !is_built_in_name(&record.name))
            .map(|record| CatalogList::open(self.store.clone(), record))
            .collect()
    }

    /// Whether a list with the given name exists
    pub fn list_exists(&self, name: &str) -> bool {
        self.store.list_exists(name)
    }

    /// Flush a list's cached element view and persist the record.
    ///
    /// Ignored if the record no longer exists in the store.
    pub fn update_list(&self, list: &mut CatalogList) -> Result<()> {
        if self.store.get_list(list.id()).is_none() {
            debug!(name = list.name(), "update for a deleted list ignored");
            return Ok(());
        }

        list.apply_changes();
        self.store.put_list(list.record_mut())?;
        Ok(())
    }

    /// Delete a user list by name; built-in names are ignored
    pub fn delete_list(&self, name: &str) {
        if is_built_in_name(name) {
            return;
        }

        self.store.remove_list_by_name(name);
    }

    // ===== Favorites =====

    /// Whether the track with the given identity is a favorite.
    ///
    /// Answered by a store existence query; always false for identities
    /// never persisted.
    pub fn is_favorite(&self, id: TrackId) -> bool {
        if !id.is_persisted() {
            return false;
        }

        self.store.list_contains(FAVORITES_LIST, id)
    }

    /// The favorites list, created on first use
    pub fn favorites(&self) -> CatalogList {
        self.built_in_list(FAVORITES_LIST)
    }

    /// Add a track to favorites; no-op if already present or unpersisted
    pub fn add_favorite(&mut self, track: &Track) {
        if !track.is_persisted() || self.is_favorite(track.id) {
            return;
        }

        let mut favorites = self.built_in_list(FAVORITES_LIST);
        favorites.elements().add(track.clone());
        if self.update_list(&mut favorites).is_ok() {
            self.hub.post(SessionEvent::FavoriteChanged);
        }
    }

    /// Remove a track from favorites; no-op if absent
    pub fn remove_favorite(&mut self, track: &Track) {
        if !self.is_favorite(track.id) {
            return;
        }

        let mut favorites = self.built_in_list(FAVORITES_LIST);
        favorites.elements().remove(track.id);
        if self.update_list(&mut favorites).is_ok() {
            self.hub.post(SessionEvent::FavoriteChanged);
        }
    }

    /// Toggle the favorite state of a track.
    ///
    /// The membership check and the branch run back-to-back on the caller's
    /// (single) command context, so no window exists where neither branch
    /// executes.
    pub fn toggle_favorite(&mut self, track: &Track) {
        if self.is_favorite(track.id) {
            self.remove_favorite(track);
        } else {
            self.add_favorite(track);
        }
    }

    // ===== History =====

    /// Record a play in history.
    ///
    /// A track already present is moved to the most-recent position without
    /// changing the length; overflow evicts the oldest entry.
    pub fn add_history(&mut self, track: &Track) {
        if !track.is_persisted() {
            return;
        }

        let capacity = self.history_capacity;
        let history = self.history_list();
        let elements = history.elements();

        elements.remove(track.id);
        elements.add(track.clone());
        if elements.len() > capacity {
            elements.remove_at(0);
        }

        self.persist_history();
    }

    /// Remove one history entry
    pub fn remove_history(&mut self, track: &Track) {
        let id = track.id;
        if !self.history_list().elements().remove(id) {
            return;
        }

        self.persist_history();
    }

    /// Remove several history entries
    pub fn remove_history_all(&mut self, ids: &[TrackId]) {
        if !self.history_list().elements().remove_all(ids) {
            return;
        }

        self.persist_history();
    }

    /// Clear the entire history
    pub fn clear_history(&mut self) {
        self.history_list().elements().clear();
        self.persist_history();
    }

    /// The full history, most-recent-first
    pub fn history(&mut self) -> Vec<Track> {
        let mut snapshot = self.history_list().elements().to_vec();
        snapshot.reverse();
        snapshot
    }

    fn history_list(&mut self) -> &mut CatalogList {
        if self.history.is_none() {
            self.history = Some(self.built_in_list(HISTORY_LIST));
        }

        self.history.as_mut().expect("just opened")
    }

    fn persist_history(&mut self) {
        let store = self.store.clone();
        let hub = self.hub.clone();

        let history = self.history_list();
        history.apply_changes();
        if let Err(error) = store.put_list(history.record_mut()) {
            debug!(%error, "persisting history failed");
            return;
        }

        let mut snapshot = history.elements().to_vec();
        snapshot.reverse();
        hub.post(SessionEvent::HistoryChanged { snapshot });
    }

    fn built_in_list(&self, name: &str) -> CatalogList {
        if let Some(record) = self.store.get_list_by_name(name) {
            return CatalogList::open(self.store.clone(), record);
        }

        let mut record = TrackListRecord::new(name, "");
        // A failure here leaves an unpersisted record; subsequent updates
        // are ignored by update_list, matching the deleted-list path
        if let Err(error) = self.store.put_list(&mut record) {
            debug!(%error, name, "creating built-in list failed");
        }

        CatalogList::open(self.store.clone(), record)
    }
}
