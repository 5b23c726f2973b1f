//! A list of entities plus the bookkeeping for fetching it.

use std::{
    collections::{HashMap, hash_map::Entry},
    hash::Hash,
};

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    budget::Budget, category::Category, database_id::DatabaseId, transaction::Transaction,
};

/// Where a collection is in its fetch lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    /// Nothing has been fetched yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch succeeded.
    Succeeded,
    /// The last fetch failed, see [Collection::error].
    Failed,
}

/// Something with a stable database ID.
pub trait Entity: Clone {
    /// The ID of the entity.
    fn id(&self) -> DatabaseId;
}

impl Entity for Transaction {
    fn id(&self) -> DatabaseId {
        self.id
    }
}

impl Entity for Category {
    fn id(&self) -> DatabaseId {
        self.id
    }
}

impl Entity for Budget {
    fn id(&self) -> DatabaseId {
        self.id
    }
}

/// Identifies one fetch of a collection.
///
/// Only the most recently started fetch may replace the collection, so a slow
/// response cannot overwrite the result of a newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken(u64);

/// The latest known items of one entity type and the status of fetching them.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    status: LoadStatus,
    error: Option<String>,
    last_fetched: Option<OffsetDateTime>,
    generation: u64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: LoadStatus::Idle,
            error: None,
            last_fetched: None,
            generation: 0,
        }
    }
}

impl<T: Entity> Collection<T> {
    /// The items in display order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item with `id`, if present.
    pub fn get(&self, id: DatabaseId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// The fetch status.
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// The message of the last failed fetch, cleared when a new fetch starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// When the collection last received a successful fetch result.
    pub fn last_fetched(&self) -> Option<OffsetDateTime> {
        self.last_fetched
    }

    /// Mark the start of a fetch.
    pub fn start_loading(&mut self) -> FetchToken {
        self.generation += 1;
        self.status = LoadStatus::Loading;
        self.error = None;

        FetchToken(self.generation)
    }

    /// Whether `token` belongs to the most recently started fetch.
    pub fn is_current(&self, token: FetchToken) -> bool {
        token.0 == self.generation
    }

    /// Set the collection to exactly `items`.
    ///
    /// Returns `false` and changes nothing if a newer fetch has started since
    /// `token` was issued.
    pub fn replace_all(&mut self, token: FetchToken, items: Vec<T>) -> bool {
        if !self.is_current(token) {
            return false;
        }

        self.items = items;
        self.mark_succeeded();

        true
    }

    /// Merge `items` into the collection, matching entries by `key`.
    ///
    /// Existing entries keep their position and are overwritten by a new item
    /// with the same key; new keys are appended in the order given. Entries
    /// with keys not in `items` are kept. If several entries share a key,
    /// only the last one is kept.
    ///
    /// Returns `false` and changes nothing if a newer fetch has started since
    /// `token` was issued.
    pub fn merge_by_key<K: Eq + Hash>(
        &mut self,
        token: FetchToken,
        items: Vec<T>,
        key: impl Fn(&T) -> K,
    ) -> bool {
        if !self.is_current(token) {
            return false;
        }

        let mut positions: HashMap<K, usize> = HashMap::new();
        let mut merged: Vec<T> = Vec::with_capacity(self.items.len() + items.len());

        for item in std::mem::take(&mut self.items).into_iter().chain(items) {
            match positions.entry(key(&item)) {
                Entry::Occupied(entry) => merged[*entry.get()] = item,
                Entry::Vacant(entry) => {
                    entry.insert(merged.len());
                    merged.push(item);
                }
            }
        }

        self.items = merged;
        self.mark_succeeded();

        true
    }

    /// Record a failed fetch, emptying the items if `clear_items` is set.
    ///
    /// Returns `false` and changes nothing if a newer fetch has started since
    /// `token` was issued.
    pub fn fail(&mut self, token: FetchToken, message: &str, clear_items: bool) -> bool {
        if !self.is_current(token) {
            return false;
        }

        self.status = LoadStatus::Failed;
        self.error = Some(message.to_owned());

        if clear_items {
            self.items.clear();
        }

        true
    }

    /// Replace the entry with the same `key` as `item` in place, or append
    /// `item` if there is none.
    pub fn upsert_one<K: PartialEq>(&mut self, item: T, key: impl Fn(&T) -> K) {
        let item_key = key(&item);

        match self.items.iter().position(|existing| key(existing) == item_key) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    /// Add `item` as the first entry.
    pub fn insert_front(&mut self, item: T) {
        self.items.insert(0, item);
    }

    /// Remove every entry with `id`, doing nothing if there is none.
    ///
    /// # Returns
    /// The first entry removed.
    pub fn remove_by_id(&mut self, id: DatabaseId) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        let removed = self.items.remove(index);
        self.items.retain(|item| item.id() != id);

        Some(removed)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    /// Forget the last error message.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Return to the initial empty, idle state.
    ///
    /// Fetches that started before the reset can no longer replace the items.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    fn mark_succeeded(&mut self) {
        self.status = LoadStatus::Succeeded;
        self.error = None;
        self.last_fetched = Some(OffsetDateTime::now_utc());
    }
}
