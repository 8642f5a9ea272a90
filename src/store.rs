use std::sync::Arc;

use crate::clock::Clock;
use crate::core::entry::{Entry, EntryDraft, EntryId, Priority};
use crate::storage::{ENTRIES_KEY, Storage, StorageError, load_json, save_json};
use crate::toast::{Severity, Toaster};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("entry {0} not found")]
    NotFound(EntryId),
    #[error("index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Owns the entry collection and keeps it in step with durable storage.
///
/// Every mutation persists before it reports success. When the write fails the
/// in-memory collection is restored to what it was before the call, so memory
/// and storage never disagree.
pub struct EntryStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    toaster: Arc<dyn Toaster>,
    entries: Vec<Entry>,
    search_query: String,
    last_id: EntryId,
}

impl EntryStore {
    pub fn open(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        toaster: Arc<dyn Toaster>,
    ) -> Result<Self, StorageError> {
        let mut entries: Vec<Entry> = load_json(storage.as_ref(), ENTRIES_KEY)?.unwrap_or_default();
        normalize_order(&mut entries);
        let last_id = entries.iter().map(|e| e.id).max().unwrap_or(0);

        log::info!("Loaded {} entries", entries.len());

        Ok(Self {
            storage,
            clock,
            toaster,
            entries,
            search_query: String::new(),
            last_id,
        })
    }

    /// All entries in storage order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Entries matching the active search query, sorted by `order`.
    pub fn filtered_entries(&self) -> Vec<Entry> {
        let query = self.search_query.to_lowercase();
        let mut result: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| query.is_empty() || e.matches(&query))
            .cloned()
            .collect();
        result.sort_by_key(|e| e.order);
        result
    }

    pub fn add(&mut self, draft: EntryDraft) -> Result<Entry, StoreError> {
        let name = draft.name.clone();
        let result = self.try_add(draft);
        self.report(
            &result,
            format!("Successfully added \"{}\"", name),
            format!("Failed to add \"{}\"", name),
        );
        result
    }

    fn try_add(&mut self, draft: EntryDraft) -> Result<Entry, StoreError> {
        let now = self.clock.now();
        let id = self.next_id();
        let entry = draft.into_entry(id, self.entries.len(), now);

        let snapshot = self.entries.clone();
        self.entries.push(entry.clone());
        self.commit(snapshot)?;
        self.last_id = id;
        Ok(entry)
    }

    /// Replaces the stored entry with the same id. `created_at` is kept from the
    /// stored record.
    pub fn update(&mut self, entry: Entry) -> Result<Entry, StoreError> {
        let name = entry.name.clone();
        let result = self.try_update(entry);
        self.report(
            &result,
            format!("Successfully updated \"{}\"", name),
            format!("Failed to update \"{}\"", name),
        );
        result
    }

    fn try_update(&mut self, mut entry: Entry) -> Result<Entry, StoreError> {
        let index = self.index_of(entry.id)?;
        let snapshot = self.entries.clone();
        entry.created_at = self.entries[index].created_at;
        self.entries[index] = entry;
        self.commit(snapshot)?;
        Ok(self.entries[index].clone())
    }

    pub fn delete(&mut self, id: EntryId) -> Result<Entry, StoreError> {
        let result = self.try_delete(id);
        match &result {
            Ok(entry) => self.toaster.notify(
                &format!("Successfully deleted \"{}\"", entry.name),
                Severity::Success,
            ),
            Err(e) => {
                log::error!("Failed to delete entry {}: {}", id, e);
                self.toaster.notify("Failed to delete entry", Severity::Error);
            }
        }
        result
    }

    fn try_delete(&mut self, id: EntryId) -> Result<Entry, StoreError> {
        let index = self.index_of(id)?;
        let snapshot = self.entries.clone();
        let removed = self.entries.remove(index);
        self.commit(snapshot)?;
        Ok(removed)
    }

    pub fn set_priority(
        &mut self,
        id: EntryId,
        priority: Option<Priority>,
    ) -> Result<Entry, StoreError> {
        let result = self.try_set_priority(id, priority);
        match &result {
            Ok(entry) => {
                let label = priority.map_or("none", |p| p.as_label());
                self.toaster.notify(
                    &format!("Set priority of \"{}\" to {}", entry.name, label),
                    Severity::Success,
                );
            }
            Err(e) => {
                log::error!("Failed to set priority of entry {}: {}", id, e);
                self.toaster.notify("Failed to set priority", Severity::Error);
            }
        }
        result
    }

    fn try_set_priority(
        &mut self,
        id: EntryId,
        priority: Option<Priority>,
    ) -> Result<Entry, StoreError> {
        let index = self.index_of(id)?;
        let snapshot = self.entries.clone();
        self.entries[index].priority = priority;
        self.commit(snapshot)?;
        Ok(self.entries[index].clone())
    }

    /// Moves the entry at `from` to `to`. Both indices are positions in
    /// [`filtered_entries`](Self::filtered_entries); afterwards every entry's
    /// `order` is renumbered 0..n-1.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        let result = self.try_reorder(from, to);
        match &result {
            Ok(()) => self.toaster.notify("Entries reordered", Severity::Success),
            Err(e) => {
                log::error!("Failed to move entry from {} to {}: {}", from, to, e);
                self.toaster.notify("Failed to reorder entries", Severity::Error);
            }
        }
        result
    }

    fn try_reorder(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        let view: Vec<EntryId> = self.filtered_entries().iter().map(|e| e.id).collect();
        let len = view.len();
        for index in [from, to] {
            if index >= len {
                return Err(StoreError::IndexOutOfRange { index, len });
            }
        }
        let moving = view[from];
        let target = view[to];

        let mut sequence = self.entries.clone();
        sequence.sort_by_key(|e| e.order);
        let mut ids: Vec<EntryId> = sequence.iter().map(|e| e.id).collect();

        if moving != target {
            let src = position(&ids, moving);
            ids.remove(src);
            let mut dst = position(&ids, target);
            if from < to {
                dst += 1;
            }
            ids.insert(dst, moving);
        }

        let snapshot = self.entries.clone();
        for (order, id) in ids.iter().enumerate() {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == *id) {
                entry.order = order;
            }
        }
        self.commit(snapshot)
    }

    fn index_of(&self, id: EntryId) -> Result<usize, StoreError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Millisecond timestamp, bumped past the last id handed out.
    fn next_id(&self) -> EntryId {
        let millis = self.clock.now().and_utc().timestamp_millis().max(0) as u64;
        millis.max(self.last_id + 1)
    }

    fn commit(&mut self, snapshot: Vec<Entry>) -> Result<(), StoreError> {
        normalize_order(&mut self.entries);
        if let Err(e) = save_json(self.storage.as_ref(), ENTRIES_KEY, &self.entries) {
            self.entries = snapshot;
            return Err(e.into());
        }
        Ok(())
    }

    fn report<T>(&self, result: &Result<T, StoreError>, success: String, failure: String) {
        match result {
            Ok(_) => self.toaster.notify(&success, Severity::Success),
            Err(e) => {
                log::error!("{}: {}", failure, e);
                self.toaster.notify(&failure, Severity::Error);
            }
        }
    }
}

fn position(ids: &[EntryId], id: EntryId) -> usize {
    ids.iter().position(|i| *i == id).unwrap_or(ids.len())
}

/// Rewrites `order` as a dense 0..n-1 sequence, keeping the current relative
/// order. Ties keep their storage position.
fn normalize_order(entries: &mut [Entry]) {
    let mut by_order: Vec<usize> = (0..entries.len()).collect();
    by_order.sort_by_key(|&i| entries[i].order);
    for (rank, index) in by_order.into_iter().enumerate() {
        entries[index].order = rank;
    }
}
