use std::sync::Arc;

use crate::clock::Clock;
use crate::core::entry::{Entry, EntryDraft, EntryId, Priority};
use crate::preferences::ThemePreferences;
use crate::reminder::{Alerter, MissedReminderPolicy, Scheduler};
use crate::storage::{Storage, StorageError};
use crate::store::{EntryStore, StoreError};
use crate::toast::Toaster;

/// Wires the entry store, reminder scheduler and preferences to one storage.
pub struct Datemaster {
    store: EntryStore,
    scheduler: Scheduler,
    preferences: ThemePreferences,
}

impl Datemaster {
    /// Loads all persisted state and re-arms reminders left pending by an
    /// earlier run. Must be called inside a tokio runtime for timers to arm.
    pub fn open(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        toaster: Arc<dyn Toaster>,
        alerter: Arc<dyn Alerter>,
        missed_reminders: MissedReminderPolicy,
    ) -> Result<Self, StorageError> {
        let store = EntryStore::open(storage.clone(), clock.clone(), toaster)?;
        let scheduler = Scheduler::open(storage.clone(), clock, alerter);
        let preferences = ThemePreferences::load(storage);

        scheduler.rearm_pending(missed_reminders);

        Ok(Self {
            store,
            scheduler,
            preferences,
        })
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn preferences(&self) -> &ThemePreferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut ThemePreferences {
        &mut self.preferences
    }

    /// Adds the entry and schedules its reminder. A reminder that cannot be
    /// scheduled does not fail the add.
    pub fn add_entry(&mut self, draft: EntryDraft) -> Result<Entry, StoreError> {
        let entry = self.store.add(draft)?;
        if !self.scheduler.schedule_notification(&entry) {
            log::info!("No reminder scheduled for \"{}\"", entry.name);
        }
        Ok(entry)
    }

    /// Replaces the entry. A pending reminder is rescheduled when the name or
    /// date changed.
    pub fn update_entry(&mut self, entry: Entry) -> Result<Entry, StoreError> {
        let previous = self.store.get(entry.id).cloned();
        let updated = self.store.update(entry)?;

        let changed = previous
            .is_some_and(|p| p.name != updated.name || p.date != updated.date);
        let has_pending = self
            .scheduler
            .notifications()
            .iter()
            .any(|r| r.entry_id == updated.id && r.is_pending());
        if changed && has_pending {
            match self.scheduler.cancel_for_entry(updated.id) {
                Ok(()) => {
                    if !self.scheduler.schedule_notification(&updated) {
                        log::info!("No reminder rescheduled for \"{}\"", updated.name);
                    }
                }
                Err(e) => log::error!(
                    "Failed to drop old reminders for \"{}\": {}",
                    updated.name,
                    e
                ),
            }
        }
        Ok(updated)
    }

    pub fn set_priority(
        &mut self,
        id: EntryId,
        priority: Option<Priority>,
    ) -> Result<Entry, StoreError> {
        self.store.set_priority(id, priority)
    }

    /// Moves an entry within the filtered view; see [`EntryStore::reorder`].
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        self.store.reorder(from, to)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.store.set_search_query(query);
    }

    /// Deletes the entry and cancels any reminder still waiting for it.
    pub fn delete_entry(&mut self, id: EntryId) -> Result<Entry, StoreError> {
        let entry = self.store.delete(id)?;
        if let Err(e) = self.scheduler.cancel_for_entry(id) {
            log::error!("Failed to drop reminders for \"{}\": {}", entry.name, e);
        }
        Ok(entry)
    }
}
