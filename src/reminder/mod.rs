pub mod alert;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::clock::Clock;
use crate::core::entry::{Entry, EntryId};
use crate::core::notification::{
    NotificationRecord, NotificationSettings, NotificationStatus, SettingsPatch,
};
use crate::storage::{
    NOTIFICATION_HISTORY_KEY, NOTIFICATION_SETTINGS_KEY, Storage, StorageError,
    load_json_or_default, save_json,
};

pub use alert::{Alerter, LogAlerter, Permission};

/// What to do at startup with pending reminders whose instant already passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissedReminderPolicy {
    /// Show them right away, late.
    #[default]
    Deliver,
    /// Leave them pending and silent.
    Skip,
}

/// Outcome of [`Scheduler::rearm_pending`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RearmSummary {
    pub rearmed: usize,
    pub delivered: usize,
    pub skipped: usize,
}

struct ArmedTimer {
    entry_id: EntryId,
    handle: AbortHandle,
}

/// State reachable from timer tasks.
struct Shared {
    storage: Arc<dyn Storage>,
    alerter: Arc<dyn Alerter>,
    permission: Mutex<Permission>,
    settings: Mutex<NotificationSettings>,
    history: Mutex<Vec<NotificationRecord>>,
    timers: Mutex<HashMap<Uuid, ArmedTimer>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Shared {
    fn persist_history(&self, history: &[NotificationRecord]) -> Result<(), StorageError> {
        save_json(self.storage.as_ref(), NOTIFICATION_HISTORY_KEY, history)
    }

    /// Shows the reminder for `record_id` and marks it sent. Returns false,
    /// leaving the record untouched, when it is gone, no longer pending, or
    /// alert permission is missing.
    fn fire(&self, record_id: Uuid) -> bool {
        lock(&self.timers).remove(&record_id);

        if *lock(&self.permission) != Permission::Granted {
            log::warn!("Alert permission missing, reminder {} left pending", record_id);
            return false;
        }

        let title = {
            let mut history = lock(&self.history);
            let Some(record) = history
                .iter_mut()
                .find(|r| r.id == record_id && r.is_pending())
            else {
                log::debug!("Reminder {} no longer pending, not firing", record_id);
                return false;
            };
            record.status = NotificationStatus::Sent;
            let title = record.title.clone();
            if let Err(e) = self.persist_history(&history) {
                log::error!("Failed to save notification history: {}", e);
            }
            title
        };

        let silent = !lock(&self.settings).sound_enabled;
        log::info!("Firing reminder for \"{}\"", title);
        self.alerter
            .display(&title, &format!("Reminder: {} is coming up!", title), silent);
        true
    }
}

/// Turns entries into one-shot reminders tracked in a persisted history.
///
/// Armed timers are tokio tasks. Each one can be aborted through
/// [`cancel_for_entry`](Self::cancel_for_entry), and after a restart
/// [`rearm_pending`](Self::rearm_pending) picks up whatever is still pending.
pub struct Scheduler {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn open(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, alerter: Arc<dyn Alerter>) -> Self {
        let settings: NotificationSettings =
            load_json_or_default(storage.as_ref(), NOTIFICATION_SETTINGS_KEY);
        let history: Vec<NotificationRecord> =
            load_json_or_default(storage.as_ref(), NOTIFICATION_HISTORY_KEY);
        let permission = alerter.permission();

        log::info!(
            "Loaded {} notification records, permission {:?}",
            history.len(),
            permission
        );

        Self {
            shared: Arc::new(Shared {
                storage,
                alerter,
                permission: Mutex::new(permission),
                settings: Mutex::new(settings),
                history: Mutex::new(history),
                timers: Mutex::new(HashMap::new()),
            }),
            clock,
        }
    }

    pub fn settings(&self) -> NotificationSettings {
        lock(&self.shared.settings).clone()
    }

    pub fn notifications(&self) -> Vec<NotificationRecord> {
        lock(&self.shared.history).clone()
    }

    pub fn permission(&self) -> Permission {
        *lock(&self.shared.permission)
    }

    /// Number of timers currently waiting to fire.
    pub fn armed_count(&self) -> usize {
        lock(&self.shared.timers).len()
    }

    /// Prompts for alert permission. Returns true when granted.
    pub async fn request_permission(&self) -> bool {
        let permission = self.shared.alerter.request_permission().await;
        *lock(&self.shared.permission) = permission;
        permission == Permission::Granted
    }

    /// Shallow-merges `patch` into the settings and persists the result.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<NotificationSettings, StorageError> {
        let mut settings = lock(&self.shared.settings);
        let previous = settings.clone();
        settings.apply(patch);
        if let Err(e) = save_json(
            self.shared.storage.as_ref(),
            NOTIFICATION_SETTINGS_KEY,
            &*settings,
        ) {
            *settings = previous;
            return Err(e);
        }
        Ok(settings.clone())
    }

    /// Records a pending reminder for `entry` and arms a timer when its
    /// instant is still ahead. Returns false, creating nothing, when reminders
    /// are disabled, permission is missing, the lead time reaches past the
    /// earliest representable date or the history cannot be saved.
    pub fn schedule_notification(&self, entry: &Entry) -> bool {
        let settings = self.settings();
        if !settings.enabled {
            log::debug!("Reminders disabled, not scheduling \"{}\"", entry.name);
            return false;
        }
        if self.permission() != Permission::Granted {
            log::debug!("No alert permission, not scheduling \"{}\"", entry.name);
            return false;
        }

        let Some(fire_at) = settings.fire_instant(entry.date) else {
            log::warn!(
                "Reminder for \"{}\" would fall {} days before {}, out of range",
                entry.name,
                settings.days_before_event,
                entry.date
            );
            return false;
        };
        let record = NotificationRecord::pending(entry.id, entry.name.clone(), fire_at);
        {
            let mut history = lock(&self.shared.history);
            history.push(record.clone());
            if let Err(e) = self.shared.persist_history(&history) {
                history.pop();
                log::error!("Failed to save reminder for \"{}\": {}", entry.name, e);
                return false;
            }
        }

        if !self.arm(&record) {
            log::info!(
                "Reminder for \"{}\" at {} is not ahead of now, left pending",
                entry.name,
                record.date
            );
        }
        true
    }

    /// Aborts the timers of `entry_id` and drops its pending records.
    pub fn cancel_for_entry(&self, entry_id: EntryId) -> Result<(), StorageError> {
        lock(&self.shared.timers).retain(|_, timer| {
            if timer.entry_id == entry_id {
                timer.handle.abort();
                false
            } else {
                true
            }
        });

        let mut history = lock(&self.shared.history);
        let before = history.clone();
        history.retain(|r| !(r.entry_id == entry_id && r.is_pending()));
        if history.len() == before.len() {
            return Ok(());
        }
        if let Err(e) = self.shared.persist_history(&history) {
            *history = before;
            return Err(e);
        }
        log::info!("Cancelled reminders for entry {}", entry_id);
        Ok(())
    }

    /// Drops every record that is no longer pending.
    pub fn clear_history(&self) -> Result<(), StorageError> {
        let mut history = lock(&self.shared.history);
        let before = history.clone();
        history.retain(NotificationRecord::is_pending);
        if let Err(e) = self.shared.persist_history(&history) {
            *history = before;
            return Err(e);
        }
        Ok(())
    }

    /// Arms timers for pending records that have none yet. Records whose
    /// instant has passed are handled per `policy`.
    pub fn rearm_pending(&self, policy: MissedReminderPolicy) -> RearmSummary {
        let mut summary = RearmSummary::default();
        if !lock(&self.shared.settings).enabled {
            log::info!("Reminders disabled, nothing re-armed");
            return summary;
        }

        let now = self.clock.now();
        let pending: Vec<NotificationRecord> = {
            let timers = lock(&self.shared.timers);
            lock(&self.shared.history)
                .iter()
                .filter(|r| r.is_pending() && !timers.contains_key(&r.id))
                .cloned()
                .collect()
        };

        for record in pending {
            if record.date > now && self.arm(&record) {
                summary.rearmed += 1;
            } else if record.date > now {
                summary.skipped += 1;
            } else {
                match policy {
                    MissedReminderPolicy::Deliver if self.shared.fire(record.id) => {
                        summary.delivered += 1;
                    }
                    MissedReminderPolicy::Deliver => summary.skipped += 1,
                    MissedReminderPolicy::Skip => summary.skipped += 1,
                }
            }
        }

        log::info!(
            "Re-armed {} reminders, delivered {} missed, skipped {}",
            summary.rearmed,
            summary.delivered,
            summary.skipped
        );
        summary
    }

    /// Spawns the timer task for `record`. False when its instant is not in the
    /// future or no tokio runtime is running.
    fn arm(&self, record: &NotificationRecord) -> bool {
        let Ok(delay) = (record.date - self.clock.now()).to_std() else {
            return false;
        };
        if delay.is_zero() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("No async runtime, reminder {} not armed", record.id);
            return false;
        };

        // hold the table while spawning so the task cannot remove itself first
        let mut timers = lock(&self.shared.timers);
        let shared = Arc::clone(&self.shared);
        let record_id = record.id;
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire(record_id);
        });
        timers.insert(
            record_id,
            ArmedTimer {
                entry_id: record.entry_id,
                handle: task.abort_handle(),
            },
        );
        log::debug!("Armed reminder {} for {:?}", record_id, delay);
        true
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for (_, timer) in lock(&self.shared.timers).drain() {
            timer.handle.abort();
        }
    }
}
