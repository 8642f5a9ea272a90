use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    #[default]
    Default,
}

/// Desktop alert capability.
#[async_trait]
pub trait Alerter: Send + Sync {
    /// Permission as currently known, without prompting.
    fn permission(&self) -> Permission;

    async fn request_permission(&self) -> Permission;

    fn display(&self, title: &str, body: &str, silent: bool);
}

/// Writes alerts to the log. Always permitted.
pub struct LogAlerter;

#[async_trait]
impl Alerter for LogAlerter {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn display(&self, title: &str, body: &str, silent: bool) {
        log::info!("Reminder alert: {} - {} (silent: {})", title, body, silent);
    }
}

/// An alert that reached [`RecordingAlerter::display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedAlert {
    pub title: String,
    pub body: String,
    pub silent: bool,
}

/// Alerter with a fixed answer to permission prompts that remembers what it showed.
pub struct RecordingAlerter {
    current: Mutex<Permission>,
    answer: Permission,
    shown: Mutex<Vec<DisplayedAlert>>,
}

impl RecordingAlerter {
    pub fn new(current: Permission, answer: Permission) -> Self {
        Self {
            current: Mutex::new(current),
            answer,
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn granted() -> Self {
        Self::new(Permission::Granted, Permission::Granted)
    }

    pub fn shown(&self) -> Vec<DisplayedAlert> {
        self.shown.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Alerter for RecordingAlerter {
    fn permission(&self) -> Permission {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn request_permission(&self) -> Permission {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = self.answer;
        self.answer
    }

    fn display(&self, title: &str, body: &str, silent: bool) {
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(DisplayedAlert {
                title: title.to_string(),
                body: body.to_string(),
                silent,
            });
    }
}
