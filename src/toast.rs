use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// Fire-and-forget user feedback.
pub trait Toaster: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Sends toasts to the log when there is no UI to show them.
pub struct LogToaster;

impl Toaster for LogToaster {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => log::warn!("{}", message),
            Severity::Success | Severity::Info => log::info!("{}", message),
        }
    }
}

/// Keeps every toast it receives, newest last.
#[derive(Default)]
pub struct RecordingToaster {
    toasts: Mutex<Vec<(String, Severity)>>,
}

impl RecordingToaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<(String, Severity)> {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<(String, Severity)> {
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl Toaster for RecordingToaster {
    fn notify(&self, message: &str, severity: Severity) {
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((message.to_string(), severity));
    }
}
