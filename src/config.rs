use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::reminder::MissedReminderPolicy;

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("datemaster")
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("datemaster")
        .join("config.json")
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct DatemasterConfig {
    pub data_directory: PathBuf,
    pub debug_logging: bool,
    pub missed_reminders: MissedReminderPolicy,
}

impl Default for DatemasterConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            debug_logging: false,
            missed_reminders: MissedReminderPolicy::default(),
        }
    }
}

impl DatemasterConfig {
    /// Reads the config, falling back to defaults when it is missing or broken.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::error!("Invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::error!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatemasterConfig::load(&dir.path().join("config.json"));
        assert_eq!(config, DatemasterConfig::default());
        assert!(config.data_directory.ends_with("datemaster"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"missed_reminders":"skip"}"#).unwrap();
        let config = DatemasterConfig::load(&path);
        assert_eq!(config.missed_reminders, MissedReminderPolicy::Skip);
        assert!(!config.debug_logging);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let config = DatemasterConfig {
            data_directory: dir.path().join("data"),
            debug_logging: true,
            missed_reminders: MissedReminderPolicy::Skip,
        };
        config.save(&path).unwrap();
        assert_eq!(DatemasterConfig::load(&path), config);
        config.ensure_directories().unwrap();
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(DatemasterConfig::load(&path), DatemasterConfig::default());
    }
}
