pub mod file;
pub mod memory;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use file::FileStorage;
pub use memory::MemoryStorage;

pub const ENTRIES_KEY: &str = "date-entries";
pub const NOTIFICATION_SETTINGS_KEY: &str = "notification-settings";
pub const NOTIFICATION_HISTORY_KEY: &str = "notifications-history";
pub const THEME_KEY: &str = "datemaster-theme";
pub const FAVORITE_THEMES_KEY: &str = "favorite-themes";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode JSON: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String-keyed durable store. A `set` either lands completely or not at all.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub fn load_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

/// Like [`load_json`], but a missing or unreadable value yields `T::default()`.
pub fn load_json_or_default<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    match load_json(storage, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            log::error!("Failed to load {}: {}", key, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_helpers_roundtrip_through_storage() {
        let storage = MemoryStorage::new();
        save_json(&storage, FAVORITE_THEMES_KEY, &vec!["neon", "ocean"]).unwrap();
        let loaded: Option<Vec<String>> = load_json(&storage, FAVORITE_THEMES_KEY).unwrap();
        assert_eq!(loaded, Some(vec!["neon".to_string(), "ocean".to_string()]));
    }

    #[test]
    fn corrupt_value_falls_back_to_default() {
        let storage = MemoryStorage::new();
        storage.set(FAVORITE_THEMES_KEY, "{not json").unwrap();
        let loaded: Vec<String> = load_json_or_default(&storage, FAVORITE_THEMES_KEY);
        assert!(loaded.is_empty());
        assert!(load_json::<Vec<String>>(&storage, FAVORITE_THEMES_KEY).is_err());
    }
}
