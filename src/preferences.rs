use std::sync::Arc;

use crate::core::theme::AppTheme;
use crate::storage::{
    FAVORITE_THEMES_KEY, Storage, StorageError, THEME_KEY, load_json_or_default, save_json,
};

/// Selected app theme plus the user's favorites, both persisted.
pub struct ThemePreferences {
    storage: Arc<dyn Storage>,
    current: AppTheme,
    favorites: Vec<AppTheme>,
}

impl ThemePreferences {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let current = load_theme(storage.as_ref());
        let favorites: Vec<AppTheme> = load_json_or_default(storage.as_ref(), FAVORITE_THEMES_KEY);
        Self {
            storage,
            current,
            favorites,
        }
    }

    pub fn current(&self) -> AppTheme {
        self.current
    }

    pub fn favorites(&self) -> &[AppTheme] {
        &self.favorites
    }

    pub fn is_favorite(&self, theme: AppTheme) -> bool {
        self.favorites.contains(&theme)
    }

    pub fn apply(&mut self, theme: AppTheme) -> Result<(), StorageError> {
        save_json(self.storage.as_ref(), THEME_KEY, &theme)?;
        self.current = theme;
        log::debug!("Applied theme {}", theme);
        Ok(())
    }

    /// Adds `theme` to the end of the favorites, or removes it if already there.
    /// Returns whether it is a favorite afterwards.
    pub fn toggle_favorite(&mut self, theme: AppTheme) -> Result<bool, StorageError> {
        let mut favorites = self.favorites.clone();
        let now_favorite = match favorites.iter().position(|t| *t == theme) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(theme);
                true
            }
        };
        save_json(self.storage.as_ref(), FAVORITE_THEMES_KEY, &favorites)?;
        self.favorites = favorites;
        Ok(now_favorite)
    }
}

/// The selected theme is stored as a JSON string, or as the bare key by
/// older versions.
fn load_theme(storage: &dyn Storage) -> AppTheme {
    let raw = match storage.get(THEME_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return AppTheme::default(),
        Err(e) => {
            log::error!("Failed to read {}: {}", THEME_KEY, e);
            return AppTheme::default();
        }
    };
    serde_json::from_str(&raw)
        .ok()
        .or_else(|| AppTheme::from_key(&raw))
        .unwrap_or_else(|| {
            log::warn!("Unknown theme {:?}, using default", raw);
            AppTheme::default()
        })
}
