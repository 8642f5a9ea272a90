use serde::{Deserialize, Serialize};
use std::fmt;

/// Accent color attached to an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum EntryTheme {
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
    Red,
    Teal,
    Pink,
    Yellow,
}

impl EntryTheme {
    pub const ALL: [EntryTheme; 8] = [
        Self::Blue,
        Self::Green,
        Self::Purple,
        Self::Orange,
        Self::Red,
        Self::Teal,
        Self::Pink,
        Self::Yellow,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Teal => "teal",
            Self::Pink => "pink",
            Self::Yellow => "yellow",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Purple => "Purple",
            Self::Orange => "Orange",
            Self::Red => "Red",
            Self::Teal => "Teal",
            Self::Pink => "Pink",
            Self::Yellow => "Yellow",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Blue => "#1E90FF",
            Self::Green => "#32CD32",
            Self::Purple => "#9370DB",
            Self::Orange => "#FF8C00",
            Self::Red => "#FF4444",
            Self::Teal => "#20B2AA",
            Self::Pink => "#FF69B4",
            Self::Yellow => "#FFD700",
        }
    }

    /// Case-insensitive lookup by [`key`](Self::key).
    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|t| t.key().eq_ignore_ascii_case(s))
    }
}

impl TryFrom<String> for EntryTheme {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_key(&s).ok_or_else(|| format!("unknown entry theme {:?}", s))
    }
}

impl From<EntryTheme> for &'static str {
    fn from(theme: EntryTheme) -> Self {
        theme.key()
    }
}

impl fmt::Display for EntryTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Application-wide color scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum AppTheme {
    #[default]
    Dark,
    Light,
    Ocean,
    Forest,
    Sunset,
    Purple,
    Minimal,
    Neon,
}

impl AppTheme {
    pub const ALL: [AppTheme; 8] = [
        Self::Dark,
        Self::Light,
        Self::Ocean,
        Self::Forest,
        Self::Sunset,
        Self::Purple,
        Self::Minimal,
        Self::Neon,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::Ocean => "ocean",
            Self::Forest => "forest",
            Self::Sunset => "sunset",
            Self::Purple => "purple",
            Self::Minimal => "minimal",
            Self::Neon => "neon",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|t| t.key().eq_ignore_ascii_case(s))
    }
}

impl TryFrom<String> for AppTheme {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_key(&s).ok_or_else(|| format!("unknown app theme {:?}", s))
    }
}

impl From<AppTheme> for &'static str {
    fn from(theme: AppTheme) -> Self {
        theme.key()
    }
}

impl fmt::Display for AppTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_theme_keys_match_serde() {
        for theme in EntryTheme::ALL {
            let json = serde_json::to_string(&theme).unwrap();
            assert_eq!(json, format!("\"{}\"", theme.key()));
            assert_eq!(EntryTheme::from_key(theme.key()), Some(theme));
        }
    }

    #[test]
    fn default_entry_theme_is_blue() {
        let theme = EntryTheme::default();
        assert_eq!(theme.display_name(), "Blue");
        assert_eq!(theme.color(), "#1E90FF");
    }

    #[test]
    fn unknown_theme_rejected() {
        assert_eq!(AppTheme::from_key("solarized"), None);
        assert!(serde_json::from_str::<EntryTheme>("\"magenta\"").is_err());
    }

    #[test]
    fn keys_read_case_insensitively() {
        assert_eq!(EntryTheme::from_key(" Teal "), Some(EntryTheme::Teal));
        assert_eq!(serde_json::from_str::<AppTheme>("\"Ocean\"").unwrap(), AppTheme::Ocean);
        assert_eq!(serde_json::to_string(&AppTheme::Ocean).unwrap(), "\"ocean\"");
    }
}
