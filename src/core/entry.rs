use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::theme::EntryTheme;

/// Millisecond-derived entry identifier.
pub type EntryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" | "1" => Some(Self::High),
            "medium" | "m" | "2" => Some(Self::Medium),
            "low" | "l" | "3" => Some(Self::Low),
            _ => None,
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_label(&s).ok_or_else(|| format!("unknown priority {:?}", s))
    }
}

impl From<Priority> for &'static str {
    fn from(priority: Priority) -> Self {
        priority.as_label()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// A dated event the user tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub theme: EntryTheme,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Manual display position, kept dense (0..n-1) by the store.
    #[serde(default)]
    pub order: usize,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
}

impl Entry {
    /// Case-insensitive substring match on name or category.
    /// `query` must already be lowercased.
    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query) || self.category.to_lowercase().contains(query)
    }
}

/// User-supplied fields for a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub name: String,
    pub category: String,
    pub date: NaiveDate,
    pub theme: Option<EntryTheme>,
    pub priority: Option<Priority>,
}

impl EntryDraft {
    pub fn new(name: impl Into<String>, category: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            date,
            theme: None,
            priority: None,
        }
    }

    pub fn into_entry(self, id: EntryId, order: usize, created_at: NaiveDateTime) -> Entry {
        Entry {
            id,
            name: self.name,
            category: self.category,
            date: self.date,
            theme: self.theme.unwrap_or_default(),
            priority: self.priority,
            order,
            created_at,
        }
    }
}

/// Written as a naive local timestamp. Also reads RFC 3339 strings with a
/// `Z` or offset suffix, converted to local time.
mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        value.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(zoned) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(zoned.with_timezone(&Local).naive_local());
        }
        raw.parse::<NaiveDateTime>()
            .map_err(|e| D::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone, Utc};

    #[test]
    fn priority_labels() {
        assert_eq!(Priority::from_label("HIGH"), Some(Priority::High));
        assert_eq!(Priority::from_label(" m "), Some(Priority::Medium));
        assert_eq!(Priority::from_label("urgent"), None);
        assert_eq!(Priority::Low.to_string(), "low");
    }

    #[test]
    fn priority_wire_format_is_lenient_on_read() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::from_str::<Priority>("\"Medium\"").unwrap(), Priority::Medium);
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
    }

    #[test]
    fn legacy_entry_without_order_or_theme() {
        let json = r#"{"id":1717000000000,"name":"Birthday","category":"personal","date":"2025-06-01","createdAt":"2025-05-01T10:00:00"}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.theme, EntryTheme::Blue);
        assert_eq!(entry.order, 0);
        assert_eq!(entry.priority, None);
    }

    #[test]
    fn created_at_accepts_utc_suffix() {
        let json = r#"{"id":1,"name":"Birthday","category":"personal","date":"2025-06-01","createdAt":"2025-05-01T10:00:00.000Z","theme":"blue","priority":null}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        let expected = Utc
            .with_ymd_and_hms(2025, 5, 1, 10, 0, 0)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(entry.created_at, expected);

        let offset = r#"{"id":2,"name":"Trip","date":"2025-07-01","createdAt":"2025-05-01T12:00:00+02:00"}"#;
        let entry: Entry = serde_json::from_str(offset).unwrap();
        assert_eq!(entry.created_at, expected);

        let written = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            written["createdAt"],
            expected.format("%Y-%m-%dT%H:%M:%S").to_string()
        );
    }

    #[test]
    fn created_at_rejects_garbage() {
        let json = r#"{"id":1,"name":"Birthday","date":"2025-06-01","createdAt":"yesterday"}"#;
        assert!(serde_json::from_str::<Entry>(json).is_err());
    }

    #[test]
    fn matches_name_or_category() {
        let entry = EntryDraft::new("Mom's Birthday", "Family", NaiveDate::from_ymd_opt(2026, 3, 4).unwrap())
            .into_entry(1, 0, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert!(entry.matches("birth"));
        assert!(entry.matches("fam"));
        assert!(!entry.matches("work"));
    }
}
