use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::EntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
}

/// Durable record of one scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    /// Lookup only; the entry may be gone by the time this fires.
    pub entry_id: EntryId,
    /// Entry name at scheduling time.
    pub title: String,
    pub date: NaiveDateTime,
    pub status: NotificationStatus,
}

impl NotificationRecord {
    pub fn pending(entry_id: EntryId, title: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry_id,
            title: title.into(),
            date,
            status: NotificationStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == NotificationStatus::Pending
    }
}

fn default_time_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub days_before_event: u32,
    #[serde(with = "hh_mm")]
    pub time_of_day: NaiveTime,
    pub sound_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            days_before_event: 7,
            time_of_day: default_time_of_day(),
            sound_enabled: true,
        }
    }
}

impl NotificationSettings {
    /// The instant a reminder for an event on `event_date` should fire:
    /// `days_before_event` days earlier, at `time_of_day` with seconds zeroed.
    /// `None` when that day falls outside chrono's date range.
    pub fn fire_instant(&self, event_date: NaiveDate) -> Option<NaiveDateTime> {
        let day = event_date.checked_sub_days(Days::new(u64::from(self.days_before_event)))?;
        Some(day.and_time(self.time_of_day))
    }

    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(days) = patch.days_before_event {
            self.days_before_event = days;
        }
        if let Some(time) = patch.time_of_day {
            self.time_of_day = time;
        }
        if let Some(sound) = patch.sound_enabled {
            self.sound_enabled = sound;
        }
    }
}

/// Partial settings update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub days_before_event: Option<u32>,
    pub time_of_day: Option<NaiveTime>,
    pub sound_enabled: Option<bool>,
}

/// `"HH:MM"` encoding for time-of-day settings.
mod hh_mm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{:02}:{:02}", time.hour(), time.minute()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        let (h, m) = raw
            .split_once(':')
            .ok_or_else(|| D::Error::custom(format!("expected HH:MM, got {:?}", raw)))?;
        let hour: u32 = h.trim().parse().map_err(D::Error::custom)?;
        let minute: u32 = m.trim().parse().map_err(D::Error::custom)?;
        NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| D::Error::custom(format!("time out of range: {:?}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_wire_format() {
        let json = serde_json::to_string(&NotificationSettings::default()).unwrap();
        assert_eq!(
            json,
            r#"{"enabled":true,"daysBeforeEvent":7,"timeOfDay":"09:00","soundEnabled":true}"#
        );
        let parsed: NotificationSettings =
            serde_json::from_str(r#"{"enabled":false,"daysBeforeEvent":2,"timeOfDay":"18:30","soundEnabled":false}"#)
                .unwrap();
        assert_eq!(parsed.time_of_day, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(parsed.days_before_event, 2);
    }

    #[test]
    fn bad_time_of_day_rejected() {
        let result = serde_json::from_str::<NotificationSettings>(r#"{"timeOfDay":"25:00"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn fire_instant_subtracts_days_and_overwrites_time() {
        let settings = NotificationSettings {
            days_before_event: 3,
            time_of_day: NaiveTime::from_hms_opt(7, 45, 0).unwrap(),
            ..Default::default()
        };
        let fire = settings.fire_instant(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(
            fire,
            NaiveDate::from_ymd_opt(2026, 2, 27).unwrap().and_hms_opt(7, 45, 0)
        );
    }

    #[test]
    fn fire_instant_out_of_range_lead_time() {
        let settings = NotificationSettings {
            days_before_event: 200_000_000,
            ..Default::default()
        };
        assert_eq!(
            settings.fire_instant(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
            None
        );

        let settings = NotificationSettings {
            days_before_event: u32::MAX,
            ..Default::default()
        };
        assert_eq!(settings.fire_instant(NaiveDate::MAX), None);
    }

    #[test]
    fn patch_is_shallow_merge() {
        let mut settings = NotificationSettings::default();
        settings.apply(SettingsPatch {
            days_before_event: Some(1),
            ..Default::default()
        });
        assert_eq!(settings.days_before_event, 1);
        assert!(settings.enabled);
        assert_eq!(settings.time_of_day, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn record_wire_format() {
        let record = NotificationRecord::pending(
            42,
            "Birthday",
            NaiveDate::from_ymd_opt(2025, 5, 25).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["entryId"], 42);
        assert_eq!(value["status"], "pending");
        assert_eq!(value["date"], "2025-05-25T09:00:00");
    }
}
