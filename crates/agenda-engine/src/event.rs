//! User-authored event definitions and the storage boundary.
//!
//! [`EventRecord`] is the loose shape events are stored in: datetimes as
//! strings, repeat rules and reminders as display text, categories as bare
//! keys. [`EventRecord::into_definition`] is the one place that text is
//! interpreted; everything downstream works on the typed [`EventDefinition`].

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::AgendaError;
use crate::reminder::ReminderOffset;
use crate::repeat::RepeatRule;
use crate::time::{end_of_day, local_date, parse_datetime, start_of_day};

/// A stored, user-authored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub repeat: RepeatRule,
    pub category: Category,
    /// Explicit color chosen for this event's category.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub reminder: ReminderOffset,
}

impl EventDefinition {
    /// A one-off event in [`Category::Other`] with no reminder.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            all_day: false,
            repeat: RepeatRule::None,
            category: Category::Other,
            color: None,
            location: None,
            note: None,
            url: None,
            reminder: ReminderOffset::None,
        }
    }

    pub fn with_repeat(mut self, repeat: RepeatRule) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_reminder(mut self, reminder: ReminderOffset) -> Self {
        self.reminder = reminder;
        self
    }

    /// Mark all-day and stretch start/end to 00:00:00–23:59:59 local time.
    pub fn into_all_day(mut self, tz: Tz) -> Self {
        self.all_day = true;
        self.start = start_of_day(local_date(self.start, tz), tz);
        self.end = end_of_day(local_date(self.end, tz), tz);
        self
    }

    /// Check the structural invariants of a definition.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::Validation`] if the id is blank or `end` is
    /// before `start`.
    pub fn validate(&self) -> Result<(), AgendaError> {
        if self.id.trim().is_empty() {
            return Err(AgendaError::Validation("event id must not be empty".to_string()));
        }
        if self.end < self.start {
            return Err(AgendaError::Validation(format!(
                "event '{}': end ({}) is before start ({})",
                self.id,
                self.end.to_rfc3339(),
                self.start.to_rfc3339()
            )));
        }
        Ok(())
    }
}

/// An event as read from storage, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    /// Free-text repeat rule, e.g. `"weekly"` or `"Hàng tuần"`.
    #[serde(default)]
    pub repeat: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Free-text reminder label, e.g. `"10 minutes before"`.
    #[serde(default)]
    pub reminder: Option<String>,
}

impl EventRecord {
    /// Normalize this record into a typed definition.
    ///
    /// A missing `end` defaults to `start` (or the end of the start day for
    /// all-day events). Unrecognized repeat rules degrade to
    /// [`RepeatRule::None`] and unrecognized categories to
    /// [`Category::Other`]; neither is an error.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::InvalidDatetime`] for unparseable datetimes,
    /// [`AgendaError::InvalidReminder`] for an unparseable reminder label, and
    /// [`AgendaError::Validation`] if the result violates
    /// [`EventDefinition::validate`].
    pub fn into_definition(self, tz: Tz) -> Result<EventDefinition, AgendaError> {
        let start = parse_datetime(&self.start, tz)?;
        let end = match self.end.as_deref() {
            Some(end) if !end.trim().is_empty() => parse_datetime(end, tz)?,
            _ => start,
        };

        let mut definition = EventDefinition {
            id: self.id,
            title: self.title,
            start,
            end,
            all_day: false,
            repeat: RepeatRule::from_legacy(self.repeat.as_deref().unwrap_or_default()),
            category: Category::from_key(self.category.as_deref().unwrap_or_default()),
            color: self.color.filter(|c| !c.trim().is_empty()),
            location: self.location,
            note: self.note,
            url: self.url,
            reminder: ReminderOffset::parse(self.reminder.as_deref().unwrap_or_default())?,
        };
        if self.all_day {
            definition = definition.into_all_day(tz);
        }

        definition.validate()?;
        Ok(definition)
    }
}

/// Parse a JSON array of stored records and normalize each one.
///
/// # Errors
///
/// Fails on malformed JSON or on the first record that does not normalize.
pub fn load_records(json: &str, tz: Tz) -> Result<Vec<EventDefinition>, AgendaError> {
    let records: Vec<EventRecord> = serde_json::from_str(json)?;
    records
        .into_iter()
        .map(|record| record.into_definition(tz))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_timezone;
    use chrono::Timelike;

    fn hcm() -> Tz {
        parse_timezone("Asia/Ho_Chi_Minh").unwrap()
    }

    fn record(id: &str, start: &str, end: Option<&str>) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            title: "Lecture".to_string(),
            start: start.to_string(),
            end: end.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_record_normalizes_free_text() {
        let mut rec = record("e1", "2026-02-17T09:00", Some("2026-02-17T11:00"));
        rec.repeat = Some("Hàng tuần".to_string());
        rec.category = Some("Study".to_string());
        rec.reminder = Some("10 phút trước".to_string());
        let def = rec.into_definition(hcm()).unwrap();
        assert_eq!(def.repeat, RepeatRule::Weekly);
        assert_eq!(def.category, Category::Study);
        assert_eq!(def.reminder, ReminderOffset::minutes(10));
        assert_eq!(def.start.with_timezone(&hcm()).hour(), 9);
    }

    #[test]
    fn test_record_unknown_rule_and_category_degrade() {
        let mut rec = record("e1", "2026-02-17T09:00", None);
        rec.repeat = Some("foo".to_string());
        rec.category = Some("gardening".to_string());
        let def = rec.into_definition(hcm()).unwrap();
        assert_eq!(def.repeat, RepeatRule::None);
        assert_eq!(def.category, Category::Other);
        assert_eq!(def.end, def.start);
    }

    #[test]
    fn test_record_end_before_start_rejected() {
        let rec = record("e1", "2026-02-17T09:00", Some("2026-02-17T08:00"));
        let err = rec.into_definition(hcm()).unwrap_err();
        assert!(matches!(err, AgendaError::Validation(_)), "got: {err}");
    }

    #[test]
    fn test_record_bad_date_rejected() {
        let rec = record("e1", "17/02/2026 9h", None);
        let err = rec.into_definition(hcm()).unwrap_err();
        assert!(matches!(err, AgendaError::InvalidDatetime(_)), "got: {err}");
    }

    #[test]
    fn test_record_blank_id_rejected() {
        let rec = record("  ", "2026-02-17T09:00", None);
        assert!(matches!(
            rec.into_definition(hcm()),
            Err(AgendaError::Validation(_))
        ));
    }

    #[test]
    fn test_all_day_normalized_to_full_days() {
        let mut rec = record("e1", "2026-02-17T14:30", Some("2026-02-18T10:00"));
        rec.all_day = true;
        let def = rec.into_definition(hcm()).unwrap();
        let start = def.start.with_timezone(&hcm());
        let end = def.end.with_timezone(&hcm());
        assert!(def.all_day);
        assert_eq!((start.hour(), start.minute(), start.second()), (0, 0, 0));
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
        assert_eq!(end.date_naive().to_string(), "2026-02-18");
    }

    #[test]
    fn test_load_records_from_json() {
        let json = r#"[
            {"id": "a", "title": "Standup", "start": "2026-02-17T09:00:00+07:00",
             "end": "2026-02-17T09:15:00+07:00", "repeat": "daily", "category": "work",
             "reminder": "10m"},
            {"id": "b", "title": "Tet", "start": "2026-02-17", "allDay": true}
        ]"#;
        let defs = load_records(json, hcm()).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].repeat, RepeatRule::Daily);
        assert_eq!(defs[0].category, Category::Work);
        assert!(defs[1].all_day);
        assert_eq!(defs[1].reminder, ReminderOffset::None);
    }

    #[test]
    fn test_definition_serde_round_trip_shape() {
        let start = parse_datetime("2026-02-17T09:00", hcm()).unwrap();
        let def = EventDefinition::new("x", "Gym", start, start)
            .with_category(Category::Health)
            .with_reminder(ReminderOffset::hours(1));
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["category"], "health");
        assert_eq!(json["reminder"], "1 hour before");
        assert_eq!(json["repeat"], "none");
    }
}
