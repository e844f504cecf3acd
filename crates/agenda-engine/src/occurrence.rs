//! Concrete dated instances of event definitions.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::category::{Category, HOLIDAY_COLOR};
use crate::event::EventDefinition;
use crate::reminder::ReminderOffset;
use crate::time::{end_of_day, start_of_day};

/// Source id shared by every holiday pseudo-occurrence.
pub const HOLIDAY_SOURCE_ID: &str = "holiday";

/// One dated instance of an [`EventDefinition`], or a holiday pseudo-occurrence.
///
/// Occurrences are rebuilt on every expansion pass and never persisted. They
/// copy what the later stages need from the definition instead of holding a
/// reference to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// `"{source_event_id}@{YYYYMMDD}#{ordinal}"`.
    pub instance_id: String,
    pub source_event_id: String,
    /// Local calendar date of `start`.
    pub occurrence_date: NaiveDate,
    /// Recurrence index, 0 for the definition's own start.
    pub ordinal: u32,
    pub title: String,
    pub category: Category,
    pub priority: u8,
    /// Display color, resolved during bucketing.
    pub color: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub reminder: ReminderOffset,
    pub is_holiday: bool,
}

impl Occurrence {
    /// Instantiate `definition` at `start`.
    pub fn from_definition(
        definition: &EventDefinition,
        ordinal: u32,
        occurrence_date: NaiveDate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            instance_id: instance_id(&definition.id, occurrence_date, ordinal),
            source_event_id: definition.id.clone(),
            occurrence_date,
            ordinal,
            title: definition.title.clone(),
            category: definition.category,
            priority: definition.category.priority(),
            color: None,
            start,
            end,
            all_day: definition.all_day,
            reminder: definition.reminder,
            is_holiday: false,
        }
    }

    /// The all-day pseudo-occurrence for a holiday.
    pub fn holiday(date: NaiveDate, label: &str, tz: Tz) -> Self {
        Self {
            instance_id: format!("{}@{}", HOLIDAY_SOURCE_ID, date.format("%Y%m%d")),
            source_event_id: HOLIDAY_SOURCE_ID.to_string(),
            occurrence_date: date,
            ordinal: 0,
            title: label.to_string(),
            category: Category::Other,
            priority: 0,
            color: Some(HOLIDAY_COLOR.to_string()),
            start: start_of_day(date, tz),
            end: end_of_day(date, tz),
            all_day: true,
            reminder: ReminderOffset::None,
            is_holiday: true,
        }
    }
}

/// Build the instance id for one occurrence.
pub fn instance_id(source_event_id: &str, date: NaiveDate, ordinal: u32) -> String {
    format!("{}@{}#{}", source_event_id, date.format("%Y%m%d"), ordinal)
}
