//! Static holiday annotations.
//!
//! A [`HolidayCalendar`] is a versioned `date → label` table loaded once per
//! process. Entries are either a specific date (`2026-02-17`, for holidays
//! that move, such as the lunar new year) or an annual month-day (`09-02`).
//! A specific date wins over an annual entry on the same day.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::error::AgendaError;

/// Vietnamese public holidays that fall on the same solar date every year.
const BUILTIN_ANNUAL: &[(u32, u32, &str)] = &[
    (1, 1, "Tết Dương lịch"),
    (4, 30, "Ngày Giải phóng miền Nam"),
    (5, 1, "Ngày Quốc tế Lao động"),
    (9, 2, "Quốc khánh"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    version: String,
    dated: BTreeMap<NaiveDate, String>,
    annual: BTreeMap<(u32, u32), String>,
}

#[derive(Debug, Deserialize)]
struct HolidayFile {
    #[serde(default)]
    version: String,
    holidays: Vec<HolidayEntry>,
}

#[derive(Debug, Deserialize)]
struct HolidayEntry {
    date: String,
    label: String,
}

impl HolidayCalendar {
    /// A calendar with no holidays.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The fixed-date national holidays.
    pub fn builtin() -> Self {
        let annual = BUILTIN_ANNUAL
            .iter()
            .map(|&(month, day, label)| ((month, day), label.to_string()))
            .collect();
        Self {
            version: "builtin".to_string(),
            dated: BTreeMap::new(),
            annual,
        }
    }

    /// Parse a holiday table.
    ///
    /// ```json
    /// { "version": "2026.1",
    ///   "holidays": [ { "date": "2026-02-17", "label": "Tết Nguyên Đán" },
    ///                 { "date": "09-02", "label": "Quốc khánh" } ] }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::Json`] for malformed JSON and
    /// [`AgendaError::Holiday`] for an entry whose date is neither
    /// `YYYY-MM-DD` nor a valid `MM-DD`.
    pub fn from_json(json: &str) -> Result<Self, AgendaError> {
        let file: HolidayFile = serde_json::from_str(json)?;
        let mut calendar = Self {
            version: file.version,
            ..Self::default()
        };
        for entry in file.holidays {
            calendar.insert(&entry.date, entry.label)?;
        }
        tracing::debug!(
            version = %calendar.version,
            entries = calendar.len(),
            "loaded holiday table"
        );
        Ok(calendar)
    }

    /// Read and parse a holiday table file.
    pub fn load(path: &Path) -> Result<Self, AgendaError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Add one specific-date holiday.
    pub fn with_holiday(mut self, date: NaiveDate, label: impl Into<String>) -> Self {
        self.dated.insert(date, label.into());
        self
    }

    fn insert(&mut self, date: &str, label: String) -> Result<(), AgendaError> {
        let date = date.trim();
        if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            self.dated.insert(d, label);
            return Ok(());
        }

        let (month, day) = date
            .trim_start_matches('-')
            .split_once('-')
            .and_then(|(m, d)| Some((m.parse::<u32>().ok()?, d.parse::<u32>().ok()?)))
            .ok_or_else(|| AgendaError::Holiday(format!("invalid date '{date}'")))?;
        // 2024 is a leap year, so 02-29 is accepted
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            return Err(AgendaError::Holiday(format!("invalid month-day '{date}'")));
        }
        self.annual.insert((month, day), label);
        Ok(())
    }

    /// The holiday label for `date`, if any.
    pub fn lookup(&self, date: NaiveDate) -> Option<&str> {
        self.dated
            .get(&date)
            .or_else(|| self.annual.get(&(date.month(), date.day())))
            .map(String::as_str)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of table entries (specific and annual).
    pub fn len(&self) -> usize {
        self.dated.len() + self.annual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
