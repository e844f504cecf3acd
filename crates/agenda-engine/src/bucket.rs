//! Day bucketing: expanded occurrences → per-date lists and calendar markers.
//!
//! # Visibility
//!
//! An occurrence is dropped when
//! - it is not all-day and its start is strictly before `now`, or
//! - it is all-day and the local date of its end is strictly before today.
//!
//! An all-day event therefore stays visible for its whole span, and a timed
//! event disappears exactly at its start. `now` is whatever instant the caller
//! passes; re-bucketing is the caller's decision.
//!
//! # Ordering
//!
//! Within a bucket the holiday pseudo-occurrence (if any) comes first, then
//! events by ascending (category priority, start), as defined by
//! [`crate::schedule::compare`].

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::category::Palette;
use crate::error::AgendaError;
use crate::expander::ExpandedEvent;
use crate::holiday::HolidayCalendar;
use crate::occurrence::Occurrence;
use crate::schedule::compare;
use crate::time::local_date;

/// An inclusive range of local dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// # Errors
    ///
    /// Returns [`AgendaError::Validation`] if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AgendaError> {
        if end < start {
            return Err(AgendaError::Validation(format!(
                "window end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the window, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// One calendar dot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub key: String,
    pub color: String,
}

/// The ordered contents of one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub holiday: Option<String>,
    /// Holiday pseudo-occurrence first, then events.
    pub occurrences: Vec<Occurrence>,
}

impl DayBucket {
    /// The non-holiday entries.
    pub fn events(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(|o| !o.is_holiday)
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.occurrences
            .iter()
            .map(|o| Marker {
                key: o.instance_id.clone(),
                color: o.color.clone().unwrap_or_default(),
            })
            .collect()
    }
}

/// Output of [`DayBucketer::bucket`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Buckets {
    pub days: BTreeMap<NaiveDate, DayBucket>,
    pub markers: BTreeMap<NaiveDate, Vec<Marker>>,
    /// Every visible event occurrence (no holidays), in date then bucket order.
    pub all: Vec<Occurrence>,
}

impl Buckets {
    pub fn get(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.days.get(&date)
    }
}

/// Groups occurrences by local date relative to a fixed `now`.
#[derive(Debug, Clone)]
pub struct DayBucketer<'a> {
    now: DateTime<Utc>,
    tz: Tz,
    holidays: &'a HolidayCalendar,
    palette: &'a Palette,
    window: Option<DateWindow>,
}

impl<'a> DayBucketer<'a> {
    pub fn new(now: DateTime<Utc>, tz: Tz, holidays: &'a HolidayCalendar, palette: &'a Palette) -> Self {
        Self {
            now,
            tz,
            holidays,
            palette,
            window: None,
        }
    }

    /// Restrict output to `window`; holiday-only dates inside it get buckets too.
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Whether `occurrence` survives the past-event filter.
    pub fn is_visible(&self, occurrence: &Occurrence) -> bool {
        if occurrence.all_day {
            local_date(occurrence.end, self.tz) >= local_date(self.now, self.tz)
        } else {
            occurrence.start >= self.now
        }
    }

    /// Bucket every visible occurrence by date.
    ///
    /// Colors are resolved per event from its explicit color, the palette, and
    /// the category defaults. An instance id seen twice is kept once.
    pub fn bucket(&self, expanded: &[ExpandedEvent]) -> Buckets {
        let mut days: BTreeMap<NaiveDate, Vec<Occurrence>> = BTreeMap::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut hidden = 0usize;

        for event in expanded {
            let definition = &event.definition;
            let color = self
                .palette
                .resolve(definition.category, definition.color.as_deref());

            for occurrence in &event.occurrences {
                if !self.is_visible(occurrence) {
                    hidden += 1;
                    continue;
                }
                if let Some(window) = &self.window {
                    if !window.contains(occurrence.occurrence_date) {
                        continue;
                    }
                }
                if !seen.insert(occurrence.instance_id.clone()) {
                    tracing::debug!(id = %occurrence.instance_id, "duplicate occurrence dropped");
                    continue;
                }
                let mut occurrence = occurrence.clone();
                occurrence.color = Some(color.clone());
                days.entry(occurrence.occurrence_date).or_default().push(occurrence);
            }
        }

        if let Some(window) = &self.window {
            for date in window.days() {
                if self.holidays.lookup(date).is_some() {
                    days.entry(date).or_default();
                }
            }
        }

        let days: BTreeMap<NaiveDate, DayBucket> = days
            .into_iter()
            .map(|(date, occurrences)| (date, self.assemble(date, occurrences)))
            .collect();
        let markers = days.iter().map(|(date, b)| (*date, b.markers())).collect();
        let all = days
            .values()
            .flat_map(|b| b.events().cloned())
            .collect::<Vec<_>>();

        tracing::debug!(days = days.len(), visible = all.len(), hidden, "bucketed occurrences");
        Buckets { days, markers, all }
    }

    /// The bucket for one requested date, holiday included even when no
    /// event falls on it.
    pub fn bucket_for(&self, expanded: &[ExpandedEvent], date: NaiveDate) -> DayBucket {
        let single = DateWindow { start: date, end: date };
        let scoped = Self {
            window: Some(single),
            ..self.clone()
        };
        scoped
            .bucket(expanded)
            .days
            .remove(&date)
            .unwrap_or_else(|| self.assemble(date, Vec::new()))
    }

    fn assemble(&self, date: NaiveDate, mut occurrences: Vec<Occurrence>) -> DayBucket {
        let holiday = self.holidays.lookup(date).map(str::to_string);
        if let Some(label) = &holiday {
            occurrences.insert(0, Occurrence::holiday(date, label, self.tz));
        }
        occurrences.sort_by(compare);
        DayBucket {
            date,
            holiday,
            occurrences,
        }
    }
}

/// A window of `days` consecutive dates starting at `start`.
pub fn window_from(start: NaiveDate, days: u64) -> DateWindow {
    let end = start
        .checked_add_days(Days::new(days.saturating_sub(1)))
        .unwrap_or(start);
    DateWindow { start, end }
}
