//! Repeat expansion: one event definition → concrete dated occurrences.
//!
//! Expansion is count-based. Each repeat rule materializes a fixed number of
//! occurrences (the *horizon*), starting with the definition's own start and
//! stepping forward in local wall-clock time.
//!
//! # Month arithmetic
//!
//! Monthly and yearly steps are computed from the original start each time
//! and clamp to the last day of shorter months: a series starting on Jan 31
//! yields Feb 28 (or 29), Mar 31, Apr 30, ... It never skips a month and
//! never rolls over into the following one.

use chrono::{DateTime, Days, Months, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::AgendaError;
use crate::event::EventDefinition;
use crate::occurrence::Occurrence;
use crate::repeat::RepeatRule;
use crate::time::{end_of_day, from_local, local_date, parse_datetime};

/// Number of occurrences each repeat rule materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonPolicy {
    pub daily: u32,
    pub weekly: u32,
    pub monthly: u32,
    pub yearly: u32,
}

impl Default for HorizonPolicy {
    fn default() -> Self {
        Self {
            daily: 2,
            weekly: 7,
            monthly: 30,
            yearly: 5,
        }
    }
}

impl HorizonPolicy {
    /// Largest count any rule may materialize.
    pub const MAX: u32 = 10_000;

    /// Each per-rule count as `(rule key, count)`.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> {
        [
            ("daily", self.daily),
            ("weekly", self.weekly),
            ("monthly", self.monthly),
            ("yearly", self.yearly),
        ]
        .into_iter()
    }

    /// Occurrence count for `rule`; never less than 1.
    pub fn count(&self, rule: RepeatRule) -> u32 {
        let n = match rule {
            RepeatRule::None => 1,
            RepeatRule::Daily => self.daily,
            RepeatRule::Weekly => self.weekly,
            RepeatRule::Monthly => self.monthly,
            RepeatRule::Yearly => self.yearly,
        };
        n.max(1)
    }
}

/// An event definition together with its expanded occurrences.
#[derive(Debug, Clone)]
pub struct ExpandedEvent {
    pub definition: EventDefinition,
    pub occurrences: Vec<Occurrence>,
}

/// Expand `start` into `horizon` ascending instants.
///
/// The first element is always `start`. [`RepeatRule::None`] yields exactly
/// one element whatever the horizon, and a horizon of 0 is treated as 1.
/// Expansion stops early only if a step leaves chrono's representable range.
pub fn expand_dates(
    start: DateTime<Utc>,
    rule: RepeatRule,
    horizon: u32,
    tz: Tz,
) -> Vec<DateTime<Utc>> {
    let count = if rule.is_repeating() { horizon.max(1) } else { 1 };
    let local = start.with_timezone(&tz).naive_local();

    let mut dates = Vec::with_capacity(count.min(1024) as usize);
    dates.push(start);
    for n in 1..count {
        let Some(naive) = step(local, rule, n) else {
            tracing::debug!(%start, n, "repeat step out of range, stopping expansion");
            break;
        };
        dates.push(from_local(tz, naive));
    }
    dates
}

/// Expand from string inputs, as read from storage.
///
/// # Errors
///
/// Returns [`AgendaError::InvalidDatetime`] if `start` cannot be parsed. An
/// unrecognized `rule` is not an error; it expands as [`RepeatRule::None`].
pub fn expand_str(
    start: &str,
    rule: &str,
    policy: &HorizonPolicy,
    tz: Tz,
) -> Result<Vec<DateTime<Utc>>, AgendaError> {
    let start = parse_datetime(start, tz)?;
    let rule = RepeatRule::from_legacy(rule);
    Ok(expand_dates(start, rule, policy.count(rule), tz))
}

/// Expand one definition into occurrences that keep its duration.
///
/// All-day occurrences keep their span in whole days and end at 23:59:59
/// local time of their last day.
pub fn expand_event(definition: &EventDefinition, policy: &HorizonPolicy, tz: Tz) -> Vec<Occurrence> {
    let duration = definition.end - definition.start;
    let span_days = (local_date(definition.end, tz) - local_date(definition.start, tz))
        .num_days()
        .max(0) as u64;

    expand_dates(
        definition.start,
        definition.repeat,
        policy.count(definition.repeat),
        tz,
    )
    .into_iter()
    .zip(0u32..)
    .map(|(start, ordinal)| {
        let date = local_date(start, tz);
        let end = if definition.all_day {
            let last_day = date.checked_add_days(Days::new(span_days)).unwrap_or(date);
            end_of_day(last_day, tz)
        } else {
            start + duration
        };
        Occurrence::from_definition(definition, ordinal, date, start, end)
    })
    .collect()
}

/// Expand every definition.
pub fn expand_all(
    definitions: &[EventDefinition],
    policy: &HorizonPolicy,
    tz: Tz,
) -> Vec<ExpandedEvent> {
    let expanded: Vec<ExpandedEvent> = definitions
        .iter()
        .map(|definition| ExpandedEvent {
            definition: definition.clone(),
            occurrences: expand_event(definition, policy, tz),
        })
        .collect();
    tracing::debug!(
        events = expanded.len(),
        occurrences = expanded.iter().map(|e| e.occurrences.len()).sum::<usize>(),
        "expanded definitions"
    );
    expanded
}

/// The `n`th step of `rule` from `local`, in wall-clock time.
fn step(local: NaiveDateTime, rule: RepeatRule, n: u32) -> Option<NaiveDateTime> {
    match rule {
        RepeatRule::None => Some(local),
        RepeatRule::Daily => local.checked_add_days(Days::new(u64::from(n))),
        RepeatRule::Weekly => local.checked_add_days(Days::new(7 * u64::from(n))),
        RepeatRule::Monthly => local.checked_add_months(Months::new(n)),
        RepeatRule::Yearly => local.checked_add_months(Months::new(n.checked_mul(12)?)),
    }
}
