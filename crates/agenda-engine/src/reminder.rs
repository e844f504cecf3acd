//! Reminder offsets and fire-time planning.
//!
//! The planner only computes *when* reminders should fire and what they say.
//! Delivery belongs to the device notification service.
//!
//! # Policy
//!
//! - An offset of `none` schedules nothing.
//! - The configured reminder fires at `start - offset`.
//! - Occurrences whose category priority is at or above the high-priority
//!   threshold (priority number ≤ 3 by default) get an extra reminder one hour
//!   before start, regardless of the configured offset.
//! - Every fire-time must be strictly after `now`; reminders in the past are
//!   dropped individually.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::AgendaError;
use crate::occurrence::Occurrence;

// ── ReminderOffset ──────────────────────────────────────────────────────────

/// Longest lead a stored label may ask for: one year.
pub const MAX_LEAD_MINUTES: i64 = 366 * 1440;

/// How long before an occurrence the user wants to be reminded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReminderOffset {
    /// No reminder.
    #[default]
    None,
    /// Remind this long before start. Zero means "at time of event".
    Before(Duration),
}

impl ReminderOffset {
    pub fn minutes(minutes: i64) -> Self {
        ReminderOffset::Before(Duration::minutes(minutes))
    }

    pub fn hours(hours: i64) -> Self {
        ReminderOffset::Before(Duration::hours(hours))
    }

    /// Parse a stored reminder label.
    ///
    /// Accepts compact durations (`"10m"`, `"1h"`, `"1h30m"`, `"1d"`),
    /// phrases (`"10 minutes before"`, `"1 hour before"`,
    /// `"at time of event"`), the legacy Vietnamese labels
    /// (`"10 phút trước"`, `"1 giờ trước"`, `"Không nhắc"`), and `"none"`.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::InvalidReminder`] if the label matches none of
    /// these forms, or asks for a lead longer than [`MAX_LEAD_MINUTES`].
    pub fn parse(text: &str) -> Result<Self, AgendaError> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match normalized.as_str() {
            "" | "none" | "never" | "no reminder" | "không" | "không nhắc" => {
                return Ok(ReminderOffset::None)
            }
            "0" | "at time of event" | "at start" | "đúng giờ" | "lúc bắt đầu" => {
                return Ok(ReminderOffset::Before(Duration::zero()))
            }
            _ => {}
        }

        let minutes = parse_phrase(&normalized)
            .or_else(|| parse_compact(&normalized))
            .ok_or_else(|| AgendaError::InvalidReminder(format!("'{}'", text.trim())))?;
        if minutes > MAX_LEAD_MINUTES {
            return Err(AgendaError::InvalidReminder(format!(
                "'{}' is longer than {} days",
                text.trim(),
                MAX_LEAD_MINUTES / 1440
            )));
        }
        Duration::try_minutes(minutes)
            .map(ReminderOffset::Before)
            .ok_or_else(|| AgendaError::InvalidReminder(format!("'{}'", text.trim())))
    }

    /// The lead time, or `None` when reminders are off.
    pub fn lead(self) -> Option<Duration> {
        match self {
            ReminderOffset::None => None,
            ReminderOffset::Before(lead) => Some(lead),
        }
    }

    /// The single canonical label for this offset.
    pub fn label(self) -> String {
        let Some(lead) = self.lead() else {
            return "none".to_string();
        };
        let minutes = lead.num_minutes();
        let plural = |n: i64| if n == 1 { "" } else { "s" };
        if minutes == 0 {
            "at time of event".to_string()
        } else if minutes % 1440 == 0 {
            let d = minutes / 1440;
            format!("{d} day{} before", plural(d))
        } else if minutes % 60 == 0 {
            let h = minutes / 60;
            format!("{h} hour{} before", plural(h))
        } else {
            format!("{minutes} minute{} before", plural(minutes))
        }
    }
}

impl fmt::Display for ReminderOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl TryFrom<String> for ReminderOffset {
    type Error = AgendaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ReminderOffset::parse(&value)
    }
}

impl From<ReminderOffset> for String {
    fn from(offset: ReminderOffset) -> Self {
        offset.label()
    }
}

/// `"<n> <unit> before"` in English or Vietnamese.
fn parse_phrase(s: &str) -> Option<i64> {
    let rest = s
        .strip_suffix(" before")
        .or_else(|| s.strip_suffix(" trước"))?;
    let (number, unit) = rest.split_once(' ')?;
    let n: i64 = number.parse().ok()?;
    let per_unit = match unit {
        "minute" | "minutes" | "min" | "mins" | "phút" => 1,
        "hour" | "hours" | "hr" | "hrs" | "giờ" | "tiếng" => 60,
        "day" | "days" | "ngày" => 1440,
        "week" | "weeks" | "tuần" => 10_080,
        _ => return None,
    };
    n.checked_mul(per_unit)
}

/// Compact durations such as `"10m"`, `"1h30m"`, `"2d"`, `"1w"`.
fn parse_compact(s: &str) -> Option<i64> {
    let s = s.strip_prefix('-').unwrap_or(s);
    if s.is_empty() {
        return None;
    }

    let mut total: i64 = 0;
    let mut num_buf = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            num_buf.push(ch);
            continue;
        }
        if num_buf.is_empty() {
            return None;
        }
        let n: i64 = num_buf.parse().ok()?;
        num_buf.clear();
        let per_unit = match ch {
            'w' => 10_080,
            'd' => 1440,
            'h' => 60,
            'm' => 1,
            _ => return None,
        };
        total = total.checked_add(n.checked_mul(per_unit)?)?;
    }

    // Trailing number without unit
    if !num_buf.is_empty() {
        return None;
    }
    Some(total)
}

// ── Planning ────────────────────────────────────────────────────────────────

/// Tunables for the dual-reminder rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    /// Categories with priority number at or below this get the extra reminder.
    pub high_priority_threshold: u8,
    /// Lead time of the extra reminder.
    pub high_priority_lead: Duration,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            high_priority_threshold: 3,
            high_priority_lead: Duration::hours(1),
        }
    }
}

/// Why a reminder exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// The user's configured offset.
    Configured,
    /// The fixed extra reminder for high-priority categories.
    HighPriority,
}

/// One computed fire-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub fire_at: DateTime<Utc>,
    pub kind: ReminderKind,
}

/// Compute the fire-times for one occurrence start.
///
/// The result is ascending, contains only fire-times strictly after `now`,
/// and never lists the same instant twice (a configured reminder that
/// coincides with the high-priority one is kept as [`ReminderKind::Configured`]).
/// A fire-time outside chrono's range is dropped.
pub fn plan(
    start: DateTime<Utc>,
    offset: ReminderOffset,
    priority: u8,
    now: DateTime<Utc>,
    policy: &ReminderPolicy,
) -> Vec<Reminder> {
    let Some(lead) = offset.lead() else {
        return Vec::new();
    };

    let configured = start.checked_sub_signed(lead);
    let mut reminders: Vec<Reminder> = configured
        .map(|fire_at| Reminder {
            fire_at,
            kind: ReminderKind::Configured,
        })
        .into_iter()
        .collect();
    if priority <= policy.high_priority_threshold {
        if let Some(extra) = start.checked_sub_signed(policy.high_priority_lead) {
            if Some(extra) != configured {
                reminders.push(Reminder {
                    fire_at: extra,
                    kind: ReminderKind::HighPriority,
                });
            }
        }
    }

    reminders.retain(|r| r.fire_at > now);
    reminders.sort_by_key(|r| r.fire_at);
    reminders
}

/// A reminder ready to hand to the notification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderPlan {
    pub instance_id: String,
    pub source_event_id: String,
    pub fire_at: DateTime<Utc>,
    pub kind: ReminderKind,
    pub title: String,
    pub body: String,
}

/// Plan the reminders of one occurrence, with message content.
///
/// Holiday pseudo-occurrences never produce reminders.
pub fn plan_occurrence(
    occurrence: &Occurrence,
    now: DateTime<Utc>,
    tz: Tz,
    policy: &ReminderPolicy,
) -> Vec<ReminderPlan> {
    if occurrence.is_holiday {
        return Vec::new();
    }

    let body = if occurrence.all_day {
        "All day".to_string()
    } else {
        format!("Starts at {}", occurrence.start.with_timezone(&tz).format("%H:%M"))
    };

    plan(
        occurrence.start,
        occurrence.reminder,
        occurrence.priority,
        now,
        policy,
    )
    .into_iter()
    .map(|r| ReminderPlan {
        instance_id: occurrence.instance_id.clone(),
        source_event_id: occurrence.source_event_id.clone(),
        fire_at: r.fire_at,
        kind: r.kind,
        title: occurrence.title.clone(),
        body: body.clone(),
    })
    .collect()
}

/// Plan every occurrence in a schedule, ordered by fire-time.
pub fn plan_all(
    occurrences: &[Occurrence],
    now: DateTime<Utc>,
    tz: Tz,
    policy: &ReminderPolicy,
) -> Vec<ReminderPlan> {
    let mut plans: Vec<ReminderPlan> = occurrences
        .iter()
        .flat_map(|o| plan_occurrence(o, now, tz, policy))
        .collect();
    plans.sort_by(|a, b| {
        a.fire_at
            .cmp(&b.fire_at)
            .then_with(|| a.instance_id.cmp(&b.instance_id))
    });
    tracing::debug!(count = plans.len(), "planned reminders");
    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 17, 7, 0, 0).unwrap()
    }

    // ── parse tests ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_compact() {
        assert_eq!(ReminderOffset::parse("10m").unwrap(), ReminderOffset::minutes(10));
        assert_eq!(ReminderOffset::parse("1h").unwrap(), ReminderOffset::hours(1));
        assert_eq!(ReminderOffset::parse("1h30m").unwrap(), ReminderOffset::minutes(90));
        assert_eq!(ReminderOffset::parse("1d").unwrap(), ReminderOffset::minutes(1440));
        assert_eq!(ReminderOffset::parse("-15m").unwrap(), ReminderOffset::minutes(15));
    }

    #[test]
    fn test_parse_phrases() {
        assert_eq!(
            ReminderOffset::parse("10 minutes before").unwrap(),
            ReminderOffset::minutes(10)
        );
        assert_eq!(
            ReminderOffset::parse("1 hour before").unwrap(),
            ReminderOffset::hours(1)
        );
        assert_eq!(
            ReminderOffset::parse("at time of event").unwrap(),
            ReminderOffset::minutes(0)
        );
    }

    #[test]
    fn test_parse_vietnamese_labels() {
        assert_eq!(
            ReminderOffset::parse("10 phút trước").unwrap(),
            ReminderOffset::minutes(10)
        );
        assert_eq!(
            ReminderOffset::parse("1 giờ trước").unwrap(),
            ReminderOffset::hours(1)
        );
        assert_eq!(
            ReminderOffset::parse("1 ngày trước").unwrap(),
            ReminderOffset::minutes(1440)
        );
        assert_eq!(ReminderOffset::parse("Không nhắc").unwrap(), ReminderOffset::None);
    }

    #[test]
    fn test_parse_none() {
        assert_eq!(ReminderOffset::parse("none").unwrap(), ReminderOffset::None);
        assert_eq!(ReminderOffset::parse("").unwrap(), ReminderOffset::None);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["soon", "10x", "m10", "10", "ten minutes before"] {
            let result = ReminderOffset::parse(bad);
            assert!(result.is_err(), "{bad} should not parse");
        }
        let err = ReminderOffset::parse("soon").unwrap_err();
        assert!(err.to_string().contains("Invalid reminder offset"), "got: {err}");
    }

    #[test]
    fn test_parse_rejects_huge_leads() {
        for bad in ["200000000000000m", "1000000000000m", "367d", "60 weeks before", "9223372036854775807m"] {
            let err = ReminderOffset::parse(bad).unwrap_err();
            assert!(matches!(err, AgendaError::InvalidReminder(_)), "{bad}: {err}");
        }
        assert_eq!(
            ReminderOffset::parse("366d").unwrap(),
            ReminderOffset::minutes(MAX_LEAD_MINUTES)
        );
    }

    #[test]
    fn test_huge_reminder_in_record_is_an_error() {
        let json = r#"[{"id": "a", "start": "2026-02-17T09:00", "reminder": "200000000000000m"}]"#;
        let err = crate::event::load_records(json, chrono_tz::Asia::Ho_Chi_Minh).unwrap_err();
        assert!(err.to_string().contains("Invalid reminder offset"), "got: {err}");
    }

    #[test]
    fn test_labels_are_unique_and_reparse() {
        let offsets = [
            ReminderOffset::None,
            ReminderOffset::minutes(0),
            ReminderOffset::minutes(5),
            ReminderOffset::minutes(10),
            ReminderOffset::minutes(30),
            ReminderOffset::hours(1),
            ReminderOffset::hours(2),
            ReminderOffset::minutes(1440),
        ];
        let labels: Vec<String> = offsets.iter().map(|o| o.label()).collect();
        let mut deduped = labels.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), labels.len());
        for (offset, label) in offsets.iter().zip(&labels) {
            assert_eq!(ReminderOffset::parse(label).unwrap(), *offset, "label {label}");
        }
        assert_eq!(ReminderOffset::hours(1).label(), "1 hour before");
        assert_eq!(ReminderOffset::minutes(10).label(), "10 minutes before");
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&ReminderOffset::minutes(10)).unwrap();
        assert_eq!(json, "\"10 minutes before\"");
        let back: ReminderOffset = serde_json::from_str("\"1h\"").unwrap();
        assert_eq!(back, ReminderOffset::hours(1));
        assert!(serde_json::from_str::<ReminderOffset>("\"whenever\"").is_err());
    }

    // ── plan tests ──────────────────────────────────────────────────────

    #[test]
    fn test_past_start_yields_nothing() {
        let start = now() - Duration::hours(1);
        for offset in [ReminderOffset::minutes(10), ReminderOffset::hours(1), ReminderOffset::minutes(0)] {
            assert!(plan(start, offset, 2, now(), &ReminderPolicy::default()).is_empty());
        }
    }

    #[test]
    fn test_none_offset_yields_nothing() {
        let start = now() + Duration::hours(5);
        assert!(plan(start, ReminderOffset::None, 1, now(), &ReminderPolicy::default()).is_empty());
    }

    #[test]
    fn test_high_priority_dual_reminder() {
        // work (priority 2), 2 hours from now, 10m offset
        let start = now() + Duration::hours(2);
        let reminders = plan(start, ReminderOffset::minutes(10), 2, now(), &ReminderPolicy::default());
        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].fire_at, start - Duration::hours(1));
        assert_eq!(reminders[0].kind, ReminderKind::HighPriority);
        assert_eq!(reminders[1].fire_at, start - Duration::minutes(10));
        assert_eq!(reminders[1].kind, ReminderKind::Configured);
        assert!(reminders.iter().all(|r| r.fire_at > now()));
    }

    #[test]
    fn test_low_priority_single_reminder() {
        let start = now() + Duration::hours(2);
        let reminders = plan(start, ReminderOffset::minutes(10), 10, now(), &ReminderPolicy::default());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].kind, ReminderKind::Configured);
    }

    #[test]
    fn test_coinciding_reminders_collapse() {
        let start = now() + Duration::hours(2);
        let reminders = plan(start, ReminderOffset::hours(1), 1, now(), &ReminderPolicy::default());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].kind, ReminderKind::Configured);
    }

    #[test]
    fn test_each_fire_time_filtered_independently() {
        // Configured 2h lead is already past, the 1h extra is not
        let start = now() + Duration::minutes(90);
        let reminders = plan(start, ReminderOffset::hours(2), 3, now(), &ReminderPolicy::default());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].kind, ReminderKind::HighPriority);
    }

    #[test]
    fn test_fire_time_equal_to_now_is_dropped() {
        let start = now() + Duration::minutes(10);
        let reminders = plan(start, ReminderOffset::minutes(10), 9, now(), &ReminderPolicy::default());
        assert!(reminders.is_empty());
    }

    #[test]
    fn test_custom_policy_threshold() {
        let policy = ReminderPolicy {
            high_priority_threshold: 1,
            high_priority_lead: Duration::minutes(30),
        };
        let start = now() + Duration::hours(2);
        assert_eq!(plan(start, ReminderOffset::minutes(10), 2, now(), &policy).len(), 1);
        let study = plan(start, ReminderOffset::minutes(10), 1, now(), &policy);
        assert_eq!(study[0].fire_at, start - Duration::minutes(30));
    }

    #[test]
    fn test_out_of_range_fire_time_is_dropped() {
        let start = now() + Duration::hours(2);
        let reminders = plan(start, ReminderOffset::Before(Duration::MAX), 1, now(), &ReminderPolicy::default());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].kind, ReminderKind::HighPriority);

        let policy = ReminderPolicy {
            high_priority_threshold: 3,
            high_priority_lead: Duration::MAX,
        };
        let reminders = plan(start, ReminderOffset::minutes(10), 1, now(), &policy);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].kind, ReminderKind::Configured);
    }
}
