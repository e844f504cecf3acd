//! Timezone-aware helpers shared by the pipeline stages.
//!
//! Every instant in the engine is a `DateTime<Utc>`. Calendar concepts (the
//! date an occurrence falls on, "today", the span of an all-day event) are
//! computed in one IANA timezone supplied by the caller, so that a weekly
//! 09:00 event stays at 09:00 local time across DST changes.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::AgendaError;

/// Timezone used when no configuration overrides it.
pub const DEFAULT_TIMEZONE: &str = "Asia/Ho_Chi_Minh";

/// Wall-clock layouts accepted in addition to RFC 3339.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz, AgendaError> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| AgendaError::InvalidTimezone(format!("'{}'", s)))
}

/// Parse a datetime string.
///
/// Accepts RFC 3339 (`2026-02-17T09:00:00+07:00`), a local wall-clock time
/// without offset (`2026-02-17T09:00`), interpreted in `tz`, or a bare date
/// (`2026-02-17`), interpreted as local midnight.
///
/// # Errors
///
/// Returns [`AgendaError::InvalidDatetime`] if none of the layouts match.
pub fn parse_datetime(s: &str, tz: Tz) -> Result<DateTime<Utc>, AgendaError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(from_local(tz, naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(start_of_day(date, tz));
    }
    Err(AgendaError::InvalidDatetime(format!("'{}'", s)))
}

/// The local calendar date of an instant.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Resolve a local wall-clock time to an instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times that
/// do not exist (DST spring-forward gap) are shifted forward by one hour.
pub fn from_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            tracing::debug!(%naive, %tz, "local time falls in a DST gap, shifting forward");
            naive
                .checked_add_signed(Duration::hours(1))
                .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
        }
    }
}

/// 00:00:00 local time of `date`.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    from_local(tz, date.and_time(NaiveTime::MIN))
}

/// 23:59:59 local time of `date`.
pub fn end_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    from_local(tz, date.and_time(NaiveTime::MIN) + Duration::seconds(86_399))
}
