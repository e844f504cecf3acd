//! Priority scheduling and reconciliation with an external (AI) ordering.
//!
//! The canonical order is ascending category priority, then ascending start,
//! with holiday pseudo-occurrences ahead of everything. [`local_sort`] is a
//! stable sort, so equal keys keep their input order.
//!
//! An externally suggested order is only ever a permutation hint:
//! [`reconcile_external_order`] never adds or drops an occurrence. When the
//! suggestion is missing, empty, or matches nothing, the local order is used
//! and the result carries [`ScheduleStatus::AiFallback`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::occurrence::Occurrence;

// ── Ordering ────────────────────────────────────────────────────────────────

/// Holiday first, then category priority, then start time.
pub fn compare(a: &Occurrence, b: &Occurrence) -> Ordering {
    b.is_holiday
        .cmp(&a.is_holiday)
        .then_with(|| a.priority.cmp(&b.priority))
        .then_with(|| a.start.cmp(&b.start))
}

/// Stable sort by [`compare`].
pub fn local_sort(occurrences: &[Occurrence]) -> Vec<Occurrence> {
    let mut sorted = occurrences.to_vec();
    sorted.sort_by(compare);
    sorted
}

// ── Reconciliation ──────────────────────────────────────────────────────────

/// Why the external ordering was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No ordering was available (parse failure, timeout, transport error).
    Missing,
    /// The ordering was an empty list for a non-empty input.
    Empty,
    /// None of the suggested ids matched an occurrence.
    NoMatches,
}

/// How a schedule's order was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Local priority order; no external ordering was requested.
    Local,
    /// The external ordering was applied.
    External {
        /// Suggested ids that placed an occurrence.
        matched: usize,
        /// Suggested ids that were unknown or repeated.
        ignored: usize,
        /// Occurrences the suggestion left out, appended in local order.
        appended: usize,
    },
    /// The external ordering was unusable; local order was used.
    AiFallback { reason: FallbackReason },
    /// The ordering belonged to an older snapshot and was discarded.
    Stale,
}

impl ScheduleStatus {
    /// Whether the caller asked for an external ordering and did not get it.
    pub fn is_fallback(&self) -> bool {
        matches!(self, ScheduleStatus::AiFallback { .. } | ScheduleStatus::Stale)
    }
}

/// Output of [`reconcile_external_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub occurrences: Vec<Occurrence>,
    pub status: ScheduleStatus,
}

impl Reconciled {
    fn fallback(occurrences: &[Occurrence], reason: FallbackReason) -> Self {
        tracing::warn!(?reason, count = occurrences.len(), "external order unusable, using local sort");
        Self {
            occurrences: local_sort(occurrences),
            status: ScheduleStatus::AiFallback { reason },
        }
    }
}

/// Re-sequence `occurrences` to follow `external` ids.
///
/// Each id is matched against instance ids first, then against source event
/// ids (placing the earliest unplaced occurrence of that event in input
/// order). Unknown and repeated ids are ignored. Occurrences not named by
/// the suggestion are appended in [`local_sort`] order.
///
/// `None` stands for "no usable ordering" and is treated exactly like a
/// malformed one.
pub fn reconcile_external_order(
    occurrences: &[Occurrence],
    external: Option<&[String]>,
) -> Reconciled {
    let Some(ids) = external else {
        return Reconciled::fallback(occurrences, FallbackReason::Missing);
    };
    if occurrences.is_empty() {
        return Reconciled {
            occurrences: Vec::new(),
            status: ScheduleStatus::External {
                matched: 0,
                ignored: ids.len(),
                appended: 0,
            },
        };
    }
    if ids.is_empty() {
        return Reconciled::fallback(occurrences, FallbackReason::Empty);
    }

    let by_instance: HashMap<&str, usize> = occurrences
        .iter()
        .enumerate()
        .map(|(i, o)| (o.instance_id.as_str(), i))
        .collect();
    let mut by_source: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, o) in occurrences.iter().enumerate() {
        by_source.entry(o.source_event_id.as_str()).or_default().push(i);
    }

    let mut placed = vec![false; occurrences.len()];
    let mut order: Vec<usize> = Vec::with_capacity(occurrences.len());
    let mut ignored = 0usize;

    for id in ids {
        let id = id.as_str();
        let slot = by_instance
            .get(id)
            .copied()
            .filter(|&i| !placed[i])
            .or_else(|| {
                by_source
                    .get(id)
                    .and_then(|indices| indices.iter().copied().find(|&i| !placed[i]))
            });
        match slot {
            Some(i) => {
                placed[i] = true;
                order.push(i);
            }
            None => ignored += 1,
        }
    }

    if order.is_empty() {
        return Reconciled::fallback(occurrences, FallbackReason::NoMatches);
    }

    let matched = order.len();
    let leftovers: Vec<Occurrence> = (0..occurrences.len())
        .filter(|&i| !placed[i])
        .map(|i| occurrences[i].clone())
        .collect();
    let appended = leftovers.len();

    let mut result: Vec<Occurrence> = order.into_iter().map(|i| occurrences[i].clone()).collect();
    result.extend(local_sort(&leftovers));

    tracing::debug!(matched, ignored, appended, "applied external order");
    Reconciled {
        occurrences: result,
        status: ScheduleStatus::External {
            matched,
            ignored,
            appended,
        },
    }
}

// ── Generations ─────────────────────────────────────────────────────────────

/// Stamp of the data snapshot an external request was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

/// Monotonic generation source shared by the code that issues AI requests and
/// the code that applies their responses.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, invalidating every earlier one.
    pub fn advance(&self) -> Generation {
        Generation(self.current.fetch_add(1, AtomicOrdering::SeqCst) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(AtomicOrdering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}

/// [`reconcile_external_order`], unless `issued` is no longer current.
///
/// A stale ordering is discarded without being looked at; the result is the
/// local order with [`ScheduleStatus::Stale`].
pub fn reconcile_if_current(
    counter: &GenerationCounter,
    issued: Generation,
    occurrences: &[Occurrence],
    external: Option<&[String]>,
) -> Reconciled {
    if !counter.is_current(issued) {
        tracing::debug!(?issued, current = ?counter.current(), "discarding stale external order");
        return Reconciled {
            occurrences: local_sort(occurrences),
            status: ScheduleStatus::Stale,
        };
    }
    reconcile_external_order(occurrences, external)
}

// ── Scoped schedules ────────────────────────────────────────────────────────

/// Which occurrences a schedule covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "date", rename_all = "snake_case")]
pub enum ScheduleScope {
    /// One date.
    Day(NaiveDate),
    /// Seven days starting at the given date.
    Week(NaiveDate),
    All,
}

impl ScheduleScope {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            ScheduleScope::Day(day) => date == day,
            ScheduleScope::Week(start) => {
                let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
                start <= date && date <= end
            }
            ScheduleScope::All => true,
        }
    }
}

/// An ordered schedule plus its per-day grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleResult {
    pub scope: ScheduleScope,
    pub occurrences: Vec<Occurrence>,
    /// The same occurrences grouped by date, in schedule order within a day.
    pub by_day: BTreeMap<NaiveDate, Vec<Occurrence>>,
    pub status: ScheduleStatus,
}

impl ScheduleResult {
    fn new(scope: ScheduleScope, occurrences: Vec<Occurrence>, status: ScheduleStatus) -> Self {
        let mut by_day: BTreeMap<NaiveDate, Vec<Occurrence>> = BTreeMap::new();
        for o in &occurrences {
            by_day.entry(o.occurrence_date).or_default().push(o.clone());
        }
        Self {
            scope,
            occurrences,
            by_day,
            status,
        }
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Instance ids in schedule order.
    pub fn ids(&self) -> Vec<&str> {
        self.occurrences.iter().map(|o| o.instance_id.as_str()).collect()
    }
}

fn in_scope(occurrences: &[Occurrence], scope: ScheduleScope) -> Vec<Occurrence> {
    occurrences
        .iter()
        .filter(|o| scope.contains(o.occurrence_date))
        .cloned()
        .collect()
}

/// Local priority schedule for `scope`.
pub fn schedule(occurrences: &[Occurrence], scope: ScheduleScope) -> ScheduleResult {
    let scoped = in_scope(occurrences, scope);
    ScheduleResult::new(scope, local_sort(&scoped), ScheduleStatus::Local)
}

/// Schedule for `scope` following an external ordering where usable.
pub fn schedule_with_order(
    occurrences: &[Occurrence],
    scope: ScheduleScope,
    external: Option<&[String]>,
) -> ScheduleResult {
    let scoped = in_scope(occurrences, scope);
    let reconciled = reconcile_external_order(&scoped, external);
    ScheduleResult::new(scope, reconciled.occurrences, reconciled.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::event::EventDefinition;
    use crate::time::{local_date, parse_datetime, parse_timezone};
    use chrono_tz::Tz;

    fn hcm() -> Tz {
        parse_timezone("Asia/Ho_Chi_Minh").unwrap()
    }

    fn occ(id: &str, category: Category, start: &str) -> Occurrence {
        let start = parse_datetime(start, hcm()).unwrap();
        let def = EventDefinition::new(id, id, start, start).with_category(category);
        Occurrence::from_definition(&def, 0, local_date(start, hcm()), start, start)
    }

    fn ids(list: &[Occurrence]) -> Vec<&str> {
        list.iter().map(|o| o.source_event_id.as_str()).collect()
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Vec<Occurrence> {
        vec![
            occ("hobby", Category::Hobby, "2026-02-18T08:00"),
            occ("work9", Category::Work, "2026-02-18T09:00"),
            occ("study", Category::Study, "2026-02-18T10:00"),
            occ("work8", Category::Work, "2026-02-18T08:00"),
        ]
    }

    // ── local_sort tests ────────────────────────────────────────────────

    #[test]
    fn test_priority_beats_time() {
        let list = vec![
            occ("hobby", Category::Hobby, "2026-02-18T09:00"),
            occ("study", Category::Study, "2026-02-18T09:00"),
        ];
        assert_eq!(ids(&local_sort(&list)), vec!["study", "hobby"]);
    }

    #[test]
    fn test_tie_break_by_time() {
        let list = vec![
            occ("nine", Category::Work, "2026-02-18T09:00"),
            occ("eight", Category::Work, "2026-02-18T08:00"),
        ];
        assert_eq!(ids(&local_sort(&list)), vec!["eight", "nine"]);
    }

    #[test]
    fn test_unknown_category_sorts_as_five() {
        let list = vec![
            occ("project", Category::Project, "2026-02-18T08:00"),
            occ("other", Category::Other, "2026-02-18T09:00"),
            occ("family", Category::Family, "2026-02-18T10:00"),
        ];
        assert_eq!(ids(&local_sort(&list)), vec!["family", "other", "project"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let list = vec![
            occ("first", Category::Work, "2026-02-18T09:00"),
            occ("second", Category::Work, "2026-02-18T09:00"),
            occ("third", Category::Work, "2026-02-18T09:00"),
        ];
        assert_eq!(ids(&local_sort(&list)), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_holiday_sorts_first() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let mut list = sample();
        list.push(Occurrence::holiday(date, "Tết", hcm()));
        let sorted = local_sort(&list);
        assert!(sorted[0].is_holiday);
    }

    // ── reconcile tests ─────────────────────────────────────────────────

    #[test]
    fn test_reconcile_follows_external_order() {
        let list = sample();
        let order = strings(&["hobby", "study", "work9", "work8"]);
        let result = reconcile_external_order(&list, Some(order.as_slice()));
        assert_eq!(ids(&result.occurrences), vec!["hobby", "study", "work9", "work8"]);
        assert_eq!(
            result.status,
            ScheduleStatus::External {
                matched: 4,
                ignored: 0,
                appended: 0
            }
        );
    }

    #[test]
    fn test_reconcile_by_instance_id() {
        let list = sample();
        let order = vec![list[2].instance_id.clone(), list[0].instance_id.clone()];
        let result = reconcile_external_order(&list, Some(order.as_slice()));
        assert_eq!(ids(&result.occurrences), vec!["study", "hobby", "work8", "work9"]);
    }

    #[test]
    fn test_reconcile_ignores_unknown_and_appends_missing() {
        let list = sample();
        let order = strings(&["ghost", "hobby", "hobby"]);
        let result = reconcile_external_order(&list, Some(order.as_slice()));
        assert_eq!(ids(&result.occurrences), vec!["hobby", "study", "work8", "work9"]);
        assert_eq!(
            result.status,
            ScheduleStatus::External {
                matched: 1,
                ignored: 2,
                appended: 3
            }
        );
    }

    #[test]
    fn test_reconcile_none_falls_back_to_local() {
        let list = sample();
        let result = reconcile_external_order(&list, None);
        assert_eq!(result.occurrences, local_sort(&list));
        assert_eq!(
            result.status,
            ScheduleStatus::AiFallback {
                reason: FallbackReason::Missing
            }
        );
        assert!(result.status.is_fallback());
    }

    #[test]
    fn test_reconcile_empty_on_non_empty_falls_back() {
        let list = sample();
        let result = reconcile_external_order(&list, Some(&[][..]));
        assert_eq!(result.occurrences, local_sort(&list));
        assert!(result.status.is_fallback());
    }

    #[test]
    fn test_reconcile_no_matches_falls_back() {
        let list = sample();
        let order = strings(&["x", "y"]);
        let result = reconcile_external_order(&list, Some(order.as_slice()));
        assert_eq!(result.occurrences, local_sort(&list));
        assert_eq!(
            result.status,
            ScheduleStatus::AiFallback {
                reason: FallbackReason::NoMatches
            }
        );
    }

    #[test]
    fn test_reconcile_empty_input() {
        let order = strings(&["a"]);
        let result = reconcile_external_order(&[], Some(order.as_slice()));
        assert!(result.occurrences.is_empty());
        assert!(!result.status.is_fallback());
    }

    #[test]
    fn test_source_id_places_repeats_in_input_order() {
        let a0 = occ("a", Category::Work, "2026-02-18T09:00");
        let mut a1 = occ("a", Category::Work, "2026-02-19T09:00");
        a1.instance_id = "a@20260219#1".to_string();
        let b = occ("b", Category::Study, "2026-02-18T07:00");
        let list = vec![a0.clone(), a1.clone(), b];
        let order = strings(&["a", "a"]);
        let result = reconcile_external_order(&list, Some(order.as_slice()));
        assert_eq!(result.occurrences[0].instance_id, a0.instance_id);
        assert_eq!(result.occurrences[1].instance_id, a1.instance_id);
        assert_eq!(result.occurrences[2].source_event_id, "b");
    }

    // ── generation tests ────────────────────────────────────────────────

    #[test]
    fn test_stale_generation_is_discarded() {
        let counter = GenerationCounter::new();
        let issued = counter.advance();
        let list = sample();
        let order = strings(&["hobby"]);

        let fresh = reconcile_if_current(&counter, issued, &list, Some(order.as_slice()));
        assert_eq!(fresh.occurrences[0].source_event_id, "hobby");

        counter.advance();
        let stale = reconcile_if_current(&counter, issued, &list, Some(order.as_slice()));
        assert_eq!(stale.status, ScheduleStatus::Stale);
        assert_eq!(stale.occurrences, local_sort(&list));
    }

    #[test]
    fn test_generations_increase() {
        let counter = GenerationCounter::new();
        let a = counter.advance();
        let b = counter.advance();
        assert!(b > a);
        assert!(counter.is_current(b));
        assert!(!counter.is_current(a));
    }

    // ── scope tests ─────────────────────────────────────────────────────

    #[test]
    fn test_schedule_day_scope() {
        let mut list = sample();
        list.push(occ("tomorrow", Category::Study, "2026-02-19T08:00"));
        let day = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let result = schedule(&list, ScheduleScope::Day(day));
        assert_eq!(ids(&result.occurrences), vec!["study", "work8", "work9", "hobby"]);
        assert_eq!(result.by_day.len(), 1);
        assert_eq!(result.status, ScheduleStatus::Local);
    }

    #[test]
    fn test_schedule_week_scope_and_grouping() {
        let mut list = sample();
        list.push(occ("next-week", Category::Study, "2026-02-25T08:00"));
        list.push(occ("last-day", Category::Hobby, "2026-02-24T08:00"));
        let start = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let result = schedule(&list, ScheduleScope::Week(start));
        assert_eq!(result.len(), 5);
        assert_eq!(result.by_day.len(), 2);
        let total: usize = result.by_day.values().map(Vec::len).sum();
        assert_eq!(total, result.len());
    }

    #[test]
    fn test_schedule_with_order_keeps_count() {
        let list = sample();
        let order = strings(&["work9"]);
        let result = schedule_with_order(&list, ScheduleScope::All, Some(order.as_slice()));
        assert_eq!(result.len(), list.len());
        assert_eq!(result.occurrences[0].source_event_id, "work9");
    }
}
