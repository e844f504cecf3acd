//! End-to-end composition of the four stages.
//!
//! ```text
//! definitions ─▶ expand_all ─▶ DayBucketer ─▶ schedule ─▶ plan_all
//! ```
//!
//! A [`Pipeline`] holds the configuration the stages share and runs them
//! against one `now` anchor. It owns nothing mutable; caches and generation
//! counters stay with the caller.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::bucket::{Buckets, DateWindow, DayBucketer};
use crate::category::Palette;
use crate::config::AgendaConfig;
use crate::error::AgendaError;
use crate::event::EventDefinition;
use crate::expander::{expand_all, HorizonPolicy};
use crate::holiday::HolidayCalendar;
use crate::reminder::{plan_all, ReminderPlan, ReminderPolicy};
use crate::schedule::{schedule_with_order, ScheduleResult, ScheduleScope};
use crate::suggest::{request_order, Suggester};

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgendaView {
    pub buckets: Buckets,
    pub schedule: ScheduleResult,
    /// Reminders for the scheduled occurrences, by fire-time.
    pub reminders: Vec<ReminderPlan>,
}

#[derive(Debug, Clone)]
pub struct Pipeline<'a> {
    tz: Tz,
    horizon: HorizonPolicy,
    reminders: ReminderPolicy,
    palette: &'a Palette,
    holidays: &'a HolidayCalendar,
    window: Option<DateWindow>,
}

impl<'a> Pipeline<'a> {
    pub fn new(tz: Tz, palette: &'a Palette, holidays: &'a HolidayCalendar) -> Self {
        Self {
            tz,
            horizon: HorizonPolicy::default(),
            reminders: ReminderPolicy::default(),
            palette,
            holidays,
            window: None,
        }
    }

    /// A pipeline using the timezone, horizon, reminder policy and palette
    /// of `config`.
    pub fn from_config(
        config: &'a AgendaConfig,
        holidays: &'a HolidayCalendar,
    ) -> Result<Self, AgendaError> {
        Ok(Self {
            tz: config.tz()?,
            horizon: config.horizon,
            reminders: config.reminder_policy(),
            palette: &config.palette,
            holidays,
            window: None,
        })
    }

    pub fn with_horizon(mut self, horizon: HorizonPolicy) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_reminder_policy(mut self, policy: ReminderPolicy) -> Self {
        self.reminders = policy;
        self
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    fn bucketer(&self, now: DateTime<Utc>) -> DayBucketer<'a> {
        let bucketer = DayBucketer::new(now, self.tz, self.holidays, self.palette);
        match self.window {
            Some(window) => bucketer.with_window(window),
            None => bucketer,
        }
    }

    /// Expand and bucket `definitions` as seen at `now`.
    pub fn buckets(&self, definitions: &[EventDefinition], now: DateTime<Utc>) -> Buckets {
        let expanded = expand_all(definitions, &self.horizon, self.tz);
        self.bucketer(now).bucket(&expanded)
    }

    /// Run the pipeline with the local priority order.
    pub fn run(
        &self,
        definitions: &[EventDefinition],
        now: DateTime<Utc>,
        scope: ScheduleScope,
    ) -> AgendaView {
        let buckets = self.buckets(definitions, now);
        let schedule = crate::schedule::schedule(&buckets.all, scope);
        self.finish(buckets, schedule, now)
    }

    /// Run the pipeline following an already-parsed external ordering.
    pub fn run_with_order(
        &self,
        definitions: &[EventDefinition],
        now: DateTime<Utc>,
        scope: ScheduleScope,
        external: Option<&[String]>,
    ) -> AgendaView {
        let buckets = self.buckets(definitions, now);
        let schedule = schedule_with_order(&buckets.all, scope, external);
        self.finish(buckets, schedule, now)
    }

    /// Run the pipeline, asking `suggester` for the order of the in-scope
    /// occurrences. Any suggester failure falls back to the local order.
    pub fn run_with_suggester(
        &self,
        definitions: &[EventDefinition],
        now: DateTime<Utc>,
        scope: ScheduleScope,
        suggester: &dyn Suggester,
        instruction: &str,
    ) -> AgendaView {
        let buckets = self.buckets(definitions, now);
        let scoped: Vec<_> = buckets
            .all
            .iter()
            .filter(|o| scope.contains(o.occurrence_date))
            .cloned()
            .collect();
        let external = request_order(suggester, &scoped, instruction, self.tz);
        let schedule = schedule_with_order(&scoped, scope, external.as_deref());
        self.finish(buckets, schedule, now)
    }

    fn finish(&self, buckets: Buckets, schedule: ScheduleResult, now: DateTime<Utc>) -> AgendaView {
        let reminders = plan_all(&schedule.occurrences, now, self.tz, &self.reminders);
        tracing::debug!(
            scheduled = schedule.len(),
            reminders = reminders.len(),
            status = ?schedule.status,
            "pipeline finished"
        );
        AgendaView {
            buckets,
            schedule,
            reminders,
        }
    }
}
