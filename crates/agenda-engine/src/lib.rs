//! # agenda-engine
//!
//! Deterministic calendar core for a personal agenda.
//!
//! Stored event definitions go through four pure stages: repeat expansion
//! into dated occurrences, day bucketing with holiday markers and a past
//! filter, priority scheduling that can follow an AI-suggested order, and
//! reminder planning. Every stage takes its `now` anchor and timezone
//! explicitly, so the same inputs always give the same outputs.
//!
//! ## Modules
//!
//! - [`event`] — stored records → validated [`EventDefinition`]s
//! - [`repeat`] — repeat rules and their free-text synonyms
//! - [`expander`] — definitions → occurrences under a horizon policy
//! - [`bucket`] — occurrences → per-date buckets and markers
//! - [`schedule`] — priority ordering and external-order reconciliation
//! - [`reminder`] — reminder offsets and fire-time planning
//! - [`suggest`] — prompt rendering and reply parsing for an AI suggester
//! - [`agenda`] — the whole pipeline in one call
//! - [`category`], [`holiday`], [`occurrence`], [`time`] — shared data
//! - [`cache`], [`config`], [`error`] — supporting services

pub mod agenda;
pub mod bucket;
pub mod cache;
pub mod category;
pub mod config;
pub mod error;
pub mod event;
pub mod expander;
pub mod holiday;
pub mod occurrence;
pub mod reminder;
pub mod repeat;
pub mod schedule;
pub mod suggest;
pub mod time;

pub use agenda::{AgendaView, Pipeline};
pub use bucket::{window_from, Buckets, DateWindow, DayBucket, DayBucketer, Marker};
pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use category::{Category, Palette};
pub use config::AgendaConfig;
pub use error::AgendaError;
pub use event::{load_records, EventDefinition, EventRecord};
pub use expander::{expand_all, expand_dates, expand_event, expand_str, ExpandedEvent, HorizonPolicy};
pub use holiday::HolidayCalendar;
pub use occurrence::Occurrence;
pub use reminder::{plan, plan_all, plan_occurrence, Reminder, ReminderKind, ReminderOffset, ReminderPlan, ReminderPolicy};
pub use repeat::RepeatRule;
pub use schedule::{
    local_sort, reconcile_external_order, reconcile_if_current, schedule, schedule_with_order,
    FallbackReason, Generation, GenerationCounter, Reconciled, ScheduleResult, ScheduleScope,
    ScheduleStatus,
};
pub use suggest::{
    extract_order, parse_order, render_prompt, request_order, CachingSuggester, SuggestError,
    Suggester, DEFAULT_INSTRUCTION,
};
pub use time::{parse_datetime, parse_timezone};
