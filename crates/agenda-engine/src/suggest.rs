//! Adapter for an external ordering suggester (an AI model).
//!
//! The suggester is a black box that takes a prompt and returns text which
//! should contain a JSON array. This module renders the prompt, pulls the
//! array out of whatever surrounds it, and turns it into an id list for
//! [`reconcile_external_order`](crate::schedule::reconcile_external_order).
//! Every failure collapses to `None`, which the scheduler treats as "use the
//! local order".

use std::time::Duration;

use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::cache::{Clock, TtlCache};
use crate::occurrence::Occurrence;

/// Instruction used when the caller does not supply one.
pub const DEFAULT_INSTRUCTION: &str =
    "Order these calendar items so the most important and time-sensitive come first.";

/// Failure talking to the suggester. Every variant leads to a local fallback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SuggestError {
    #[error("suggester timed out after {0:?}")]
    Timeout(Duration),

    #[error("suggester transport error: {0}")]
    Transport(String),

    #[error("malformed suggestion: {0}")]
    Malformed(String),
}

/// Something that answers a prompt with free text.
pub trait Suggester {
    fn suggest(&self, prompt: &str) -> Result<String, SuggestError>;
}

impl<F> Suggester for F
where
    F: Fn(&str) -> Result<String, SuggestError>,
{
    fn suggest(&self, prompt: &str) -> Result<String, SuggestError> {
        self(prompt)
    }
}

// ── Prompt ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PromptItem<'a> {
    id: &'a str,
    title: &'a str,
    category: &'a str,
    priority: u8,
    date: String,
    start: String,
    all_day: bool,
}

/// Render the prompt describing `occurrences` in local time.
///
/// The reply is expected to be a JSON array of `{"id": ...}` objects in the
/// suggested order.
pub fn render_prompt(occurrences: &[Occurrence], instruction: &str, tz: Tz) -> String {
    let items: Vec<PromptItem<'_>> = occurrences
        .iter()
        .map(|o| PromptItem {
            id: &o.instance_id,
            title: &o.title,
            category: o.category.key(),
            priority: o.priority,
            date: o.occurrence_date.format("%Y-%m-%d").to_string(),
            start: o.start.with_timezone(&tz).format("%H:%M").to_string(),
            all_day: o.all_day,
        })
        .collect();
    let listing = serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string());

    format!(
        "{instruction}\n\
         Lower priority numbers are more important.\n\
         Items:\n{listing}\n\
         Reply with only a JSON array of objects, each with the \"id\" of one item, \
         in the order you recommend. Example: [{{\"id\": \"...\"}}]"
    )
}

// ── Response ────────────────────────────────────────────────────────────────

/// Parse the first `[` … last `]` span of `text` into an id list.
///
/// Elements may be strings or objects with a string or integer `id`; any
/// other element is skipped.
///
/// # Errors
///
/// [`SuggestError::Malformed`] when no bracketed span exists or it is not a
/// JSON array.
pub fn parse_order(text: &str) -> Result<Vec<String>, SuggestError> {
    let (Some(open), Some(close)) = (text.find('['), text.rfind(']')) else {
        return Err(SuggestError::Malformed("no JSON array found".to_string()));
    };
    if close < open {
        return Err(SuggestError::Malformed("no JSON array found".to_string()));
    }

    let value: Value = serde_json::from_str(&text[open..=close])
        .map_err(|e| SuggestError::Malformed(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(SuggestError::Malformed("not an array".to_string()));
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(id),
            Value::Object(mut map) => match map.remove("id") {
                Some(Value::String(id)) => Some(id),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect())
}

/// Like [`parse_order`], but logs and returns `None` on failure.
pub fn extract_order(text: &str) -> Option<Vec<String>> {
    match parse_order(text) {
        Ok(ids) => Some(ids),
        Err(e) => {
            tracing::warn!(error = %e, "could not extract ordering from suggestion");
            None
        }
    }
}

/// Ask `suggester` for an ordering of `occurrences`.
///
/// Returns `None` when the suggester fails or its reply holds no array.
pub fn request_order(
    suggester: &dyn Suggester,
    occurrences: &[Occurrence],
    instruction: &str,
    tz: Tz,
) -> Option<Vec<String>> {
    let prompt = render_prompt(occurrences, instruction, tz);
    match suggester.suggest(&prompt) {
        Ok(text) => extract_order(&text),
        Err(e) => {
            tracing::warn!(error = %e, "suggester failed");
            None
        }
    }
}

// ── Caching ─────────────────────────────────────────────────────────────────

/// A [`Suggester`] that memoizes successful replies by prompt.
pub struct CachingSuggester<'a, S, C: Clock> {
    inner: S,
    cache: &'a TtlCache<String, String, C>,
}

impl<'a, S: Suggester, C: Clock> CachingSuggester<'a, S, C> {
    pub fn new(inner: S, cache: &'a TtlCache<String, String, C>) -> Self {
        Self { inner, cache }
    }
}

impl<S: Suggester, C: Clock> Suggester for CachingSuggester<'_, S, C> {
    fn suggest(&self, prompt: &str) -> Result<String, SuggestError> {
        if let Some(hit) = self.cache.get(prompt) {
            tracing::debug!("suggestion cache hit");
            return Ok(hit);
        }
        let reply = self.inner.suggest(prompt)?;
        self.cache.insert(prompt.to_string(), reply.clone());
        Ok(reply)
    }
}
