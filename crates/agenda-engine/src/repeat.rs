//! Canonical repeat rules and the legacy free-text normalization boundary.
//!
//! Stored records carry the repeat rule as display text, in several
//! languages and spellings ("daily", "Hàng ngày", "Không lặp lại", ...).
//! That text is parsed here, once, when records are read; the rest of the
//! engine only sees [`RepeatRule`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// How an event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatRule {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

const DAILY: &[&str] = &["daily", "every day", "day", "hàng ngày", "hằng ngày", "mỗi ngày"];
const WEEKLY: &[&str] = &["weekly", "every week", "week", "hàng tuần", "hằng tuần", "mỗi tuần"];
const MONTHLY: &[&str] = &[
    "monthly",
    "every month",
    "month",
    "hàng tháng",
    "hằng tháng",
    "mỗi tháng",
];
const YEARLY: &[&str] = &[
    "yearly",
    "annually",
    "every year",
    "year",
    "hàng năm",
    "hằng năm",
    "mỗi năm",
];
const NONE: &[&str] = &[
    "",
    "none",
    "never",
    "once",
    "no repeat",
    "does not repeat",
    "không lặp lại",
    "không lặp",
    "không",
];

impl RepeatRule {
    pub fn as_str(self) -> &'static str {
        match self {
            RepeatRule::None => "none",
            RepeatRule::Daily => "daily",
            RepeatRule::Weekly => "weekly",
            RepeatRule::Monthly => "monthly",
            RepeatRule::Yearly => "yearly",
        }
    }

    /// Strictly recognize a rule from free text; `None` when unrecognized.
    pub fn recognize(text: &str) -> Option<RepeatRule> {
        let normalized = normalize_text(text);
        let table: [(&[&str], RepeatRule); 5] = [
            (NONE, RepeatRule::None),
            (DAILY, RepeatRule::Daily),
            (WEEKLY, RepeatRule::Weekly),
            (MONTHLY, RepeatRule::Monthly),
            (YEARLY, RepeatRule::Yearly),
        ];
        table
            .into_iter()
            .find(|(synonyms, _)| synonyms.contains(&normalized.as_str()))
            .map(|(_, rule)| rule)
    }

    /// Normalize stored free text, degrading unrecognized text to
    /// [`RepeatRule::None`].
    ///
    /// An unrecognized rule is not an error; it is logged at `warn` level so
    /// bad data stays visible.
    pub fn from_legacy(text: &str) -> RepeatRule {
        match RepeatRule::recognize(text) {
            Some(rule) => rule,
            None => {
                tracing::warn!(rule = text, "unrecognized repeat rule, treating as none");
                RepeatRule::None
            }
        }
    }

    pub fn is_repeating(self) -> bool {
        self != RepeatRule::None
    }
}

impl fmt::Display for RepeatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim, lowercase, and collapse inner whitespace.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
