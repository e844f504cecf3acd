//! TOML configuration.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! timezone = "Asia/Ho_Chi_Minh"
//! holidays_file = "holidays.json"
//!
//! [horizon]
//! daily = 2
//! weekly = 7
//! monthly = 30
//! yearly = 5
//!
//! [reminders]
//! high_priority_threshold = 3
//! high_priority_lead_minutes = 60
//!
//! [cache]
//! ttl_secs = 300
//! max_entries = 256
//!
//! [palette]
//! work = "#1E88E5"
//! ```
//!
//! A relative `holidays_file` is resolved against the directory of the
//! configuration file it came from.

use std::path::{Path, PathBuf};

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::cache::{Clock, TtlCache};
use crate::category::{Category, Palette};
use crate::error::AgendaError;
use crate::expander::HorizonPolicy;
use crate::holiday::HolidayCalendar;
use crate::reminder::ReminderPolicy;
use crate::time::{parse_timezone, DEFAULT_TIMEZONE};

/// Dual-reminder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_high_priority_threshold")]
    pub high_priority_threshold: u8,
    #[serde(default = "default_high_priority_lead_minutes")]
    pub high_priority_lead_minutes: u32,
}

/// Suggestion cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaConfig {
    /// IANA timezone all local-date computations use.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Holiday table in JSON; the built-in table is used when unset.
    #[serde(default)]
    pub holidays_file: Option<PathBuf>,
    #[serde(default)]
    pub horizon: HorizonPolicy,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Category key to color overrides.
    #[serde(default)]
    pub palette: Palette,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_high_priority_threshold() -> u8 {
    3
}
fn default_high_priority_lead_minutes() -> u32 {
    60
}
fn default_ttl_secs() -> u64 {
    300
}
fn default_max_entries() -> usize {
    256
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            high_priority_threshold: default_high_priority_threshold(),
            high_priority_lead_minutes: default_high_priority_lead_minutes(),
        }
    }
}

impl ReminderConfig {
    pub fn policy(&self) -> ReminderPolicy {
        ReminderPolicy {
            high_priority_threshold: self.high_priority_threshold,
            high_priority_lead: Duration::minutes(i64::from(self.high_priority_lead_minutes)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// An empty prompt → reply cache with these settings.
    pub fn build<C: Clock>(&self, clock: C) -> TtlCache<String, String, C> {
        TtlCache::new(clock, self.ttl(), self.max_entries)
    }
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            holidays_file: None,
            horizon: HorizonPolicy::default(),
            reminders: ReminderConfig::default(),
            cache: CacheConfig::default(),
            palette: Palette::default(),
            base_dir: None,
        }
    }
}

impl AgendaConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, AgendaError> {
        let config: Self = toml::from_str(s).map_err(|e| AgendaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, AgendaError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AgendaError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        tracing::debug!(path = %path.display(), timezone = %config.timezone, "loaded config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, AgendaError> {
        toml::to_string_pretty(self).map_err(|e| AgendaError::Config(e.to_string()))
    }

    /// Check values serde cannot: timezone name, horizon and cache bounds, palette colors.
    pub fn validate(&self) -> Result<(), AgendaError> {
        parse_timezone(&self.timezone)?;

        for (rule, count) in self.horizon.iter() {
            if count > HorizonPolicy::MAX {
                return Err(AgendaError::Config(format!(
                    "horizon.{rule} must be at most {}, got {count}",
                    HorizonPolicy::MAX
                )));
            }
        }

        for (key, color) in self.palette.iter() {
            if Category::from_key(key) == Category::Other && key != Category::Other.key() {
                tracing::warn!(key, "palette entry for unknown category");
            }
            if !is_hex_color(color) {
                return Err(AgendaError::Config(format!(
                    "palette color for '{key}' must be #RRGGBB, got '{color}'"
                )));
            }
        }

        if self.cache.max_entries == 0 {
            return Err(AgendaError::Config(
                "cache.max_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, AgendaError> {
        parse_timezone(&self.timezone)
    }

    pub fn reminder_policy(&self) -> ReminderPolicy {
        self.reminders.policy()
    }

    /// The configured holiday table, or the built-in one.
    pub fn holidays(&self) -> Result<HolidayCalendar, AgendaError> {
        match &self.holidays_file {
            Some(path) => {
                let path = match &self.base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path.clone(),
                };
                HolidayCalendar::load(&path)
            }
            None => Ok(HolidayCalendar::builtin()),
        }
    }
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
