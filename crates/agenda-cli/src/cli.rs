use std::path::PathBuf;

use agenda_engine::{HorizonPolicy, ScheduleScope};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agenda")]
#[command(author, version, about = "Expand, bucket, schedule, and plan reminders for calendar events")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "AGENDA_CONFIG")]
    pub config: Option<PathBuf>,

    /// IANA timezone, overriding the configuration
    #[arg(short = 'z', long, global = true)]
    pub timezone: Option<String>,

    /// Reference instant for past filtering and reminders (default: current time)
    #[arg(long, global = true)]
    pub now: Option<String>,

    /// Holiday table (JSON), overriding the configuration
    #[arg(long, global = true)]
    pub holidays: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where event records come from.
#[derive(Args)]
pub struct EventsArg {
    /// JSON array of event records ('-' for stdin)
    #[arg(short, long, default_value = "-")]
    pub events: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand one start time under a repeat rule
    Expand {
        /// Start datetime (RFC 3339 or local 'YYYY-MM-DDTHH:MM')
        #[arg(short, long)]
        start: String,

        /// Repeat rule: none, daily, weekly, monthly, yearly, or a synonym
        #[arg(short, long, default_value = "none")]
        repeat: String,

        /// Occurrence count, overriding the configured horizon
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=i64::from(HorizonPolicy::MAX)))]
        count: Option<u32>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Bucket and schedule events
    Agenda {
        #[command(flatten)]
        events: EventsArg,

        /// Schedule scope: all, day:YYYY-MM-DD, or week:YYYY-MM-DD
        #[arg(short, long, default_value = "all", value_parser = parse_scope)]
        scope: ScheduleScope,

        /// File holding a suggester reply with the preferred order
        #[arg(long)]
        suggestion: Option<PathBuf>,

        /// Only bucket dates on or after this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,

        /// Number of days to bucket, starting at --from
        #[arg(long, requires = "from")]
        days: Option<u64>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Plan reminder fire-times
    Reminders {
        #[command(flatten)]
        events: EventsArg,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the prompt that would be sent to an ordering suggester
    Prompt {
        #[command(flatten)]
        events: EventsArg,

        /// Schedule scope: all, day:YYYY-MM-DD, or week:YYYY-MM-DD
        #[arg(short, long, default_value = "all", value_parser = parse_scope)]
        scope: ScheduleScope,

        /// Instruction placed at the top of the prompt
        #[arg(short, long)]
        instruction: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD", s))
}

pub fn parse_scope(s: &str) -> Result<ScheduleScope, String> {
    match s.trim().split_once(':') {
        None if s.trim().eq_ignore_ascii_case("all") => Ok(ScheduleScope::All),
        Some((kind, date)) => {
            let date = parse_date(date)?;
            match kind.to_ascii_lowercase().as_str() {
                "day" => Ok(ScheduleScope::Day(date)),
                "week" => Ok(ScheduleScope::Week(date)),
                other => Err(format!("Unknown scope '{other}'. Use day or week")),
            }
        }
        None => Err(format!(
            "Invalid scope '{s}'. Use all, day:YYYY-MM-DD, or week:YYYY-MM-DD"
        )),
    }
}
