mod cli;
mod output;

use std::io::Read;
use std::path::Path;

use agenda_engine::{
    expand_str, load_records, parse_datetime, parse_timezone, render_prompt, window_from,
    AgendaConfig, CachingSuggester, EventDefinition, HolidayCalendar, HorizonPolicy, Pipeline,
    ScheduleScope, SuggestError, SystemClock, DEFAULT_INSTRUCTION,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Loaded configuration plus the command-line overrides.
struct Session {
    config: AgendaConfig,
    tz: Tz,
    now: DateTime<Utc>,
    holidays: HolidayCalendar,
}

impl Session {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => AgendaConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AgendaConfig::default(),
        };
        if let Some(tz) = &cli.timezone {
            parse_timezone(tz)?;
            config.timezone = tz.clone();
        }
        let tz = config.tz()?;

        let now = match &cli.now {
            Some(now) => parse_datetime(now, tz).context("Invalid --now")?,
            None => Utc::now(),
        };

        let holidays = match &cli.holidays {
            Some(path) => HolidayCalendar::load(path)
                .with_context(|| format!("Failed to load holidays {}", path.display()))?,
            None => config.holidays().context("Failed to load holiday table")?,
        };

        Ok(Self {
            config,
            tz,
            now,
            holidays,
        })
    }

    fn pipeline(&self) -> Result<Pipeline<'_>> {
        Ok(Pipeline::from_config(&self.config, &self.holidays)?)
    }
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("Failed to read {source}"))
    }
}

fn read_events(source: &str, tz: Tz) -> Result<Vec<EventDefinition>> {
    let json = read_source(source)?;
    let definitions = load_records(&json, tz).context("Invalid event records")?;
    tracing::debug!(count = definitions.len(), "loaded event definitions");
    Ok(definitions)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Session::from_cli(&cli)?;

    match &cli.command {
        Commands::Expand {
            start,
            repeat,
            count,
            json,
        } => {
            let policy = match count {
                Some(n) => HorizonPolicy {
                    daily: *n,
                    weekly: *n,
                    monthly: *n,
                    yearly: *n,
                },
                None => ctx.config.horizon,
            };
            let instants = expand_str(start, repeat, &policy, ctx.tz)?;
            if *json {
                let local: Vec<String> = instants
                    .iter()
                    .map(|i| i.with_timezone(&ctx.tz).to_rfc3339())
                    .collect();
                print_json(&local)?;
            } else {
                output::print_instants(&instants, ctx.tz);
            }
        }
        Commands::Agenda {
            events,
            scope,
            suggestion,
            from,
            days,
            json,
        } => {
            let definitions = read_events(&events.events, ctx.tz)?;
            let mut pipeline = ctx.pipeline()?;
            if let Some(from) = from {
                pipeline = pipeline.with_window(window_from(*from, days.unwrap_or(7)));
            }

            let view = match suggestion {
                Some(path) => {
                    let reply = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let from_file = move |_: &str| -> Result<String, SuggestError> {
                        Ok(reply.clone())
                    };
                    let cache = ctx.config.cache.build(SystemClock);
                    let suggester = CachingSuggester::new(from_file, &cache);
                    pipeline.run_with_suggester(
                        &definitions,
                        ctx.now,
                        *scope,
                        &suggester,
                        DEFAULT_INSTRUCTION,
                    )
                }
                None => pipeline.run(&definitions, ctx.now, *scope),
            };

            if *json {
                print_json(&view)?;
            } else {
                output::print_agenda(&view, ctx.tz);
            }
        }
        Commands::Reminders { events, json } => {
            let definitions = read_events(&events.events, ctx.tz)?;
            let view = ctx.pipeline()?.run(&definitions, ctx.now, ScheduleScope::All);
            if *json {
                print_json(&view.reminders)?;
            } else {
                output::print_reminders(&view.reminders, ctx.tz);
            }
        }
        Commands::Prompt {
            events,
            scope,
            instruction,
        } => {
            let definitions = read_events(&events.events, ctx.tz)?;
            let view = ctx.pipeline()?.run(&definitions, ctx.now, *scope);
            let instruction = instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION);
            println!(
                "{}",
                render_prompt(&view.schedule.occurrences, instruction, ctx.tz)
            );
        }
        Commands::Config => {
            print!("{}", ctx.config.to_toml_string()?);
        }
    }

    Ok(())
}
