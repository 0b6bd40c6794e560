//! `slot` CLI: create calendar events without double-booking.
//!
//! ## Usage
//!
//! ```sh
//! # Canonical interval for a start + duration
//! slot normalize --start 2024-01-01T10:15 --duration 30
//!
//! # Would this proposal fit? (prints a JSON verdict, never writes)
//! slot check --start 2024-01-01T10:15 --duration 30
//!
//! # Create an event; fails if it overlaps an existing one
//! slot add --title "Standup" --start 2024-01-01T10:30 --duration 15
//!
//! # Weekly tag (stored as metadata on the single interval)
//! slot add --title "Gym" --start 2024-01-01T18:00 --duration 60 --recurring --days Monday,Thursday
//!
//! # List the events in the store, and report pre-existing overlaps
//! slot list
//! slot audit
//!
//! # Use a different store file or config
//! slot --store team.json --config slot.toml list
//! ```

mod config;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slot_engine::conflict::find_overlapping_pairs;
use slot_engine::{denormalize, normalize, DurationInput, EventProposal, ScheduleError, Scheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::SlotConfig;
use crate::store::JsonFileStore;

#[derive(Parser)]
#[command(
    name = "slot",
    version,
    about = "Create calendar events without double-booking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Event store file (overrides `[store] path`)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical interval for a start time and duration
    Normalize {
        /// Wall-clock start, e.g. 2024-01-01T10:15
        #[arg(short, long)]
        start: String,
        /// Duration in minutes (defaults to `[ui] default_duration_minutes`)
        #[arg(short, long)]
        duration: Option<String>,
    },
    /// Check a proposed event against the store without creating it
    Check {
        #[arg(short, long)]
        start: String,
        #[arg(short, long)]
        duration: Option<String>,
    },
    /// Create an event if it does not overlap an existing one
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        start: String,
        #[arg(short, long)]
        duration: Option<String>,
        /// Tag the event as recurring
        #[arg(long)]
        recurring: bool,
        /// Comma-separated weekdays for a recurring event
        #[arg(long, value_delimiter = ',', requires = "recurring")]
        days: Vec<String>,
    },
    /// List stored events in start order
    List,
    /// Report events in the store that already overlap each other
    Audit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SlotConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.store {
        config.store.path = path;
    }
    init_tracing(&config.log.level, cli.verbose);

    match cli.command {
        Commands::Normalize { start, duration } => {
            let minutes = duration_minutes(duration, &config)?;
            let interval = normalize(&start, minutes).map_err(|err| explain(err, &config))?;
            println!("{}", serde_json::to_string_pretty(&interval)?);
        }
        Commands::Check { start, duration } => {
            let proposal = EventProposal {
                title: "(check)".to_string(),
                start,
                duration: duration_input(duration, &config),
                is_recurring: false,
                recurring_days: Vec::new(),
            };
            let scheduler = load_scheduler(&config)?;
            let mut verdict = scheduler
                .check(&proposal)
                .map_err(|err| explain(err, &config))?;
            if verdict.conflict {
                verdict.message = Some(config.ui.conflict_message.clone());
            }
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Commands::Add {
            title,
            start,
            duration,
            recurring,
            days,
        } => {
            let proposal = EventProposal {
                title,
                start,
                duration: duration_input(duration, &config),
                is_recurring: recurring,
                recurring_days: days,
            };
            let mut scheduler = load_scheduler(&config)?;
            let event = scheduler
                .submit(&proposal)
                .map_err(|err| explain(err, &config))?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        Commands::List => {
            let scheduler = load_scheduler(&config)?;
            for event in scheduler.working_set().sorted() {
                let recurring = if event.is_recurring() {
                    format!(" [{}]", event.recurring_days().labels().join(","))
                } else {
                    String::new()
                };
                println!(
                    "{}\t{}\t{}{}",
                    event.id(),
                    denormalize(event.interval()),
                    event.title(),
                    recurring
                );
            }
        }
        Commands::Audit => {
            let scheduler = load_scheduler(&config)?;
            let events = scheduler.working_set().events();
            let pairs = find_overlapping_pairs(events);
            if pairs.is_empty() {
                println!("No overlapping events.");
            } else {
                for (i, j) in &pairs {
                    println!(
                        "{} ({}) overlaps {} ({})",
                        events[*i].id(),
                        denormalize(events[*i].interval()),
                        events[*j].id(),
                        denormalize(events[*j].interval())
                    );
                }
                anyhow::bail!("{} overlapping pair(s) found", pairs.len());
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine readable. `RUST_LOG` overrides
/// the configured level.
fn init_tracing(level: &str, verbose: bool) {
    let default = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn duration_input(duration: Option<String>, config: &SlotConfig) -> DurationInput {
    match duration {
        Some(text) => DurationInput::Text(text),
        None => DurationInput::Minutes(config.ui.default_duration_minutes),
    }
}

fn duration_minutes(duration: Option<String>, config: &SlotConfig) -> Result<i64> {
    duration_input(duration, config)
        .minutes()
        .map_err(|err| explain(err, config))
}

/// Attach the configured user-facing message to a scheduling error.
///
/// Duration errors also list the configured presets as suggestions.
fn explain(err: ScheduleError, config: &SlotConfig) -> anyhow::Error {
    let message = match &err {
        ScheduleError::ConflictDetected { .. } => config.ui.conflict_message.clone(),
        ScheduleError::PersistenceFailure(_) => config.ui.failure_message.clone(),
        ScheduleError::InvalidDuration(_) if !config.ui.duration_presets.is_empty() => {
            let presets: Vec<String> = config
                .ui
                .duration_presets
                .iter()
                .map(i64::to_string)
                .collect();
            format!(
                "{} (try one of: {} minutes)",
                err.user_message(),
                presets.join(", ")
            )
        }
        other => other.user_message(),
    };
    anyhow::Error::new(err).context(message)
}

fn load_scheduler(config: &SlotConfig) -> Result<Scheduler<JsonFileStore>> {
    let mut scheduler = Scheduler::new(JsonFileStore::new(&config.store.path));
    scheduler.refresh().with_context(|| {
        format!(
            "Failed to load events from {}",
            scheduler.store().path().display()
        )
    })?;
    Ok(scheduler)
}
