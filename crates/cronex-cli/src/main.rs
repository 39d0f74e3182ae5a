//! `cronex` CLI: evaluate cron expressions from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Next firing of a schedule, from now
//! cronex next "0 30 9 * * MON-FRI"
//!
//! # Next five firings from a given instant, in a timezone
//! cronex next "0 30 2 * * *" --from 2024-03-09T00:00:00Z -n 5 --tz America/New_York
//!
//! # Previous firing under a fixed UTC offset
//! cronex prev "@daily" --offset-minutes 330
//!
//! # Machine-readable output
//! cronex next "*/15 * * * * *" -n 3 --json
//!
//! # Inspect how an expression was understood
//! cronex describe "0 10-20/30 * * * *"
//! ```

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use cronex_core::{CronExpression, MissingHourPolicy, ParseOptions, StrictMode, Timezone};

#[derive(Parser)]
#[command(
    name = "cronex",
    version,
    about = "Cron expression evaluation with explicit DST semantics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print upcoming firing instants of an expression
    Next {
        #[command(flatten)]
        query: Query,
    },
    /// Print past firing instants of an expression
    Prev {
        #[command(flatten)]
        query: Query,
    },
    /// Show how an expression is interpreted, including warnings
    Describe {
        /// The cron expression
        expression: String,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
}

#[derive(Args)]
struct Query {
    /// The cron expression
    expression: String,

    /// Reference instant, RFC 3339 (defaults to now)
    #[arg(long)]
    from: Option<String>,

    /// Number of instants to print
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Emit a JSON array instead of one instant per line
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    schedule: ScheduleArgs,
}

#[derive(Args)]
struct ScheduleArgs {
    /// IANA timezone the schedule is evaluated in (e.g. Europe/Zurich)
    #[arg(long, conflicts_with = "offset_minutes")]
    tz: Option<String>,

    /// Fixed UTC offset in minutes, east positive (e.g. -300 for UTC-5)
    #[arg(long)]
    offset_minutes: Option<i32>,

    /// Let the schedule fire on both passes of a repeated (fall-back) hour
    #[arg(long)]
    include_repeated_hour: bool,

    /// What to do with firings inside a spring-forward gap
    #[arg(long, default_value = "insert")]
    missing_hour: String,

    /// Treat parser warnings as errors
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Next { query } => run_query(&query, true),
        Commands::Prev { query } => run_query(&query, false),
        Commands::Describe {
            expression,
            schedule,
        } => describe(&expression, &schedule),
    }
}

fn run_query(query: &Query, forward: bool) -> Result<()> {
    let expr = compile(&query.expression, &query.schedule)?;
    let from = parse_from(query.from.as_deref())?;

    let instants = if forward {
        expr.next_occurrences(from, query.count)
    } else {
        expr.previous_occurrences(from, query.count)
    };

    if query.json {
        let formatted: Vec<String> = instants.iter().map(|dt| dt.to_rfc3339()).collect();
        println!("{}", serde_json::to_string(&formatted)?);
    } else {
        if instants.is_empty() {
            bail!("no matching instant for '{}'", query.expression);
        }
        for instant in &instants {
            println!("{}", instant.to_rfc3339());
        }
    }
    Ok(())
}

fn describe(expression: &str, schedule: &ScheduleArgs) -> Result<()> {
    let expr = compile(expression, schedule)?;
    println!("{}", expr);
    for warning in expr.warnings() {
        println!("warning: {}", warning.message);
    }
    Ok(())
}

fn compile(expression: &str, schedule: &ScheduleArgs) -> Result<CronExpression> {
    let timezone = match (&schedule.tz, schedule.offset_minutes) {
        (Some(name), _) => Some(Timezone::named(name)?),
        (None, Some(minutes)) => Some(Timezone::fixed_minutes(minutes)?),
        (None, None) => None,
    };

    let mut options = ParseOptions::default()
        .skip_repeated_hour(!schedule.include_repeated_hour)
        .missing_hour(parse_missing_hour(&schedule.missing_hour)?);
    if let Some(timezone) = timezone {
        options = options.timezone(timezone);
    }
    if schedule.strict {
        options = options.strict(StrictMode::All);
    }

    CronExpression::parse_with(expression, &options)
        .with_context(|| format!("failed to compile '{expression}'"))
}

fn parse_missing_hour(value: &str) -> Result<MissingHourPolicy> {
    match value {
        "insert" => Ok(MissingHourPolicy::Insert),
        "offset" => Ok(MissingHourPolicy::Offset),
        "skip" => Ok(MissingHourPolicy::Skip),
        other => bail!("unknown missing-hour policy '{other}' (expected insert, offset or skip)"),
    }
}

fn parse_from(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("invalid RFC 3339 instant: {raw}")),
        None => Ok(Utc::now()),
    }
}
