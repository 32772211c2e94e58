//! Command-line flight search.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use skyscan::AppConfig;
use skyscan_search::{
    CabinClass, DurationRange, FilterOptions, SearchContext, SearchCriteria, SortBy, TimeRange,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Skyscan: search flights across every configured provider at once.
#[derive(Parser)]
#[command(name = "skyscan", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search flights and print the ranked results as JSON.
    Search(SearchArgs),

    /// Write a default configuration file.
    InitConfig {
        /// Destination path. Defaults to the standard config location.
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Origin airport (IATA code).
    #[arg(long)]
    from: String,

    /// Destination airport (IATA code).
    #[arg(long)]
    to: String,

    /// Local departure date, YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,

    /// Number of passengers.
    #[arg(long, default_value_t = 1)]
    passengers: u32,

    /// Cabin class: economy, premium_economy, business or first.
    #[arg(long, default_value = "economy")]
    cabin: CabinClass,

    /// Highest acceptable fare.
    #[arg(long)]
    max_price: Option<u64>,

    /// Most acceptable stops.
    #[arg(long)]
    max_stops: Option<u32>,

    /// Keep only these airline codes (repeatable).
    #[arg(long = "airline")]
    airlines: Vec<String>,

    /// Earliest local departure time, HH:MM.
    #[arg(long, value_parser = parse_hhmm)]
    depart_after: Option<NaiveTime>,

    /// Local departure time must be before this, HH:MM.
    #[arg(long, value_parser = parse_hhmm)]
    depart_before: Option<NaiveTime>,

    /// Earliest local arrival time, HH:MM.
    #[arg(long, value_parser = parse_hhmm)]
    arrive_after: Option<NaiveTime>,

    /// Local arrival time must be before this, HH:MM.
    #[arg(long, value_parser = parse_hhmm)]
    arrive_before: Option<NaiveTime>,

    /// Shortest acceptable duration in minutes.
    #[arg(long)]
    min_duration: Option<i64>,

    /// Longest acceptable duration in minutes.
    #[arg(long)]
    max_duration: Option<i64>,

    /// Result order: best, price, duration or departure.
    #[arg(long, default_value = "best")]
    sort: SortBy,
}

fn parse_hhmm(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

/// Combine optional bounds into a window; a missing side opens to the edge of the day.
fn time_window(
    after: Option<NaiveTime>,
    before: Option<NaiveTime>,
) -> anyhow::Result<Option<TimeRange>> {
    if after.is_none() && before.is_none() {
        return Ok(None);
    }
    let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
        .context("end of day is a valid time")?;
    let start = after.unwrap_or(NaiveTime::MIN);
    let end = before.unwrap_or(end_of_day);
    Ok(Some(TimeRange::new(start, end)?))
}

impl SearchArgs {
    fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            origin: self.from.trim().to_ascii_uppercase(),
            destination: self.to.trim().to_ascii_uppercase(),
            departure_date: self.date,
            passengers: self.passengers,
            cabin_class: self.cabin,
        }
    }

    fn filters(&self) -> anyhow::Result<FilterOptions> {
        let duration = if self.min_duration.is_some() || self.max_duration.is_some() {
            Some(DurationRange::new(self.min_duration, self.max_duration)?)
        } else {
            None
        };
        Ok(FilterOptions {
            max_price: self.max_price,
            max_stops: self.max_stops,
            airlines: self.airlines.clone(),
            departure_time: time_window(self.depart_after, self.depart_before)?,
            arrival_time: time_window(self.arrive_after, self.arrive_before)?,
            duration,
        })
    }
}

/// Load the explicit config, else the default location if present, else defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(AppConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let config = AppConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        return Ok((config, path.parent().map(Path::to_path_buf)));
    }
    let default_path = AppConfig::default_config_path();
    if default_path.is_file() {
        let config = AppConfig::from_file(&default_path)
            .with_context(|| format!("failed to load config {}", default_path.display()))?;
        return Ok((config, default_path.parent().map(Path::to_path_buf)));
    }
    Ok((AppConfig::default(), None))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, base_dir) = load_config(cli.config.as_deref())?;
    skyscan::logging::init(&config.logging);

    match cli.command {
        Command::Search(args) => run_search(&config, base_dir.as_deref(), &args).await,
        Command::InitConfig { path, force } => init_config(path, force),
    }
}

async fn run_search(
    config: &AppConfig,
    base_dir: Option<&Path>,
    args: &SearchArgs,
) -> anyhow::Result<()> {
    let criteria = args.criteria();
    criteria.validate()?;
    let filters = args.filters()?;
    let search = skyscan::build_search(config, base_dir)?;

    let interrupt = CancellationToken::new();
    let ctx = SearchContext::with_cancel(interrupt.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, canceling search");
            interrupt.cancel();
        }
    });

    let response = search.search(&ctx, &criteria, &filters, args.sort).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(AppConfig::default_config_path);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    AppConfig::default().save_to_file(&path)?;
    info!(path = %path.display(), "wrote default config");
    println!("{}", path.display());
    Ok(())
}
