//! # Stayscan CLI (`stay`)
//!
//! The `stay` binary drives the hotel price pipeline. It provides
//! commands for database initialization, single-date and whole-month
//! scraping, missing-date backfill, aggregate recomputation, and
//! exporting the collected history.
//!
//! ## Usage
//!
//! ```bash
//! stay --config ./stayscan.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stay init` | Create the SQLite database and all tables |
//! | `stay scrape` | Scrape one stay window for a city and store the prices |
//! | `stay month` | Scrape every remaining date of a calendar month |
//! | `stay missing` | List (optionally scrape) dates of a month with no data |
//! | `stay aggregate` | Recompute the interquartile-mean aggregate tables |
//! | `stay stats` | Show row counts, coverage, and a per-city breakdown |
//! | `stay export` | Dump the price history as CSV |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! stay init
//!
//! # One night in Osaka
//! stay scrape --city Osaka --country Japan --check-in 2025-07-05
//!
//! # Every remaining night of July
//! stay month --city Osaka --country Japan --year 2025 --month 7
//!
//! # What is still unscraped, and fill it
//! stay missing --city Osaka --country Japan --year 2025 --month 7 --fill
//!
//! # Ship the data to a spreadsheet
//! stay export --output osaka.csv
//! ```

mod aggregate;
mod assemble;
mod config;
mod db;
mod export;
mod extract;
mod fetch;
mod migrate;
mod models;
mod month;
mod query;
mod scrape;
mod stats;
mod store;
mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

/// Stayscan CLI — hotel price retrieval and interquartile-mean price
/// statistics for city searches.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file holding the database path, provider settings, and search defaults.
#[derive(Parser)]
#[command(
    name = "stay",
    about = "Stayscan — hotel price retrieval and interquartile-mean price statistics",
    version,
    long_about = "Stayscan scrapes nightly hotel prices for a city from a travel provider's \
    GraphQL search endpoint, validates that the provider answered the question that was asked, \
    and stores the prices in SQLite together with outlier-resistant interquartile-mean \
    aggregates by date, review score, weekday, month, and location."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./stayscan.toml`. Database path, provider endpoint,
    /// and search defaults are read from this file; request headers come
    /// from the environment (or a `.env` file).
    #[arg(long, global = true, default_value = "./stayscan.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the HotelPrice fact table, and
    /// the five aggregate tables. Idempotent; running it again is safe.
    Init,

    /// Scrape one stay window for a city and store the prices.
    ///
    /// Fetches every result page for the search, validates the provider's
    /// echo of the search parameters, stores the assembled prices, and
    /// refreshes the aggregate tables.
    Scrape {
        /// City to search, as the provider spells it (e.g. `Osaka`).
        #[arg(long)]
        city: String,

        /// Country the city is in (e.g. `Japan`).
        #[arg(long)]
        country: String,

        /// Check-in date (YYYY-MM-DD).
        #[arg(long)]
        check_in: chrono::NaiveDate,

        /// Check-out date (YYYY-MM-DD). Defaults to the night after check-in.
        #[arg(long)]
        check_out: Option<chrono::NaiveDate>,

        /// Number of adults. Defaults to the configured value.
        #[arg(long)]
        adults: Option<u32>,

        /// Number of rooms. Defaults to the configured value.
        #[arg(long)]
        rooms: Option<u32>,

        /// Number of children. Defaults to the configured value.
        #[arg(long)]
        children: Option<u32>,

        /// Display currency (e.g. `USD`). Defaults to the configured value.
        #[arg(long)]
        currency: Option<String>,

        /// Include hostels, apartments, and other non-hotel properties.
        #[arg(long)]
        all_properties: bool,
    },

    /// Scrape every remaining date of a calendar month, one night each.
    ///
    /// Runs the single-date pipeline sequentially for each date of the
    /// month that is not already in the past. Days the provider has no
    /// data for are skipped; a validation failure aborts the run.
    Month {
        /// City to search, as the provider spells it.
        #[arg(long)]
        city: String,

        /// Country the city is in.
        #[arg(long)]
        country: String,

        /// Year of the month to scrape.
        #[arg(long)]
        year: i32,

        /// Month to scrape (1-12).
        #[arg(long)]
        month: u32,

        /// Number of adults. Defaults to the configured value.
        #[arg(long)]
        adults: Option<u32>,

        /// Number of rooms. Defaults to the configured value.
        #[arg(long)]
        rooms: Option<u32>,

        /// Number of children. Defaults to the configured value.
        #[arg(long)]
        children: Option<u32>,

        /// Display currency. Defaults to the configured value.
        #[arg(long)]
        currency: Option<String>,

        /// Include hostels, apartments, and other non-hotel properties.
        #[arg(long)]
        all_properties: bool,
    },

    /// List dates of a month that have no stored prices for a city.
    ///
    /// Dates already in the past are not reported; an entirely past
    /// month has nothing left to fill. With `--fill`, the missing dates
    /// are scraped on the spot.
    Missing {
        /// City to check, as stored in the database.
        #[arg(long)]
        city: String,

        /// Country the city is in (used when filling).
        #[arg(long)]
        country: String,

        /// Year of the month to check.
        #[arg(long)]
        year: i32,

        /// Month to check (1-12).
        #[arg(long)]
        month: u32,

        /// Scrape the missing dates immediately.
        #[arg(long)]
        fill: bool,

        /// Number of adults. Defaults to the configured value.
        #[arg(long)]
        adults: Option<u32>,

        /// Number of rooms. Defaults to the configured value.
        #[arg(long)]
        rooms: Option<u32>,

        /// Number of children. Defaults to the configured value.
        #[arg(long)]
        children: Option<u32>,

        /// Display currency. Defaults to the configured value.
        #[arg(long)]
        currency: Option<String>,

        /// Include hostels, apartments, and other non-hotel properties.
        #[arg(long)]
        all_properties: bool,
    },

    /// Recompute the five aggregate tables from the stored history.
    ///
    /// Normally unnecessary: every store refreshes them. Useful after
    /// hand-editing the database or restoring a backup.
    Aggregate,

    /// Show row counts, coverage, and a per-city breakdown.
    Stats,

    /// Dump the HotelPrice table as CSV.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Merge command-line search options with the configured defaults.
fn build_params(
    cfg: &config::Config,
    city: String,
    country: String,
    adults: Option<u32>,
    rooms: Option<u32>,
    children: Option<u32>,
    currency: Option<String>,
    all_properties: bool,
) -> models::SearchParams {
    models::SearchParams {
        city,
        country,
        adults: adults.unwrap_or(cfg.search.adults),
        rooms: rooms.unwrap_or(cfg.search.rooms),
        children: children.unwrap_or(cfg.search.children),
        currency: currency.unwrap_or_else(|| cfg.provider.currency.clone()),
        hotels_only: cfg.search.hotels_only && !all_properties,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Scrape {
            city,
            country,
            check_in,
            check_out,
            adults,
            rooms,
            children,
            currency,
            all_properties,
        } => {
            let params = build_params(
                &cfg,
                city,
                country,
                adults,
                rooms,
                children,
                currency,
                all_properties,
            );
            let check_out = check_out.unwrap_or(check_in + chrono::Duration::days(1));
            let request = params.for_dates(check_in, check_out)?;
            scrape::run_scrape(&cfg, &request).await?;
        }
        Commands::Month {
            city,
            country,
            year,
            month,
            adults,
            rooms,
            children,
            currency,
            all_properties,
        } => {
            let params = build_params(
                &cfg,
                city,
                country,
                adults,
                rooms,
                children,
                currency,
                all_properties,
            );
            month::run_month(&cfg, &params, year, month).await?;
        }
        Commands::Missing {
            city,
            country,
            year,
            month,
            fill,
            adults,
            rooms,
            children,
            currency,
            all_properties,
        } => {
            let params = build_params(
                &cfg,
                city,
                country,
                adults,
                rooms,
                children,
                currency,
                all_properties,
            );
            month::run_missing(&cfg, &params, year, month, fill).await?;
        }
        Commands::Aggregate => {
            aggregate::run_aggregate(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
    }

    Ok(())
}
