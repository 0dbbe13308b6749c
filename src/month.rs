//! Whole-month scraping and missing-date backfill.

use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use sqlx::sqlite::SqlitePool;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::aggregate;
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::SearchParams;
use crate::scrape;
use crate::store;

/// Every date of a calendar month, in order. An invalid month yields
/// nothing.
pub fn month_dates(year: i32, month: u32) -> Vec<NaiveDate> {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first
            .iter_days()
            .take_while(|date| date.month() == month)
            .collect(),
        None => Vec::new(),
    }
}

/// Dates of the month with no stored prices, excluding dates already in
/// the past. A month that lies entirely behind `today` has nothing left
/// to backfill.
pub fn find_missing(
    dates_in_db: &HashSet<String>,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Vec<NaiveDate> {
    month_dates(year, month)
        .into_iter()
        .filter(|date| *date >= today)
        .filter(|date| !dates_in_db.contains(&date.to_string()))
        .collect()
}

/// Check which dates of the month this city already has rows for and
/// report the rest.
pub async fn missing_dates(
    pool: &SqlitePool,
    city: &str,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let rows: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT Date FROM HotelPrice WHERE City = ? AND Date LIKE ?")
            .bind(city)
            .bind(format!("{:04}-{:02}-%", year, month))
            .fetch_all(pool)
            .await?;

    Ok(find_missing(&rows.into_iter().collect(), year, month, today))
}

/// Scrape each date with a one-night stay window, storing day by day.
///
/// A validation failure aborts the whole run; a day that merely returns
/// nothing is logged and skipped.
async fn scrape_dates(config: &Config, params: &SearchParams, dates: &[NaiveDate]) -> Result<u64> {
    let pool = db::connect(config).await?;
    migrate::create_tables(&pool).await?;

    let mut stored = 0u64;
    for &date in dates {
        let request = params.for_dates(date, date + Duration::days(1))?;
        let records = scrape::run_search(config, &request).await?;
        if records.is_empty() {
            warn!("no prices for {} on {}", params.city, date);
            continue;
        }

        let inserted = store::append_records(&pool, &records).await?;
        aggregate::recompute_all(&pool).await?;
        info!("stored {} prices for {} on {}", inserted, params.city, date);
        stored += inserted;
    }

    pool.close().await;
    Ok(stored)
}

/// The `month` command: scrape every remaining date of one calendar
/// month, one night per date.
pub async fn run_month(
    config: &Config,
    params: &SearchParams,
    year: i32,
    month: u32,
) -> Result<()> {
    let dates = month_dates(year, month);
    if dates.is_empty() {
        bail!("invalid month: {}", month);
    }

    let today = Utc::now().date_naive();
    let dates: Vec<NaiveDate> = dates.into_iter().filter(|date| *date >= today).collect();
    if dates.is_empty() {
        println!(
            "All of {:04}-{:02} is in the past, nothing to scrape.",
            year, month
        );
        return Ok(());
    }

    let stored = scrape_dates(config, params, &dates).await?;
    println!(
        "Stored {} hotel prices for {} across {} dates.",
        stored,
        params.city,
        dates.len()
    );
    Ok(())
}

/// The `missing` command: list dates of the month without stored prices,
/// optionally scraping them on the spot.
pub async fn run_missing(
    config: &Config,
    params: &SearchParams,
    year: i32,
    month: u32,
    fill: bool,
) -> Result<()> {
    if month_dates(year, month).is_empty() {
        bail!("invalid month: {}", month);
    }

    let pool = db::connect(config).await?;
    migrate::create_tables(&pool).await?;
    let today = Utc::now().date_naive();
    let missing = missing_dates(&pool, &params.city, year, month, today).await?;
    pool.close().await;

    if missing.is_empty() {
        println!(
            "No missing dates for {} in {:04}-{:02}.",
            params.city, year, month
        );
        return Ok(());
    }

    println!(
        "{} missing dates for {} in {:04}-{:02}:",
        missing.len(),
        params.city,
        year,
        month
    );
    for date in &missing {
        println!("  {}", date);
    }

    if fill {
        let stored = scrape_dates(config, params, &missing).await?;
        println!(
            "Backfilled {} hotel prices across {} dates.",
            stored,
            missing.len()
        );
    }
    Ok(())
}
