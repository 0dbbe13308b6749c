//! Database statistics and coverage overview.
//!
//! Provides a quick summary of what has been scraped: row counts,
//! distinct hotels and cities, the covered date range, and a per-city
//! breakdown. Used by `stay stats` to show at a glance which months
//! still need scraping and whether recent runs actually stored data.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::migrate;

/// Per-city breakdown of stored prices.
struct CityStats {
    city: String,
    row_count: i64,
    hotel_count: i64,
    date_count: i64,
    first_date: String,
    last_date: String,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_tables(&pool).await?;

    let total_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM HotelPrice")
        .fetch_one(&pool)
        .await?;

    let hotel_count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT Hotel) FROM HotelPrice")
        .fetch_one(&pool)
        .await?;

    let city_count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT City) FROM HotelPrice")
        .fetch_one(&pool)
        .await?;

    let date_count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT Date) FROM HotelPrice")
        .fetch_one(&pool)
        .await?;

    let first_date: Option<String> = sqlx::query_scalar("SELECT MIN(Date) FROM HotelPrice")
        .fetch_one(&pool)
        .await?;

    let last_date: Option<String> = sqlx::query_scalar("SELECT MAX(Date) FROM HotelPrice")
        .fetch_one(&pool)
        .await?;

    let last_retrieval: Option<String> = sqlx::query_scalar("SELECT MAX(AsOf) FROM HotelPrice")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Stayscan — Database Stats");
    println!("=========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Rows:        {}", total_rows);
    println!("  Hotels:      {}", hotel_count);
    println!("  Cities:      {}", city_count);
    println!("  Dates:       {}", date_count);

    if let (Some(first), Some(last)) = (&first_date, &last_date) {
        println!("  Covered:     {} .. {}", first, last);
    }
    if let Some(asof) = &last_retrieval {
        println!("  Last scrape: {}", format_asof_relative(asof));
    }

    // Per-city breakdown
    let city_rows = sqlx::query(
        r#"
        SELECT
            City,
            COUNT(*) AS row_count,
            COUNT(DISTINCT Hotel) AS hotel_count,
            COUNT(DISTINCT Date) AS date_count,
            MIN(Date) AS first_date,
            MAX(Date) AS last_date
        FROM HotelPrice
        GROUP BY City
        ORDER BY row_count DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let mut city_stats: Vec<CityStats> = Vec::new();
    for row in &city_rows {
        city_stats.push(CityStats {
            city: row.get("City"),
            row_count: row.get("row_count"),
            hotel_count: row.get("hotel_count"),
            date_count: row.get("date_count"),
            first_date: row.get("first_date"),
            last_date: row.get("last_date"),
        });
    }

    if !city_stats.is_empty() {
        println!();
        println!("  By city:");
        println!(
            "  {:<18} {:>8} {:>8} {:>7}   {}",
            "CITY", "ROWS", "HOTELS", "DATES", "COVERED"
        );
        println!("  {}", "-".repeat(70));

        for s in &city_stats {
            println!(
                "  {:<18} {:>8} {:>8} {:>7}   {} .. {}",
                s.city, s.row_count, s.hotel_count, s.date_count, s.first_date, s.last_date
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a stored AsOf timestamp as a relative time string
/// (e.g. "3 hours ago").
fn format_asof_relative(asof: &str) -> String {
    let parsed = match chrono::DateTime::parse_from_rfc3339(asof) {
        Ok(parsed) => parsed,
        Err(_) => return asof.to_string(),
    };

    let delta = chrono::Utc::now().timestamp() - parsed.timestamp();
    if delta < 0 {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        parsed.format("%Y-%m-%d %H:%M").to_string()
    }
}
