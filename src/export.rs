//! Export stored prices as CSV.
//!
//! Dumps the full `HotelPrice` table for spreadsheet work or analysis
//! elsewhere. Column order matches the table; text fields are quoted
//! RFC 4180 style when they contain commas, quotes, or line breaks.

use anyhow::Result;
use sqlx::Row;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::migrate;

const HEADER: &str = "Hotel,Price,Review,Location,Price/Review,City,Date,AsOf";

/// Export the price history as CSV.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_tables(&pool).await?;

    let rows = sqlx::query(
        r#"
        SELECT Hotel, Price, Review, Location, "Price/Review" AS PricePerReview, City, Date, AsOf
        FROM HotelPrice
        ORDER BY Date, Hotel
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let mut csv = String::from(HEADER);
    csv.push('\n');
    for row in &rows {
        let hotel: String = row.get("Hotel");
        let price: f64 = row.get("Price");
        let review: f64 = row.get("Review");
        let location: String = row.get("Location");
        let price_per_review: f64 = row.get("PricePerReview");
        let city: String = row.get("City");
        let date: String = row.get("Date");
        let as_of: String = row.get("AsOf");

        let line = [
            csv_field(&hotel),
            price.to_string(),
            review.to_string(),
            csv_field(&location),
            price_per_review.to_string(),
            csv_field(&city),
            csv_field(&date),
            csv_field(&as_of),
        ]
        .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &csv)?;
            eprintln!("Exported {} rows to {}", rows.len(), path.display());
        }
        None => {
            print!("{}", csv);
        }
    }

    pool.close().await;
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
