//! Append-only persistence of assembled records.

use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::models::HotelRecord;

/// Insert a batch of records into `HotelPrice` in one transaction and
/// return the number of rows written.
///
/// History is append-only: re-scraping a date adds rows with a newer
/// AsOf, it never updates or replaces the earlier retrieval.
pub async fn append_records(pool: &SqlitePool, records: &[HotelRecord]) -> Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for record in records {
        sqlx::query(
            r#"
            INSERT INTO HotelPrice (Hotel, Price, Review, Location, "Price/Review", City, Date, AsOf)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.hotel)
        .bind(record.price)
        .bind(record.review)
        .bind(&record.location)
        .bind(record.price_per_review)
        .bind(&record.city)
        .bind(record.date.to_string())
        .bind(record.as_of.to_rfc3339())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(records.len() as u64)
}
