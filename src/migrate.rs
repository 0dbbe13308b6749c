use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create every table the pipeline writes. Idempotent; called by `init`
/// and again before any write so a fresh database path just works.
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    // Fact table. One row per hotel per check-in date per retrieval.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS HotelPrice (
            ID INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            Hotel TEXT NOT NULL,
            Price REAL NOT NULL,
            Review REAL NOT NULL,
            Location TEXT NOT NULL,
            "Price/Review" REAL NOT NULL,
            City TEXT NOT NULL,
            Date TEXT NOT NULL,
            AsOf TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Aggregate tables, recomputed wholesale after every store.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS AverageRoomPriceByDateTable (
            Date TEXT NOT NULL PRIMARY KEY,
            AveragePrice REAL NOT NULL,
            City TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS AverageHotelRoomPriceByReview (
            Review REAL NOT NULL PRIMARY KEY,
            AveragePrice REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS AverageHotelRoomPriceByDayOfWeek (
            DayOfWeek TEXT NOT NULL PRIMARY KEY,
            AveragePrice REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS AverageHotelRoomPriceByMonth (
            Month TEXT NOT NULL PRIMARY KEY,
            AveragePrice REAL NOT NULL,
            Quarter TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS AverageHotelRoomPriceByLocation (
            Location TEXT NOT NULL PRIMARY KEY,
            AveragePrice REAL NOT NULL,
            AverageRating REAL NOT NULL,
            AveragePricePerReview REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_tables(&pool).await?;
    pool.close().await;
    Ok(())
}
