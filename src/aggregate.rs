//! Interquartile-mean aggregate tables.
//!
//! Every aggregate is recomputed from scratch out of `HotelPrice`:
//! delete all rows, reinsert from a windowed scan. Averages keep only
//! the middle two quartiles (NTILE 2 and 3) of each partition, so a
//! handful of presidential suites or capsule bunks cannot drag the
//! figure. The calendar tables partition by review score on purpose:
//! outliers are trimmed within same-score cohorts even though the
//! grouping key is a date.

use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::migrate;

const BY_DATE: &str = r#"
    INSERT INTO AverageRoomPriceByDateTable (Date, AveragePrice, City)
    SELECT
        Date,
        AVG(Price) AS IQMPrice,
        City
    FROM (
        SELECT
            Date,
            Price,
            NTILE(4) OVER (PARTITION BY Review ORDER BY Price) AS Quartile,
            City
        FROM HotelPrice
    )
    WHERE Quartile IN (2, 3)
    GROUP BY Date
"#;

const BY_REVIEW: &str = r#"
    INSERT INTO AverageHotelRoomPriceByReview (Review, AveragePrice)
    SELECT
        Review,
        AVG(Price) AS IQMPrice
    FROM (
        SELECT
            Review,
            Price,
            NTILE(4) OVER (PARTITION BY Review ORDER BY Price) AS Quartile
        FROM HotelPrice
    )
    WHERE Quartile IN (2, 3)
    GROUP BY Review
"#;

const BY_DAY_OF_WEEK: &str = r#"
    INSERT INTO AverageHotelRoomPriceByDayOfWeek (DayOfWeek, AveragePrice)
    WITH PricedDays AS (
        SELECT
            CASE strftime('%w', Date)
                WHEN '0' THEN 'Sunday'
                WHEN '1' THEN 'Monday'
                WHEN '2' THEN 'Tuesday'
                WHEN '3' THEN 'Wednesday'
                WHEN '4' THEN 'Thursday'
                WHEN '5' THEN 'Friday'
                WHEN '6' THEN 'Saturday'
            END AS day_of_week,
            Price,
            NTILE(4) OVER (
                PARTITION BY strftime('%w', Date)
                ORDER BY Price
            ) AS quartile
        FROM HotelPrice
    )
    SELECT
        day_of_week,
        AVG(Price) AS iqm_price
    FROM PricedDays
    WHERE quartile IN (2, 3)
    GROUP BY day_of_week
    ORDER BY
        CASE day_of_week
            WHEN 'Sunday' THEN 1
            WHEN 'Monday' THEN 2
            WHEN 'Tuesday' THEN 3
            WHEN 'Wednesday' THEN 4
            WHEN 'Thursday' THEN 5
            WHEN 'Friday' THEN 6
            WHEN 'Saturday' THEN 7
        END
"#;

const BY_MONTH: &str = r#"
    WITH MonthlyPrices AS (
        SELECT
            CASE strftime('%m', Date)
                WHEN '01' THEN 'January'
                WHEN '02' THEN 'February'
                WHEN '03' THEN 'March'
                WHEN '04' THEN 'April'
                WHEN '05' THEN 'May'
                WHEN '06' THEN 'June'
                WHEN '07' THEN 'July'
                WHEN '08' THEN 'August'
                WHEN '09' THEN 'September'
                WHEN '10' THEN 'October'
                WHEN '11' THEN 'November'
                WHEN '12' THEN 'December'
            END AS month,
            Price,
            CASE
                WHEN strftime('%m', Date) IN ('01', '02', '03') THEN 'Quarter1'
                WHEN strftime('%m', Date) IN ('04', '05', '06') THEN 'Quarter2'
                WHEN strftime('%m', Date) IN ('07', '08', '09') THEN 'Quarter3'
                WHEN strftime('%m', Date) IN ('10', '11', '12') THEN 'Quarter4'
            END AS quarter,
            NTILE(4) OVER (
                PARTITION BY strftime('%m', Date)
                ORDER BY Price
            ) AS quartile
        FROM HotelPrice
    )
    INSERT INTO AverageHotelRoomPriceByMonth (Month, AveragePrice, Quarter)
    SELECT
        month,
        AVG(Price) AS iqm_price,
        quarter
    FROM MonthlyPrices
    WHERE quartile IN (2, 3)
    GROUP BY month
    ORDER BY
        CASE month
            WHEN 'January' THEN 1
            WHEN 'February' THEN 2
            WHEN 'March' THEN 3
            WHEN 'April' THEN 4
            WHEN 'May' THEN 5
            WHEN 'June' THEN 6
            WHEN 'July' THEN 7
            WHEN 'August' THEN 8
            WHEN 'September' THEN 9
            WHEN 'October' THEN 10
            WHEN 'November' THEN 11
            WHEN 'December' THEN 12
        END
"#;

const BY_LOCATION: &str = r#"
    WITH LocationMetrics AS (
        SELECT
            Location,
            Price,
            Review,
            "Price/Review",
            NTILE(4) OVER (PARTITION BY Location ORDER BY Price) AS price_quartile,
            NTILE(4) OVER (PARTITION BY Location ORDER BY Review) AS review_quartile,
            NTILE(4) OVER (PARTITION BY Location ORDER BY "Price/Review") AS price_per_review_quartile
        FROM HotelPrice
    )
    INSERT INTO AverageHotelRoomPriceByLocation (Location, AveragePrice, AverageRating, AveragePricePerReview)
    SELECT
        Location,
        COALESCE(AVG(CASE WHEN price_quartile IN (2, 3) THEN Price END), 0) AS IQM_Price,
        COALESCE(AVG(CASE WHEN review_quartile IN (2, 3) THEN Review END), 0) AS IQM_Rating,
        COALESCE(AVG(CASE WHEN price_per_review_quartile IN (2, 3) THEN "Price/Review" END), 0) AS IQM_PricePerReview
    FROM LocationMetrics
    GROUP BY Location
"#;

const AGGREGATES: &[(&str, &str)] = &[
    ("AverageRoomPriceByDateTable", BY_DATE),
    ("AverageHotelRoomPriceByReview", BY_REVIEW),
    ("AverageHotelRoomPriceByDayOfWeek", BY_DAY_OF_WEEK),
    ("AverageHotelRoomPriceByMonth", BY_MONTH),
    ("AverageHotelRoomPriceByLocation", BY_LOCATION),
];

/// Delete and rebuild one aggregate table in its own transaction.
async fn recompute(pool: &SqlitePool, table: &str, insert_sql: &str) -> Result<u64> {
    let mut tx = pool.begin().await?;
    sqlx::query(&format!("DELETE FROM {}", table))
        .execute(&mut *tx)
        .await?;
    let inserted = sqlx::query(insert_sql)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;
    Ok(inserted)
}

/// Rebuild all five aggregate tables. Returns (table, row count) pairs
/// in recompute order.
pub async fn recompute_all(pool: &SqlitePool) -> Result<Vec<(&'static str, u64)>> {
    let mut refreshed = Vec::new();
    for (table, insert_sql) in AGGREGATES {
        let rows = recompute(pool, table, insert_sql).await?;
        refreshed.push((*table, rows));
    }
    Ok(refreshed)
}

/// The `aggregate` command.
pub async fn run_aggregate(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_tables(&pool).await?;
    let refreshed = recompute_all(&pool).await?;
    pool.close().await;

    println!("Aggregate tables refreshed:");
    for (table, rows) in refreshed {
        println!("  {:<34} {:>6} rows", table, rows);
    }
    Ok(())
}
