//! Batch assembly: turn extracted listing rows into storable records.

use crate::models::{HotelRecord, ListingRow};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use tracing::warn;

/// Assemble extracted batches into finished records for one search.
///
/// Rows are flattened in page order, deduplicated by hotel name keeping
/// the first occurrence, and dropped unless hotel, review, and price are
/// all present. Zero prices and zero reviews are dropped too: the
/// provider uses 0 as a placeholder for unavailable listings, and a zero
/// review would make the price-per-review ratio meaningless.
///
/// All records of one assembly share a single retrieval timestamp.
pub fn assemble(
    check_in: NaiveDate,
    city: &str,
    batches: Vec<Vec<ListingRow>>,
) -> Vec<HotelRecord> {
    let rows: Vec<ListingRow> = batches.into_iter().flatten().collect();
    if rows.is_empty() {
        warn!("no listings extracted, nothing to assemble");
        return Vec::new();
    }

    let as_of = Utc::now();
    let mut seen: HashSet<Option<String>> = HashSet::new();
    let mut records = Vec::new();

    for row in rows {
        if !seen.insert(row.hotel.clone()) {
            continue;
        }

        let (hotel, review, price) = match (row.hotel, row.review, row.price) {
            (Some(hotel), Some(review), Some(price)) => (hotel, review, price),
            _ => continue,
        };

        if price == 0.0 || review == 0.0 {
            continue;
        }

        records.push(HotelRecord {
            hotel,
            price,
            review,
            location: row.location.unwrap_or_default(),
            price_per_review: price / review,
            city: city.to_string(),
            date: check_in,
            as_of,
        });
    }

    records
}
