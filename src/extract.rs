//! Field extraction from raw listing JSON.

use crate::models::ListingRow;
use serde_json::Value;

/// Extract one batch of rows from a page of listings and append it to the
/// accumulator. An empty page appends nothing.
pub fn extract_batch(listings: &[Value], batches: &mut Vec<Vec<ListingRow>>) {
    if listings.is_empty() {
        return;
    }
    batches.push(listings.iter().map(listing_row).collect());
}

/// Pull the four fields of interest out of a single listing.
///
/// Every field is optional: listings routinely omit review scores and
/// price blocks, and the assembler decides what to do about that. Numeric
/// fields are coerced whether the provider sends them as JSON numbers or
/// as strings; unparseable and `"NaN"` strings count as missing.
pub fn listing_row(listing: &Value) -> ListingRow {
    let hotel = listing
        .get("displayName")
        .and_then(|name| name.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let review = listing
        .get("basicPropertyData")
        .and_then(|data| data.get("reviewScore"))
        .and_then(|score| score.get("score"))
        .and_then(as_float);

    let price = listing
        .get("blocks")
        .and_then(|blocks| blocks.get(0))
        .and_then(|block| block.get("finalPrice"))
        .and_then(|price| price.get("amount"))
        .and_then(as_float);

    let location = listing
        .get("location")
        .and_then(|location| location.get("displayLocation"))
        .and_then(Value::as_str)
        .map(str::to_string);

    ListingRow {
        hotel,
        review,
        price,
        location,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        // A parsed NaN would reach SQLite as NULL and abort the NOT NULL
        // insert downstream; count the string "NaN" as missing instead.
        // Infinities stay.
        Value::String(text) => text.trim().parse().ok().filter(|f: &f64| !f.is_nan()),
        _ => None,
    }
}
