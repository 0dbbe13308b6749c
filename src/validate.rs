//! Page-0 response validation.
//!
//! The provider silently corrects queries it considers odd: an unknown
//! city falls back to a region search, an unsupported currency to the
//! account default. Prices from a corrected search would poison the
//! dataset, so the first page is read back and every echoed parameter is
//! compared against what was asked. Any mismatch aborts the search.

use crate::models::{ResponseMeta, SearchRequest};
use crate::query::HOTEL_FILTER;
use anyhow::{bail, Result};
use serde_json::Value;
use tracing::{error, warn};

/// Sentinel recorded when no breadcrumb matches the requested city.
const CITY_NOT_MATCHED: &str = "Not Match";

/// Total result count announced by a page-0 body.
///
/// A body without a count is treated as an empty result set rather than
/// an error; the provider sends such bodies for searches it cannot place.
pub fn total_count(body: &Value) -> i64 {
    let total = search_node(body)
        .and_then(|search| search.get("pagination"))
        .and_then(|pagination| pagination.get("nbResultsTotal"))
        .and_then(Value::as_i64);

    if let Some(total) = total {
        total
    } else {
        error!("total result count not found in response, treating as 0");
        0
    }
}

/// Cross-check the page-0 body against the request that produced it.
///
/// Returns the echoed parameters on success. Every mismatch is fatal,
/// including fields the response omits entirely.
pub fn validate(body: &Value, request: &SearchRequest, default_currency: &str) -> Result<ResponseMeta> {
    let meta = read_meta(body, request, default_currency);

    if meta.city != request.city {
        bail!(
            "city mismatch: requested '{}', response matched '{}'",
            request.city,
            meta.city
        );
    }

    if meta.country != request.country {
        bail!(
            "country mismatch: requested '{}', response matched '{}'",
            request.country,
            meta.country
        );
    }

    let check_in = request.check_in.to_string();
    if meta.check_in.as_deref() != Some(check_in.as_str()) {
        bail!(
            "check-in mismatch: requested {}, response echoed {:?}",
            check_in,
            meta.check_in
        );
    }

    let check_out = request.check_out.to_string();
    if meta.check_out.as_deref() != Some(check_out.as_str()) {
        bail!(
            "check-out mismatch: requested {}, response echoed {:?}",
            check_out,
            meta.check_out
        );
    }

    if meta.adults != Some(i64::from(request.adults)) {
        bail!(
            "adult count mismatch: requested {}, response echoed {:?}",
            request.adults,
            meta.adults
        );
    }

    if meta.children != Some(i64::from(request.children)) {
        bail!(
            "child count mismatch: requested {}, response echoed {:?}",
            request.children,
            meta.children
        );
    }

    if meta.rooms != Some(i64::from(request.rooms)) {
        bail!(
            "room count mismatch: requested {}, response echoed {:?}",
            request.rooms,
            meta.rooms
        );
    }

    if meta.currency != request.currency {
        bail!(
            "currency mismatch: requested '{}', response priced in '{}'",
            request.currency,
            meta.currency
        );
    }

    if meta.hotels_only != request.hotels_only {
        bail!(
            "hotel filter mismatch: requested {}, response applied {}",
            request.hotels_only,
            meta.hotels_only
        );
    }

    Ok(meta)
}

fn read_meta(body: &Value, request: &SearchRequest, default_currency: &str) -> ResponseMeta {
    let city = if let Some(name) = matched_breadcrumb(body, &request.city) {
        name
    } else {
        warn!("city '{}' not found in response breadcrumbs", request.city);
        CITY_NOT_MATCHED.to_string()
    };

    let country = if let Some(name) = matched_breadcrumb(body, &request.country) {
        name
    } else {
        warn!("country '{}' not found in response breadcrumbs", request.country);
        String::new()
    };

    let currency = if let Some(currency) = echoed_currency(body) {
        currency
    } else {
        warn!("no priced block in response, assuming default currency {}", default_currency);
        default_currency.to_string()
    };

    let date_range = search_node(body)
        .and_then(|search| search.get("flexibleDatesConfig"))
        .and_then(|config| config.get("dateRangeCalendar"));
    let search_meta = search_node(body).and_then(|search| search.get("searchMeta"));

    ResponseMeta {
        total_count: total_count(body),
        city,
        country,
        check_in: first_date(date_range, "checkin"),
        check_out: first_date(date_range, "checkout"),
        adults: meta_count(search_meta, "nbAdults"),
        children: meta_count(search_meta, "nbChildren"),
        rooms: meta_count(search_meta, "nbRooms"),
        currency,
        hotels_only: hotel_filter_applied(body),
    }
}

fn search_node(body: &Value) -> Option<&Value> {
    body.get("data")
        .and_then(|data| data.get("searchQueries"))
        .and_then(|queries| queries.get("search"))
}

/// First breadcrumb whose name equals `wanted` ignoring case, returned in
/// the response's own casing. Breadcrumbs without a name are skipped.
fn matched_breadcrumb(body: &Value, wanted: &str) -> Option<String> {
    let wanted = wanted.to_lowercase();
    search_node(body)?
        .get("breadcrumbs")?
        .as_array()?
        .iter()
        .filter_map(|crumb| crumb.get("name").and_then(Value::as_str))
        .find(|name| name.to_lowercase() == wanted)
        .map(str::to_string)
}

/// Currency of the first priced block, scanning results in order.
fn echoed_currency(body: &Value) -> Option<String> {
    search_node(body)?
        .get("results")?
        .as_array()?
        .iter()
        .find_map(|result| {
            result
                .get("blocks")
                .and_then(Value::as_array)?
                .iter()
                .find_map(|block| {
                    block
                        .get("finalPrice")
                        .and_then(|price| price.get("currency"))
                        .and_then(Value::as_str)
                })
        })
        .map(str::to_string)
}

fn hotel_filter_applied(body: &Value) -> bool {
    search_node(body)
        .and_then(|search| search.get("appliedFilterOptions"))
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .any(|option| option.get("urlId").and_then(Value::as_str) == Some(HOTEL_FILTER))
        })
        .unwrap_or(false)
}

fn first_date(date_range: Option<&Value>, key: &str) -> Option<String> {
    date_range?
        .get(key)?
        .get(0)?
        .as_str()
        .map(str::to_string)
}

fn meta_count(search_meta: Option<&Value>, key: &str) -> Option<i64> {
    search_meta?.get(key)?.as_i64()
}
