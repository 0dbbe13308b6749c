//! Core data models used throughout Stayscan.
//!
//! These types represent the search parameters, per-listing rows, and
//! assembled hotel records that flow through the retrieval pipeline.

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};

/// Immutable parameters for one hotel search.
///
/// Construct through [`SearchRequest::new`], which enforces the field
/// bounds; the pipeline assumes a validated request everywhere else.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub city: String,
    pub country: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub rooms: u32,
    pub children: u32,
    pub currency: String,
    pub hotels_only: bool,
}

impl SearchRequest {
    pub fn new(
        city: &str,
        country: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        adults: u32,
        rooms: u32,
        children: u32,
        currency: &str,
        hotels_only: bool,
    ) -> Result<Self> {
        if city.is_empty() {
            bail!("city must not be empty");
        }
        if country.is_empty() {
            bail!("country must not be empty");
        }
        if currency.is_empty() {
            bail!("currency must not be empty");
        }
        if adults == 0 {
            bail!("adults must be > 0");
        }
        if rooms == 0 {
            bail!("rooms must be > 0");
        }

        Ok(Self {
            city: city.to_string(),
            country: country.to_string(),
            check_in,
            check_out,
            adults,
            rooms,
            children,
            currency: currency.to_string(),
            hotels_only,
        })
    }
}

/// Date-free search parameters, shared by every day of a month run.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub city: String,
    pub country: String,
    pub adults: u32,
    pub rooms: u32,
    pub children: u32,
    pub currency: String,
    pub hotels_only: bool,
}

impl SearchParams {
    /// Bind the parameters to a concrete stay window.
    pub fn for_dates(&self, check_in: NaiveDate, check_out: NaiveDate) -> Result<SearchRequest> {
        SearchRequest::new(
            &self.city,
            &self.country,
            check_in,
            check_out,
            self.adults,
            self.rooms,
            self.children,
            &self.currency,
            self.hotels_only,
        )
    }
}

/// One flat row extracted from a raw provider listing.
///
/// Every field is optional: a listing missing any nested node degrades
/// that field to `None` rather than failing the listing. Rows are
/// collected into per-page batches and never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub hotel: Option<String>,
    pub review: Option<f64>,
    pub price: Option<f64>,
    pub location: Option<String>,
}

/// An assembled hotel row, ready for storage.
///
/// Hotel, price, and review are guaranteed non-null and non-zero by the
/// assembler; `date` is the check-in date of the search (not the
/// retrieval date) and `as_of` records when the data was fetched.
#[derive(Debug, Clone)]
pub struct HotelRecord {
    pub hotel: String,
    pub price: f64,
    pub review: f64,
    pub location: String,
    pub price_per_review: f64,
    pub city: String,
    pub date: NaiveDate,
    pub as_of: DateTime<Utc>,
}

/// Search parameters echoed back by the provider in a page-0 response,
/// plus the discovered total result count.
///
/// Built once per search by the validator, cross-checked against the
/// [`SearchRequest`], then discarded. Fields the response omits carry
/// sentinels (`"Not Match"` city, empty country) or `None`.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub total_count: i64,
    pub city: String,
    pub country: String,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub adults: Option<i64>,
    pub children: Option<i64>,
    pub rooms: Option<i64>,
    pub currency: String,
    pub hotels_only: bool,
}
