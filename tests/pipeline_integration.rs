//! Integration tests for the retrieval pipeline.
//!
//! These tests prove that a custom page source (implemented via the
//! `PageSource` trait) flows end-to-end through pagination, the page-0
//! echo check, assembly, storage, and aggregate recomputation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use stayscan::aggregate;
use stayscan::assemble;
use stayscan::config::Config;
use stayscan::db;
use stayscan::fetch::PageSource;
use stayscan::migrate;
use stayscan::models::{HotelRecord, SearchRequest};
use stayscan::month;
use stayscan::scrape;
use stayscan::store;
use tempfile::TempDir;

// ─── Canned Page Source ─────────────────────────────────────────────

/// A page source that serves pre-built bodies by offset and records
/// every offset it is asked for.
struct CannedSource {
    pages: HashMap<i64, Value>,
    requested: Mutex<Vec<i64>>,
}

impl CannedSource {
    fn new(pages: Vec<(i64, Value)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn offsets_requested(&self) -> Vec<i64> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for CannedSource {
    async fn fetch_page(&self, _request: &SearchRequest, offset: i64) -> Option<Value> {
        self.requested.lock().unwrap().push(offset);
        self.pages.get(&offset).cloned()
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────

fn osaka_request() -> SearchRequest {
    SearchRequest::new(
        "Osaka",
        "Japan",
        NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(),
        NaiveDate::from_ymd_opt(2025, 7, 6).unwrap(),
        1,
        1,
        0,
        "USD",
        true,
    )
    .unwrap()
}

/// A raw provider listing with the nodes the extractor reads.
fn listing(name: &str, score: f64, price: f64) -> Value {
    json!({
        "displayName": { "text": name },
        "basicPropertyData": { "reviewScore": { "score": score } },
        "blocks": [ { "finalPrice": { "amount": price, "currency": "USD" } } ],
        "location": { "displayLocation": "Namba, Osaka" },
    })
}

/// A page-0 body that echoes [`osaka_request`] and reports `total` results.
fn first_page(total: i64, listings: Vec<Value>) -> Value {
    json!({
        "data": { "searchQueries": { "search": {
            "pagination": { "nbResultsTotal": total },
            "breadcrumbs": [
                { "name": "Japan" },
                { "name": "Osaka Prefecture" },
                { "name": "Osaka" },
            ],
            "appliedFilterOptions": [ { "urlId": "ht_id=204" } ],
            "flexibleDatesConfig": { "dateRangeCalendar": {
                "checkin": ["2025-07-05"],
                "checkout": ["2025-07-06"],
            } },
            "searchMeta": { "nbAdults": 1, "nbChildren": 0, "nbRooms": 1 },
            "results": listings,
        } } }
    })
}

/// A follow-up page body. Past page 0 only the results matter.
fn later_page(listings: Vec<Value>) -> Value {
    json!({
        "data": { "searchQueries": { "search": { "results": listings } } }
    })
}

fn test_config(tmp: &TempDir) -> Config {
    let db_path = tmp.path().join("hotels.sqlite");
    let config_content = format!(
        r#"
[db]
path = "{}"
"#,
        db_path.display()
    );
    toml::from_str(&config_content).unwrap()
}

fn record(hotel: &str, price: f64, review: f64, date: &str) -> HotelRecord {
    HotelRecord {
        hotel: hotel.to_string(),
        price,
        review,
        location: "Namba, Osaka".to_string(),
        price_per_review: price / review,
        city: "Osaka".to_string(),
        date: date.parse().unwrap(),
        as_of: Utc::now(),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

/// Prove that a multi-page search requests page 0 first, fans out over
/// the remaining offsets, and merges every page's rows.
#[tokio::test]
async fn test_multi_page_search_merges_every_page() {
    let source = CannedSource::new(vec![
        (
            0,
            first_page(
                5,
                vec![listing("Hotel A", 8.0, 100.0), listing("Hotel B", 7.5, 90.0)],
            ),
        ),
        (
            2,
            later_page(vec![
                listing("Hotel C", 9.1, 210.0),
                listing("Hotel D", 6.4, 55.0),
            ]),
        ),
        (4, later_page(vec![listing("Hotel E", 8.8, 130.0)])),
    ]);

    let batches = scrape::scrape_pages(&source, &osaka_request(), 2, "USD")
        .await
        .unwrap();

    assert_eq!(batches.len(), 3, "one batch per page");
    let rows: usize = batches.iter().map(Vec::len).sum();
    assert_eq!(rows, 5);

    let mut offsets = source.offsets_requested();
    offsets.sort_unstable();
    assert_eq!(offsets, vec![0, 2, 4]);
}

/// Prove that 150 reported results at the production page size cost
/// exactly one follow-up fetch, at offset 100.
#[tokio::test]
async fn test_150_results_need_one_follow_up_page() {
    let first: Vec<Value> = (0..100)
        .map(|i| listing(&format!("Hotel {i}"), 8.0, 100.0 + f64::from(i)))
        .collect();
    let second: Vec<Value> = (100..150)
        .map(|i| listing(&format!("Hotel {i}"), 8.0, 100.0 + f64::from(i)))
        .collect();

    let source = CannedSource::new(vec![
        (0, first_page(150, first)),
        (100, later_page(second)),
    ]);

    let request = osaka_request();
    let batches = scrape::scrape_pages(&source, &request, 100, "USD")
        .await
        .unwrap();
    let records = assemble::assemble(request.check_in, &request.city, batches);

    assert_eq!(source.offsets_requested(), vec![0, 100]);
    assert_eq!(records.len(), 150);
}

/// Prove that a failed echo check aborts the search before any
/// follow-up page is requested.
#[tokio::test]
async fn test_echo_mismatch_aborts_before_fan_out() {
    let mut page = first_page(5, vec![listing("Hotel A", 8.0, 100.0)]);
    page["data"]["searchQueries"]["search"]["results"][0]["blocks"][0]["finalPrice"]["currency"] =
        json!("JPY");

    let source = CannedSource::new(vec![(0, page)]);
    let err = scrape::scrape_pages(&source, &osaka_request(), 2, "USD")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("currency mismatch"), "{err}");
    assert_eq!(
        source.offsets_requested(),
        vec![0],
        "no fan-out after a failed check"
    );
}

/// Prove that a zero-result search is empty, not an error.
#[tokio::test]
async fn test_zero_results_is_not_an_error() {
    let source = CannedSource::new(vec![(0, first_page(0, vec![]))]);

    let batches = scrape::scrape_pages(&source, &osaka_request(), 2, "USD")
        .await
        .unwrap();

    assert!(batches.is_empty());
}

/// Prove that an unreachable provider yields no data rather than an error.
#[tokio::test]
async fn test_unfetchable_first_page_yields_no_data() {
    let source = CannedSource::new(vec![]);

    let batches = scrape::scrape_pages(&source, &osaka_request(), 2, "USD")
        .await
        .unwrap();

    assert!(batches.is_empty());
}

/// Prove that losing a follow-up page costs its rows, not the search.
#[tokio::test]
async fn test_lost_page_drops_only_its_rows() {
    let source = CannedSource::new(vec![
        (
            0,
            first_page(
                6,
                vec![listing("Hotel A", 8.0, 100.0), listing("Hotel B", 7.5, 90.0)],
            ),
        ),
        // offset 2 is never served
        (
            4,
            later_page(vec![
                listing("Hotel E", 8.8, 130.0),
                listing("Hotel F", 7.0, 80.0),
            ]),
        ),
    ]);

    let batches = scrape::scrape_pages(&source, &osaka_request(), 2, "USD")
        .await
        .unwrap();

    let rows: usize = batches.iter().map(Vec::len).sum();
    assert_eq!(rows, 4, "rows from surviving pages only");
}

/// Prove that scraped rows assemble into stamped, deduplicated records.
#[tokio::test]
async fn test_scraped_rows_assemble_into_records() {
    let source = CannedSource::new(vec![
        (
            0,
            first_page(
                4,
                vec![listing("Hotel A", 8.0, 100.0), listing("Hotel B", 7.5, 90.0)],
            ),
        ),
        (
            2,
            later_page(vec![
                listing("Hotel A", 8.0, 100.0),
                listing("Hotel C", 9.0, 225.0),
            ]),
        ),
    ]);

    let request = osaka_request();
    let batches = scrape::scrape_pages(&source, &request, 2, "USD")
        .await
        .unwrap();
    let records = assemble::assemble(request.check_in, &request.city, batches);

    assert_eq!(records.len(), 3, "duplicate Hotel A collapses to one record");
    assert!(records.iter().all(|r| r.city == "Osaka"));
    assert!(records.iter().all(|r| r.date == request.check_in));

    let c = records.iter().find(|r| r.hotel == "Hotel C").unwrap();
    assert!((c.price_per_review - 25.0).abs() < 1e-9);
}

/// Prove that a NaN-priced listing is dropped before storage instead of
/// aborting the whole batch insert.
#[tokio::test]
async fn test_nan_priced_listing_does_not_block_the_store() {
    let mut bad = listing("Hotel B", 7.5, 0.0);
    bad["blocks"][0]["finalPrice"]["amount"] = json!("NaN");

    let source = CannedSource::new(vec![(
        0,
        first_page(2, vec![listing("Hotel A", 8.0, 100.0), bad]),
    )]);

    let request = osaka_request();
    let batches = scrape::scrape_pages(&source, &request, 2, "USD")
        .await
        .unwrap();
    let records = assemble::assemble(request.check_in, &request.city, batches);

    assert_eq!(records.len(), 1, "the NaN-priced row is purged");
    assert_eq!(records[0].hotel, "Hotel A");

    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = db::connect(&cfg).await.unwrap();
    migrate::create_tables(&pool).await.unwrap();

    let inserted = store::append_records(&pool, &records).await.unwrap();
    assert_eq!(inserted, 1);

    pool.close().await;
}

/// Prove that stored prices produce interquartile means in the
/// aggregate tables: of {10, 20, 30, 40}, only the middle two count.
#[tokio::test]
async fn test_aggregates_use_interquartile_mean() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);

    let pool = db::connect(&cfg).await.unwrap();
    migrate::create_tables(&pool).await.unwrap();

    let records = vec![
        record("Hotel A", 10.0, 8.0, "2099-07-05"),
        record("Hotel B", 20.0, 8.0, "2099-07-05"),
        record("Hotel C", 30.0, 8.0, "2099-07-05"),
        record("Hotel D", 40.0, 8.0, "2099-07-05"),
    ];
    let inserted = store::append_records(&pool, &records).await.unwrap();
    assert_eq!(inserted, 4);

    let refreshed = aggregate::recompute_all(&pool).await.unwrap();
    assert_eq!(refreshed.len(), 5, "every aggregate table refreshed");

    let by_date: f64 =
        sqlx::query_scalar("SELECT AveragePrice FROM AverageRoomPriceByDateTable WHERE Date = ?")
            .bind("2099-07-05")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(
        (by_date - 25.0).abs() < 1e-9,
        "IQM of 10,20,30,40 is 25, got {by_date}"
    );

    let by_review: f64 = sqlx::query_scalar(
        "SELECT AveragePrice FROM AverageHotelRoomPriceByReview WHERE Review = 8.0",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!((by_review - 25.0).abs() < 1e-9);

    let by_location: f64 = sqlx::query_scalar(
        "SELECT AveragePrice FROM AverageHotelRoomPriceByLocation WHERE Location = ?",
    )
    .bind("Namba, Osaka")
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!((by_location - 25.0).abs() < 1e-9);

    pool.close().await;
}

/// Prove that recomputation replaces previous aggregates instead of
/// accumulating alongside them.
#[tokio::test]
async fn test_recompute_replaces_previous_aggregates() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);

    let pool = db::connect(&cfg).await.unwrap();
    migrate::create_tables(&pool).await.unwrap();

    let records = vec![
        record("Hotel A", 10.0, 8.0, "2099-07-05"),
        record("Hotel B", 20.0, 8.0, "2099-07-05"),
        record("Hotel C", 30.0, 8.0, "2099-07-05"),
        record("Hotel D", 40.0, 8.0, "2099-07-05"),
    ];
    store::append_records(&pool, &records).await.unwrap();

    aggregate::recompute_all(&pool).await.unwrap();
    aggregate::recompute_all(&pool).await.unwrap();

    let date_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM AverageRoomPriceByDateTable")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(date_rows, 1);

    pool.close().await;
}

/// Prove that dates with stored prices are excluded from the missing
/// list, per city.
#[tokio::test]
async fn test_missing_dates_skip_stored_coverage() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);

    let pool = db::connect(&cfg).await.unwrap();
    migrate::create_tables(&pool).await.unwrap();

    store::append_records(&pool, &[record("Hotel A", 100.0, 8.0, "2099-07-05")])
        .await
        .unwrap();

    let today = NaiveDate::from_ymd_opt(2099, 7, 1).unwrap();
    let missing = month::missing_dates(&pool, "Osaka", 2099, 7, today)
        .await
        .unwrap();

    assert_eq!(missing.len(), 30, "31 July dates minus the stored one");
    assert!(!missing.contains(&NaiveDate::from_ymd_opt(2099, 7, 5).unwrap()));

    // Another city's coverage does not count
    let missing_tokyo = month::missing_dates(&pool, "Tokyo", 2099, 7, today)
        .await
        .unwrap();
    assert_eq!(missing_tokyo.len(), 31);

    pool.close().await;
}
