//! Search orchestration: one validated, paginated sweep of a city.
//!
//! Page 0 is fetched alone and validated before anything else happens.
//! Only after the response echo passes does the sweep fan out over the
//! remaining offsets concurrently. A lost page after that point costs
//! its rows, not the search.

use crate::aggregate;
use crate::assemble;
use crate::config::Config;
use crate::db;
use crate::extract;
use crate::fetch::{self, HttpSource, PageSource};
use crate::migrate;
use crate::models::{HotelRecord, ListingRow, SearchRequest};
use crate::store;
use crate::validate;
use anyhow::Result;
use futures::future::join_all;
use tracing::{info, warn};

/// Row offsets of every page after page 0.
pub fn page_offsets(total: i64, page_size: i64) -> Vec<i64> {
    let mut offsets = Vec::new();
    let mut offset = page_size;
    while offset < total {
        offsets.push(offset);
        offset += page_size;
    }
    offsets
}

/// Fetch and extract every page of one search.
///
/// Returns an empty batch list when the search legitimately has no
/// results or page 0 cannot be fetched. Fails only when the page-0 echo
/// contradicts the request.
pub async fn scrape_pages(
    source: &dyn PageSource,
    request: &SearchRequest,
    page_size: i64,
    default_currency: &str,
) -> Result<Vec<Vec<ListingRow>>> {
    let first = match source.fetch_page(request, 0).await {
        Some(body) => body,
        None => {
            warn!("first page could not be fetched, no data for this search");
            return Ok(Vec::new());
        }
    };

    let total = validate::total_count(&first);
    if total == 0 {
        warn!("no results for {}, {}", request.city, request.country);
        return Ok(Vec::new());
    }

    let meta = validate::validate(&first, request, default_currency)?;
    info!(
        "{} listings reported for {}, {} on {}",
        meta.total_count, request.city, request.country, request.check_in
    );

    let mut batches = Vec::new();
    extract::extract_batch(fetch::results(&first), &mut batches);

    let offsets = page_offsets(total, page_size);
    let pages = join_all(
        offsets
            .iter()
            .map(|&offset| source.fetch_page(request, offset)),
    )
    .await;

    for (&offset, page) in offsets.iter().zip(pages) {
        match page {
            Some(body) => extract::extract_batch(fetch::results(&body), &mut batches),
            None => warn!("page at offset {} lost, continuing without it", offset),
        }
    }

    Ok(batches)
}

/// Run one full search over HTTP and assemble the records.
pub async fn run_search(config: &Config, request: &SearchRequest) -> Result<Vec<HotelRecord>> {
    let source = HttpSource::new(config)?;
    let batches = scrape_pages(
        &source,
        request,
        config.provider.page_size,
        &config.provider.currency,
    )
    .await?;
    Ok(assemble::assemble(request.check_in, &request.city, batches))
}

/// The `scrape` command: search one stay window, store what it finds,
/// and refresh the aggregate tables.
pub async fn run_scrape(config: &Config, request: &SearchRequest) -> Result<()> {
    let records = run_search(config, request).await?;
    if records.is_empty() {
        println!(
            "No data stored for {} on {}.",
            request.city, request.check_in
        );
        return Ok(());
    }

    let pool = db::connect(config).await?;
    migrate::create_tables(&pool).await?;
    let inserted = store::append_records(&pool, &records).await?;
    aggregate::recompute_all(&pool).await?;
    pool.close().await;

    println!(
        "Stored {} hotel prices for {} on {}.",
        inserted, request.city, request.check_in
    );
    Ok(())
}
