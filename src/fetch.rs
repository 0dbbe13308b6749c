//! Page fetching over HTTP, behind a seam the tests can substitute.

use crate::config::{provider_headers, Config};
use crate::models::SearchRequest;
use crate::query;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of search results, addressed by row offset.
///
/// `None` means the page could not be fetched. Fetch failures are not
/// errors at this layer; the caller decides how much of the search
/// survives a lost page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &SearchRequest, offset: i64) -> Option<Value>;
}

/// Page source talking to the provider's GraphQL endpoint.
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: String,
    page_size: i64,
}

impl HttpSource {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in provider_headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name: {}", name))?;
            let header_value = HeaderValue::from_str(&value)
                .with_context(|| format!("invalid value for header {}", name))?;
            headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.provider.endpoint.clone(),
            page_size: config.provider.page_size,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch_page(&self, request: &SearchRequest, offset: i64) -> Option<Value> {
        let url = query::endpoint_url(&self.endpoint, &request.currency);
        let payload = query::search_payload(request, offset, self.page_size);

        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("request for offset {} failed: {}", offset, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("provider returned {} for offset {}", status, offset);
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => Some(body),
            Err(e) => {
                error!("response for offset {} is not valid JSON: {}", offset, e);
                None
            }
        }
    }
}

/// Listings of one page body. A body without a results array yields an
/// empty slice, not an error; fully empty pages occur past the last page.
pub fn results(body: &Value) -> &[Value] {
    body.get("data")
        .and_then(|data| data.get("searchQueries"))
        .and_then(|queries| queries.get("search"))
        .and_then(|search| search.get("results"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn results_reads_the_listing_array() {
        let body = json!({
            "data": { "searchQueries": { "search": {
                "results": [ { "displayName": { "text": "A" } } ],
            } } }
        });
        assert_eq!(results(&body).len(), 1);
    }

    #[test]
    fn bodies_without_results_yield_empty() {
        assert!(results(&json!({})).is_empty());
        assert!(results(&json!({ "data": { "searchQueries": { "search": {} } } })).is_empty());
        assert!(results(&json!({ "data": { "searchQueries": { "search": { "results": 7 } } } }))
            .is_empty());
    }
}
