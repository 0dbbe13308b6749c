use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Query endpoint URL, without the currency query parameter.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Default currency for searches and the fallback when a response
    /// carries no price currency at all.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Rows per page; page offsets advance in multiples of this.
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            currency: default_currency(),
            page_size: default_page_size(),
        }
    }
}

fn default_endpoint() -> String {
    "https://www.booking.com/dml/graphql".to_string()
}
fn default_currency() -> String {
    "USD".to_string()
}
fn default_page_size() -> i64 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default = "default_rooms")]
    pub rooms: u32,
    #[serde(default)]
    pub children: u32,
    /// Restrict results to hotel properties (as opposed to hostels,
    /// apartments, and other accommodation types).
    #[serde(default = "default_hotels_only")]
    pub hotels_only: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            adults: default_adults(),
            rooms: default_rooms(),
            children: 0,
            hotels_only: default_hotels_only(),
        }
    }
}

fn default_adults() -> u32 {
    1
}
fn default_rooms() -> u32 {
    1
}
fn default_hotels_only() -> bool {
    true
}

/// Request headers the provider expects, with their backing environment
/// variables. Values are read at search time so `.env` edits take effect
/// without restarting anything.
const HEADER_ENV_VARS: &[(&str, &str)] = &[
    ("User-Agent", "USER_AGENT"),
    ("X-Booking-Csrf-Token", "X_BOOKING_CSRF_TOKEN"),
    ("X-Booking-Context-Action-Name", "X_BOOKING_CONTEXT_ACTION_NAME"),
    ("X-Booking-Context-Aid", "X_BOOKING_CONTEXT_AID"),
    ("X-Booking-Et-Serialized-State", "X_BOOKING_ET_SERIALIZED_STATE"),
    ("X-Booking-Pageview-Id", "X_BOOKING_PAGEVIEW_ID"),
    ("X-Booking-Site-Type-Id", "X_BOOKING_SITE_TYPE_ID"),
    ("X-Booking-Topic", "X_BOOKING_TOPIC"),
];

/// Build the provider request-header set.
///
/// Absent environment variables yield empty header values, not errors;
/// the provider decides whether it will answer an unauthenticated query.
pub fn provider_headers() -> Vec<(String, String)> {
    let mut headers = vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "*/*".to_string()),
    ];
    for (name, var) in HEADER_ENV_VARS {
        headers.push((name.to_string(), std::env::var(var).unwrap_or_default()));
    }
    headers
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.provider.endpoint.is_empty() {
        anyhow::bail!("provider.endpoint must not be empty");
    }

    if config.provider.currency.is_empty() {
        anyhow::bail!("provider.currency must not be empty");
    }

    if config.provider.page_size < 1 {
        anyhow::bail!("provider.page_size must be >= 1");
    }

    if config.search.adults == 0 {
        anyhow::bail!("search.adults must be > 0");
    }

    if config.search.rooms == 0 {
        anyhow::bail!("search.rooms must be > 0");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;
        if config.provider.page_size < 1 {
            anyhow::bail!("provider.page_size must be >= 1");
        }
        Ok(config)
    }

    #[test]
    fn test_defaults_fill_in() {
        let config = parse(
            r#"
[db]
path = "data/hotels.sqlite"
"#,
        )
        .unwrap();

        assert_eq!(config.provider.endpoint, "https://www.booking.com/dml/graphql");
        assert_eq!(config.provider.currency, "USD");
        assert_eq!(config.provider.page_size, 100);
        assert_eq!(config.search.adults, 1);
        assert_eq!(config.search.rooms, 1);
        assert_eq!(config.search.children, 0);
        assert!(config.search.hotels_only);
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let config = parse(
            r#"
[db]
path = "data/hotels.sqlite"

[provider]
currency = "JPY"
page_size = 50

[search]
adults = 2
hotels_only = false
"#,
        )
        .unwrap();

        assert_eq!(config.provider.currency, "JPY");
        assert_eq!(config.provider.page_size, 50);
        assert_eq!(config.search.adults, 2);
        assert!(!config.search.hotels_only);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let result = parse(
            r#"
[db]
path = "data/hotels.sqlite"

[provider]
page_size = 0
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_headers_always_include_content_type() {
        let headers = provider_headers();
        assert!(headers
            .iter()
            .any(|(name, value)| name == "Content-Type" && value == "application/json"));
        assert!(headers.iter().any(|(name, _)| name == "X-Booking-Csrf-Token"));
    }
}
