//! # Stayscan
//!
//! Hotel price retrieval and interquartile-mean price statistics for
//! city searches.
//!
//! Stayscan asks a travel provider's GraphQL search endpoint for every
//! hotel price in a city on a given night, verifies that the provider
//! answered the question that was asked, and stores the nightly prices
//! in SQLite together with outlier-resistant aggregates by date, review
//! score, weekday, month, and location.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Provider    │──▶│  Pipeline   │──▶│  SQLite  │
//! │ FullSearch  │   │ Fetch+Store │   │ Facts+IQM│
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   CSV    │
//!                 │  (stay)  │       │  export  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! stay init                     # create database
//! stay scrape --city Osaka --country Japan --check-in 2025-07-05
//! stay month --city Osaka --country Japan --year 2025 --month 7
//! stay missing --city Osaka --country Japan --year 2025 --month 7 --fill
//! stay stats                    # coverage report
//! stay export --output osaka.csv
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and provider request headers |
//! | [`models`] | Search parameters, requests, and stored records |
//! | [`query`] | GraphQL payloads for the FullSearch operation |
//! | [`fetch`] | HTTP page source |
//! | [`validate`] | Response echo checks against the requested search |
//! | [`extract`] | Listing field extraction from result pages |
//! | [`assemble`] | Stamping, dedup, and filtering into records |
//! | [`scrape`] | Page fan-out and the single-date pipeline |
//! | [`month`] | Whole-month scraping and missing-date detection |
//! | [`aggregate`] | Interquartile-mean aggregate recomputation |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod aggregate;
pub mod assemble;
pub mod config;
pub mod db;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod migrate;
pub mod models;
pub mod month;
pub mod query;
pub mod scrape;
pub mod stats;
pub mod store;
pub mod validate;
