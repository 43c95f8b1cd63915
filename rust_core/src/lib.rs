//! ETF Core - market-data aggregation, scoring and caching.
//!
//! This module provides:
//! - Static ticker catalog (symbol, zone, theme, ESG tier)
//! - Quote provider trait with a Yahoo Finance client
//! - Match score from cost ratio and ESG tier
//! - Enrichment pipeline with batch → per-symbol → mock fallback
//! - TTL cache keyed by canonical filter sets
//! - Performance, volatility and chart history analytics
//! - `EtfService` facade combining the above

pub mod analytics;
pub mod cache;
pub mod catalog;
pub mod clients;
pub mod filters;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod service;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use catalog::{CatalogError, TickerCatalog};
pub use clients::{QuoteProvider, YahooFinanceClient};
pub use filters::{EtfFilters, FilterParams};
pub use models::{EnrichedRow, EsgTier, OhlcvPoint, QuoteSnapshot, Theme, TickerEntry, Zone};
pub use pipeline::{EnrichmentPipeline, EtfListing, QuoteOutcome};
pub use scoring::compute_match;
pub use service::{validate_ticker, Comparison, EtfDetails, EtfService};
