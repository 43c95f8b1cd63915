//! ETF Service
//!
//! Facade over the catalog, provider, pipeline and cache. This is what the
//! HTTP layer calls.

use crate::analytics::{self, ChartPoint, LookbackPeriod, PerformanceSummary};
use crate::cache::{Clock, SystemClock, TtlCache, DEFAULT_TTL_SECS};
use crate::catalog::TickerCatalog;
use crate::clients::QuoteProvider;
use crate::filters::{EtfFilters, FilterParams};
use crate::models::{EnrichedRow, OhlcvPoint, QuoteSnapshot};
use crate::pipeline::{enrich, EnrichmentPipeline, EtfListing};
use chrono::Duration;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Provider passthrough for a single fund.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtfDetails {
    pub quote: Option<QuoteSnapshot>,
    pub historical: Vec<OhlcvPoint>,
    pub esg_score: Option<f64>,
}

/// One entry of a side-by-side comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    #[serde(flatten)]
    pub etf: EnrichedRow,
    pub performance: f64,
    pub volatility: f64,
    pub esg_score: f64,
}

pub struct EtfService {
    pipeline: EnrichmentPipeline,
    provider: Arc<dyn QuoteProvider>,
    catalog: Arc<TickerCatalog>,
    listings: TtlCache<Arc<EtfListing>>,
    clock: Arc<dyn Clock>,
}

impl EtfService {
    /// Create a service with the default 5 minute listing TTL
    pub fn new(catalog: Arc<TickerCatalog>, provider: Arc<dyn QuoteProvider>) -> Self {
        Self::with_ttl(catalog, provider, Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(
        catalog: Arc<TickerCatalog>,
        provider: Arc<dyn QuoteProvider>,
        ttl: Duration,
    ) -> Self {
        Self::with_clock(catalog, provider, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        catalog: Arc<TickerCatalog>,
        provider: Arc<dyn QuoteProvider>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pipeline: EnrichmentPipeline::new(catalog.clone(), provider.clone()),
            provider,
            catalog,
            listings: TtlCache::with_clock(ttl, clock.clone()),
            clock,
        }
    }

    pub fn catalog(&self) -> &TickerCatalog {
        &self.catalog
    }

    /// Number of cached listings, fresh or stale.
    pub fn cached_listings(&self) -> usize {
        self.listings.len()
    }

    /// Filtered, enriched rows, served from cache within the TTL.
    pub async fn list_etfs(&self, params: &FilterParams) -> Arc<EtfListing> {
        let filters = EtfFilters::from_params(params);
        let key = filters.cache_key();

        let pipeline = &self.pipeline;
        let filters = &filters;
        self.listings
            .get_or_compute(&key, move || async move { Arc::new(pipeline.run(filters).await) })
            .await
    }

    /// Quote, one year of history and ESG score; every part degrades independently.
    pub async fn details(&self, symbol: &str) -> EtfDetails {
        let quote = match self.provider.single_quote(symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!("Quote unavailable for {}: {}", symbol, e);
                return EtfDetails::default();
            }
        };

        let historical = self
            .history_points(symbol, LookbackPeriod::OneYear)
            .await
            .unwrap_or_default();

        let esg_score = match self.provider.esg_score(symbol).await {
            Ok(score) => score,
            Err(e) => {
                warn!("ESG score unavailable for {}: {}", symbol, e);
                None
            }
        };

        EtfDetails {
            quote: Some(quote),
            historical,
            esg_score,
        }
    }

    /// Return and volatility over `period`; `None` when history is missing or too short.
    pub async fn performance(
        &self,
        symbol: &str,
        period: LookbackPeriod,
    ) -> Option<PerformanceSummary> {
        let points = self.history_points(symbol, period).await?;
        analytics::performance(points)
    }

    /// Chart rows over `period`, oldest first; empty when unavailable.
    pub async fn history(&self, symbol: &str, period: LookbackPeriod) -> Vec<ChartPoint> {
        self.history_points(symbol, period)
            .await
            .map(|points| analytics::chart_rows(&points))
            .unwrap_or_default()
    }

    async fn history_points(&self, symbol: &str, period: LookbackPeriod) -> Option<Vec<OhlcvPoint>> {
        let to = self.clock.now();
        let from = period.start_from(to);

        match self.provider.historical(symbol, from, to).await {
            Ok(points) => Some(points),
            Err(e) => {
                warn!("History unavailable for {} ({}): {}", symbol, period, e);
                None
            }
        }
    }

    /// Compare funds side by side. Tickers that cannot be resolved are dropped;
    /// the rest keep their request order.
    pub async fn compare(&self, tickers: &[String]) -> Vec<Comparison> {
        join_all(tickers.iter().map(|t| self.compare_one(t)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn compare_one(&self, symbol: &str) -> Option<Comparison> {
        let Some(entry) = self.catalog.lookup(symbol) else {
            debug!("Compare: {} not in catalog", symbol);
            return None;
        };

        let quote = match self.provider.single_quote(symbol).await {
            Ok(quote) if quote.has_usable_data() => quote,
            Ok(_) => {
                warn!("Compare: quote for {} has no usable data", symbol);
                return None;
            }
            Err(e) => {
                warn!("Compare: quote failed for {}: {}", symbol, e);
                return None;
            }
        };

        let etf = enrich(entry, &quote);
        let summary = self.performance(symbol, LookbackPeriod::OneYear).await;
        let esg_score = self.provider.esg_score(symbol).await.ok().flatten();

        Some(Comparison {
            etf,
            performance: summary.as_ref().map_or(0.0, |s| s.performance),
            volatility: summary.as_ref().map_or(0.0, |s| s.volatility),
            esg_score: esg_score.unwrap_or(0.0),
        })
    }
}

/// Whether `symbol` looks like an exchange ticker (`CW8`, `EWLD.PA`).
pub fn validate_ticker(symbol: &str) -> bool {
    static PATTERN: OnceLock<Option<regex::Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| regex::Regex::new(r"^[A-Z0-9]{1,10}(\.[A-Z]{2})?$").ok())
        .as_ref()
        .map_or(false, |p| p.is_match(symbol))
}
