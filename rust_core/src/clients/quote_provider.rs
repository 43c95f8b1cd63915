//! Quote Provider Trait
//!
//! Defines the interface to a third-party market-data source.
//! The Yahoo Finance client is the production implementation; tests plug in
//! scripted providers.

use crate::models::{OhlcvPoint, QuoteSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Common trait for market-data providers
///
/// Implementations must be Send + Sync for use in async contexts.
/// Every call may fail; callers decide how to degrade.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Get the provider's display name (e.g., "YahooFinance")
    fn provider_name(&self) -> &str;

    /// Get quotes for many symbols in one request
    ///
    /// # Returns
    /// * `Ok(Vec<QuoteSnapshot>)` - Quotes for the symbols the provider knows (missing ones excluded)
    /// * `Err` - If the request as a whole failed
    async fn batch_quote(&self, symbols: &[String]) -> Result<Vec<QuoteSnapshot>>;

    /// Get the quote for a single symbol
    async fn single_quote(&self, symbol: &str) -> Result<QuoteSnapshot>;

    /// Get daily bars between two instants
    async fn historical(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OhlcvPoint>>;

    /// Get the total ESG score, if the provider publishes one
    async fn esg_score(&self, _symbol: &str) -> Result<Option<f64>> {
        Ok(None)
    }
}
