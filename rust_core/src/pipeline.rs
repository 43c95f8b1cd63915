//! Enrichment Pipeline
//!
//! Turns the ticker catalog into enriched, scored and filtered ETF rows.
//!
//! Quote acquisition is a three-step fallback chain:
//! batch request → per-symbol requests → synthetic (mock) rows.
//! The step that produced the data is reported as a [`QuoteOutcome`].

use crate::catalog::TickerCatalog;
use crate::clients::QuoteProvider;
use crate::filters::EtfFilters;
use crate::models::{round2, EnrichedRow, QuoteSnapshot, TickerEntry};
use crate::scoring::match_score;
use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// TER assumed when the provider does not publish one (percent).
pub const DEFAULT_TER_PCT: f64 = 0.2;
/// One-year performance assumed when the provider does not publish one (percent).
pub const DEFAULT_PERF_1Y_PCT: f64 = 0.0;

/// Which step of the fallback chain produced the quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOutcome {
    /// The batch request returned usable quotes.
    Live,
    /// The batch failed; some per-symbol requests succeeded.
    PartialLive,
    /// No live quote at all; every row is synthetic.
    Mock,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfListing {
    pub outcome: QuoteOutcome,
    pub rows: Vec<EnrichedRow>,
}

impl EtfListing {
    pub fn empty() -> Self {
        Self {
            outcome: QuoteOutcome::Live,
            rows: Vec::new(),
        }
    }
}

/// Quotes gathered by the fallback chain, keyed by symbol.
enum Acquired {
    Quotes {
        outcome: QuoteOutcome,
        quotes: HashMap<String, QuoteSnapshot>,
    },
    Nothing,
}

pub struct EnrichmentPipeline {
    catalog: Arc<TickerCatalog>,
    provider: Arc<dyn QuoteProvider>,
}

impl EnrichmentPipeline {
    pub fn new(catalog: Arc<TickerCatalog>, provider: Arc<dyn QuoteProvider>) -> Self {
        Self { catalog, provider }
    }

    pub fn catalog(&self) -> &TickerCatalog {
        &self.catalog
    }

    /// Run the pipeline for one filter set. Never fails.
    pub async fn run(&self, filters: &EtfFilters) -> EtfListing {
        if self.catalog.is_empty() {
            debug!("Catalog empty, nothing to enrich");
            return EtfListing::empty();
        }

        let (outcome, rows) = match self.acquire_quotes().await {
            Acquired::Quotes { outcome, quotes } => (outcome, self.enrich_live(&quotes)),
            Acquired::Nothing => {
                warn!(
                    "{} unavailable, serving {} synthetic rows",
                    self.provider.provider_name(),
                    self.catalog.len()
                );
                (QuoteOutcome::Mock, self.synthesize())
            }
        };

        let total = rows.len();
        let rows: Vec<EnrichedRow> = rows.into_iter().filter(|r| filters.matches(r)).collect();

        info!(
            "ETF pipeline: {:?}, {} enriched, {} after filters",
            outcome,
            total,
            rows.len()
        );

        EtfListing { outcome, rows }
    }

    async fn acquire_quotes(&self) -> Acquired {
        let symbols = self.catalog.symbols();

        match self.provider.batch_quote(&symbols).await {
            Ok(quotes) => {
                let usable = index_usable(quotes);
                if !usable.is_empty() {
                    return Acquired::Quotes {
                        outcome: QuoteOutcome::Live,
                        quotes: usable,
                    };
                }
                warn!(
                    "{} batch returned no usable quotes, retrying per symbol",
                    self.provider.provider_name()
                );
            }
            Err(e) => {
                warn!(
                    "{} batch quote failed, retrying per symbol: {}",
                    self.provider.provider_name(),
                    e
                );
            }
        }

        let results = join_all(symbols.iter().map(|s| self.provider.single_quote(s))).await;

        let mut quotes = Vec::with_capacity(results.len());
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(quote) => quotes.push(quote),
                Err(e) => debug!("Single quote failed for {}: {}", symbol, e),
            }
        }

        let usable = index_usable(quotes);
        if usable.is_empty() {
            return Acquired::Nothing;
        }

        info!(
            "Recovered {}/{} quotes via per-symbol requests",
            usable.len(),
            symbols.len()
        );
        Acquired::Quotes {
            outcome: QuoteOutcome::PartialLive,
            quotes: usable,
        }
    }

    fn enrich_live(&self, quotes: &HashMap<String, QuoteSnapshot>) -> Vec<EnrichedRow> {
        self.catalog
            .entries()
            .iter()
            .filter_map(|entry| quotes.get(&entry.symbol).map(|q| enrich(entry, q)))
            .collect()
    }

    /// One synthetic row per entry. Each symbol draws from its own seeded
    /// generator, so a fund shows the same numbers under every filter set.
    fn synthesize(&self) -> Vec<EnrichedRow> {
        self.catalog
            .entries()
            .iter()
            .map(|entry| {
                let mut rng = StdRng::seed_from_u64(symbol_seed(&entry.symbol));
                synthetic_row(entry, &mut rng)
            })
            .collect()
    }
}

/// Keep quotes that pass the data-quality guard, first occurrence per symbol.
fn index_usable(quotes: Vec<QuoteSnapshot>) -> HashMap<String, QuoteSnapshot> {
    let mut usable = HashMap::with_capacity(quotes.len());
    for quote in quotes {
        if !quote.has_usable_data() {
            warn!("Quote for {} has no price or name, skipped", quote.symbol);
            continue;
        }
        usable.entry(quote.symbol.clone()).or_insert(quote);
    }
    usable
}

/// Stable across processes: `FxHasher` is not randomly keyed.
fn symbol_seed(symbol: &str) -> u64 {
    let mut hasher = FxHasher::default();
    symbol.hash(&mut hasher);
    hasher.finish()
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x != 0.0 && x.is_finite())
}

/// Merge a live quote with its catalog entry.
pub fn enrich(entry: &TickerEntry, quote: &QuoteSnapshot) -> EnrichedRow {
    let price = positive(quote.last_price);
    let previous = positive(quote.previous_close);

    let last_price = price.or(previous).unwrap_or(0.0);
    let change = positive(quote.change_abs)
        .or_else(|| Some(price? - previous?))
        .filter(|c| c.is_finite())
        .unwrap_or(0.0);
    let change_percent = positive(quote.change_pct)
        .unwrap_or_else(|| change / previous.unwrap_or(1.0) * 100.0);

    let ter = quote
        .expense_ratio
        .filter(|t| t.is_finite())
        .unwrap_or(DEFAULT_TER_PCT);
    let perf1y = quote
        .fifty_two_week_change_pct
        .filter(|p| p.is_finite())
        .unwrap_or(DEFAULT_PERF_1Y_PCT);

    let name = [&quote.long_name, &quote.short_name]
        .into_iter()
        .flatten()
        .find(|n| !n.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| entry.symbol.clone());

    EnrichedRow {
        id: entry.symbol.clone(),
        name,
        ticker: entry.symbol.clone(),
        last_price: round2(last_price),
        volume: quote.volume.unwrap_or(0),
        change: round2(change),
        change_percent: round2(change_percent),
        ter: round2(ter),
        perf1y: round2(perf1y),
        esg: entry.esg.clone(),
        match_score: match_score(ter, entry.esg_tier()),
        zone: entry.zone,
        theme: entry.theme,
        is_mock: false,
    }
}

/// Plausible placeholder row for a symbol with no live data.
pub fn synthetic_row<R: Rng + ?Sized>(entry: &TickerEntry, rng: &mut R) -> EnrichedRow {
    let change = round2(rng.gen_range(-1.0..1.0));
    let price = round2(rng.gen_range(90.0..110.0));

    EnrichedRow {
        id: entry.symbol.clone(),
        name: entry.description.clone(),
        ticker: entry.symbol.clone(),
        last_price: price,
        volume: rng.gen_range(0..100_000),
        change,
        change_percent: round2(change / price * 100.0),
        ter: DEFAULT_TER_PCT,
        perf1y: round2(rng.gen_range(-4.0..16.0)),
        esg: entry.esg.clone(),
        match_score: match_score(DEFAULT_TER_PCT, entry.esg_tier()),
        zone: entry.zone,
        theme: entry.theme,
        is_mock: true,
    }
}
