//! Yahoo Finance API Client
//!
//! Provides fund quotes, daily history and ESG scores from the public
//! Yahoo Finance endpoints. No API key required, but the quote and summary
//! endpoints need a session cookie plus the crumb bound to it.
//!
//! Endpoints:
//! - `/v7/finance/quote` - batch and single quotes (crumb)
//! - `/v8/finance/chart/{symbol}` - daily OHLCV
//! - `/v10/finance/quoteSummary/{symbol}` - ESG scores (crumb)
//! - `/v1/test/getcrumb` - crumb for the current cookie

use super::quote_provider::QuoteProvider;
use crate::models::{OhlcvPoint, QuoteSnapshot};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
/// Any response from this host sets the session cookie.
pub const DEFAULT_SESSION_URL: &str = "https://fc.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Yahoo Finance client implementing QuoteProvider
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    session_url: String,
    /// Fetched lazily, dropped when Yahoo rejects it.
    crumb: RwLock<Option<String>>,
}

impl YahooFinanceClient {
    /// Create a client against the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create with a custom base URL and request timeout
    pub fn with_config(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent("Mozilla/5.0 (compatible; FinancePWA/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_url: DEFAULT_SESSION_URL.to_string(),
            crumb: RwLock::new(None),
        })
    }

    /// Override the host used to obtain the session cookie
    pub fn with_session_url(mut self, session_url: &str) -> Self {
        self.session_url = session_url.to_string();
        self
    }

    async fn send(&self, url: &str, what: &str) -> Result<(StatusCode, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {} from Yahoo Finance", what))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response", what))?;
        Ok((status, body))
    }

    async fn get_text(&self, url: &str, what: &str) -> Result<String> {
        let (status, body) = self.send(url, what).await?;
        if !status.is_success() {
            return Err(anyhow!("Yahoo Finance API error: {} - {}", status, body));
        }
        Ok(body)
    }

    /// Crumb for the current session, running the cookie handshake when none is cached.
    async fn crumb(&self) -> Result<String> {
        let cached = self.crumb.read().clone();
        if let Some(crumb) = cached {
            return Ok(crumb);
        }

        // Only the Set-Cookie header matters here; the host answers 404.
        if let Err(e) = self.client.get(&self.session_url).send().await {
            warn!("Yahoo Finance session cookie request failed: {}", e);
        }

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let crumb = parse_crumb(&self.get_text(&url, "crumb").await?)?;
        debug!("Obtained Yahoo Finance crumb");

        *self.crumb.write() = Some(crumb.clone());
        Ok(crumb)
    }

    /// GET an endpoint that requires a crumb, renewing the session once on 401.
    async fn get_with_crumb(&self, url: &str, what: &str) -> Result<String> {
        let crumb = self.crumb().await?;
        let (status, body) = self.send(&with_crumb(url, &crumb)?, what).await?;

        if status == StatusCode::UNAUTHORIZED {
            debug!("Yahoo Finance rejected crumb for {}, renewing session", what);
            *self.crumb.write() = None;
            let crumb = self.crumb().await?;
            return self.get_text(&with_crumb(url, &crumb)?, what).await;
        }

        if !status.is_success() {
            return Err(anyhow!("Yahoo Finance API error: {} - {}", status, body));
        }
        Ok(body)
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<QuoteSnapshot>> {
        let url = format!(
            "{}/v7/finance/quote?symbols={}",
            self.base_url,
            symbols.join(",")
        );
        let body = self.get_with_crumb(&url, "quotes").await?;
        parse_quote_response(&body)
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceClient {
    fn provider_name(&self) -> &str {
        "YahooFinance"
    }

    async fn batch_quote(&self, symbols: &[String]) -> Result<Vec<QuoteSnapshot>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Fetching {} quotes from Yahoo Finance", symbols.len());
        self.fetch_quotes(symbols).await
    }

    async fn single_quote(&self, symbol: &str) -> Result<QuoteSnapshot> {
        debug!("Fetching quote for {} from Yahoo Finance", symbol);
        self.fetch_quotes(&[symbol.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Quote not found: {}", symbol))
    }

    async fn historical(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OhlcvPoint>> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            symbol,
            from.timestamp(),
            to.timestamp()
        );
        debug!("Fetching daily chart for {} from Yahoo Finance", symbol);
        let body = self.get_text(&url, "chart").await?;
        parse_chart_response(&body)
    }

    async fn esg_score(&self, symbol: &str) -> Result<Option<f64>> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=esgScores",
            self.base_url, symbol
        );
        let body = self.get_with_crumb(&url, "ESG scores").await?;
        parse_esg_response(&body)
    }
}

// ============================================================================
// Wire formats
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    regular_market_price: Option<f64>,
    #[serde(alias = "previousClose")]
    regular_market_previous_close: Option<f64>,
    regular_market_volume: Option<u64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    long_name: Option<String>,
    short_name: Option<String>,
    /// Fraction (0.002 means 0.2 %).
    net_expense_ratio: Option<f64>,
    fifty_two_week_change_percent: Option<f64>,
}

impl From<YahooQuote> for QuoteSnapshot {
    fn from(q: YahooQuote) -> Self {
        QuoteSnapshot {
            symbol: q.symbol,
            last_price: q.regular_market_price,
            previous_close: q.regular_market_previous_close,
            volume: q.regular_market_volume,
            change_abs: q.regular_market_change,
            change_pct: q.regular_market_change_percent,
            long_name: q.long_name,
            short_name: q.short_name,
            expense_ratio: q.net_expense_ratio.map(|r| r * 100.0),
            fifty_two_week_change_pct: q.fifty_two_week_change_percent,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartResponse,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Vec<ChartAdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct ChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryResponse,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    esg_scores: Option<EsgScores>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EsgScores {
    total_esg: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Append the crumb as a query parameter, percent-encoded.
fn with_crumb(url: &str, crumb: &str) -> Result<String> {
    let mut url = Url::parse(url).with_context(|| format!("Invalid Yahoo Finance URL: {}", url))?;
    url.query_pairs_mut().append_pair("crumb", crumb);
    Ok(url.into())
}

/// The crumb endpoint answers with the bare token, or an HTML/JSON error page.
fn parse_crumb(body: &str) -> Result<String> {
    let crumb = body.trim();
    let malformed = crumb.is_empty()
        || crumb.len() > 64
        || crumb.contains(|c: char| c.is_whitespace() || c == '<' || c == '{');
    if malformed {
        return Err(anyhow!("Yahoo Finance returned no usable crumb"));
    }
    Ok(crumb.to_string())
}

fn parse_quote_response(body: &str) -> Result<Vec<QuoteSnapshot>> {
    let envelope: QuoteEnvelope =
        serde_json::from_str(body).context("Failed to parse Yahoo Finance quote response")?;

    if let Some(error) = envelope.quote_response.error.filter(|e| !e.is_null()) {
        return Err(anyhow!("Yahoo Finance quote error: {}", error));
    }

    Ok(envelope
        .quote_response
        .result
        .into_iter()
        .map(QuoteSnapshot::from)
        .collect())
}

/// Holidays come back as null closes and are dropped.
fn parse_chart_response(body: &str) -> Result<Vec<OhlcvPoint>> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("Failed to parse Yahoo Finance chart response")?;

    if let Some(error) = envelope.chart.error.filter(|e| !e.is_null()) {
        return Err(anyhow!("Yahoo Finance chart error: {}", error));
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("Yahoo Finance chart response has no result"))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adj = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

    let points = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = at(&quote.close, i)?;
            let date = Utc.timestamp_opt(ts, 0).single()?;
            Some(OhlcvPoint {
                date,
                open: at(&quote.open, i).unwrap_or(close),
                high: at(&quote.high, i).unwrap_or(close),
                low: at(&quote.low, i).unwrap_or(close),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
                adj_close: at(&adj, i).unwrap_or(close),
            })
        })
        .collect();

    Ok(points)
}

fn parse_esg_response(body: &str) -> Result<Option<f64>> {
    let envelope: SummaryEnvelope =
        serde_json::from_str(body).context("Failed to parse Yahoo Finance summary response")?;

    Ok(envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.esg_scores)
        .and_then(|s| s.total_esg)
        .and_then(|t| t.raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quote_response() {
        let body = r#"{"quoteResponse":{"result":[
            {"symbol":"CW8.PA","regularMarketPrice":512.3,"regularMarketPreviousClose":510.0,
             "regularMarketVolume":1234,"regularMarketChange":2.3,"regularMarketChangePercent":0.45,
             "longName":"Amundi MSCI World","netExpenseRatio":0.0038,"fiftyTwoWeekChangePercent":14.2},
            {"symbol":"DEAD.PA"}
        ],"error":null}}"#;

        let quotes = parse_quote_response(body).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].symbol, "CW8.PA");
        assert_eq!(quotes[0].volume, Some(1234));
        assert!((quotes[0].expense_ratio.unwrap() - 0.38).abs() < 1e-9);
        assert!(quotes[1].last_price.is_none());
        assert!(!quotes[1].has_usable_data());
    }

    #[test]
    fn test_parse_quote_error() {
        let body = r#"{"quoteResponse":{"result":[],"error":{"code":"Unauthorized"}}}"#;
        assert!(parse_quote_response(body).is_err());
    }

    #[test]
    fn test_parse_chart_skips_null_closes() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1700000000,1700086400,1700172800],
            "indicators":{
                "quote":[{"open":[1.0,null,3.0],"high":[1.5,null,3.5],"low":[0.5,null,2.5],
                          "close":[1.2,null,3.2],"volume":[100,null,300]}],
                "adjclose":[{"adjclose":[1.1,null,3.1]}]
            }}],"error":null}}"#;

        let points = parse_chart_response(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].close, 3.2);
        assert_eq!(points[1].adj_close, 3.1);
        assert_eq!(points[1].volume, 300);
    }

    #[test]
    fn test_parse_chart_without_result_fails() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#;
        assert!(parse_chart_response(body).is_err());
    }

    #[test]
    fn test_parse_esg_response() {
        let body = r#"{"quoteSummary":{"result":[{"esgScores":{"totalEsg":{"raw":21.5,"fmt":"21.5"}}}],"error":null}}"#;
        assert_eq!(parse_esg_response(body).unwrap(), Some(21.5));

        let empty = r#"{"quoteSummary":{"result":[{}],"error":null}}"#;
        assert_eq!(parse_esg_response(empty).unwrap(), None);
    }

    #[test]
    fn test_with_crumb_encodes_token() {
        let url = with_crumb(
            "https://query1.finance.yahoo.com/v7/finance/quote?symbols=CW8.PA,EWLD.PA",
            "aB/c.d",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://query1.finance.yahoo.com/v7/finance/quote?symbols=CW8.PA,EWLD.PA&crumb=aB%2Fc.d"
        );

        let bare = with_crumb("https://example.com/v10/finance/quoteSummary/CW8.PA", "x").unwrap();
        assert!(bare.ends_with("CW8.PA?crumb=x"));
        assert!(with_crumb("not a url", "x").is_err());
    }

    #[test]
    fn test_parse_crumb() {
        assert_eq!(parse_crumb("Xy1.aB/cD\n").unwrap(), "Xy1.aB/cD");
        assert_eq!(parse_crumb(" kq9WpQ2x4Zr \n").unwrap(), "kq9WpQ2x4Zr");
        assert!(parse_crumb("").is_err());
        assert!(parse_crumb("<html><body>Too Many Requests</body></html>").is_err());
        assert!(parse_crumb(r#"{"finance":{"error":{"code":"Unauthorized"}}}"#).is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_single_quote() {
        let client = YahooFinanceClient::new().unwrap();
        let quote = client.single_quote("CW8.PA").await.unwrap();
        assert_eq!(quote.symbol, "CW8.PA");
        assert!(quote.has_usable_data());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_historical() {
        let client = YahooFinanceClient::new().unwrap();
        let to = Utc::now();
        let from = to - chrono::Duration::days(30);
        let points = client.historical("CW8.PA", from, to).await.unwrap();
        assert!(!points.is_empty());
    }
}
