// Shared models for the ETF service
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Classification Enums
// ============================================================================

/// Sustainability rating, ordered `B < A < AA < AAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EsgTier {
    B,
    A,
    AA,
    AAA,
}

impl EsgTier {
    pub const ALL: [EsgTier; 4] = [EsgTier::B, EsgTier::A, EsgTier::AA, EsgTier::AAA];

    pub fn as_str(&self) -> &'static str {
        match self {
            EsgTier::B => "B",
            EsgTier::A => "A",
            EsgTier::AA => "AA",
            EsgTier::AAA => "AAA",
        }
    }

    /// Steps above the lowest tier.
    pub fn rank(&self) -> u8 {
        match self {
            EsgTier::B => 0,
            EsgTier::A => 1,
            EsgTier::AA => 2,
            EsgTier::AAA => 3,
        }
    }
}

impl FromStr for EsgTier {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "B" => Ok(EsgTier::B),
            "A" => Ok(EsgTier::A),
            "AA" => Ok(EsgTier::AA),
            "AAA" => Ok(EsgTier::AAA),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

impl fmt::Display for EsgTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic exposure of a fund.
///
/// The catalog files were written with French labels, which are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    #[serde(alias = "Monde")]
    World,
    Europe,
    #[serde(alias = "Amérique")]
    Americas,
    #[serde(alias = "Asie")]
    Asia,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::World => "World",
            Zone::Europe => "Europe",
            Zone::Americas => "Americas",
            Zone::Asia => "Asia",
        }
    }

    /// Labels meaning "no restriction" in a zone filter.
    pub fn is_wildcard(label: &str) -> bool {
        matches!(label.trim(), "All" | "Toutes")
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::World
    }
}

impl FromStr for Zone {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "World" | "Monde" => Ok(Zone::World),
            "Europe" => Ok(Zone::Europe),
            "Americas" | "Amérique" => Ok(Zone::Americas),
            "Asia" | "Asie" => Ok(Zone::Asia),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Investment theme of a fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    #[serde(alias = "Large cap")]
    LargeCap,
    #[serde(alias = "Small cap")]
    SmallCap,
    #[serde(alias = "Technologie")]
    Tech,
    #[serde(alias = "Santé")]
    Health,
    #[serde(alias = "Diversifié")]
    Diversified,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::LargeCap => "LargeCap",
            Theme::SmallCap => "SmallCap",
            Theme::Tech => "Tech",
            Theme::Health => "Health",
            Theme::Diversified => "Diversified",
        }
    }

    /// Labels meaning "no restriction" in a theme filter.
    pub fn is_wildcard(label: &str) -> bool {
        matches!(label.trim(), "All" | "Tous")
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Diversified
    }
}

impl FromStr for Theme {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "LargeCap" | "Large cap" => Ok(Theme::LargeCap),
            "SmallCap" | "Small cap" => Ok(Theme::SmallCap),
            "Tech" | "Technologie" => Ok(Theme::Tech),
            "Health" | "Santé" => Ok(Theme::Health),
            "Diversified" | "Diversifié" => Ok(Theme::Diversified),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// A label that names none of the known enum variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown label: {0}")]
pub struct UnknownLabel(pub String);

// ============================================================================
// Catalog & Provider Data
// ============================================================================

/// Default ESG label for a listed symbol without metadata.
pub const DEFAULT_ESG_LABEL: &str = "A";

/// Static reference data for one fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerEntry {
    pub symbol: String,
    pub description: String,
    pub zone: Zone,
    pub theme: Theme,
    /// Raw rating label; may name no known tier.
    pub esg: String,
}

impl TickerEntry {
    /// Entry for a listed symbol that has no metadata record.
    pub fn bare(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            description: symbol.to_string(),
            zone: Zone::default(),
            theme: Theme::default(),
            esg: DEFAULT_ESG_LABEL.to_string(),
        }
    }

    pub fn esg_tier(&self) -> Option<EsgTier> {
        self.esg.parse().ok()
    }
}

/// One quote as returned by the market-data provider.
///
/// Every numeric field is optional: providers return partial shells for
/// delisted or illiquid symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub last_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<u64>,
    pub change_abs: Option<f64>,
    pub change_pct: Option<f64>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    /// Total expense ratio in percent (0.2 means 0.2 %).
    pub expense_ratio: Option<f64>,
    pub fifty_two_week_change_pct: Option<f64>,
}

impl QuoteSnapshot {
    /// Whether the quote carries any price or name signal at all.
    pub fn has_usable_data(&self) -> bool {
        let nonzero = |v: Option<f64>| v.map_or(false, |x| x != 0.0 && x.is_finite());
        let named = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());

        nonzero(self.last_price)
            || nonzero(self.previous_close)
            || named(&self.long_name)
            || named(&self.short_name)
    }
}

/// Daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OhlcvPoint {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

// ============================================================================
// Derived Rows
// ============================================================================

/// A catalog entry merged with live (or synthetic) market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRow {
    pub id: String,
    pub name: String,
    pub ticker: String,
    pub last_price: f64,
    pub volume: u64,
    pub change: f64,
    pub change_percent: f64,
    pub ter: f64,
    pub perf1y: f64,
    pub esg: String,
    #[serde(rename = "match")]
    pub match_score: u8,
    pub zone: Zone,
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_mock: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Round to two decimals, the precision every price field is served with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
