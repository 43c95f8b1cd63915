//! Performance and volatility over a daily price history.

use crate::models::{round2, OhlcvPoint};
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading days per year used to annualize volatility.
const TRADING_DAYS: f64 = 252.0;

/// Lookback window for performance and chart history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookbackPeriod {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
}

impl LookbackPeriod {
    /// Parse `1m`/`1mo`, `3m`/`3mo`, `6m`/`6mo`, `1y`, `2y`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "1m" | "1mo" => Some(Self::OneMonth),
            "3m" | "3mo" => Some(Self::ThreeMonths),
            "6m" | "6mo" => Some(Self::SixMonths),
            "1y" => Some(Self::OneYear),
            "2y" => Some(Self::TwoYears),
            _ => None,
        }
    }

    /// Parse, falling back to `default` for absent or unknown labels.
    pub fn parse_or(label: Option<&str>, default: Self) -> Self {
        label.and_then(Self::parse).unwrap_or(default)
    }

    pub fn months(&self) -> u32 {
        match self {
            Self::OneMonth => 1,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::OneYear => 12,
            Self::TwoYears => 24,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
        }
    }

    /// Start of the window ending at `now`.
    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_months(Months::new(self.months()))
            .unwrap_or(now)
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return and risk over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Total return in percent.
    pub performance: f64,
    /// Annualized volatility in percent.
    pub volatility: f64,
    pub data: Vec<OhlcvPoint>,
}

/// Chart-ready daily point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub value: f64,
    pub volume: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
}

/// Summarize a history; `None` with fewer than two points or a zero start price.
pub fn performance(points: Vec<OhlcvPoint>) -> Option<PerformanceSummary> {
    if points.len() < 2 {
        return None;
    }

    let first = points.first()?.close;
    let last = points.last()?.close;
    if first == 0.0 {
        return None;
    }

    Some(PerformanceSummary {
        performance: round2((last - first) / first * 100.0),
        volatility: round2(annualized_volatility(&points)),
        data: points,
    })
}

/// Annualized volatility of daily simple returns, in percent.
pub fn annualized_volatility(points: &[OhlcvPoint]) -> f64 {
    let returns: Vec<f64> = points
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    (variance * TRADING_DAYS).sqrt() * 100.0
}

/// Chart rows, oldest first.
pub fn chart_rows(points: &[OhlcvPoint]) -> Vec<ChartPoint> {
    let mut sorted: Vec<&OhlcvPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.date);

    sorted
        .into_iter()
        .map(|p| ChartPoint {
            date: p.date.format("%Y-%m-%d").to_string(),
            value: round2(p.close),
            volume: p.volume,
            open: round2(p.open),
            high: round2(p.high),
            low: round2(p.low),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn series(closes: &[f64]) -> Vec<OhlcvPoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvPoint {
                date: Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 0, 0, 0).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10,
                adj_close: close,
            })
            .collect()
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!(LookbackPeriod::parse("6m"), Some(LookbackPeriod::SixMonths));
        assert_eq!(LookbackPeriod::parse("6mo"), Some(LookbackPeriod::SixMonths));
        assert_eq!(LookbackPeriod::parse("5y"), None);
        assert_eq!(
            LookbackPeriod::parse_or(None, LookbackPeriod::OneYear),
            LookbackPeriod::OneYear
        );
    }

    #[test]
    fn test_start_from() {
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap();
        let start = LookbackPeriod::ThreeMonths.start_from(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert_eq!(
            LookbackPeriod::OneYear.start_from(now),
            Utc.with_ymd_and_hms(2023, 5, 31, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_performance() {
        let summary = performance(series(&[100.0, 105.0, 110.0])).unwrap();
        assert_eq!(summary.performance, 10.0);
        assert!(summary.volatility > 0.0);
        assert_eq!(summary.data.len(), 3);
    }

    #[test]
    fn test_performance_needs_two_points() {
        assert!(performance(series(&[100.0])).is_none());
        assert!(performance(Vec::new()).is_none());
    }

    #[test]
    fn test_flat_series_has_zero_volatility() {
        assert_eq!(annualized_volatility(&series(&[50.0, 50.0, 50.0])), 0.0);
    }

    #[test]
    fn test_volatility_value() {
        // Returns +10 % then -10 %: mean 0, population variance 0.01.
        let vol = annualized_volatility(&series(&[100.0, 110.0, 99.0]));
        assert!((vol - (0.01_f64 * 252.0).sqrt() * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_chart_rows_sorted_and_rounded() {
        let mut points = series(&[1.234, 2.345]);
        points.reverse();
        let rows = chart_rows(&points);
        assert_eq!(rows[0].date, "2024-01-01");
        assert_eq!(rows[0].value, 1.23);
        assert_eq!(rows[1].date, "2024-01-02");
    }
}
