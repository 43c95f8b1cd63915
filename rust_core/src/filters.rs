//! ETF list filters.
//!
//! Raw query strings are normalized into typed restrictions once, so the
//! pipeline and the cache key both see the same canonical form.

use crate::models::{EnrichedRow, EsgTier, Theme, Zone};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

/// Filter parameters as received from a caller, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub zone: Option<String>,
    pub sector: Option<String>,
    pub esg: Option<String>,
    pub ter_max: Option<String>,
}

/// Restriction on one filter axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction<T> {
    /// No constraint (absent, empty, or a wildcard label).
    Any,
    Exactly(T),
    /// A label naming no known value; nothing satisfies it.
    Unsatisfiable,
}

impl<T: FromStr> Restriction<T> {
    fn parse(raw: Option<&str>, is_wildcard: fn(&str) -> bool) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Restriction::Any,
            Some(label) if is_wildcard(label) => Restriction::Any,
            Some(label) => label
                .parse()
                .map(Restriction::Exactly)
                .unwrap_or(Restriction::Unsatisfiable),
        }
    }
}

impl<T> Restriction<T> {
    fn key_part(&self, render: impl Fn(&T) -> String) -> String {
        match self {
            Restriction::Any => "*".to_string(),
            Restriction::Exactly(v) => render(v),
            Restriction::Unsatisfiable => "!".to_string(),
        }
    }
}

/// Normalized filter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtfFilters {
    pub zone: Restriction<Zone>,
    pub theme: Restriction<Theme>,
    /// Minimum ESG tier (inclusive).
    pub esg_min: Restriction<EsgTier>,
    /// Maximum TER in percent (inclusive).
    pub ter_max: Option<f64>,
}

impl Default for EtfFilters {
    fn default() -> Self {
        Self {
            zone: Restriction::Any,
            theme: Restriction::Any,
            esg_min: Restriction::Any,
            ter_max: None,
        }
    }
}

impl EtfFilters {
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            zone: Restriction::parse(params.zone.as_deref(), Zone::is_wildcard),
            theme: Restriction::parse(params.sector.as_deref(), Theme::is_wildcard),
            esg_min: Restriction::parse(params.esg.as_deref(), |s| matches!(s, "All" | "Tous")),
            ter_max: params.ter_max.as_deref().and_then(parse_ter_max),
        }
    }

    /// Canonical key with a fixed field order; equivalent filters share a key.
    pub fn cache_key(&self) -> String {
        format!(
            "etfs|zone={}|sector={}|esg={}|terMax={}",
            self.zone.key_part(|z| z.as_str().to_string()),
            self.theme.key_part(|t| t.as_str().to_string()),
            self.esg_min.key_part(|e| e.as_str().to_string()),
            self.ter_max.map_or_else(|| "*".to_string(), |v| format!("{}", v)),
        )
    }

    /// Apply zone, theme, ESG and TER predicates in that order.
    pub fn matches(&self, row: &EnrichedRow) -> bool {
        match self.zone {
            Restriction::Any => {}
            Restriction::Exactly(zone) if row.zone == zone => {}
            _ => return false,
        }

        match self.theme {
            Restriction::Any => {}
            Restriction::Exactly(theme) if row.theme == theme => {}
            _ => return false,
        }

        match self.esg_min {
            Restriction::Any => {}
            Restriction::Exactly(min) => match row.esg.parse::<EsgTier>() {
                Ok(tier) if tier >= min => {}
                _ => return false,
            },
            Restriction::Unsatisfiable => return false,
        }

        match self.ter_max {
            Some(max) => row.ter <= max,
            None => true,
        }
    }
}

impl From<&FilterParams> for EtfFilters {
    fn from(params: &FilterParams) -> Self {
        Self::from_params(params)
    }
}

/// Parse a TER ceiling such as `"≤ 0,20 %"` or `"0.5"`.
///
/// Only the `0.xx` / `0,xx` form is recognized; anything else means no constraint.
pub fn parse_ter_max(raw: &str) -> Option<f64> {
    static PATTERN: OnceLock<Option<regex::Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| regex::Regex::new(r"0[,.]([0-9]+)").ok())
        .as_ref()?;

    let digits = pattern.captures(raw)?.get(1)?.as_str();
    format!("0.{}", digits).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(zone: Zone, theme: Theme, esg: &str, ter: f64) -> EnrichedRow {
        EnrichedRow {
            id: "T".to_string(),
            name: "T".to_string(),
            ticker: "T".to_string(),
            last_price: 100.0,
            volume: 0,
            change: 0.0,
            change_percent: 0.0,
            ter,
            perf1y: 0.0,
            esg: esg.to_string(),
            match_score: 80,
            zone,
            theme,
            is_mock: false,
        }
    }

    fn params(zone: Option<&str>, sector: Option<&str>, esg: Option<&str>, ter: Option<&str>) -> FilterParams {
        FilterParams {
            zone: zone.map(String::from),
            sector: sector.map(String::from),
            esg: esg.map(String::from),
            ter_max: ter.map(String::from),
        }
    }

    #[test]
    fn test_parse_ter_max() {
        assert_eq!(parse_ter_max("≤ 0,20 %"), Some(0.20));
        assert_eq!(parse_ter_max("0.5"), Some(0.5));
        assert_eq!(parse_ter_max("max 0.075%"), Some(0.075));
        assert_eq!(parse_ter_max("cheap"), None);
        assert_eq!(parse_ter_max(""), None);
    }

    #[test]
    fn test_wildcards_and_absent_are_unrestricted() {
        let all = EtfFilters::from_params(&params(Some("All"), Some("Tous"), Some("Tous"), Some("n/a")));
        assert_eq!(all, EtfFilters::default());
        assert!(all.matches(&row(Zone::Asia, Theme::Tech, "B", 3.0)));
    }

    #[test]
    fn test_esg_minimum() {
        let f = EtfFilters::from_params(&params(None, None, Some("AA"), None));
        assert!(!f.matches(&row(Zone::World, Theme::Diversified, "B", 0.2)));
        assert!(!f.matches(&row(Zone::World, Theme::Diversified, "A", 0.2)));
        assert!(f.matches(&row(Zone::World, Theme::Diversified, "AA", 0.2)));
        assert!(f.matches(&row(Zone::World, Theme::Diversified, "AAA", 0.2)));
        // Unknown tier on the row side fails.
        assert!(!f.matches(&row(Zone::World, Theme::Diversified, "C", 0.2)));
    }

    #[test]
    fn test_unknown_requested_tier_fails_everything() {
        let f = EtfFilters::from_params(&params(None, None, Some("Z"), None));
        assert_eq!(f.esg_min, Restriction::Unsatisfiable);
        assert!(!f.matches(&row(Zone::World, Theme::Diversified, "AAA", 0.2)));
    }

    #[test]
    fn test_ter_ceiling() {
        let f = EtfFilters::from_params(&params(None, None, None, Some("≤ 0,20 %")));
        assert!(f.matches(&row(Zone::World, Theme::Diversified, "A", 0.20)));
        assert!(!f.matches(&row(Zone::World, Theme::Diversified, "A", 0.21)));
    }

    #[test]
    fn test_zone_and_theme_exact_match() {
        let f = EtfFilters::from_params(&params(Some("Europe"), Some("Santé"), None, None));
        assert!(f.matches(&row(Zone::Europe, Theme::Health, "A", 0.2)));
        assert!(!f.matches(&row(Zone::World, Theme::Health, "A", 0.2)));
        assert!(!f.matches(&row(Zone::Europe, Theme::Tech, "A", 0.2)));

        let unknown = EtfFilters::from_params(&params(Some("Mars"), None, None, None));
        assert!(!unknown.matches(&row(Zone::Europe, Theme::Health, "A", 0.2)));
    }

    #[test]
    fn test_cache_key_is_canonical() {
        let a = EtfFilters::from_params(&params(Some("Monde"), None, None, None));
        let b = EtfFilters::from_params(&params(Some("World"), Some("All"), Some(""), None));
        assert_eq!(a.cache_key(), b.cache_key());

        let c = EtfFilters::from_params(&params(Some("Europe"), None, None, None));
        assert_ne!(a.cache_key(), c.cache_key());
        assert_eq!(
            EtfFilters::default().cache_key(),
            "etfs|zone=*|sector=*|esg=*|terMax=*"
        );
    }
}
