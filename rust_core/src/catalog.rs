//! Ticker catalog: static fund reference data.
//!
//! This module provides:
//! - Loading from two JSON documents (symbol listing + per-symbol metadata)
//! - Symbol lookup in O(1), iteration in listing order
//! - Degraded (empty) mode when the backing files are missing or malformed

use crate::models::{Theme, TickerEntry, UnknownLabel, Zone, DEFAULT_ESG_LABEL};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while reading catalog sources.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Metadata record as stored in the meta document.
///
/// Missing or unrecognized fields fall back to the same defaults as an
/// unlisted symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerMeta {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub zone: Option<Zone>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub esg: Option<String>,
}

impl TickerMeta {
    /// Read one record field by field, so a bad label only costs that field.
    ///
    /// Returns `None` for a record that is not an object.
    pub fn from_record(symbol: &str, record: &Value) -> Option<Self> {
        let Some(fields) = record.as_object() else {
            warn!("Metadata for {} is not an object, using defaults", symbol);
            return None;
        };
        let text = |key: &'static str| fields.get(key).and_then(Value::as_str);

        Some(Self {
            description: text("description").map(str::to_string),
            zone: text("zone").and_then(|label| parse_label(symbol, "zone", label)),
            theme: text("theme").and_then(|label| parse_label(symbol, "theme", label)),
            esg: text("esg").map(str::to_string),
        })
    }
}

fn parse_label<T: FromStr<Err = UnknownLabel>>(symbol: &str, field: &str, label: &str) -> Option<T> {
    match label.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} for {}: {}, using default", field, symbol, e);
            None
        }
    }
}

/// Immutable fund catalog, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct TickerCatalog {
    entries: Vec<TickerEntry>,
    index: FxHashMap<String, usize>,
}

impl TickerCatalog {
    /// Create an empty catalog.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from the listing and metadata files.
    ///
    /// Never fails: any read or parse error is logged and yields an empty catalog.
    pub fn load(tickers_path: impl AsRef<Path>, meta_path: impl AsRef<Path>) -> Self {
        match Self::try_load(tickers_path.as_ref(), meta_path.as_ref()) {
            Ok(catalog) => {
                info!("Loaded ETF catalog with {} symbols", catalog.len());
                catalog
            }
            Err(e) => {
                warn!("ETF catalog unavailable, running with empty catalog: {}", e);
                Self::empty()
            }
        }
    }

    /// Load from the listing and metadata files, surfacing errors.
    pub fn try_load(tickers_path: &Path, meta_path: &Path) -> Result<Self, CatalogError> {
        let symbols: Vec<String> = read_json(tickers_path)?;
        let records: HashMap<String, Value> = read_json(meta_path)?;

        let meta = records
            .iter()
            .filter_map(|(symbol, record)| {
                TickerMeta::from_record(symbol, record).map(|m| (symbol.clone(), m))
            })
            .collect();
        Ok(Self::from_parts(symbols, meta))
    }

    /// Build from already-parsed documents. Duplicate symbols keep their first position.
    pub fn from_parts(symbols: Vec<String>, mut meta: HashMap<String, TickerMeta>) -> Self {
        let mut catalog = Self::empty();

        for symbol in symbols {
            let symbol = symbol.trim().to_string();
            if symbol.is_empty() || catalog.index.contains_key(&symbol) {
                continue;
            }

            let entry = match meta.remove(&symbol) {
                Some(m) => TickerEntry {
                    description: m.description.unwrap_or_else(|| symbol.clone()),
                    zone: m.zone.unwrap_or_default(),
                    theme: m.theme.unwrap_or_default(),
                    esg: m.esg.unwrap_or_else(|| DEFAULT_ESG_LABEL.to_string()),
                    symbol: symbol.clone(),
                },
                None => TickerEntry::bare(&symbol),
            };

            catalog.index.insert(symbol, catalog.entries.len());
            catalog.entries.push(entry);
        }

        catalog
    }

    /// Build directly from entries, mainly for tests and embedding.
    pub fn from_entries(entries: impl IntoIterator<Item = TickerEntry>) -> Self {
        let mut catalog = Self::empty();
        for entry in entries {
            if catalog.index.contains_key(&entry.symbol) {
                continue;
            }
            catalog.index.insert(entry.symbol.clone(), catalog.entries.len());
            catalog.entries.push(entry);
        }
        catalog
    }

    pub fn lookup(&self, symbol: &str) -> Option<&TickerEntry> {
        self.index.get(symbol).map(|&i| &self.entries[i])
    }

    /// Entries in listing order.
    pub fn entries(&self) -> &[TickerEntry] {
        &self.entries
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("etf_catalog_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_from_parts_keeps_listing_order_and_defaults() {
        let mut meta = HashMap::new();
        meta.insert(
            "CW8.PA".to_string(),
            TickerMeta {
                description: Some("Amundi MSCI World".to_string()),
                zone: Some(Zone::World),
                theme: Some(Theme::LargeCap),
                esg: Some("AA".to_string()),
            },
        );

        let catalog = TickerCatalog::from_parts(
            vec!["PAEEM.PA".into(), "CW8.PA".into(), "PAEEM.PA".into()],
            meta,
        );

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.symbols(), vec!["PAEEM.PA", "CW8.PA"]);

        let bare = catalog.lookup("PAEEM.PA").unwrap();
        assert_eq!(bare.description, "PAEEM.PA");
        assert_eq!(bare.zone, Zone::World);
        assert_eq!(bare.theme, Theme::Diversified);
        assert_eq!(bare.esg, "A");

        let cw8 = catalog.lookup("CW8.PA").unwrap();
        assert_eq!(cw8.theme, Theme::LargeCap);
        assert_eq!(cw8.esg_tier(), Some(crate::models::EsgTier::AA));
        assert!(catalog.lookup("SPY").is_none());
    }

    #[test]
    fn test_load_from_files_with_french_labels() {
        let tickers = write_temp("tickers_ok.json", r#"["EWLD.PA", "HLT.PA"]"#);
        let meta = write_temp(
            "meta_ok.json",
            r#"{
                "EWLD.PA": {"description": "Lyxor MSCI World", "zone": "Monde", "theme": "Diversifié", "esg": "A"},
                "HLT.PA": {"description": "Amundi Health", "zone": "Europe", "theme": "Santé", "esg": "AAA"}
            }"#,
        );

        let catalog = TickerCatalog::load(&tickers, &meta);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("HLT.PA").unwrap().theme, Theme::Health);
    }

    #[test]
    fn test_unknown_labels_only_default_their_field() {
        let tickers = write_temp("tickers_labels.json", r#"["CW8.PA", "EMIM.PA", "WLDH.PA"]"#);
        let meta = write_temp(
            "meta_labels.json",
            r#"{
                "CW8.PA": {"description": "Amundi MSCI World", "zone": "Monde", "theme": "Diversifié", "esg": "AA"},
                "EMIM.PA": {"description": "iShares Emerging Markets", "zone": "Émergents", "theme": "Diversifié", "esg": "B"},
                "WLDH.PA": ["not", "an", "object"]
            }"#,
        );

        let catalog = TickerCatalog::load(&tickers, &meta);
        assert_eq!(catalog.len(), 3);

        let cw8 = catalog.lookup("CW8.PA").unwrap();
        assert_eq!(cw8.description, "Amundi MSCI World");
        assert_eq!(cw8.esg, "AA");

        let emim = catalog.lookup("EMIM.PA").unwrap();
        assert_eq!(emim.description, "iShares Emerging Markets");
        assert_eq!(emim.zone, Zone::World);
        assert_eq!(emim.theme, Theme::Diversified);
        assert_eq!(emim.esg, "B");

        assert_eq!(catalog.lookup("WLDH.PA").unwrap().description, "WLDH.PA");
    }

    #[test]
    fn test_meta_record_with_unknown_theme() {
        let record = serde_json::json!({"zone": "Europe", "theme": "Sectoriel", "esg": 3});
        let meta = TickerMeta::from_record("SEC.PA", &record).unwrap();
        assert_eq!(meta.zone, Some(Zone::Europe));
        assert_eq!(meta.theme, None);
        assert_eq!(meta.esg, None);
    }

    #[test]
    fn test_missing_file_yields_empty_catalog() {
        let catalog = TickerCatalog::load("/nonexistent/tickers.json", "/nonexistent/meta.json");
        assert!(catalog.is_empty());

        let err = TickerCatalog::try_load(
            Path::new("/nonexistent/tickers.json"),
            Path::new("/nonexistent/meta.json"),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_yields_empty_catalog() {
        let tickers = write_temp("tickers_bad.json", r#"{"not": "an array"}"#);
        let meta = write_temp("meta_bad.json", "{}");

        assert!(TickerCatalog::load(&tickers, &meta).is_empty());
        assert!(matches!(
            TickerCatalog::try_load(&tickers, &meta),
            Err(CatalogError::Malformed { .. })
        ));
    }
}
