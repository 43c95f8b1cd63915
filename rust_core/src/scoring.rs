//! Match score: a 0-100 suitability metric combining fund cost and ESG rating.
//!
//! The weighting is fixed policy and not configurable.

use crate::models::EsgTier;

/// Weight of the cost component.
pub const COST_WEIGHT: f64 = 0.4;
/// Weight of the ESG component.
pub const ESG_WEIGHT: f64 = 0.6;
/// Cost score lost per TER percentage point; 2 % floors it at zero.
const COST_PENALTY_PER_PCT: f64 = 50.0;
const ESG_BASE: f64 = 60.0;
const ESG_STEP: f64 = 13.0;
/// ESG score for a label that names no known tier.
const ESG_UNRATED: f64 = 70.0;

/// Cost component: `max(0, 100 - 50 * ter)`.
pub fn cost_score(ter: f64) -> f64 {
    (100.0 - ter * COST_PENALTY_PER_PCT).max(0.0)
}

/// ESG component: 60 for B, +13 per tier above it, 70 when unrated.
pub fn esg_score(tier: Option<EsgTier>) -> f64 {
    match tier {
        Some(tier) => ESG_BASE + ESG_STEP * tier.rank() as f64,
        None => ESG_UNRATED,
    }
}

/// Match score for a parsed tier.
pub fn match_score(ter: f64, tier: Option<EsgTier>) -> u8 {
    let ter = if ter.is_finite() { ter } else { 0.0 };
    let raw = COST_WEIGHT * cost_score(ter) + ESG_WEIGHT * esg_score(tier);
    raw.round().clamp(0.0, 100.0) as u8
}

/// Match score from a raw rating label.
pub fn compute_match(ter: f64, esg: &str) -> u8 {
    match_score(ter, esg.parse().ok())
}
