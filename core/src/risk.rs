//! Derived-metric calculator: transaction composites and the integrated
//! per-site risk score.
//!
//! Sub-score sources:
//!   land change: the site's generator-supplied anomaly scalar
//!   financial: the site's suspicion score
//!   official: mean risk of officials connected to the site
//!   transaction: mean composite of those officials' transactions
//!
//! A site with no connected officials (or no transactions) gets 0.0 for
//! that sub-score; the linked counts on the row make the gap visible.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::{PatternWeights, RiskConfig, SubScoreWeights},
    dataset::{FinancialRecord, Official, PatternScores, Site, Transaction},
    error::{DashError, DashResult},
    types::{EntityId, LicenseType, RiskCategory, TransactionFlag},
};

/// Bucket a score by the configured breakpoints (upper bounds inclusive).
pub fn categorize(score: f64, config: &RiskConfig) -> RiskCategory {
    if score <= config.low_max {
        RiskCategory::Low
    } else if score <= config.medium_max {
        RiskCategory::Medium
    } else {
        RiskCategory::High
    }
}

/// Weighted blend of the three pattern strengths, clamped to [0, 1].
pub fn composite_score(patterns: &PatternScores, weights: &PatternWeights) -> f64 {
    let raw = patterns.structuring * weights.structuring
        + patterns.velocity * weights.velocity
        + patterns.layering * weights.layering;
    raw.clamp(0.0, 1.0)
}

/// Composite above threshold always flags; the independent random flag
/// can only add suspicion, never remove it.
pub fn transaction_flag(composite: f64, threshold: f64, random_flag: bool) -> TransactionFlag {
    if composite > threshold || random_flag {
        TransactionFlag::Suspicious
    } else {
        TransactionFlag::Normal
    }
}

/// Mean of the values, or 0.0 for an empty set.
pub fn mean_or_zero<I: IntoIterator<Item = f64>>(values: I) -> (f64, usize) {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        (0.0, 0)
    } else {
        (sum / n as f64, n)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SubScores {
    pub land_change: f64,
    pub financial: f64,
    pub official: f64,
    pub transaction: f64,
}

impl SubScores {
    pub const FEATURE_NAMES: [&'static str; 4] =
        ["land_change", "financial", "official", "transaction"];

    pub fn new(land_change: f64, financial: f64, official: f64, transaction: f64) -> Self {
        Self { land_change, financial, official, transaction }
    }

    pub fn as_features(&self) -> [f64; 4] {
        [self.land_change, self.financial, self.official, self.transaction]
    }

    pub fn from_features(f: [f64; 4]) -> Self {
        Self::new(f[0], f[1], f[2], f[3])
    }

    /// Weighted average, clamped to [0, 1].
    pub fn integrated(&self, weights: &SubScoreWeights) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        let raw = self.land_change * weights.land_change
            + self.financial * weights.financial
            + self.official * weights.official
            + self.transaction * weights.transaction;
        (raw / total).clamp(0.0, 1.0)
    }
}

/// One joined row per site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegratedRisk {
    pub site_id: EntityId,
    pub site_name: String,
    pub district: String,
    pub license_type: LicenseType,
    pub sub_scores: SubScores,
    pub officials_linked: usize,
    pub transactions_linked: usize,
    pub score: f64,
    pub category: RiskCategory,
}

/// Join the four tables into one integrated-risk row per site.
///
/// Any site missing its financial record aborts the whole computation.
pub fn compute_integrated_risk(
    sites: &[Site],
    financials: &[FinancialRecord],
    officials: &[Official],
    transactions: &[Transaction],
    config: &RiskConfig,
) -> DashResult<Vec<IntegratedRisk>> {
    if sites.is_empty() {
        return Err(DashError::no_data("no sites match the current filters"));
    }

    let fin_by_site: HashMap<&str, &FinancialRecord> =
        financials.iter().map(|f| (f.site_id.as_str(), f)).collect();

    let mut officials_by_site: HashMap<&str, Vec<&Official>> = HashMap::new();
    let mut site_of_official: HashMap<&str, &str> = HashMap::new();
    for o in officials {
        if let Some(site_id) = o.connected_site.as_deref() {
            officials_by_site.entry(site_id).or_default().push(o);
            site_of_official.insert(o.id.as_str(), site_id);
        }
    }

    let mut composites_by_site: HashMap<&str, Vec<f64>> = HashMap::new();
    for t in transactions {
        if let Some(&site_id) = site_of_official.get(t.official_id.as_str()) {
            composites_by_site
                .entry(site_id)
                .or_default()
                .push(t.composite_score);
        }
    }

    let mut rows = Vec::with_capacity(sites.len());
    for site in sites {
        let fin = fin_by_site
            .get(site.id.as_str())
            .ok_or_else(|| DashError::MissingFinancials { site_id: site.id.clone() })?;

        let (official, officials_linked) = mean_or_zero(
            officials_by_site
                .get(site.id.as_str())
                .into_iter()
                .flatten()
                .map(|o| o.risk_score),
        );
        let (transaction, transactions_linked) = mean_or_zero(
            composites_by_site
                .get(site.id.as_str())
                .into_iter()
                .flatten()
                .copied(),
        );

        let sub_scores = SubScores::new(
            site.land_anomaly,
            fin.suspicion_score,
            official,
            transaction,
        );
        let score = sub_scores.integrated(&config.weights);

        rows.push(IntegratedRisk {
            site_id: site.id.clone(),
            site_name: site.name.clone(),
            district: site.district.clone(),
            license_type: site.license_type,
            sub_scores,
            officials_linked,
            transactions_linked,
            score,
            category: categorize(score, config),
        });
    }

    log::debug!(
        "integrated risk: {} sites, {} high",
        rows.len(),
        rows.iter().filter(|r| r.category == RiskCategory::High).count()
    );
    Ok(rows)
}

/// Count of rows per category, in ordinal order.
pub fn category_counts(rows: &[IntegratedRisk]) -> [(RiskCategory, usize); 3] {
    RiskCategory::ALL.map(|c| (c, rows.iter().filter(|r| r.category == c).count()))
}
