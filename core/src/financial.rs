//! Financial estimation from land change.
//!
//! Basic dashboard: revenue and cost scale with hectares cleared.
//! Regulator dashboard: compare what was reported with what the land
//! change implies, and how much tax that reported figure carried.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    dataset::{FinancialRecord, Mine, MineFinancials, Site},
    error::{DashError, DashResult},
    land::{percent_change, LandChange},
};

pub const MIN_PRICE_FACTOR: f64 = 0.5;
pub const MAX_PRICE_FACTOR: f64 = 1.5;

// ── Basic dashboard ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MineEstimate {
    pub name: String,
    pub land_change_ha: f64,
    pub area_2023: f64,
    pub estimated_revenue: f64,
    pub estimated_cost: f64,
    pub estimated_profit: f64,
    /// None when the mine did not change area.
    pub profit_per_ha: Option<f64>,
    pub tax_paid_2022: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EstimateTotals {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

/// Join mines with their per-hectare economics.
pub fn estimate_mines(
    mines: &[Mine],
    financials: &[MineFinancials],
) -> DashResult<Vec<MineEstimate>> {
    let by_mine: HashMap<&str, &MineFinancials> =
        financials.iter().map(|f| (f.mine.as_str(), f)).collect();

    mines
        .iter()
        .map(|mine| {
            let fin = by_mine
                .get(mine.name.as_str())
                .ok_or_else(|| DashError::MissingFinancials { site_id: mine.name.clone() })?;
            let change = LandChange::from_mine(mine).change_ha;
            let revenue = change * fin.revenue_per_ha;
            let cost = change * fin.cost_per_ha;
            let profit = revenue - cost;
            Ok(MineEstimate {
                name: mine.name.clone(),
                land_change_ha: change,
                area_2023: mine.area_2023,
                estimated_revenue: revenue,
                estimated_cost: cost,
                estimated_profit: profit,
                profit_per_ha: (change != 0.0).then(|| profit / change),
                tax_paid_2022: fin.tax_paid_2022,
            })
        })
        .collect()
}

pub fn totals(estimates: &[MineEstimate]) -> EstimateTotals {
    estimates.iter().fold(EstimateTotals::default(), |acc, e| EstimateTotals {
        revenue: acc.revenue + e.estimated_revenue,
        cost: acc.cost + e.estimated_cost,
        profit: acc.profit + e.estimated_profit,
    })
}

/// Each mine's share of the total tax paid, in percent.
pub fn tax_shares(estimates: &[MineEstimate]) -> Vec<(String, f64)> {
    let total: f64 = estimates.iter().map(|e| e.tax_paid_2022).sum();
    estimates
        .iter()
        .map(|e| {
            let share = if total > 0.0 { e.tax_paid_2022 / total * 100.0 } else { 0.0 };
            (e.name.clone(), share)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostBenefit {
    pub mine: String,
    pub area_ha: f64,
    pub price_factor: f64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

/// What-if economics for a custom area and commodity price factor.
/// The factor is clamped to the slider range.
pub fn cost_benefit(fin: &MineFinancials, area_ha: f64, price_factor: f64) -> DashResult<CostBenefit> {
    if !area_ha.is_finite() || !price_factor.is_finite() {
        return Err(DashError::InvalidInput("area and price factor must be finite".into()));
    }
    let factor = price_factor.clamp(MIN_PRICE_FACTOR, MAX_PRICE_FACTOR);
    let revenue = area_ha * fin.revenue_per_ha * factor;
    let cost = area_ha * fin.cost_per_ha;
    Ok(CostBenefit {
        mine: fin.mine.clone(),
        area_ha,
        price_factor: factor,
        revenue,
        cost,
        profit: revenue - cost,
    })
}

// ── Regulator dashboard ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenueGap {
    pub site_id: String,
    pub site_name: String,
    pub reported_revenue: f64,
    pub estimated_revenue: f64,
    /// Estimated minus reported; positive means under-reporting.
    pub gap: f64,
    /// Gap as a percentage of the estimate.
    pub gap_percent: Option<f64>,
    /// Tax paid over reported revenue.
    pub effective_tax_rate: Option<f64>,
    pub suspicion_score: f64,
}

impl RevenueGap {
    /// Fractional under-reporting, 0 when not under-reported.
    pub fn gap_ratio(&self) -> f64 {
        self.gap_percent.map_or(0.0, |p| (p / 100.0).max(0.0))
    }
}

pub fn revenue_gaps(sites: &[Site], financials: &[FinancialRecord]) -> DashResult<Vec<RevenueGap>> {
    let by_site: HashMap<&str, &FinancialRecord> =
        financials.iter().map(|f| (f.site_id.as_str(), f)).collect();

    sites
        .iter()
        .map(|site| {
            let fin = by_site
                .get(site.id.as_str())
                .ok_or_else(|| DashError::MissingFinancials { site_id: site.id.clone() })?;
            let gap = fin.estimated_revenue - fin.reported_revenue;
            // Share of the estimate that went unreported.
            let gap_percent = percent_change(fin.estimated_revenue, fin.reported_revenue).map(|p| -p);
            Ok(RevenueGap {
                site_id: site.id.clone(),
                site_name: site.name.clone(),
                reported_revenue: fin.reported_revenue,
                estimated_revenue: fin.estimated_revenue,
                gap,
                gap_percent,
                effective_tax_rate: (fin.reported_revenue > 0.0)
                    .then(|| fin.tax_paid / fin.reported_revenue),
                suspicion_score: fin.suspicion_score,
            })
        })
        .collect()
}
