//! Basic dashboard pages: map, financial estimation, stakeholders.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::DashError,
    filter::{DateRange, StakeholderFilter},
    financial::{cost_benefit, estimate_mines, tax_shares, totals},
    land::{environmental_impact, ImpactBand, LandChange},
    stakeholder::{stakeholder_risk, suspicious_by_person, timeline, type_distribution},
    view::{
        group_thousands, percent, usd, ChartKind, LegendEntry, MapMarker, MetricCard, Section,
        Series,
    },
};

use super::{Dashboard, Sections};

pub const FIRST_SURVEY_YEAR: i32 = 2020;
pub const LAST_SURVEY_YEAR: i32 = 2023;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapFilters {
    /// Year slider; defaults to the first survey year.
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FinancialFilters {
    /// Mine for the cost-benefit calculator; defaults to the first.
    pub mine: Option<String>,
    /// Hectares; defaults to the mine's land change.
    pub custom_area: Option<f64>,
    /// Commodity price multiplier; defaults to 1.0.
    pub price_factor: Option<f64>,
}

// ── Map analysis ──────────────────────────────────────────────────

pub(super) fn map_analysis(dash: &Dashboard, filters: MapFilters) -> Sections {
    let year = filters.year.unwrap_or(FIRST_SURVEY_YEAR);
    if !(FIRST_SURVEY_YEAR..=LAST_SURVEY_YEAR).contains(&year) {
        return Err(DashError::InvalidInput(format!(
            "year must be within {FIRST_SURVEY_YEAR}-{LAST_SURVEY_YEAR}, got {year}"
        )));
    }

    let mines = dash.store.mines()?;
    if mines.is_empty() {
        return Err(DashError::no_data("no mining locations"));
    }
    let financials = dash.store.mine_financials()?;
    let changes: Vec<LandChange> = mines.iter().map(LandChange::from_mine).collect();

    let markers = mines
        .iter()
        .zip(&changes)
        .map(|(mine, change)| {
            let revenue = financials
                .iter()
                .find(|f| f.mine == mine.name)
                .map(|f| mine.area_2023 * f.revenue_per_ha);
            let mut tooltip = format!(
                "{} | {} | {:.0} ha -> {:.0} ha | change {:+.0} ha",
                mine.name, mine.company, mine.area_2020, mine.area_2023, change.change_ha
            );
            if let Some(p) = change.percent_change {
                tooltip.push_str(&format!(" ({})", percent(p)));
            }
            if let Some(r) = revenue {
                tooltip.push_str(&format!(" | est. revenue {}", usd(r)));
            }
            MapMarker {
                name: mine.name.clone(),
                lat: mine.lat,
                lon: mine.lon,
                color: change.impact.color().to_string(),
                // Sized by total land change; the year slider drives the charts.
                radius: change.change_ha.abs() / 20.0,
                tooltip,
            }
        })
        .collect();
    let legend = [ImpactBand::Low, ImpactBand::Medium, ImpactBand::High]
        .iter()
        .map(|b| LegendEntry { label: b.label().to_string(), color: b.color().to_string() })
        .collect();

    let mut area_from = Series::new("area_2020");
    let mut area_to = Series::new("area_2023");
    let mut distribution = Series::new("area_2023");
    for mine in &mines {
        area_from.push(&mine.name, mine.area_2020);
        area_to.push(&mine.name, mine.area_2023);
        distribution.push(&mine.name, mine.area_2023);
    }

    let mut by_change: Vec<&LandChange> = changes.iter().collect();
    by_change.sort_by(|a, b| b.change_ha.total_cmp(&a.change_ha));
    let mut change_series = Series::new("area_change");
    for c in by_change {
        change_series.push(&c.name, c.change_ha);
    }

    let mut in_year = Series::new(&format!("area_{year}"));
    for c in &changes {
        in_year.push(&c.name, c.area_at(year));
    }

    let impact = environmental_impact(&changes, &dash.config.environment);

    Ok(vec![
        Section::Map {
            title: "Nickel Mining Locations".into(),
            markers,
            legend,
        },
        Section::chart(
            "Mining Area Comparison (hectares)",
            ChartKind::GroupedBar,
            vec![area_from, area_to],
        ),
        Section::chart("Current Mining Area Distribution", ChartKind::Pie, vec![distribution]),
        Section::chart(
            "Land Area Change by Mining Location",
            ChartKind::Bar,
            vec![change_series],
        ),
        Section::chart(&format!("Mining Area in {year} (hectares)"), ChartKind::Bar, vec![in_year]),
        Section::metrics(
            "Environmental Impact Metrics",
            vec![
                MetricCard::new(
                    "Total Land Change",
                    format!("{:.0} hectares", impact.total_change_ha),
                )
                .with_delta(format!("{:.1} ha/year", impact.change_per_year_ha)),
                MetricCard::new(
                    "Estimated CO2 Impact",
                    format!("{} tons", group_thousands(impact.co2_tons.max(0.0).round() as u64)),
                )
                .with_delta(format!("{:.1} tons/year", impact.co2_tons_per_year)),
                MetricCard::new(
                    "Biodiversity Impact Index",
                    format!("{:.1}", impact.biodiversity_index),
                )
                .with_delta("Based on land change".into()),
            ],
        ),
    ])
}

// ── Financial estimation ──────────────────────────────────────────

pub(super) fn financial_estimation(dash: &Dashboard, filters: FinancialFilters) -> Sections {
    let mines = dash.store.mines()?;
    if mines.is_empty() {
        return Err(DashError::no_data("no mining locations"));
    }
    let financials = dash.store.mine_financials()?;
    let estimates = estimate_mines(&mines, &financials)?;
    let sum = totals(&estimates);

    let mut revenue = Series::new("estimated_revenue");
    let mut cost = Series::new("estimated_cost");
    let mut profit = Series::new("estimated_profit");
    let mut scatter = Series::new("estimated_profit");
    for e in &estimates {
        revenue.push(&e.name, e.estimated_revenue);
        cost.push(&e.name, e.estimated_cost);
        profit.push(&e.name, e.estimated_profit);
        scatter.push(&e.name, e.estimated_profit);
        scatter.x.push(e.land_change_ha);
    }

    let mut tax = Series::new("tax_paid_2022");
    for (name, share) in tax_shares(&estimates) {
        tax.push(name, share);
    }

    let selected = match &filters.mine {
        Some(name) => estimates
            .iter()
            .find(|e| &e.name == name)
            .ok_or_else(|| DashError::InvalidInput(format!("unknown mine '{name}'")))?,
        None => &estimates[0],
    };
    let fin = financials
        .iter()
        .find(|f| f.mine == selected.name)
        .ok_or_else(|| DashError::MissingFinancials { site_id: selected.name.clone() })?;
    let calc = cost_benefit(
        fin,
        filters.custom_area.unwrap_or(selected.land_change_ha),
        filters.price_factor.unwrap_or(1.0),
    )?;

    Ok(vec![
        Section::metrics(
            "Estimated Totals",
            vec![
                MetricCard::new("Total Estimated Revenue", usd(sum.revenue)),
                MetricCard::new("Total Estimated Cost", usd(sum.cost)),
                MetricCard::new("Total Estimated Profit", usd(sum.profit)),
            ],
        ),
        Section::chart(
            "Financial Estimation Based on Land Change",
            ChartKind::GroupedBar,
            vec![revenue, cost, profit],
        ),
        Section::chart("Profit vs Land Change", ChartKind::Scatter, vec![scatter]),
        Section::table(
            "Profitability Analysis",
            &["name", "land_change_ha", "estimated_profit", "profit_per_ha"],
            estimates
                .iter()
                .map(|e| {
                    vec![
                        json!(e.name),
                        json!(e.land_change_ha),
                        json!(e.estimated_profit),
                        json!(e.profit_per_ha),
                    ]
                })
                .collect(),
        ),
        Section::chart("Tax Contribution by Mining Operation (2022)", ChartKind::Pie, vec![tax]),
        Section::metrics(
            "Cost-Benefit Calculator",
            vec![
                MetricCard::new("Mining Operation", calc.mine.clone()),
                MetricCard::new("Land Area", format!("{:.1} ha", calc.area_ha)),
                MetricCard::new("Price Factor", format!("{:.1}", calc.price_factor)),
                MetricCard::new("Estimated Revenue", usd(calc.revenue)),
                MetricCard::new("Estimated Cost", usd(calc.cost)),
                MetricCard::new("Estimated Profit", usd(calc.profit)),
            ],
        ),
    ])
}

// ── Stakeholders ──────────────────────────────────────────────────

pub(super) fn stakeholder_analysis(dash: &Dashboard, filters: StakeholderFilter) -> Sections {
    if let Some(r) = filters.date_range {
        DateRange::new(r.start, r.end)?;
    }

    let stakeholders = dash.store.stakeholders()?;
    let all = dash.store.stakeholder_transactions(&StakeholderFilter::default())?;
    let explorer = dash.store.stakeholder_transactions(&filters)?;
    if explorer.is_empty() {
        return Err(DashError::no_data("no transactions match the selected people and dates"));
    }

    let mut suspicious = Series::new("suspicious_transactions");
    for (person, count) in suspicious_by_person(&all) {
        suspicious.push(person, count as f64);
    }

    // One line per person, in the order people first appear.
    let mut lines: Vec<Series> = Vec::new();
    for point in timeline(&all) {
        let idx = match lines.iter().position(|s| s.name == point.person) {
            Some(i) => i,
            None => {
                lines.push(Series::new(&point.person));
                lines.len() - 1
            }
        };
        lines[idx].push(point.date.to_string(), point.amount as f64);
    }

    let mut by_type = Series::new("amount");
    for share in type_distribution(&all) {
        by_type.push(share.txn_type.as_str(), share.amount as f64);
    }

    let mut risk = Series::new("risk_score");
    let risk_rows = stakeholder_risk(&stakeholders);
    for r in &risk_rows {
        risk.push(&r.name, f64::from(r.risk_score));
    }

    Ok(vec![
        Section::table(
            "Key Stakeholders in Mining Operations",
            &["name", "role", "company", "connected_mine", "suspicious_transactions"],
            stakeholders
                .iter()
                .map(|s| {
                    vec![
                        json!(s.name),
                        json!(s.role),
                        json!(s.company),
                        json!(s.connected_mine),
                        json!(s.suspicious_transactions),
                    ]
                })
                .collect(),
        ),
        Section::chart("Suspicious Transactions by Person", ChartKind::Bar, vec![suspicious]),
        Section::chart("Transaction Timeline by Person", ChartKind::Line, lines),
        Section::chart("Transaction Distribution by Type", ChartKind::Pie, vec![by_type]),
        Section::table(
            "Transaction Explorer",
            &["date", "person", "amount", "type", "flag"],
            explorer
                .iter()
                .map(|t| {
                    vec![
                        json!(t.date),
                        json!(t.person),
                        json!(t.amount),
                        json!(t.txn_type.as_str()),
                        json!(t.flag.as_str()),
                    ]
                })
                .collect(),
        ),
        Section::chart("Stakeholder Risk Assessment", ChartKind::Bar, vec![risk]),
        Section::table(
            "Stakeholder Risk Scores",
            &["name", "role", "company", "risk_score"],
            risk_rows
                .iter()
                .map(|r| vec![json!(r.name), json!(r.role), json!(r.company), json!(r.risk_score)])
                .collect(),
        ),
    ])
}
