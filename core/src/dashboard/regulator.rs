//! Regulator dashboard pages. All of them require a logged-in session;
//! the check happens in `Dashboard::render` before any of these run.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    anomaly::site_anomalies,
    classifier::{Prediction, RiskForest},
    error::{DashError, DashResult},
    filter::{DateRange, NetworkFilter, SiteFilter, TransactionFilter},
    financial::revenue_gaps,
    land::LandChange,
    network::{circular_layout, ConnectionGraph},
    risk::{categorize, category_counts, mean_or_zero, IntegratedRisk, SubScores},
    rng::StreamSlot,
    types::{RiskCategory, TransactionFlag, TransactionType},
    view::{
        group_thousands, percent, usd, ChartKind, GraphEdgeView, GraphNodeView, LegendEntry,
        MapMarker, MetricCard, Section, Series,
    },
};

use super::{check_unit, Dashboard, Sections};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PredictionFilters {
    /// What-if input; defaults to the mean sub-scores of all sites.
    pub sub_scores: Option<SubScores>,
}

fn category_color(category: RiskCategory) -> &'static str {
    match category {
        RiskCategory::Low => "#2ecc71",
        RiskCategory::Medium => "#f39c12",
        RiskCategory::High => "#e74c3c",
    }
}

// ── Risk overview ─────────────────────────────────────────────────

pub(super) fn risk_overview(dash: &Dashboard, filter: SiteFilter) -> Sections {
    let sites = dash.store.sites(&filter)?;
    let rows = dash.integrated_risk(&filter)?;
    let gaps = revenue_gaps(&sites, &dash.store.financial_records()?)?;
    let anomalies = site_anomalies(
        &sites,
        &gaps,
        &dash.config.isolation,
        &mut dash.model_rng(StreamSlot::IsolationForest),
    )?;

    let counts = category_counts(&rows);
    let (mean_score, _) = mean_or_zero(rows.iter().map(|r| r.score));
    let total_gap: f64 = gaps.iter().map(|g| g.gap.max(0.0)).sum();

    let markers = sites
        .iter()
        .zip(&rows)
        .map(|(site, row)| MapMarker {
            name: site.name.clone(),
            lat: site.lat,
            lon: site.lon,
            color: category_color(row.category).to_string(),
            radius: 5.0 + row.score * 20.0,
            tooltip: format!(
                "{} | {} | {} | score {:.2} ({})",
                site.name,
                site.operator,
                site.license_type.as_str(),
                row.score,
                row.category
            ),
        })
        .collect();
    let legend = RiskCategory::ALL
        .iter()
        .map(|c| LegendEntry { label: c.to_string(), color: category_color(*c).to_string() })
        .collect();

    let mut scores = Series::new("integrated_score");
    for r in &rows {
        scores.push(&r.site_name, r.score);
    }
    let mut distribution = Series::new("sites");
    for (category, n) in counts {
        distribution.push(category.as_str(), n as f64);
    }

    let mut area_first = Series::new("first_year");
    let mut area_last = Series::new("last_year");
    for change in sites.iter().filter_map(LandChange::from_site) {
        area_first.push(&change.name, change.area_from);
        area_last.push(&change.name, change.area_to);
    }

    Ok(vec![
        Section::metrics(
            "Overview",
            vec![
                MetricCard::new("Sites", rows.len().to_string()),
                MetricCard::new("High Risk Sites", counts[2].1.to_string()),
                MetricCard::new("Mean Integrated Score", format!("{mean_score:.2}")),
                MetricCard::new("Unreported Revenue", usd(total_gap)),
            ],
        ),
        Section::Map {
            title: "Site Risk Map".into(),
            markers,
            legend,
        },
        Section::chart("Integrated Risk by Site", ChartKind::Bar, vec![scores]),
        Section::chart("Risk Category Distribution", ChartKind::Pie, vec![distribution]),
        Section::chart(
            "Land Area, First vs Last Survey (hectares)",
            ChartKind::GroupedBar,
            vec![area_first, area_last],
        ),
        risk_table(&rows),
        Section::table(
            "Revenue Gap Analysis",
            &[
                "site",
                "reported_revenue",
                "estimated_revenue",
                "gap",
                "gap_percent",
                "effective_tax_rate",
                "suspicion_score",
            ],
            gaps.iter()
                .map(|g| {
                    vec![
                        json!(g.site_name),
                        json!(g.reported_revenue),
                        json!(g.estimated_revenue),
                        json!(g.gap),
                        json!(g.gap_percent),
                        json!(g.effective_tax_rate),
                        json!(g.suspicion_score),
                    ]
                })
                .collect(),
        ),
        Section::table(
            "Anomaly Detection (Isolation Forest)",
            &["site", "land_growth", "gap_ratio", "effective_tax_rate", "score", "anomaly"],
            anomalies
                .iter()
                .map(|a| {
                    vec![
                        json!(a.site_name),
                        json!(a.land_growth),
                        json!(a.gap_ratio),
                        json!(a.effective_tax_rate),
                        json!(a.score),
                        json!(a.is_anomaly),
                    ]
                })
                .collect(),
        ),
    ])
}

fn risk_table(rows: &[IntegratedRisk]) -> Section {
    Section::table(
        "Integrated Risk Scores",
        &[
            "site_id",
            "site",
            "district",
            "license_type",
            "land_change",
            "financial",
            "official",
            "transaction",
            "officials_linked",
            "transactions_linked",
            "score",
            "category",
        ],
        rows.iter()
            .map(|r| {
                vec![
                    json!(r.site_id),
                    json!(r.site_name),
                    json!(r.district),
                    json!(r.license_type.as_str()),
                    json!(r.sub_scores.land_change),
                    json!(r.sub_scores.financial),
                    json!(r.sub_scores.official),
                    json!(r.sub_scores.transaction),
                    json!(r.officials_linked),
                    json!(r.transactions_linked),
                    json!(r.score),
                    json!(r.category),
                ]
            })
            .collect(),
    )
}

// ── Transaction monitor ───────────────────────────────────────────

pub(super) fn transaction_monitor(dash: &Dashboard, filter: TransactionFilter) -> Sections {
    if let Some(r) = filter.date_range {
        DateRange::new(r.start, r.end)?;
    }
    let transactions = dash.store.transactions(&filter)?;
    if transactions.is_empty() {
        return Err(DashError::no_data("no transactions match the current filters"));
    }
    let officials = dash.store.officials()?;
    let names: HashMap<&str, &str> =
        officials.iter().map(|o| (o.id.as_str(), o.name.as_str())).collect();

    let suspicious: Vec<_> = transactions
        .iter()
        .filter(|t| t.flag == TransactionFlag::Suspicious)
        .collect();
    let total_amount: f64 = transactions.iter().map(|t| t.amount).sum();
    let share = suspicious.len() as f64 / transactions.len() as f64 * 100.0;

    // Weekly volume and suspicious count.
    let mut weekly: BTreeMap<chrono::NaiveDate, (f64, f64)> = BTreeMap::new();
    for t in &transactions {
        let entry = weekly.entry(t.date).or_default();
        entry.0 += t.amount;
        if t.flag == TransactionFlag::Suspicious {
            entry.1 += 1.0;
        }
    }
    let mut volume = Series::new("amount");
    let mut flagged = Series::new("suspicious");
    for (date, (amount, n)) in weekly {
        volume.push(date.to_string(), amount);
        flagged.push(date.to_string(), n);
    }

    let mut by_type_all = Series::new("all");
    let mut by_type_suspicious = Series::new("suspicious");
    for ty in TransactionType::ALL {
        let of_type = transactions.iter().filter(|t| t.txn_type == ty);
        by_type_all.push(ty.as_str(), of_type.clone().count() as f64);
        by_type_suspicious.push(
            ty.as_str(),
            of_type.filter(|t| t.flag == TransactionFlag::Suspicious).count() as f64,
        );
    }

    let pattern_means = |flag: TransactionFlag| {
        let rows: Vec<_> = transactions.iter().filter(|t| t.flag == flag).collect();
        let mut s = Series::new(flag.as_str());
        s.push("structuring", mean_or_zero(rows.iter().map(|t| t.patterns.structuring)).0);
        s.push("velocity", mean_or_zero(rows.iter().map(|t| t.patterns.velocity)).0);
        s.push("layering", mean_or_zero(rows.iter().map(|t| t.patterns.layering)).0);
        s
    };

    Ok(vec![
        Section::metrics(
            "Transaction Summary",
            vec![
                MetricCard::new("Transactions", group_thousands(transactions.len() as u64)),
                MetricCard::new("Suspicious", group_thousands(suspicious.len() as u64))
                    .with_delta(percent(share)),
                MetricCard::new("Total Amount", usd(total_amount)),
            ],
        ),
        Section::chart("Weekly Volume", ChartKind::Line, vec![volume, flagged]),
        Section::chart(
            "Transactions by Type",
            ChartKind::GroupedBar,
            vec![by_type_all, by_type_suspicious],
        ),
        Section::chart(
            "Mean Pattern Strength",
            ChartKind::GroupedBar,
            vec![
                pattern_means(TransactionFlag::Normal),
                pattern_means(TransactionFlag::Suspicious),
            ],
        ),
        Section::table(
            "Transactions",
            &[
                "id",
                "date",
                "official",
                "amount",
                "type",
                "counterparty",
                "structuring",
                "velocity",
                "layering",
                "composite_score",
                "flag",
            ],
            transactions
                .iter()
                .map(|t| {
                    vec![
                        json!(t.id),
                        json!(t.date),
                        json!(names.get(t.official_id.as_str()).copied().unwrap_or(&t.official_id)),
                        json!(t.amount),
                        json!(t.txn_type.as_str()),
                        json!(t.counterparty),
                        json!(t.patterns.structuring),
                        json!(t.patterns.velocity),
                        json!(t.patterns.layering),
                        json!(t.composite_score),
                        json!(t.flag.as_str()),
                    ]
                })
                .collect(),
        ),
    ])
}

// ── Network analysis ──────────────────────────────────────────────

pub(super) fn network_analysis(dash: &Dashboard, filter: NetworkFilter) -> Sections {
    check_unit("min_weight", filter.min_weight)?;
    let connections = dash.store.connections(&filter)?;
    let graph = ConnectionGraph::from_connections(&connections);
    let analysis = graph.analyze()?;

    let positions = circular_layout(analysis.nodes.len());
    let nodes = analysis
        .nodes
        .iter()
        .zip(positions)
        .map(|(n, (x, y))| GraphNodeView {
            name: n.name.clone(),
            kind: n.kind.as_str().to_string(),
            x,
            y,
            size: 10.0 + 30.0 * n.degree_centrality,
            community: n.community,
        })
        .collect();
    let edges = analysis
        .edges
        .iter()
        .map(|e| GraphEdgeView {
            source: e.source.clone(),
            target: e.target.clone(),
            weight: e.weight,
            category: e.category.as_str().to_string(),
        })
        .collect();

    let mut ranked: Vec<_> = analysis.nodes.iter().collect();
    ranked.sort_by(|a, b| {
        b.betweenness
            .total_cmp(&a.betweenness)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut categories = Series::new("connections");
    for e in &analysis.edges {
        let label = e.category.as_str();
        match categories.labels.iter().position(|l| l == label) {
            Some(i) => categories.values[i] += 1.0,
            None => categories.push(label, 1.0),
        }
    }

    let mut sections = vec![
        Section::metrics(
            "Network Summary",
            vec![
                MetricCard::new("Nodes", analysis.nodes.len().to_string()),
                MetricCard::new("Connections", analysis.edges.len().to_string()),
                MetricCard::new("Communities", analysis.communities.to_string()),
                MetricCard::new("Modularity", format!("{:.3}", analysis.modularity)),
                MetricCard::new("Components", analysis.components.to_string()),
            ],
        ),
        Section::Graph {
            title: "Official-Company Network".into(),
            nodes,
            edges,
        },
        Section::table(
            "Centrality",
            &["name", "kind", "degree", "degree_centrality", "betweenness", "eigenvector", "community"],
            ranked
                .iter()
                .map(|n| {
                    vec![
                        json!(n.name),
                        json!(n.kind.as_str()),
                        json!(n.degree),
                        json!(n.degree_centrality),
                        json!(n.betweenness),
                        json!(n.eigenvector),
                        json!(n.community),
                    ]
                })
                .collect(),
        ),
        Section::chart("Connections by Category", ChartKind::Pie, vec![categories]),
    ];
    if !analysis.eigenvector_converged {
        sections.push(Section::notice(
            "Eigenvector Centrality",
            "Power iteration did not converge; eigenvector scores are shown as zero.",
        ));
    }
    Ok(sections)
}

// ── Risk prediction ───────────────────────────────────────────────

pub(super) fn risk_prediction(dash: &Dashboard, filters: PredictionFilters) -> Sections {
    let (rows, forest) = dash.fit_classifier()?;

    let input = match filters.sub_scores {
        Some(s) => s,
        None => mean_sub_scores(&rows),
    };
    for (name, value) in SubScores::FEATURE_NAMES.iter().zip(input.as_features()) {
        check_unit(name, value)?;
    }

    let prediction = forest.what_if(input);
    let threshold_score = input.integrated(&dash.config.risk.weights);

    let mut proba = Series::new("probability");
    for (category, p) in &prediction.probabilities {
        proba.push(category.as_str(), *p);
    }
    let mut importance = Series::new("importance");
    for f in forest.feature_importances() {
        importance.push(f.feature, f.importance);
    }

    Ok(vec![
        Section::notice(
            "About This Model",
            format!(
                "Illustrative random forest refit on every view from {} sites; \
                 no held-out data. Training accuracy {}.",
                forest.n_samples(),
                percent(forest.accuracy(&rows) * 100.0)
            ),
        ),
        Section::metrics(
            "Prediction",
            vec![
                MetricCard::new("Predicted Category", prediction.category.to_string()),
                MetricCard::new("Integrated Score", format!("{threshold_score:.2}")).with_delta(
                    format!(
                        "threshold category: {}",
                        categorize(threshold_score, &dash.config.risk)
                    ),
                ),
            ],
        ),
        Section::chart("Class Probabilities", ChartKind::Bar, vec![proba]),
        Section::chart("Feature Importance", ChartKind::Bar, vec![importance]),
    ])
}

fn mean_sub_scores(rows: &[IntegratedRisk]) -> SubScores {
    let mean = |f: fn(&SubScores) -> f64| mean_or_zero(rows.iter().map(|r| f(&r.sub_scores))).0;
    SubScores::new(
        mean(|s| s.land_change),
        mean(|s| s.financial),
        mean(|s| s.official),
        mean(|s| s.transaction),
    )
}

impl Dashboard {
    /// Fit the classifier on every site's integrated risk row.
    pub fn fit_classifier(&self) -> DashResult<(Vec<IntegratedRisk>, RiskForest)> {
        let rows = self.integrated_risk(&SiteFilter::default())?;
        let forest = RiskForest::fit_integrated(
            &rows,
            &self.config.forest,
            &mut self.model_rng(StreamSlot::Classifier),
        )?;
        Ok((rows, forest))
    }

    /// What-if prediction without building a page.
    pub fn predict(&self, input: SubScores) -> DashResult<Prediction> {
        for (name, value) in SubScores::FEATURE_NAMES.iter().zip(input.as_features()) {
            check_unit(name, value)?;
        }
        let (_, forest) = self.fit_classifier()?;
        Ok(forest.what_if(input))
    }
}
