//! Synthetic data generation.
//!
//! RULE: The dashboard never reaches for data except through a
//! DataSource. Production uses SeededSource; tests may inject a
//! FixedSource with hand-built tables.
//!
//! GENERATION ORDER (fixed, never reordered):
//!   1. Basic dashboard tables (fixed rows + seeded weekly transactions)
//!   2. Sites
//!   3. Financial records
//!   4. Officials
//!   5. Transactions
//!   6. Connections
//!
//! Each table draws from its own RNG stream, so changing how one
//! table is generated never shifts another table's values.

use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate};

use crate::{
    config::{DashboardConfig, TransactionConfig},
    dataset::{
        AreaObservation, BasicDataset, Connection, Dataset, FinancialRecord, Mine,
        MineFinancials, Official, PatternScores, RegulatorDataset, Site, Stakeholder,
        StakeholderTransaction, Transaction,
    },
    error::DashResult,
    name_generator::{NameGenerator, DISTRICTS, POSITIONS},
    risk,
    rng::{RngBank, StreamSlot, TableRng},
    types::{ConnectionCategory, LicenseType, NodeKind, TransactionFlag, TransactionType},
};

/// The contract every data source must fulfill.
pub trait DataSource {
    /// Stable name for logging.
    fn name(&self) -> &'static str;

    /// Produce the complete dataset. Called once per dashboard.
    fn generate(&mut self, config: &DashboardConfig) -> DashResult<Dataset>;
}

// ── Seeded source ────────────────────────────────────────────────

/// Deterministic generator driven by the config's master seed.
pub struct SeededSource;

impl DataSource for SeededSource {
    fn name(&self) -> &'static str {
        "seeded"
    }

    fn generate(&mut self, config: &DashboardConfig) -> DashResult<Dataset> {
        config.validate()?;
        let bank = RngBank::new(config.seed);

        let basic = generate_basic(&bank, &config.transactions);
        let regulator = generate_regulator(&bank, config);

        log::info!(
            "generated dataset seed={}: {} mines, {} stakeholder txns, {} sites, {} officials, {} txns, {} connections",
            config.seed,
            basic.mines.len(),
            basic.transactions.len(),
            regulator.sites.len(),
            regulator.officials.len(),
            regulator.transactions.len(),
            regulator.connections.len(),
        );

        Ok(Dataset {
            seed: config.seed,
            basic,
            regulator,
        })
    }
}

// ── Fixed source ─────────────────────────────────────────────────

/// Hands back a prepared dataset unchanged.
pub struct FixedSource {
    dataset: Dataset,
}

impl FixedSource {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

impl DataSource for FixedSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn generate(&mut self, _config: &DashboardConfig) -> DashResult<Dataset> {
        Ok(self.dataset.clone())
    }
}

// ── Calendar ─────────────────────────────────────────────────────

/// Every Sunday in [start, end].
pub fn weekly_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let offset = (7 - start.weekday().num_days_from_sunday()) % 7;
    let mut dates = Vec::new();
    let mut current = start.checked_add_days(Days::new(u64::from(offset)));
    while let Some(d) = current.filter(|d| *d <= end) {
        dates.push(d);
        current = d.checked_add_days(Days::new(7));
    }
    dates
}

// ── Basic dashboard ──────────────────────────────────────────────

const BASIC_TXN_TYPES: [TransactionType; 3] = TransactionType::DOMESTIC;

/// The four reference mines with their surveyed areas (hectares).
pub fn basic_mines() -> Vec<Mine> {
    let rows = [
        ("Tambang A", -2.5489, 120.1989, 150.0, 320.0, "PT Nikel Utama"),
        ("Tambang B", -3.9778, 122.5632, 200.0, 450.0, "PT Mining Sejahtera"),
        ("Tambang C", -1.2456, 117.3421, 300.0, 520.0, "PT Mineral Abadi"),
        ("Tambang D", -2.1123, 119.4567, 180.0, 310.0, "PT Tambang Makmur"),
    ];
    rows.into_iter()
        .map(|(name, lat, lon, a20, a23, company)| Mine {
            name: name.into(),
            lat,
            lon,
            area_2020: a20,
            area_2023: a23,
            company: company.into(),
        })
        .collect()
}

pub fn basic_financials() -> Vec<MineFinancials> {
    let rows = [
        ("Tambang A", 250_000.0, 120_000.0, 2_500_000.0),
        ("Tambang B", 300_000.0, 150_000.0, 3_200_000.0),
        ("Tambang C", 280_000.0, 130_000.0, 4_100_000.0),
        ("Tambang D", 270_000.0, 125_000.0, 2_800_000.0),
    ];
    rows.into_iter()
        .map(|(mine, revenue, cost, tax)| MineFinancials {
            mine: mine.into(),
            revenue_per_ha: revenue,
            cost_per_ha: cost,
            tax_paid_2022: tax,
        })
        .collect()
}

pub fn basic_stakeholders() -> Vec<Stakeholder> {
    let rows = [
        ("John Doe", "CEO", "PT Nikel Utama", "Tambang A", 2),
        ("Jane Smith", "Government Official", "Ministry of Mining", "Multiple", 5),
        ("Robert Johnson", "Investor", "Investment Corp", "Tambang B", 0),
        ("Maria Garcia", "Local Official", "Local Government", "Tambang C", 3),
        ("Ali Wong", "Board Member", "PT Mining Sejahtera", "Tambang B", 1),
        ("Budi Santoso", "Regional Director", "PT Mineral Abadi", "Tambang C", 4),
    ];
    rows.into_iter()
        .map(|(name, role, company, mine, suspicious)| Stakeholder {
            name: name.into(),
            role: role.into(),
            company: company.into(),
            connected_mine: mine.into(),
            suspicious_transactions: suspicious,
        })
        .collect()
}

fn generate_basic(bank: &RngBank, config: &TransactionConfig) -> BasicDataset {
    let mut rng = bank.for_slot(StreamSlot::StakeholderTransactions);
    let stakeholders = basic_stakeholders();
    let dates = weekly_dates(config.start_date, config.end_date);

    let mut transactions = Vec::new();
    for person in &stakeholders {
        for date in &dates {
            if rng.next_f64() < 1.0 - config.weekly_probability {
                continue;
            }
            let amount = rng.int_range(5_000, 500_000);
            let txn_type = *rng.pick(&BASIC_TXN_TYPES);
            let flag = if amount > config.basic_flag_amount {
                TransactionFlag::Suspicious
            } else {
                TransactionFlag::Normal
            };
            transactions.push(StakeholderTransaction {
                date: *date,
                person: person.name.clone(),
                amount,
                txn_type,
                flag,
            });
        }
    }

    BasicDataset {
        mines: basic_mines(),
        financials: basic_financials(),
        stakeholders,
        transactions,
    }
}

// ── Regulator dashboard ──────────────────────────────────────────

const TAX_RATE: f64 = 0.10;
const MAX_TXN_AMOUNT: f64 = 5_000_000.0;

fn generate_regulator(bank: &RngBank, config: &DashboardConfig) -> RegulatorDataset {
    let sites = generate_sites(&mut bank.for_slot(StreamSlot::Sites), config);
    let financials = generate_financials(&mut bank.for_slot(StreamSlot::Financials), &sites);
    let officials =
        generate_officials(&mut bank.for_slot(StreamSlot::Officials), config, &sites);
    let transactions = generate_transactions(
        &mut bank.for_slot(StreamSlot::Transactions),
        &config.transactions,
        &sites,
        &officials,
    );
    let connections = generate_connections(
        &mut bank.for_slot(StreamSlot::Connections),
        config.population.connections,
        &sites,
        &officials,
    );

    RegulatorDataset {
        sites,
        financials,
        officials,
        transactions,
        connections,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn pick_license(rng: &mut TableRng) -> LicenseType {
    let roll = rng.next_f64();
    if roll < 0.55 {
        LicenseType::Iup
    } else if roll < 0.70 {
        LicenseType::Iupk
    } else if roll < 0.85 {
        LicenseType::Kk
    } else {
        LicenseType::Ipr
    }
}

fn generate_sites(rng: &mut TableRng, config: &DashboardConfig) -> Vec<Site> {
    let pop = &config.population;
    (0..pop.sites)
        .map(|i| {
            let district = *rng.pick(DISTRICTS);
            let lat = district.lat + rng.range_f64(-0.3, 0.3);
            let lon = district.lon + rng.range_f64(-0.3, 0.3);
            let operator = NameGenerator::company_name(rng);
            let license_type = pick_license(rng);
            let commodity = if rng.chance(0.2) { "nickel-cobalt" } else { "nickel" };

            // Year-on-year growth, occasionally negative (reclamation).
            let mut area = rng.range_f64(80.0, 600.0);
            let mut areas = Vec::new();
            for year in pop.first_year..=pop.last_year {
                areas.push(AreaObservation {
                    year,
                    area_ha: round_to(area, 1),
                });
                let growth = rng.range_f64(-0.10, 0.45);
                area = (area * (1.0 + growth)).max(0.0);
            }

            let first = areas.first().map(|a| a.area_ha).unwrap_or(0.0);
            let last = areas.last().map(|a| a.area_ha).unwrap_or(0.0);
            let growth_ratio = if first > 0.0 { (last - first) / first } else { 0.0 };
            let land_anomaly = round_to(
                ((growth_ratio / 1.5).clamp(0.0, 1.0) * 0.8 + rng.next_f64() * 0.2)
                    .clamp(0.0, 1.0),
                3,
            );

            Site {
                id: format!("site-{:03}", i + 1),
                name: NameGenerator::site_name(i),
                lat: round_to(lat, 4),
                lon: round_to(lon, 4),
                district: district.name.to_string(),
                operator,
                license_type,
                commodity: commodity.to_string(),
                areas,
                land_anomaly,
            }
        })
        .collect()
}

fn generate_financials(rng: &mut TableRng, sites: &[Site]) -> Vec<FinancialRecord> {
    sites
        .iter()
        .map(|site| {
            let change = match (site.earliest(), site.latest()) {
                (Some(e), Some(l)) => (l.area_ha - e.area_ha).max(0.0),
                _ => 0.0,
            };
            let rate_per_ha = rng.range_f64(250_000.0, 300_000.0);
            let estimated = change * rate_per_ha;
            let reporting_ratio = rng.range_f64(0.45, 1.05);
            let compliance = rng.range_f64(0.5, 1.0);
            let reported = estimated * reporting_ratio;
            let tax_paid = reported * TAX_RATE * compliance;

            let suspicion = ((1.0 - reporting_ratio).max(0.0) * 1.2
                + (1.0 - compliance) * 0.6
                + rng.next_f64() * 0.1)
                .clamp(0.0, 1.0);

            FinancialRecord {
                site_id: site.id.clone(),
                reported_revenue: reported.round(),
                estimated_revenue: estimated.round(),
                tax_paid: tax_paid.round(),
                suspicion_score: round_to(suspicion, 3),
            }
        })
        .collect()
}

fn generate_officials(
    rng: &mut TableRng,
    config: &DashboardConfig,
    sites: &[Site],
) -> Vec<Official> {
    // Officials are graph nodes keyed by name, so names must not repeat.
    let mut taken: HashSet<String> = HashSet::new();
    (0..config.population.officials)
        .map(|i| {
            let name = NameGenerator::unique_person_name(rng, &mut taken);
            let position = *rng.pick(POSITIONS);
            let district = rng.pick(DISTRICTS).name.to_string();

            let connected_site = if sites.is_empty() || rng.chance(0.25) {
                None
            } else {
                let local: Vec<&Site> = sites.iter().filter(|s| s.district == district).collect();
                let site = if local.is_empty() {
                    rng.pick(sites)
                } else {
                    *rng.pick(&local)
                };
                Some(site.id.clone())
            };

            let seniority = match position {
                "Bupati" | "Kepala Dinas ESDM" => 0.2,
                "Inspektur Tambang" | "Anggota DPRD" => 0.1,
                _ => 0.0,
            };
            let link = if connected_site.is_some() { 0.15 } else { 0.0 };
            let risk_score =
                round_to((rng.range_f64(0.05, 0.6) + seniority + link).clamp(0.0, 1.0), 3);

            Official {
                id: format!("off-{:03}", i + 1),
                name,
                position: position.to_string(),
                district,
                connected_site,
                risk_score,
            }
        })
        .collect()
}

fn generate_transactions(
    rng: &mut TableRng,
    config: &TransactionConfig,
    sites: &[Site],
    officials: &[Official],
) -> Vec<Transaction> {
    let dates = weekly_dates(config.start_date, config.end_date);
    let mut transactions = Vec::new();

    for official in officials {
        let operator = official
            .connected_site
            .as_ref()
            .and_then(|id| sites.iter().find(|s| &s.id == id))
            .map(|s| s.operator.clone());

        for date in &dates {
            if !rng.chance(config.weekly_probability) {
                continue;
            }
            let amount = rng
                .pareto(config.amount_pareto_xmin, config.amount_pareto_alpha)
                .min(MAX_TXN_AMOUNT)
                .round();
            let txn_type = *rng.pick(&TransactionType::ALL);
            let counterparty = match &operator {
                Some(op) if rng.chance(0.6) => op.clone(),
                _ if rng.chance(0.5) => NameGenerator::company_name(rng),
                _ => NameGenerator::person_name(rng),
            };

            let cash_bias = if txn_type == TransactionType::CashDeposit { 0.3 } else { 0.0 };
            let foreign_bias = if txn_type == TransactionType::ForeignTransfer { 0.35 } else { 0.0 };
            let patterns = PatternScores {
                structuring: round_to((rng.next_f64() * 0.7 + cash_bias).min(1.0), 3),
                velocity: round_to(
                    (rng.next_f64() * 0.5 + official.risk_score * 0.5).min(1.0),
                    3,
                ),
                layering: round_to((rng.next_f64() * 0.65 + foreign_bias).min(1.0), 3),
            };
            let composite = round_to(risk::composite_score(&patterns, &config.pattern_weights), 3);
            let random_flag = rng.chance(config.random_flag_rate);

            transactions.push(Transaction {
                id: format!("txn-{:06}", transactions.len() + 1),
                date: *date,
                official_id: official.id.clone(),
                amount,
                txn_type,
                counterparty,
                patterns,
                composite_score: composite,
                flag: risk::transaction_flag(composite, config.suspicious_threshold, random_flag),
            });
        }
    }
    transactions
}

fn generate_connections(
    rng: &mut TableRng,
    target_count: usize,
    sites: &[Site],
    officials: &[Official],
) -> Vec<Connection> {
    let mut connections: Vec<Connection> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    let mut push = |c: Connection, connections: &mut Vec<Connection>| {
        let self_loop = c.source_kind == c.target_kind && c.source == c.target;
        if !self_loop && seen.insert(c.pair_key()) {
            connections.push(c);
        }
    };

    // Every official tied to a site is linked to that site's operator.
    for o in officials {
        let Some(site) = o
            .connected_site
            .as_ref()
            .and_then(|id| sites.iter().find(|s| &s.id == id))
        else {
            continue;
        };
        let weight = round_to(rng.range_f64(0.4, 1.0), 2);
        push(
            Connection {
                source: o.name.clone(),
                source_kind: NodeKind::Official,
                target: site.operator.clone(),
                target_kind: NodeKind::Company,
                weight,
                category: ConnectionCategory::Business,
            },
            &mut connections,
        );
    }

    if officials.is_empty() || (officials.len() < 2 && sites.is_empty()) {
        return connections;
    }

    // Random extra ties, bounded so duplicate rolls cannot spin forever.
    let mut attempts = 0;
    while connections.len() < target_count && attempts < target_count * 20 {
        attempts += 1;
        let source = rng.pick(officials);
        let (target, target_kind) = if sites.is_empty() || rng.chance(0.5) {
            (rng.pick(officials).name.clone(), NodeKind::Official)
        } else {
            (rng.pick(sites).operator.clone(), NodeKind::Company)
        };
        let category = *rng.pick(&ConnectionCategory::ALL);
        let weight = round_to(rng.range_f64(0.1, 1.0), 2);
        push(
            Connection {
                source: source.name.clone(),
                source_kind: NodeKind::Official,
                target,
                target_kind,
                weight,
                category,
            },
            &mut connections,
        );
    }
    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ymd;

    #[test]
    fn weekly_dates_are_sundays_within_range() {
        let dates = weekly_dates(ymd(2022, 1, 1), ymd(2023, 12, 31));
        assert_eq!(dates.first().copied(), Some(ymd(2022, 1, 2)));
        assert_eq!(dates.last().copied(), Some(ymd(2023, 12, 31)));
        assert_eq!(dates.len(), 105);
        assert!(dates.iter().all(|d| d.weekday() == chrono::Weekday::Sun));
    }

    #[test]
    fn weekly_dates_empty_when_no_sunday_fits() {
        // Mon 2022-01-03 .. Sat 2022-01-08
        assert!(weekly_dates(ymd(2022, 1, 3), ymd(2022, 1, 8)).is_empty());
    }
}
