//! Integrated risk scoring and transaction flags.

use chrono::NaiveDate;
use nickel_watch_core::{
    config::{DashboardConfig, PatternWeights, RiskConfig},
    dataset::{AreaObservation, FinancialRecord, Official, PatternScores, Site, Transaction},
    error::DashError,
    generator::{DataSource, SeededSource},
    risk::{categorize, composite_score, compute_integrated_risk, transaction_flag, SubScores},
    types::{LicenseType, RiskCategory, TransactionFlag, TransactionType},
};

fn site(id: &str, land_anomaly: f64) -> Site {
    Site {
        id: id.into(),
        name: format!("Site {id}"),
        lat: -2.5,
        lon: 121.0,
        district: "Morowali".into(),
        operator: "PT Test Nikel".into(),
        license_type: LicenseType::Iup,
        commodity: "nickel".into(),
        areas: vec![
            AreaObservation { year: 2020, area_ha: 100.0 },
            AreaObservation { year: 2023, area_ha: 150.0 },
        ],
        land_anomaly,
    }
}

fn financial(site_id: &str, suspicion: f64) -> FinancialRecord {
    FinancialRecord {
        site_id: site_id.into(),
        reported_revenue: 1_000_000.0,
        estimated_revenue: 1_500_000.0,
        tax_paid: 80_000.0,
        suspicion_score: suspicion,
    }
}

fn official(id: &str, site_id: Option<&str>, risk: f64) -> Official {
    Official {
        id: id.into(),
        name: format!("Official {id}"),
        position: "Camat".into(),
        district: "Morowali".into(),
        connected_site: site_id.map(String::from),
        risk_score: risk,
    }
}

fn txn(id: &str, official_id: &str, composite: f64) -> Transaction {
    Transaction {
        id: id.into(),
        date: NaiveDate::from_ymd_opt(2022, 3, 6).unwrap(),
        official_id: official_id.into(),
        amount: 25_000.0,
        txn_type: TransactionType::BankTransfer,
        counterparty: "PT Test Nikel".into(),
        patterns: PatternScores { structuring: 0.0, velocity: 0.0, layering: 0.0 },
        composite_score: composite,
        flag: TransactionFlag::Normal,
    }
}

/// The worked example: [0.2, 0.5, 0.4, 0.7] averages to 0.45, medium.
#[test]
fn worked_example_scores_medium() {
    let sites = vec![site("s1", 0.2)];
    let financials = vec![financial("s1", 0.5)];
    let officials = vec![official("o1", Some("s1"), 0.4)];
    let transactions = vec![txn("t1", "o1", 0.7)];

    let rows =
        compute_integrated_risk(&sites, &financials, &officials, &transactions, &RiskConfig::default())
            .unwrap();

    assert_eq!(rows.len(), 1);
    assert!((rows[0].score - 0.45).abs() < 1e-9, "score {}", rows[0].score);
    assert_eq!(rows[0].category, RiskCategory::Medium);
    assert_eq!(rows[0].officials_linked, 1);
    assert_eq!(rows[0].transactions_linked, 1);
}

#[test]
fn threshold_boundaries_are_inclusive() {
    let config = RiskConfig::default();
    assert_eq!(categorize(0.0, &config), RiskCategory::Low);
    assert_eq!(categorize(0.3, &config), RiskCategory::Low);
    assert_eq!(categorize(0.300_001, &config), RiskCategory::Medium);
    assert_eq!(categorize(0.6, &config), RiskCategory::Medium);
    assert_eq!(categorize(0.600_001, &config), RiskCategory::High);
    assert_eq!(categorize(1.0, &config), RiskCategory::High);
}

#[test]
fn site_without_officials_scores_zero_for_those_parts() {
    let sites = vec![site("s1", 0.8), site("s2", 0.4)];
    let financials = vec![financial("s1", 0.6), financial("s2", 0.2)];
    let officials = vec![official("o1", Some("s1"), 0.5), official("o2", None, 0.9)];
    let transactions = vec![txn("t1", "o1", 0.3), txn("t2", "o2", 0.9)];

    let rows =
        compute_integrated_risk(&sites, &financials, &officials, &transactions, &RiskConfig::default())
            .unwrap();

    let s2 = rows.iter().find(|r| r.site_id == "s2").unwrap();
    assert_eq!(s2.officials_linked, 0);
    assert_eq!(s2.transactions_linked, 0);
    assert_eq!(s2.sub_scores.official, 0.0);
    assert_eq!(s2.sub_scores.transaction, 0.0);
    assert!((s2.score - 0.15).abs() < 1e-9);

    // The unconnected official's transaction never reaches a site.
    let s1 = rows.iter().find(|r| r.site_id == "s1").unwrap();
    assert_eq!(s1.transactions_linked, 1);
    assert!((s1.sub_scores.transaction - 0.3).abs() < 1e-9);
}

#[test]
fn missing_financial_record_aborts() {
    let sites = vec![site("s1", 0.5), site("s2", 0.5)];
    let financials = vec![financial("s1", 0.5)];

    let err = compute_integrated_risk(&sites, &financials, &[], &[], &RiskConfig::default())
        .unwrap_err();
    match err {
        DashError::MissingFinancials { site_id } => assert_eq!(site_id, "s2"),
        other => panic!("expected MissingFinancials, got {other:?}"),
    }
}

#[test]
fn no_sites_is_an_empty_selection() {
    let err = compute_integrated_risk(&[], &[], &[], &[], &RiskConfig::default()).unwrap_err();
    assert!(matches!(err, DashError::NoDataForSelection { .. }));
}

/// Every generated site scores within [0, 1] and lands in the bucket its
/// score implies.
#[test]
fn generated_scores_in_range_and_categorized() {
    for seed in [1u64, 42, 7_777] {
        let config = DashboardConfig::default_test().with_seed(seed);
        let data = SeededSource.generate(&config).unwrap();
        let r = &data.regulator;
        let rows =
            compute_integrated_risk(&r.sites, &r.financials, &r.officials, &r.transactions, &config.risk)
                .unwrap();

        assert_eq!(rows.len(), r.sites.len());
        for row in &rows {
            assert!((0.0..=1.0).contains(&row.score), "seed {seed}: score {}", row.score);
            let expected = if row.score <= 0.3 {
                RiskCategory::Low
            } else if row.score <= 0.6 {
                RiskCategory::Medium
            } else {
                RiskCategory::High
            };
            assert_eq!(row.category, expected, "seed {seed}: {}", row.site_id);
            let manual = row.sub_scores.as_features().iter().sum::<f64>() / 4.0;
            assert!((row.score - manual).abs() < 1e-9);
        }
    }
}

#[test]
fn composite_above_threshold_is_always_suspicious() {
    let config = DashboardConfig::default_test();
    let data = SeededSource.generate(&config).unwrap();
    assert!(!data.regulator.transactions.is_empty());

    for t in &data.regulator.transactions {
        if t.composite_score > config.transactions.suspicious_threshold {
            assert_eq!(t.flag, TransactionFlag::Suspicious, "{} is unflagged", t.id);
        }
        let recomputed = composite_score(&t.patterns, &config.transactions.pattern_weights);
        assert!((recomputed - t.composite_score).abs() < 1e-3);
    }
}

#[test]
fn random_flag_only_adds_suspicion() {
    assert_eq!(transaction_flag(0.9, 0.6, false), TransactionFlag::Suspicious);
    assert_eq!(transaction_flag(0.6, 0.6, false), TransactionFlag::Normal);
    assert_eq!(transaction_flag(0.1, 0.6, true), TransactionFlag::Suspicious);
}

#[test]
fn composite_uses_pattern_weights() {
    let p = PatternScores { structuring: 1.0, velocity: 0.0, layering: 0.0 };
    let w = PatternWeights::default();
    assert!((composite_score(&p, &w) - 0.40).abs() < 1e-12);

    let all = PatternScores { structuring: 1.0, velocity: 1.0, layering: 1.0 };
    assert!((composite_score(&all, &w) - 1.0).abs() < 1e-12);
}

#[test]
fn sub_scores_round_trip_features() {
    let s = SubScores::new(0.1, 0.2, 0.3, 0.4);
    assert_eq!(SubScores::from_features(s.as_features()), s);
}
