//! Land-change metrics and the financial estimates built on them.

use nickel_watch_core::{
    config::EnvironmentConfig,
    dataset::{AreaObservation, FinancialRecord, Site},
    error::DashError,
    financial::{cost_benefit, estimate_mines, revenue_gaps, tax_shares, totals},
    generator::{basic_financials, basic_mines},
    land::{environmental_impact, percent_change, site_area_at, ImpactBand, LandChange},
    types::LicenseType,
};

#[test]
fn percent_change_worked_example() {
    assert_eq!(percent_change(1000.0, 1200.0), Some(20.0));
    assert_eq!(percent_change(200.0, 150.0), Some(-25.0));
    assert_eq!(percent_change(300.0, 300.0), Some(0.0));
}

#[test]
fn percent_change_undefined_without_positive_base() {
    assert_eq!(percent_change(0.0, 50.0), None);
    assert_eq!(percent_change(-10.0, 50.0), None);
}

#[test]
fn reference_mines_land_in_expected_bands() {
    let changes: Vec<LandChange> = basic_mines().iter().map(LandChange::from_mine).collect();
    let bands: Vec<(String, f64, ImpactBand)> = changes
        .iter()
        .map(|c| (c.name.clone(), c.change_ha, c.impact))
        .collect();

    assert_eq!(bands[0], ("Tambang A".into(), 170.0, ImpactBand::Medium));
    assert_eq!(bands[1], ("Tambang B".into(), 250.0, ImpactBand::High));
    assert_eq!(bands[2], ("Tambang C".into(), 220.0, ImpactBand::High));
    assert_eq!(bands[3], ("Tambang D".into(), 130.0, ImpactBand::Medium));
    assert_eq!(ImpactBand::for_change(99.9), ImpactBand::Low);
    assert_eq!(ImpactBand::for_change(100.0), ImpactBand::Medium);
    assert_eq!(ImpactBand::for_change(200.0), ImpactBand::High);
}

#[test]
fn year_slider_interpolates_linearly() {
    let mine = &basic_mines()[0]; // 150 -> 320 over 2020..2023
    let c = LandChange::from_mine(mine);
    assert_eq!(c.area_at(2020), 150.0);
    assert_eq!(c.area_at(2023), 320.0);
    assert!((c.area_at(2021) - (150.0 + 170.0 / 3.0)).abs() < 1e-9);
    assert!((c.area_at(2022) - (150.0 + 2.0 * 170.0 / 3.0)).abs() < 1e-9);
    // Clamped outside the surveyed span.
    assert_eq!(c.area_at(2010), 150.0);
    assert_eq!(c.area_at(2030), 320.0);
}

#[test]
fn site_area_prefers_observation_then_interpolates() {
    let site = Site {
        id: "s1".into(),
        name: "Tambang A".into(),
        lat: 0.0,
        lon: 0.0,
        district: "Kolaka".into(),
        operator: "PT X".into(),
        license_type: LicenseType::Kk,
        commodity: "nickel".into(),
        areas: vec![
            AreaObservation { year: 2019, area_ha: 100.0 },
            AreaObservation { year: 2021, area_ha: 200.0 },
            AreaObservation { year: 2023, area_ha: 180.0 },
        ],
        land_anomaly: 0.1,
    };
    assert_eq!(site_area_at(&site, 2021), Some(200.0));
    assert_eq!(site_area_at(&site, 2020), Some(150.0));
    assert_eq!(site_area_at(&site, 2022), Some(190.0));
    assert_eq!(site_area_at(&site, 2018), None);

    let change = LandChange::from_site(&site).unwrap();
    assert_eq!((change.from_year, change.to_year), (2019, 2023));
    assert_eq!(change.change_ha, 80.0);
    assert_eq!(change.percent_change, Some(80.0));
}

#[test]
fn environmental_impact_uses_configured_factors() {
    let changes: Vec<LandChange> = basic_mines().iter().map(LandChange::from_mine).collect();
    let impact = environmental_impact(&changes, &EnvironmentConfig::default());

    assert_eq!(impact.total_change_ha, 770.0);
    assert!((impact.change_per_year_ha - 770.0 / 3.0).abs() < 1e-9);
    assert_eq!(impact.co2_tons, 231_000.0);
    assert!((impact.biodiversity_index - 38.5).abs() < 1e-9);
}

#[test]
fn mine_estimates_scale_with_land_change() {
    let estimates = estimate_mines(&basic_mines(), &basic_financials()).unwrap();
    let a = &estimates[0];
    assert_eq!(a.estimated_revenue, 170.0 * 250_000.0);
    assert_eq!(a.estimated_cost, 170.0 * 120_000.0);
    assert_eq!(a.estimated_profit, 170.0 * 130_000.0);
    assert_eq!(a.profit_per_ha, Some(130_000.0));

    let sum = totals(&estimates);
    let manual: f64 = estimates.iter().map(|e| e.estimated_profit).sum();
    assert_eq!(sum.profit, manual);
    assert!((sum.revenue - sum.cost - sum.profit).abs() < 1e-6);

    let shares: f64 = tax_shares(&estimates).iter().map(|(_, s)| s).sum();
    assert!((shares - 100.0).abs() < 1e-9);
}

#[test]
fn mine_without_financials_is_rejected() {
    let mut fin = basic_financials();
    fin.retain(|f| f.mine != "Tambang C");
    let err = estimate_mines(&basic_mines(), &fin).unwrap_err();
    assert!(matches!(err, DashError::MissingFinancials { site_id } if site_id == "Tambang C"));
}

#[test]
fn cost_benefit_clamps_price_factor() {
    let fin = &basic_financials()[1]; // 300k revenue, 150k cost per ha
    let calc = cost_benefit(fin, 10.0, 1.0).unwrap();
    assert_eq!(calc.revenue, 3_000_000.0);
    assert_eq!(calc.cost, 1_500_000.0);
    assert_eq!(calc.profit, 1_500_000.0);

    let high = cost_benefit(fin, 10.0, 9.0).unwrap();
    assert_eq!(high.price_factor, 1.5);
    let low = cost_benefit(fin, 10.0, 0.1).unwrap();
    assert_eq!(low.price_factor, 0.5);

    assert!(cost_benefit(fin, f64::NAN, 1.0).is_err());
}

#[test]
fn revenue_gap_and_effective_tax_rate() {
    let site = Site {
        id: "s1".into(),
        name: "Tambang A".into(),
        lat: 0.0,
        lon: 0.0,
        district: "Konawe".into(),
        operator: "PT X".into(),
        license_type: LicenseType::Iup,
        commodity: "nickel".into(),
        areas: vec![],
        land_anomaly: 0.0,
    };
    let zero = Site { id: "s2".into(), ..site.clone() };
    let financials = vec![
        FinancialRecord {
            site_id: "s1".into(),
            reported_revenue: 600.0,
            estimated_revenue: 1000.0,
            tax_paid: 60.0,
            suspicion_score: 0.4,
        },
        FinancialRecord {
            site_id: "s2".into(),
            reported_revenue: 0.0,
            estimated_revenue: 500.0,
            tax_paid: 0.0,
            suspicion_score: 0.9,
        },
    ];

    let gaps = revenue_gaps(&[site, zero], &financials).unwrap();
    assert_eq!(gaps[0].gap, 400.0);
    assert_eq!(gaps[0].gap_percent, Some(40.0));
    assert!((gaps[0].gap_ratio() - 0.4).abs() < 1e-12);
    assert_eq!(gaps[0].effective_tax_rate, Some(0.1));

    assert_eq!(gaps[1].effective_tax_rate, None);
    assert_eq!(gaps[1].gap_percent, Some(100.0));
}
