//! Random-forest classifier and isolation-forest anomaly scores.

use nickel_watch_core::{
    anomaly::{site_anomalies, IsolationForest},
    classifier::RiskForest,
    config::{DashboardConfig, ForestConfig, IsolationConfig, RiskConfig},
    error::DashError,
    financial::revenue_gaps,
    generator::{DataSource, SeededSource},
    risk::{compute_integrated_risk, SubScores},
    rng::{RngBank, StreamSlot, TableRng},
    types::RiskCategory,
};

/// Rows whose label follows the mean of the sub-scores, so there is a
/// real signal to split on.
fn labelled_rows() -> Vec<(SubScores, RiskCategory)> {
    let config = RiskConfig::default();
    let mut rng = TableRng::new(11, 0);
    (0..60)
        .map(|_| {
            let s = SubScores::new(rng.next_f64(), rng.next_f64(), rng.next_f64(), rng.next_f64());
            let score = s.integrated(&config.weights);
            (s, nickel_watch_core::risk::categorize(score, &config))
        })
        .collect()
}

fn classifier_rng(seed: u64) -> TableRng {
    RngBank::new(seed).for_slot(StreamSlot::Classifier)
}

#[test]
fn probabilities_cover_all_classes_and_sum_to_one() {
    let forest =
        RiskForest::fit(&labelled_rows(), &ForestConfig::default(), &mut classifier_rng(1)).unwrap();

    for input in [
        SubScores::new(0.0, 0.0, 0.0, 0.0),
        SubScores::new(0.5, 0.5, 0.5, 0.5),
        SubScores::new(1.0, 1.0, 1.0, 1.0),
        SubScores::new(0.2, 0.5, 0.4, 0.7),
    ] {
        let p = forest.what_if(input);
        assert_eq!(p.probabilities.len(), 3);
        let labels: Vec<RiskCategory> = p.probabilities.iter().map(|(c, _)| *c).collect();
        assert_eq!(labels, RiskCategory::ALL.to_vec());
        let total: f64 = p.probabilities.iter().map(|(_, v)| v).sum();
        assert!((total - 1.0).abs() < 1e-9, "probabilities sum to {total}");
        assert!(p.probabilities.iter().all(|(_, v)| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn importances_are_normalized() {
    let forest =
        RiskForest::fit(&labelled_rows(), &ForestConfig::default(), &mut classifier_rng(1)).unwrap();
    let importances = forest.feature_importances();

    assert_eq!(importances.len(), 4);
    let total: f64 = importances.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-9, "importances sum to {total}");
    assert!(importances.iter().all(|f| f.importance >= 0.0));
}

#[test]
fn extremes_predict_their_category() {
    // Three tight clusters, one per category.
    let mut rows = Vec::new();
    for (centre, category) in [
        (0.1, RiskCategory::Low),
        (0.5, RiskCategory::Medium),
        (0.9, RiskCategory::High),
    ] {
        for i in 0..10 {
            let j = i as f64 * 0.005;
            rows.push((SubScores::new(centre + j, centre - j, centre + j / 2.0, centre), category));
        }
    }
    let forest = RiskForest::fit(&rows, &ForestConfig::default(), &mut classifier_rng(5)).unwrap();
    assert_eq!(forest.predict(&SubScores::new(0.02, 0.03, 0.01, 0.05)), RiskCategory::Low);
    assert_eq!(forest.predict(&SubScores::new(0.98, 0.97, 0.99, 0.95)), RiskCategory::High);
}

#[test]
fn absent_classes_get_zero_probability() {
    let rows = vec![
        (SubScores::new(0.1, 0.1, 0.1, 0.1), RiskCategory::Low),
        (SubScores::new(0.2, 0.1, 0.2, 0.1), RiskCategory::Low),
        (SubScores::new(0.5, 0.5, 0.4, 0.5), RiskCategory::Medium),
        (SubScores::new(0.5, 0.6, 0.5, 0.4), RiskCategory::Medium),
    ];
    let forest = RiskForest::fit(&rows, &ForestConfig::default(), &mut classifier_rng(2)).unwrap();
    let p = forest.predict_proba(&SubScores::new(0.9, 0.9, 0.9, 0.9));
    assert_eq!(p[RiskCategory::High.index()], 0.0);
    assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert_eq!(forest.classes_seen(), &[RiskCategory::Low, RiskCategory::Medium]);
}

#[test]
fn single_class_fit_predicts_that_class() {
    let rows = vec![
        (SubScores::new(0.1, 0.2, 0.1, 0.2), RiskCategory::Low),
        (SubScores::new(0.2, 0.1, 0.2, 0.1), RiskCategory::Low),
    ];
    let forest = RiskForest::fit(&rows, &ForestConfig::default(), &mut classifier_rng(3)).unwrap();
    let p = forest.what_if(SubScores::new(0.9, 0.9, 0.9, 0.9));
    assert_eq!(p.category, RiskCategory::Low);
    assert_eq!(p.probabilities[0].1, 1.0);
    // Nothing ever split, so there is no importance to share out.
    assert!(forest.feature_importances().iter().all(|f| f.importance == 0.0));
}

#[test]
fn empty_table_is_no_data() {
    let err = RiskForest::fit(&[], &ForestConfig::default(), &mut classifier_rng(1)).unwrap_err();
    assert!(matches!(err, DashError::NoDataForSelection { .. }));
}

#[test]
fn same_stream_same_forest() {
    let rows = labelled_rows();
    let a = RiskForest::fit(&rows, &ForestConfig::default(), &mut classifier_rng(9)).unwrap();
    let b = RiskForest::fit(&rows, &ForestConfig::default(), &mut classifier_rng(9)).unwrap();
    assert_eq!(a.feature_importances(), b.feature_importances());
    let x = SubScores::new(0.3, 0.6, 0.2, 0.5);
    assert_eq!(a.predict_proba(&x), b.predict_proba(&x));
}

#[test]
fn fits_on_generated_sites() {
    let config = DashboardConfig::default_test();
    let data = SeededSource.generate(&config).unwrap();
    let r = &data.regulator;
    let rows =
        compute_integrated_risk(&r.sites, &r.financials, &r.officials, &r.transactions, &config.risk)
            .unwrap();

    let forest = RiskForest::fit_integrated(&rows, &config.forest, &mut classifier_rng(42)).unwrap();
    assert_eq!(forest.n_samples(), rows.len());
    let accuracy = forest.accuracy(&rows);
    assert!((0.0..=1.0).contains(&accuracy));
}

// ── Isolation forest ──────────────────────────────────────────────

#[test]
fn isolated_point_scores_highest() {
    let mut data: Vec<Vec<f64>> = (0..30)
        .map(|i| {
            let t = i as f64 / 30.0;
            vec![0.4 + 0.05 * t, 0.1 + 0.02 * t, 0.08]
        })
        .collect();
    data.push(vec![3.0, 0.9, 0.0]);

    let config = IsolationConfig { n_trees: 100, sample_size: 16, threshold: 0.6 };
    let forest = IsolationForest::fit(&data, &config, &mut TableRng::new(3, 7)).unwrap();

    let scores: Vec<f64> = data.iter().map(|x| forest.score(x)).collect();
    let (max_idx, _) = scores
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, s)| if *s > best.1 { (i, *s) } else { best });
    assert_eq!(max_idx, 30);
    assert!(scores.iter().all(|s| *s > 0.0 && *s <= 1.0));
}

#[test]
fn isolation_forest_rejects_empty_and_ragged_input() {
    let config = IsolationConfig::default();
    assert!(matches!(
        IsolationForest::fit(&[], &config, &mut TableRng::new(1, 7)),
        Err(DashError::NoDataForSelection { .. })
    ));
    assert!(matches!(
        IsolationForest::fit(&[vec![1.0, 2.0], vec![1.0]], &config, &mut TableRng::new(1, 7)),
        Err(DashError::InvalidInput(_))
    ));
}

#[test]
fn site_anomalies_cover_every_site() {
    let config = DashboardConfig::default_test();
    let data = SeededSource.generate(&config).unwrap();
    let r = &data.regulator;
    let gaps = revenue_gaps(&r.sites, &r.financials).unwrap();

    let rows = site_anomalies(
        &r.sites,
        &gaps,
        &config.isolation,
        &mut RngBank::new(config.seed).for_slot(StreamSlot::IsolationForest),
    )
    .unwrap();

    assert_eq!(rows.len(), r.sites.len());
    for a in &rows {
        assert!(a.score > 0.0 && a.score <= 1.0);
        assert_eq!(a.is_anomaly, a.score > config.isolation.threshold);
    }
}
