//! Random-forest risk classifier over the four sub-scores.
//!
//! Illustrative only: the forest is refit from scratch on every page
//! view from the current integrated-risk rows. There is no held-out
//! set and nothing is kept between views.
//!
//! Trees are stored as flat node arenas (index 0 is the root). Splits
//! use Gini impurity; each split considers a random subset of
//! sqrt(features) features, and every tree is grown on a bootstrap
//! sample of the rows.

use serde::{Deserialize, Serialize};

use crate::{
    config::ForestConfig,
    error::{DashError, DashResult},
    risk::{IntegratedRisk, SubScores},
    rng::TableRng,
    types::RiskCategory,
};

const N_FEATURES: usize = 4;
const N_CLASSES: usize = 3;

type Features = [f64; N_FEATURES];
type ClassDist = [f64; N_CLASSES];

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        dist: ClassDist,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn predict_dist(&self, x: &Features) -> ClassDist {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { dist } => return *dist,
                Node::Split { feature, threshold, left, right } => {
                    id = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

struct GrowParams {
    max_depth: usize,
    min_samples_split: usize,
    max_features: usize,
}

struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

fn class_counts(y: &[usize], idx: &[usize]) -> ClassDist {
    let mut counts = [0.0; N_CLASSES];
    for &i in idx {
        counts[y[i]] += 1.0;
    }
    counts
}

fn gini(counts: &ClassDist, n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / n).powi(2)).sum::<f64>()
}

/// Best threshold on one feature, as (threshold, weighted child impurity).
fn best_threshold(x: &[Features], y: &[usize], idx: &[usize], feature: usize) -> Option<(f64, f64)> {
    let mut pairs: Vec<(f64, usize)> = idx.iter().map(|&i| (x[i][feature], y[i])).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pairs.len() as f64;
    let mut right = [0.0; N_CLASSES];
    for (_, c) in &pairs {
        right[*c] += 1.0;
    }
    let mut left = [0.0; N_CLASSES];
    let mut best: Option<(f64, f64)> = None;

    for k in 0..pairs.len().saturating_sub(1) {
        let (value, class) = pairs[k];
        left[class] += 1.0;
        right[class] -= 1.0;
        let next = pairs[k + 1].0;
        if value == next {
            continue;
        }
        let nl = (k + 1) as f64;
        let nr = n - nl;
        let weighted = nl / n * gini(&left, nl) + nr / n * gini(&right, nr);
        if best.map_or(true, |(_, w)| weighted < w) {
            best = Some(((value + next) / 2.0, weighted));
        }
    }
    best
}

fn best_split(
    x: &[Features],
    y: &[usize],
    idx: &[usize],
    impurity: f64,
    max_features: usize,
    rng: &mut TableRng,
) -> Option<Split> {
    let mut order: Vec<usize> = (0..N_FEATURES).collect();
    for i in (1..order.len()).rev() {
        let j = rng.index(i + 1);
        order.swap(i, j);
    }

    // Look at max_features candidates; keep drawing only if none of them
    // could split at all.
    let mut best: Option<Split> = None;
    let mut tried_valid = 0;
    for feature in order {
        if tried_valid >= max_features {
            break;
        }
        let Some((threshold, weighted)) = best_threshold(x, y, idx, feature) else {
            continue;
        };
        tried_valid += 1;
        let decrease = impurity - weighted;
        if best.as_ref().map_or(true, |b| decrease > b.decrease) {
            best = Some(Split { feature, threshold, decrease });
        }
    }
    best
}

#[allow(clippy::too_many_arguments)]
fn grow(
    nodes: &mut Vec<Node>,
    x: &[Features],
    y: &[usize],
    idx: Vec<usize>,
    depth: usize,
    params: &GrowParams,
    rng: &mut TableRng,
    importance: &mut Features,
) -> usize {
    let n = idx.len() as f64;
    let counts = class_counts(y, &idx);
    let impurity = gini(&counts, n);

    let leaf = |nodes: &mut Vec<Node>| {
        let dist = counts.map(|c| if n > 0.0 { c / n } else { 0.0 });
        nodes.push(Node::Leaf { dist });
        nodes.len() - 1
    };

    if depth >= params.max_depth || idx.len() < params.min_samples_split || impurity <= 0.0 {
        return leaf(nodes);
    }
    let split = match best_split(x, y, &idx, impurity, params.max_features, rng) {
        Some(s) if s.decrease > 1e-12 => s,
        _ => return leaf(nodes),
    };

    importance[split.feature] += n * split.decrease;
    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
        .into_iter()
        .partition(|&i| x[i][split.feature] <= split.threshold);

    let id = nodes.len();
    nodes.push(Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: 0,
        right: 0,
    });
    let l = grow(nodes, x, y, left_idx, depth + 1, params, rng, importance);
    let r = grow(nodes, x, y, right_idx, depth + 1, params, rng, importance);
    if let Node::Split { left, right, .. } = &mut nodes[id] {
        *left = l;
        *right = r;
    }
    id
}

/// A fitted forest.
#[derive(Debug, Clone)]
pub struct RiskForest {
    trees: Vec<DecisionTree>,
    importances: Features,
    n_samples: usize,
    classes_seen: Vec<RiskCategory>,
}

/// Outcome of a what-if query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub input: SubScores,
    pub category: RiskCategory,
    /// One entry per category, in ordinal order; sums to 1.
    pub probabilities: Vec<(RiskCategory, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

impl RiskForest {
    /// Fit on labelled sub-score rows.
    pub fn fit(
        rows: &[(SubScores, RiskCategory)],
        config: &ForestConfig,
        rng: &mut TableRng,
    ) -> DashResult<Self> {
        if rows.is_empty() {
            return Err(DashError::no_data("cannot fit classifier on zero rows"));
        }
        if config.n_trees == 0 {
            return Err(DashError::InvalidInput("forest needs at least one tree".into()));
        }

        let x: Vec<Features> = rows.iter().map(|(s, _)| s.as_features()).collect();
        let y: Vec<usize> = rows.iter().map(|(_, c)| c.index()).collect();
        let params = GrowParams {
            max_depth: config.max_depth.max(1),
            min_samples_split: config.min_samples_split.max(2),
            max_features: (N_FEATURES as f64).sqrt().floor().max(1.0) as usize,
        };

        let n = rows.len();
        let mut trees = Vec::with_capacity(config.n_trees);
        let mut importance_sum = [0.0; N_FEATURES];
        let mut contributing = 0usize;

        for _ in 0..config.n_trees {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.index(n)).collect();
            let mut nodes = Vec::new();
            let mut importance = [0.0; N_FEATURES];
            grow(&mut nodes, &x, &y, bootstrap, 0, &params, rng, &mut importance);

            let total: f64 = importance.iter().sum();
            if total > 0.0 {
                for (acc, v) in importance_sum.iter_mut().zip(importance) {
                    *acc += v / total;
                }
                contributing += 1;
            }
            trees.push(DecisionTree { nodes });
        }

        let importances = if contributing > 0 {
            let total: f64 = importance_sum.iter().sum();
            importance_sum.map(|v| v / total)
        } else {
            [0.0; N_FEATURES]
        };

        let mut classes_seen: Vec<RiskCategory> = rows.iter().map(|(_, c)| *c).collect();
        classes_seen.sort();
        classes_seen.dedup();

        log::debug!(
            "classifier: {} trees on {} rows, classes={:?}, max depth {}",
            trees.len(),
            n,
            classes_seen,
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        Ok(Self {
            trees,
            importances,
            n_samples: n,
            classes_seen,
        })
    }

    /// Fit with each row's threshold category as the label.
    pub fn fit_integrated(
        rows: &[IntegratedRisk],
        config: &ForestConfig,
        rng: &mut TableRng,
    ) -> DashResult<Self> {
        let labelled: Vec<(SubScores, RiskCategory)> =
            rows.iter().map(|r| (r.sub_scores, r.category)).collect();
        Self::fit(&labelled, config, rng)
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn classes_seen(&self) -> &[RiskCategory] {
        &self.classes_seen
    }

    /// Mean leaf distribution across trees, in `RiskCategory::ALL` order.
    pub fn predict_proba(&self, input: &SubScores) -> ClassDist {
        let x = input.as_features();
        let mut acc = [0.0; N_CLASSES];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.predict_dist(&x)) {
                *a += p;
            }
        }
        let total: f64 = acc.iter().sum();
        if total > 0.0 {
            acc.map(|a| a / total)
        } else {
            acc
        }
    }

    /// Most probable category; ties go to the lower category.
    pub fn predict(&self, input: &SubScores) -> RiskCategory {
        let proba = self.predict_proba(input);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        RiskCategory::ALL[best]
    }

    pub fn what_if(&self, input: SubScores) -> Prediction {
        let proba = self.predict_proba(&input);
        Prediction {
            input,
            category: self.predict(&input),
            probabilities: RiskCategory::ALL.iter().copied().zip(proba).collect(),
        }
    }

    /// Mean decrease in impurity, normalized to sum to 1 (all zero when
    /// no tree ever split).
    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        SubScores::FEATURE_NAMES
            .iter()
            .zip(self.importances)
            .map(|(name, importance)| FeatureImportance {
                feature: name.to_string(),
                importance,
            })
            .collect()
    }

    /// Share of the given rows the forest labels correctly.
    pub fn accuracy(&self, rows: &[IntegratedRisk]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        let hits = rows
            .iter()
            .filter(|r| self.predict(&r.sub_scores) == r.category)
            .count();
        hits as f64 / rows.len() as f64
    }
}
