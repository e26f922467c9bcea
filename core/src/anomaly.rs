//! Isolation-forest anomaly scores for regulator sites.
//!
//! Features per site: land growth ratio (percent change / 100), revenue
//! gap ratio and effective tax rate. Display only; the integrated risk
//! score never reads these.

use serde::{Deserialize, Serialize};

use crate::{
    config::IsolationConfig,
    dataset::Site,
    error::{DashError, DashResult},
    financial::RevenueGap,
    land::LandChange,
    rng::TableRng,
};

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Average path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf { size: usize },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(data: &[Vec<f64>], sample: Vec<usize>, height_limit: usize, rng: &mut TableRng) -> Self {
        let mut nodes = Vec::new();
        build(&mut nodes, data, sample, 0, height_limit, rng);
        Self { nodes }
    }

    fn path_length(&self, x: &[f64]) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split { feature, threshold, left, right } => {
                    id = if x[*feature] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

fn build(
    nodes: &mut Vec<Node>,
    data: &[Vec<f64>],
    idx: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut TableRng,
) -> usize {
    let leaf = |nodes: &mut Vec<Node>, size: usize| {
        nodes.push(Node::Leaf { size });
        nodes.len() - 1
    };
    if depth >= height_limit || idx.len() <= 1 {
        return leaf(nodes, idx.len());
    }

    // Only features that still vary inside this node can split it.
    let n_features = data[idx[0]].len();
    let spans: Vec<(usize, f64, f64)> = (0..n_features)
        .filter_map(|f| {
            let (lo, hi) = idx.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                (lo.min(data[i][f]), hi.max(data[i][f]))
            });
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();
    if spans.is_empty() {
        return leaf(nodes, idx.len());
    }

    let (feature, lo, hi) = *rng.pick(&spans);
    let threshold = rng.range_f64(lo, hi);
    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
        idx.into_iter().partition(|&i| data[i][feature] < threshold);

    let id = nodes.len();
    nodes.push(Node::Split { feature, threshold, left: 0, right: 0 });
    let l = build(nodes, data, left_idx, depth + 1, height_limit, rng);
    let r = build(nodes, data, right_idx, depth + 1, height_limit, rng);
    if let Node::Split { left, right, .. } = &mut nodes[id] {
        *left = l;
        *right = r;
    }
    id
}

/// A fitted isolation forest.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit on rows of equal width.
    pub fn fit(data: &[Vec<f64>], config: &IsolationConfig, rng: &mut TableRng) -> DashResult<Self> {
        if data.is_empty() {
            return Err(DashError::no_data("cannot fit isolation forest on zero rows"));
        }
        let width = data[0].len();
        if width == 0 || data.iter().any(|row| row.len() != width) {
            return Err(DashError::InvalidInput("feature rows must share a non-zero width".into()));
        }

        let sample_size = config.sample_size.clamp(1, data.len());
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let trees = (0..config.n_trees.max(1))
            .map(|_| {
                // Partial Fisher-Yates: the first `sample_size` slots are a
                // sample without replacement.
                let mut pool: Vec<usize> = (0..data.len()).collect();
                for k in 0..sample_size {
                    let j = k + rng.index(pool.len() - k);
                    pool.swap(k, j);
                }
                pool.truncate(sample_size);
                IsolationTree::grow(data, pool, height_limit, rng)
            })
            .collect();

        Ok(Self { trees, sample_size })
    }

    /// Anomaly score in (0, 1]; about 0.5 or less is ordinary, near 1 is
    /// easily isolated.
    pub fn score(&self, x: &[f64]) -> f64 {
        let c = average_path_length(self.sample_size);
        if c <= 0.0 || self.trees.is_empty() {
            return 0.5;
        }
        let mean_path =
            self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        2f64.powf(-mean_path / c)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteAnomaly {
    pub site_id: String,
    pub site_name: String,
    pub land_growth: f64,
    pub gap_ratio: f64,
    pub effective_tax_rate: f64,
    pub score: f64,
    pub is_anomaly: bool,
}

/// Score every site that has a revenue-gap row. Sites and gaps are
/// matched by id; sites without a gap row are skipped.
pub fn site_anomalies(
    sites: &[Site],
    gaps: &[RevenueGap],
    config: &IsolationConfig,
    rng: &mut TableRng,
) -> DashResult<Vec<SiteAnomaly>> {
    let rows: Vec<(&Site, &RevenueGap)> = sites
        .iter()
        .filter_map(|s| gaps.iter().find(|g| g.site_id == s.id).map(|g| (s, g)))
        .collect();

    let features: Vec<Vec<f64>> = rows
        .iter()
        .map(|(site, gap)| {
            let growth = LandChange::from_site(site)
                .and_then(|c| c.percent_change)
                .map_or(0.0, |p| p / 100.0);
            vec![growth, gap.gap_ratio(), gap.effective_tax_rate.unwrap_or(0.0)]
        })
        .collect();

    let forest = IsolationForest::fit(&features, config, rng)?;

    let out: Vec<SiteAnomaly> = rows
        .iter()
        .zip(&features)
        .map(|((site, gap), f)| {
            let score = forest.score(f);
            SiteAnomaly {
                site_id: site.id.clone(),
                site_name: site.name.clone(),
                land_growth: f[0],
                gap_ratio: gap.gap_ratio(),
                effective_tax_rate: f[2],
                score,
                is_anomaly: score > config.threshold,
            }
        })
        .collect();

    log::debug!(
        "isolation forest: {} sites scored, {} flagged",
        out.len(),
        out.iter().filter(|a| a.is_anomaly).count()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_length_constants() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.24).abs() < 0.05, "c(256) = {c256}");
    }

    #[test]
    fn outlier_scores_higher_than_cluster() {
        let mut data: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![0.5 + (i as f64) * 0.001, 0.5 - (i as f64) * 0.001])
            .collect();
        data.push(vec![5.0, -4.0]);
        let config = IsolationConfig { n_trees: 100, sample_size: 16, threshold: 0.6 };
        let mut rng = TableRng::new(7, 0);
        let forest = IsolationForest::fit(&data, &config, &mut rng).unwrap();
        let outlier = forest.score(&data[20]);
        let inlier = forest.score(&data[10]);
        assert!(outlier > inlier, "outlier {outlier} vs inlier {inlier}");
    }
}
