//! Official/company connection network and its metrics.
//!
//! Nodes are entity names; an official and a company that happen to
//! share a name stay distinct because the kind is part of the key.
//! Duplicate pairs collapse to one edge carrying the heaviest weight.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

use rustworkx_core::centrality::{betweenness_centrality, eigenvector_centrality};
use rustworkx_core::connectivity::connected_components;
use rustworkx_core::petgraph::graph::{NodeIndex, UnGraph};
use rustworkx_core::petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::Connection,
    error::{DashError, DashResult},
    types::{ConnectionCategory, NodeKind},
};

const EIGENVECTOR_MAX_ITER: usize = 100;
const EIGENVECTOR_TOL: f64 = 1e-6;
const LABEL_PROPAGATION_MAX_ROUNDS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkNode {
    pub name: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NetworkEdge {
    pub weight: f64,
    pub category: ConnectionCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeMetrics {
    pub name: String,
    pub kind: NodeKind,
    pub degree: usize,
    pub degree_centrality: f64,
    pub betweenness: f64,
    pub eigenvector: f64,
    pub community: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeSummary {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub category: ConnectionCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkAnalysis {
    /// In insertion order (first appearance in the connection table).
    pub nodes: Vec<NodeMetrics>,
    pub edges: Vec<EdgeSummary>,
    pub communities: usize,
    pub modularity: f64,
    pub components: usize,
    /// False when the eigenvector iteration did not converge and the
    /// scores were reported as zero.
    pub eigenvector_converged: bool,
}

/// Undirected graph over connection rows.
pub struct ConnectionGraph {
    graph: UnGraph<NetworkNode, NetworkEdge>,
    index: HashMap<(NodeKind, String), NodeIndex>,
}

impl ConnectionGraph {
    pub fn from_connections(connections: &[Connection]) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index: HashMap<(NodeKind, String), NodeIndex> = HashMap::new();

        let mut node = |graph: &mut UnGraph<NetworkNode, NetworkEdge>, name: &str, kind: NodeKind| {
            *index.entry((kind, name.to_string())).or_insert_with(|| {
                graph.add_node(NetworkNode { name: name.to_string(), kind })
            })
        };

        for c in connections {
            let a = node(&mut graph, &c.source, c.source_kind);
            let b = node(&mut graph, &c.target, c.target_kind);
            if a == b {
                continue;
            }
            let edge = NetworkEdge { weight: c.weight, category: c.category };
            match graph.find_edge(a, b) {
                Some(e) if graph[e].weight >= c.weight => {}
                Some(e) => graph[e] = edge,
                None => {
                    graph.add_edge(a, b, edge);
                }
            }
        }

        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, kind: NodeKind, name: &str) -> bool {
        self.index.contains_key(&(kind, name.to_string()))
    }

    /// degree / (n - 1); all zero for a single node.
    pub fn degree_centrality(&self) -> Vec<f64> {
        let n = self.graph.node_count();
        self.graph
            .node_indices()
            .map(|idx| {
                if n > 1 {
                    self.graph.neighbors(idx).count() as f64 / (n - 1) as f64
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Normalized shortest-path betweenness.
    pub fn betweenness(&self) -> Vec<f64> {
        betweenness_centrality(&self.graph, false, true, 200)
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect()
    }

    /// Weighted eigenvector centrality, or None if power iteration did
    /// not converge.
    pub fn eigenvector(&self) -> Option<Vec<f64>> {
        if self.graph.edge_count() == 0 {
            return Some(vec![0.0; self.graph.node_count()]);
        }
        let result = eigenvector_centrality(
            &self.graph,
            |e| Ok::<f64, Infallible>(e.weight().weight),
            Some(EIGENVECTOR_MAX_ITER),
            Some(EIGENVECTOR_TOL),
        );
        match result {
            Ok(Some(scores)) => Some(
                scores
                    .into_iter()
                    .map(|v| if v.is_finite() { v } else { 0.0 })
                    .collect(),
            ),
            Ok(None) => None,
            Err(never) => match never {},
        }
    }

    /// Weighted label propagation. Nodes are visited in index order and
    /// take the label with the heaviest neighbour weight; ties go to the
    /// lowest label. Returned labels are renumbered 0.. by first
    /// appearance.
    pub fn communities(&self) -> Vec<usize> {
        let n = self.graph.node_count();
        let mut labels: Vec<usize> = (0..n).collect();

        for _ in 0..LABEL_PROPAGATION_MAX_ROUNDS {
            let mut changed = false;
            for idx in self.graph.node_indices() {
                let mut weight_by_label: BTreeMap<usize, f64> = BTreeMap::new();
                for e in self.graph.edges(idx) {
                    let other = if e.source() == idx { e.target() } else { e.source() };
                    *weight_by_label.entry(labels[other.index()]).or_default() += e.weight().weight;
                }
                // BTreeMap iterates ascending, so a strict `>` keeps the
                // lowest label on ties.
                let mut best: Option<(usize, f64)> = None;
                for (label, w) in weight_by_label {
                    if best.map_or(true, |(_, bw)| w > bw) {
                        best = Some((label, w));
                    }
                }
                if let Some((label, _)) = best {
                    if labels[idx.index()] != label {
                        labels[idx.index()] = label;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let mut renumber: HashMap<usize, usize> = HashMap::new();
        labels
            .into_iter()
            .map(|l| {
                let next = renumber.len();
                *renumber.entry(l).or_insert(next)
            })
            .collect()
    }

    /// Weighted Newman modularity of a partition.
    pub fn modularity(&self, communities: &[usize]) -> f64 {
        let m: f64 = self.graph.edge_weights().map(|e| e.weight).sum();
        if m <= 0.0 {
            return 0.0;
        }
        let k = communities.iter().copied().max().map_or(0, |c| c + 1);
        let mut internal = vec![0.0; k];
        let mut degree = vec![0.0; k];
        for e in self.graph.edge_references() {
            let (a, b) = (e.source().index(), e.target().index());
            let w = e.weight().weight;
            degree[communities[a]] += w;
            degree[communities[b]] += w;
            if communities[a] == communities[b] {
                internal[communities[a]] += w;
            }
        }
        internal
            .iter()
            .zip(&degree)
            .map(|(l, d)| l / m - (d / (2.0 * m)).powi(2))
            .sum()
    }

    pub fn component_count(&self) -> usize {
        connected_components(&self.graph).len()
    }

    pub fn analyze(&self) -> DashResult<NetworkAnalysis> {
        if self.graph.node_count() == 0 {
            return Err(DashError::no_data("no connections at this weight"));
        }

        let degree = self.degree_centrality();
        let betweenness = self.betweenness();
        let (eigenvector, eigenvector_converged) = match self.eigenvector() {
            Some(v) => (v, true),
            None => {
                log::warn!(
                    "network: eigenvector centrality did not converge on {} nodes, reporting zeros",
                    self.graph.node_count()
                );
                (vec![0.0; self.graph.node_count()], false)
            }
        };
        let communities = self.communities();
        let modularity = self.modularity(&communities);

        let nodes = self
            .graph
            .node_indices()
            .map(|idx| {
                let i = idx.index();
                let node = &self.graph[idx];
                NodeMetrics {
                    name: node.name.clone(),
                    kind: node.kind,
                    degree: self.graph.neighbors(idx).count(),
                    degree_centrality: degree[i],
                    betweenness: betweenness[i],
                    eigenvector: eigenvector[i],
                    community: communities[i],
                }
            })
            .collect();

        let edges = self
            .graph
            .edge_references()
            .map(|e| EdgeSummary {
                source: self.graph[e.source()].name.clone(),
                target: self.graph[e.target()].name.clone(),
                weight: e.weight().weight,
                category: e.weight().category,
            })
            .collect();

        Ok(NetworkAnalysis {
            nodes,
            edges,
            communities: communities.iter().copied().max().map_or(0, |c| c + 1),
            modularity,
            components: self.component_count(),
            eigenvector_converged,
        })
    }
}

/// Evenly spaced positions on the unit circle, one per node.
pub fn circular_layout(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / n.max(1) as f64;
            (angle.cos(), angle.sin())
        })
        .collect()
}
