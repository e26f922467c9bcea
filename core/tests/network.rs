//! Connection graph metrics.

use nickel_watch_core::{
    dataset::Connection,
    error::DashError,
    network::{circular_layout, ConnectionGraph},
    types::{ConnectionCategory, NodeKind},
};

fn tie(a: &str, b: &str, weight: f64) -> Connection {
    Connection {
        source: a.into(),
        source_kind: NodeKind::Official,
        target: b.into(),
        target_kind: NodeKind::Official,
        weight,
        category: ConnectionCategory::Political,
    }
}

fn company_tie(official: &str, company: &str, weight: f64) -> Connection {
    Connection {
        source: official.into(),
        source_kind: NodeKind::Official,
        target: company.into(),
        target_kind: NodeKind::Company,
        weight,
        category: ConnectionCategory::Business,
    }
}

#[test]
fn star_centre_dominates() {
    let connections: Vec<Connection> =
        ["b", "c", "d", "e"].iter().map(|leaf| tie("hub", leaf, 0.8)).collect();
    let graph = ConnectionGraph::from_connections(&connections);
    let analysis = graph.analyze().unwrap();

    let hub = analysis.nodes.iter().find(|n| n.name == "hub").unwrap();
    assert_eq!(hub.degree, 4);
    assert!((hub.degree_centrality - 1.0).abs() < 1e-12);
    for leaf in analysis.nodes.iter().filter(|n| n.name != "hub") {
        assert!((leaf.degree_centrality - 0.25).abs() < 1e-12);
        assert_eq!(leaf.betweenness, 0.0);
        assert!(hub.betweenness > leaf.betweenness);
        assert!(hub.eigenvector > leaf.eigenvector);
    }
    assert!(hub.betweenness <= 1.0 + 1e-9);
    assert_eq!(analysis.components, 1);
}

#[test]
fn duplicate_pairs_collapse_to_heaviest_edge() {
    let connections = vec![tie("a", "b", 0.3), tie("b", "a", 0.9), tie("a", "b", 0.5)];
    let graph = ConnectionGraph::from_connections(&connections);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    let analysis = graph.analyze().unwrap();
    assert_eq!(analysis.edges.len(), 1);
    assert_eq!(analysis.edges[0].weight, 0.9);
}

#[test]
fn self_loops_are_ignored() {
    let graph = ConnectionGraph::from_connections(&[tie("a", "a", 0.5), tie("a", "b", 0.5)]);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn official_and_company_with_same_name_stay_distinct() {
    let graph = ConnectionGraph::from_connections(&[
        company_tie("Budi", "PT Nikel", 0.7),
        tie("Budi", "PT Nikel", 0.4),
    ]);
    assert_eq!(graph.node_count(), 3);
    assert!(graph.contains(NodeKind::Company, "PT Nikel"));
    assert!(graph.contains(NodeKind::Official, "PT Nikel"));
}

#[test]
fn two_cliques_form_two_communities() {
    let mut connections = Vec::new();
    for (a, b) in [("a1", "a2"), ("a1", "a3"), ("a2", "a3")] {
        connections.push(tie(a, b, 1.0));
    }
    for (a, b) in [("b1", "b2"), ("b1", "b3"), ("b2", "b3")] {
        connections.push(tie(a, b, 1.0));
    }
    connections.push(tie("a3", "b1", 0.1));

    let graph = ConnectionGraph::from_connections(&connections);
    let labels = graph.communities();
    let analysis = graph.analyze().unwrap();

    assert_eq!(analysis.communities, 2);
    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[1], labels[2]);
    assert_eq!(labels[3], labels[4]);
    assert_eq!(labels[4], labels[5]);
    assert_ne!(labels[0], labels[3]);
    assert!(analysis.modularity > 0.3, "modularity {}", analysis.modularity);
    assert_eq!(analysis.components, 1);
}

#[test]
fn community_detection_is_deterministic() {
    let connections: Vec<Connection> = (0..12)
        .map(|i| tie(&format!("n{}", i % 7), &format!("n{}", (i * 3 + 1) % 7), 0.2 + 0.05 * i as f64))
        .collect();
    let graph = ConnectionGraph::from_connections(&connections);
    assert_eq!(graph.communities(), graph.communities());
}

#[test]
fn single_partition_has_zero_modularity() {
    let graph = ConnectionGraph::from_connections(&[tie("a", "b", 1.0), tie("b", "c", 1.0)]);
    let q = graph.modularity(&[0, 0, 0]);
    assert!(q.abs() < 1e-12);
}

#[test]
fn disconnected_pairs_count_as_components() {
    let graph = ConnectionGraph::from_connections(&[tie("a", "b", 0.5), tie("c", "d", 0.5)]);
    assert_eq!(graph.component_count(), 2);
}

#[test]
fn empty_graph_is_no_data() {
    let graph = ConnectionGraph::from_connections(&[]);
    assert!(matches!(graph.analyze(), Err(DashError::NoDataForSelection { .. })));
}

#[test]
fn layout_places_nodes_on_unit_circle() {
    let points = circular_layout(5);
    assert_eq!(points.len(), 5);
    for (x, y) in points {
        assert!(((x * x + y * y) - 1.0).abs() < 1e-9);
    }
    assert!(circular_layout(0).is_empty());
}
