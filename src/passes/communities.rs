//! Community detection: greedy modularity optimisation over the
//! undirected projection of the CALLS graph.
//!
//! Louvain-style local moves, capped at 50 outer iterations, until no node
//! changes community. Singleton communities are dropped. Cohesion is the
//! known-members ratio (members still resolvable in the store over total
//! member count).

use std::collections::{BTreeMap, HashMap};

use crate::error::IndexResult;
use crate::storage::GraphStore;
use crate::types::{Edge, EdgeType, Node, NodeId, NodeLabel, PropValue};

const MAX_ITERATIONS: usize = 50;

pub fn run(project: &str, store: &dyn GraphStore) -> IndexResult<usize> {
    let wrap = |source| crate::error::IndexError::StoreBatch {
        pass: "communities".to_string(),
        source,
    };

    // This pass owns its output: clear and recompute.
    store
        .delete_edges_by_type(project, EdgeType::MemberOf)
        .map_err(wrap)?;
    store
        .delete_nodes_by_label(project, NodeLabel::Community)
        .map_err(wrap)?;

    let calls = store.find_edges_by_type(project, EdgeType::Calls).map_err(wrap)?;
    if calls.is_empty() {
        return Ok(0);
    }

    let assignment = cluster(&calls);

    // Group members, dropping singletons.
    let mut groups: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for (node, community) in assignment {
        groups.entry(community).or_default().push(node);
    }
    let mut groups: Vec<Vec<NodeId>> = groups
        .into_values()
        .filter(|members| members.len() > 1)
        .collect();
    for members in &mut groups {
        members.sort();
    }
    groups.sort_by(|a, b| a.first().cmp(&b.first()));

    let mut created = 0usize;
    for (idx, members) in groups.iter().enumerate() {
        let known = store.find_nodes_by_ids(members).map_err(wrap)?;
        let cohesion = known.len() as f64 / members.len() as f64;

        let mut ranked: Vec<&Node> = known.iter().collect();
        ranked.sort_by_key(|n| (label_rank(n.label), n.name.clone()));
        let top_symbols: Vec<PropValue> = ranked
            .iter()
            .take(5)
            .map(|n| {
                let mut m = BTreeMap::new();
                m.insert("name".to_string(), PropValue::from(n.name.clone()));
                m.insert("label".to_string(), PropValue::from(n.label.as_str()));
                m.insert(
                    "qualified_name".to_string(),
                    PropValue::from(n.qualified_name.clone()),
                );
                PropValue::Map(m)
            })
            .collect();

        let name = ranked
            .first()
            .map(|n| format!("{}_cluster", n.name))
            .unwrap_or_else(|| format!("community_{idx}"));
        let qn = format!("{project}.__community__.{idx}");

        let community = Node::new(project, NodeLabel::Community, name, qn, "")
            .with_prop("cohesion", cohesion)
            .with_prop("symbol_count", members.len())
            .with_prop("top_symbols", PropValue::List(top_symbols));
        let community_id = store.upsert_node(&community).map_err(wrap)?;

        let member_edges: Vec<Edge> = members
            .iter()
            .map(|&member| Edge::new(project, member, community_id, EdgeType::MemberOf))
            .collect();
        store.insert_edge_batch(&member_edges).map_err(wrap)?;
        created += 1;
    }

    tracing::info!(communities = created, "community detection finished");
    Ok(created)
}

/// Greedy modularity: each node starts in its own community and repeatedly
/// moves to the neighboring community with the best modularity gain.
fn cluster(calls: &[Edge]) -> HashMap<NodeId, usize> {
    // Undirected projection with summed weights; self-calls are ignored.
    let mut adjacency: HashMap<NodeId, HashMap<NodeId, f64>> = HashMap::new();
    for edge in calls {
        if edge.source == edge.target {
            continue;
        }
        *adjacency
            .entry(edge.source)
            .or_default()
            .entry(edge.target)
            .or_insert(0.0) += 1.0;
        *adjacency
            .entry(edge.target)
            .or_default()
            .entry(edge.source)
            .or_insert(0.0) += 1.0;
    }

    let mut nodes: Vec<NodeId> = adjacency.keys().copied().collect();
    nodes.sort();

    let degree: HashMap<NodeId, f64> = nodes
        .iter()
        .map(|n| (*n, adjacency[n].values().sum()))
        .collect();
    let two_m: f64 = degree.values().sum();
    if two_m == 0.0 {
        return HashMap::new();
    }

    let mut community: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, n)| (*n, idx))
        .collect();
    let mut totals: Vec<f64> = nodes.iter().map(|n| degree[n]).collect();

    for _ in 0..MAX_ITERATIONS {
        let mut moved = false;
        for node in &nodes {
            let current = community[node];
            let k_i = degree[node];
            totals[current] -= k_i;

            // Weight from this node into each neighboring community.
            let mut into: HashMap<usize, f64> = HashMap::new();
            for (neighbor, weight) in &adjacency[node] {
                *into.entry(community[neighbor]).or_insert(0.0) += weight;
            }

            let gain = |comm: usize| {
                into.get(&comm).copied().unwrap_or(0.0) - totals[comm] * k_i / two_m
            };
            let mut best = (current, gain(current));
            let mut options: Vec<usize> = into.keys().copied().collect();
            options.sort();
            for comm in options {
                let g = gain(comm);
                if g > best.1 {
                    best = (comm, g);
                }
            }

            totals[best.0] += k_i;
            if best.0 != current {
                community.insert(*node, best.0);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
    community
}

fn label_rank(label: NodeLabel) -> u8 {
    match label {
        NodeLabel::Class => 0,
        NodeLabel::Interface => 1,
        NodeLabel::Type => 2,
        NodeLabel::Function => 3,
        NodeLabel::Method => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    /// Two 5-cliques with one bridge call must produce two communities.
    #[test]
    fn two_cliques_stay_separate() {
        let store = MemoryStore::new();
        let mut nodes = Vec::new();
        for i in 0..10 {
            nodes.push(Node::new(
                "p",
                NodeLabel::Function,
                format!("f{i}"),
                format!("p.m.f{i}"),
                "m.go",
            ));
        }
        let ids = store.upsert_node_batch(&nodes).unwrap();
        let id = |i: usize| ids[&format!("p.m.f{i}")];

        let mut edges = Vec::new();
        for a in 0..5 {
            for b in 0..5 {
                if a < b {
                    edges.push(Edge::new("p", id(a), id(b), EdgeType::Calls));
                }
            }
        }
        for a in 5..10 {
            for b in 5..10 {
                if a < b {
                    edges.push(Edge::new("p", id(a), id(b), EdgeType::Calls));
                }
            }
        }
        // The bridge.
        edges.push(Edge::new("p", id(0), id(5), EdgeType::Calls));
        store.insert_edge_batch(&edges).unwrap();

        let created = run("p", &store).unwrap();
        assert_eq!(created, 2);

        let communities = store
            .find_nodes_by_label("p", NodeLabel::Community)
            .unwrap();
        assert_eq!(communities.len(), 2);
        for community in &communities {
            assert_eq!(
                community.prop("symbol_count").and_then(PropValue::as_int),
                Some(5)
            );
            assert!(community.name.ends_with("_cluster"));
        }

        let member_edges = store.find_edges_by_type("p", EdgeType::MemberOf).unwrap();
        assert_eq!(member_edges.len(), 10);
    }

    #[test]
    fn rerun_replaces_prior_output() {
        let store = MemoryStore::new();
        let ids = store
            .upsert_node_batch(&[
                Node::new("p", NodeLabel::Function, "a", "p.m.a", "m.go"),
                Node::new("p", NodeLabel::Function, "b", "p.m.b", "m.go"),
                Node::new("p", NodeLabel::Function, "c", "p.m.c", "m.go"),
            ])
            .unwrap();
        store
            .insert_edge_batch(&[
                Edge::new("p", ids["p.m.a"], ids["p.m.b"], EdgeType::Calls),
                Edge::new("p", ids["p.m.b"], ids["p.m.c"], EdgeType::Calls),
                Edge::new("p", ids["p.m.a"], ids["p.m.c"], EdgeType::Calls),
            ])
            .unwrap();

        run("p", &store).unwrap();
        run("p", &store).unwrap();

        // Idempotent across reruns: exactly one community survives.
        let communities = store
            .find_nodes_by_label("p", NodeLabel::Community)
            .unwrap();
        assert_eq!(communities.len(), 1);
        assert_eq!(
            store
                .count_edges_by_type("p", EdgeType::MemberOf)
                .unwrap(),
            3
        );
    }

    #[test]
    fn singletons_are_dropped() {
        let store = MemoryStore::new();
        let ids = store
            .upsert_node_batch(&[
                Node::new("p", NodeLabel::Function, "a", "p.m.a", "m.go"),
                Node::new("p", NodeLabel::Function, "b", "p.m.b", "m.go"),
            ])
            .unwrap();
        // A single self-call produces no clusterable structure.
        store
            .insert_edge_batch(&[Edge::new("p", ids["p.m.a"], ids["p.m.a"], EdgeType::Calls)])
            .unwrap();
        let created = run("p", &store).unwrap();
        assert_eq!(created, 0);
    }
}
