//! Go IMPLEMENTS pass: interface satisfaction by method-set matching.
//!
//! Go declares no implements relation, so a type implements an interface
//! when its method set covers the interface's. Only Go files participate;
//! IMPLEMENTS edges from other languages (e.g. Rust trait impls recorded
//! at extraction) are left alone by deleting per Go source file only.

use std::collections::{HashMap, HashSet};

use crate::error::IndexResult;
use crate::storage::GraphStore;
use crate::types::{Edge, EdgeType, Node, NodeId, NodeLabel};

pub fn run(project: &str, store: &dyn GraphStore) -> IndexResult<usize> {
    let wrap = |source| crate::error::IndexError::StoreBatch {
        pass: "implements".to_string(),
        source,
    };

    // Clean own output: IMPLEMENTS edges originating in Go files.
    for file in store.list_files_for_project(project).map_err(wrap)? {
        if file.ends_with(".go") {
            store
                .delete_edges_by_source_file(project, &file, EdgeType::Implements)
                .map_err(wrap)?;
        }
    }

    let interfaces: Vec<Node> = store
        .find_nodes_by_label(project, NodeLabel::Interface)
        .map_err(wrap)?
        .into_iter()
        .filter(|n| n.file_path.ends_with(".go"))
        .collect();
    let types: Vec<Node> = store
        .find_nodes_by_label(project, NodeLabel::Class)
        .map_err(wrap)?
        .into_iter()
        .filter(|n| n.file_path.ends_with(".go"))
        .collect();
    if interfaces.is_empty() || types.is_empty() {
        return Ok(0);
    }

    let mut method_sets: HashMap<NodeId, HashSet<String>> = HashMap::new();
    let mut collect_methods = |node: &Node| -> IndexResult<HashSet<String>> {
        let Some(id) = node.id else {
            return Ok(HashSet::new());
        };
        if let Some(cached) = method_sets.get(&id) {
            return Ok(cached.clone());
        }
        let edges = store
            .find_edges_by_source_and_type(id, EdgeType::DefinesMethod)
            .map_err(wrap)?;
        let targets: Vec<NodeId> = edges.iter().map(|e| e.target).collect();
        let names: HashSet<String> = store
            .find_nodes_by_ids(&targets)
            .map_err(wrap)?
            .into_iter()
            .map(|n| n.name)
            .collect();
        method_sets.insert(id, names.clone());
        Ok(names)
    };

    let mut edges = Vec::new();
    for interface in &interfaces {
        let required = collect_methods(interface)?;
        if required.is_empty() {
            continue;
        }
        let Some(interface_id) = interface.id else {
            continue;
        };
        for ty in &types {
            let Some(type_id) = ty.id else { continue };
            let provided = collect_methods(ty)?;
            if required.is_subset(&provided) {
                edges.push(Edge::new(project, type_id, interface_id, EdgeType::Implements));
            }
        }
    }
    let count = edges.len();
    store.insert_edge_batch(&edges).map_err(wrap)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn define_methods(store: &MemoryStore, owner_qn: &str, methods: &[&str], file: &str) {
        let owner = store.find_node_by_qn("p", owner_qn).unwrap().unwrap();
        for method in methods {
            let qn = format!("{owner_qn}.{method}");
            let ids = store
                .upsert_node_batch(&[Node::new("p", NodeLabel::Method, *method, &qn, file)])
                .unwrap();
            store
                .insert_edge_batch(&[Edge::new(
                    "p",
                    owner.id.unwrap(),
                    ids[&qn],
                    EdgeType::DefinesMethod,
                )])
                .unwrap();
        }
    }

    #[test]
    fn method_set_coverage_yields_implements() {
        let store = MemoryStore::new();
        store
            .upsert_node_batch(&[
                Node::new("p", NodeLabel::Interface, "Runner", "p.m.Runner", "m.go"),
                Node::new("p", NodeLabel::Class, "Engine", "p.m.Engine", "m.go"),
                Node::new("p", NodeLabel::Class, "Stub", "p.m.Stub", "m.go"),
            ])
            .unwrap();
        define_methods(&store, "p.m.Runner", &["Run", "Stop"], "m.go");
        define_methods(&store, "p.m.Engine", &["Run", "Stop", "Reset"], "m.go");
        define_methods(&store, "p.m.Stub", &["Run"], "m.go");

        let count = run("p", &store).unwrap();
        assert_eq!(count, 1);

        let edges = store.find_edges_by_type("p", EdgeType::Implements).unwrap();
        let nodes = store.find_nodes_by_ids(&[edges[0].source]).unwrap();
        assert_eq!(nodes[0].qualified_name, "p.m.Engine");
    }

    #[test]
    fn rerun_is_idempotent() {
        let store = MemoryStore::new();
        store
            .upsert_node_batch(&[
                Node::new("p", NodeLabel::Interface, "Closer", "p.m.Closer", "m.go"),
                Node::new("p", NodeLabel::Class, "File", "p.m.File", "m.go"),
            ])
            .unwrap();
        define_methods(&store, "p.m.Closer", &["Close"], "m.go");
        define_methods(&store, "p.m.File", &["Close"], "m.go");

        run("p", &store).unwrap();
        run("p", &store).unwrap();
        assert_eq!(
            store
                .count_edges_by_type("p", EdgeType::Implements)
                .unwrap(),
            1
        );
    }
}
