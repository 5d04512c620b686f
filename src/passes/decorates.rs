//! DECORATES pass: decorator strings resolved back to the functions that
//! implement them.

use crate::error::IndexResult;
use crate::registry::{NameRegistry, ResolutionQuery};
use crate::resolve::{ResolvedEdge, flush_edges};
use crate::storage::GraphStore;
use crate::types::{EdgeType, NodeLabel};

const DECORATED_LABELS: [NodeLabel; 3] =
    [NodeLabel::Function, NodeLabel::Method, NodeLabel::Class];

pub fn run(
    project: &str,
    registry: &NameRegistry,
    store: &dyn GraphStore,
) -> IndexResult<usize> {
    let wrap = |source| crate::error::IndexError::StoreBatch {
        pass: "decorates".to_string(),
        source,
    };
    let modules = super::modules_by_qn(store, project).map_err(wrap)?;

    let accept = |label: NodeLabel| matches!(label, NodeLabel::Function | NodeLabel::Method);
    let mut edges = Vec::new();

    for label in DECORATED_LABELS {
        for node in store.find_nodes_by_label(project, label).map_err(wrap)? {
            let Some(decorators) = node.prop("decorators") else {
                continue;
            };
            let Some((module_qn, _)) = node.qualified_name.rsplit_once('.') else {
                continue;
            };
            let imports = modules
                .get(module_qn)
                .map(super::stored_import_map)
                .unwrap_or_default();

            for original in decorators.string_items() {
                let name = original.trim_start_matches('@');
                let name = name.split('(').next().unwrap_or(name).trim();
                if name.is_empty() {
                    continue;
                }
                let query = ResolutionQuery {
                    callee: name,
                    module_qn,
                    imports: &imports,
                    type_map: None,
                    enclosing_class: None,
                };
                if let Some(res) = registry.resolve_filtered(&query, &accept)
                    && res.qn != node.qualified_name
                {
                    edges.push(
                        ResolvedEdge::new(
                            res.qn,
                            node.qualified_name.clone(),
                            EdgeType::Decorates,
                        )
                        .with_prop("decorator", original),
                    );
                }
            }
        }
    }
    flush_edges(project, "decorates", edges, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{Node, PropValue};

    #[test]
    fn decorator_string_resolves_to_its_function() {
        let store = MemoryStore::new();
        store
            .upsert_node_batch(&[
                Node::new("p", NodeLabel::Module, "app", "p.app", "app.py"),
                Node::new("p", NodeLabel::Function, "cached", "p.app.cached", "app.py"),
                Node::new("p", NodeLabel::Function, "load", "p.app.load", "app.py")
                    .with_prop("decorators", vec!["cached(ttl=60)".to_string()]),
            ])
            .unwrap();

        let registry = NameRegistry::new();
        registry.build_from_store(&store, "p").unwrap();

        let inserted = run("p", &registry, &store).unwrap();
        assert_eq!(inserted, 1);

        let edges = store.find_edges_by_type("p", EdgeType::Decorates).unwrap();
        assert_eq!(
            edges[0]
                .properties
                .get("decorator")
                .and_then(PropValue::as_str),
            Some("cached(ttl=60)")
        );
        // Source is the decorator function, target the decorated one.
        let source = store.find_nodes_by_ids(&[edges[0].source]).unwrap();
        assert_eq!(source[0].qualified_name, "p.app.cached");
    }
}
