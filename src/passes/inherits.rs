//! INHERITS pass: resolve each class's recorded base names against the
//! registry.

use crate::error::IndexResult;
use crate::registry::{NameRegistry, ResolutionQuery};
use crate::resolve::{ResolvedEdge, flush_edges};
use crate::storage::GraphStore;
use crate::types::{EdgeType, NodeLabel};

pub fn run(
    project: &str,
    registry: &NameRegistry,
    store: &dyn GraphStore,
) -> IndexResult<usize> {
    let wrap = |source| crate::error::IndexError::StoreBatch {
        pass: "inherits".to_string(),
        source,
    };
    let modules = super::modules_by_qn(store, project).map_err(wrap)?;

    let accept = |label: NodeLabel| {
        matches!(
            label,
            NodeLabel::Class | NodeLabel::Interface | NodeLabel::Type | NodeLabel::Enum
        )
    };
    let mut edges = Vec::new();

    for label in [NodeLabel::Class, NodeLabel::Interface] {
        for node in store.find_nodes_by_label(project, label).map_err(wrap)? {
            let Some(bases) = node.prop("base_classes") else {
                continue;
            };
            let Some((module_qn, _)) = node.qualified_name.rsplit_once('.') else {
                continue;
            };
            let imports = modules
                .get(module_qn)
                .map(super::stored_import_map)
                .unwrap_or_default();

            for base in bases.string_items() {
                let query = ResolutionQuery {
                    callee: base,
                    module_qn,
                    imports: &imports,
                    type_map: None,
                    enclosing_class: None,
                };
                if let Some(res) = registry.resolve_filtered(&query, &accept)
                    && res.qn != node.qualified_name
                {
                    edges.push(ResolvedEdge::new(
                        node.qualified_name.clone(),
                        res.qn,
                        EdgeType::Inherits,
                    ));
                }
            }
        }
    }
    flush_edges(project, "inherits", edges, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::Node;

    #[test]
    fn base_class_resolves_to_inherits_edge() {
        let store = MemoryStore::new();
        store
            .upsert_node_batch(&[
                Node::new("p", NodeLabel::Module, "models", "p.models", "models.py"),
                Node::new("p", NodeLabel::Class, "Base", "p.models.Base", "models.py"),
                Node::new("p", NodeLabel::Class, "User", "p.models.User", "models.py")
                    .with_prop("base_classes", vec!["Base".to_string()]),
            ])
            .unwrap();

        let registry = NameRegistry::new();
        registry.build_from_store(&store, "p").unwrap();

        let inserted = run("p", &registry, &store).unwrap();
        assert_eq!(inserted, 1);

        let edges = store.find_edges_by_type("p", EdgeType::Inherits).unwrap();
        assert_eq!(edges.len(), 1);
        let nodes = store
            .find_nodes_by_ids(&[edges[0].source, edges[0].target])
            .unwrap();
        let qns: Vec<&str> = nodes.iter().map(|n| n.qualified_name.as_str()).collect();
        assert!(qns.contains(&"p.models.User"));
        assert!(qns.contains(&"p.models.Base"));
    }
}
