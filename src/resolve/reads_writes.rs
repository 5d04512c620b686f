//! READS/WRITES pass.
//!
//! Identifier references inside function bodies, resolved strictly against
//! Variable symbols (import map or same module, no global search). An
//! identifier on the left of an assignment writes; augmented assignments
//! read and write. Edges deduplicate per (caller, target, type).

use std::collections::HashSet;
use tree_sitter::Node as TsNode;

use super::{
    ResolveContext, ResolvedEdge, cached_module_qn, enclosing_caller, flush_edges, run_parallel,
};
use crate::error::IndexResult;
use crate::lang::{self, LanguageSpec};
use crate::parsing::{CachedTree, node_text, walk};
use crate::storage::GraphStore;
use crate::types::{EdgeType, NodeLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    ReadWrite,
}

pub fn run(ctx: &ResolveContext<'_>, store: &dyn GraphStore) -> IndexResult<usize> {
    let edges = run_parallel(ctx, |rel, cached| resolve_file(ctx, rel, cached));
    flush_edges(ctx.project, "reads_writes", edges, store)
}

fn resolve_file(ctx: &ResolveContext<'_>, rel: &str, cached: &CachedTree) -> Vec<ResolvedEdge> {
    let Some(spec) = lang::for_language(cached.language) else {
        return Vec::new();
    };
    if spec.assignment_node_types.is_empty() && spec.variable_node_types.is_empty() {
        return Vec::new();
    }

    let module = cached_module_qn(ctx.project, rel);
    let imports = ctx.imports_for(rel);
    let source = cached.source.as_slice();

    let mut seen: HashSet<(String, String, EdgeType)> = HashSet::new();
    let mut out = Vec::new();

    walk(cached.tree.root_node(), &mut |node| {
        if node.kind() != "identifier" {
            return true;
        }
        let text = node_text(node, source);
        if text.is_empty() {
            return false;
        }

        // Strict resolution: import map first, then same module, Variable
        // labels only.
        let target = imports
            .get(text)
            .filter(|qn| ctx.registry.label_of(qn) == Some(NodeLabel::Variable))
            .cloned()
            .or_else(|| {
                let local = format!("{module}.{text}");
                (ctx.registry.label_of(&local) == Some(NodeLabel::Variable)).then_some(local)
            });
        let Some(target) = target else {
            return false;
        };

        let caller = enclosing_caller(node, spec, cached.language, &module, source);
        if caller.fn_node.is_none() {
            // Module-level references (including the definition itself)
            // stay out of the read/write graph.
            return false;
        }

        let mut push = |edge_type: EdgeType| {
            if seen.insert((caller.qn.clone(), target.clone(), edge_type)) {
                out.push(ResolvedEdge::new(
                    caller.qn.clone(),
                    target.clone(),
                    edge_type,
                ));
            }
        };
        match classify_access(node, spec, source) {
            Access::Read => push(EdgeType::Reads),
            Access::Write => push(EdgeType::Writes),
            Access::ReadWrite => {
                push(EdgeType::Reads);
                push(EdgeType::Writes);
            }
        }
        false
    });
    out
}

const AUGMENTED_OPERATORS: &[&str] = &[
    "+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=", "<<=", ">>=", "||=", "&&=", "**=", "//=",
];

/// Walk up to the nearest assignment ancestor; an identifier inside its
/// left-hand side writes. Stops at function boundaries.
fn classify_access(node: TsNode<'_>, spec: &LanguageSpec, source: &[u8]) -> Access {
    let mut current = node.parent();
    while let Some(parent) = current {
        let kind = parent.kind();
        if spec.function_node_types.contains(&kind) {
            break;
        }
        if spec.assignment_node_types.contains(&kind) || kind == "augmented_assignment" {
            let lhs = parent
                .child_by_field_name("left")
                .or_else(|| parent.child_by_field_name("lhs"))
                .or_else(|| parent.child_by_field_name("name"));
            let in_lhs = lhs.is_some_and(|l| {
                l.start_byte() <= node.start_byte() && node.end_byte() <= l.end_byte()
            });
            if !in_lhs {
                return Access::Read;
            }
            let augmented = kind.contains("augmented")
                || kind.contains("compound")
                || kind == "operator_assignment"
                || parent
                    .child_by_field_name("operator")
                    .is_some_and(|op| AUGMENTED_OPERATORS.contains(&node_text(op, source)));
            return if augmented {
                Access::ReadWrite
            } else {
                Access::Write
            };
        }
        current = parent.parent();
    }
    Access::Read
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;
    use crate::parsing::{AstCache, parse};
    use crate::pipeline::CancelToken;
    use crate::registry::NameRegistry;
    use std::collections::HashMap;

    fn edges_for(source: &str, rel: &str, language: Language) -> Vec<ResolvedEdge> {
        let bytes = source.as_bytes().to_vec();
        let tree = parse(language, &bytes).unwrap();
        let mut cache = AstCache::new();
        cache.insert(
            rel,
            crate::parsing::CachedTree {
                tree,
                source: bytes,
                language,
            },
        );

        let registry = NameRegistry::new();
        let module = crate::types::module_qn("proj", rel);
        registry.insert(&format!("{module}.counter"), "counter", NodeLabel::Variable);

        let imports = HashMap::new();
        let files = vec![rel.to_string()];
        let cancel = CancelToken::new();
        let ctx = ResolveContext {
            project: "proj",
            cache: &cache,
            registry: &registry,
            imports: &imports,
            files: &files,
            threads: 1,
            cancel: &cancel,
        };
        run_parallel(&ctx, |rel, cached| resolve_file(&ctx, rel, cached))
    }

    #[test]
    fn python_read_write_classification() {
        let edges = edges_for(
            "counter = 0\n\ndef bump():\n    global counter\n    counter = read()\n\ndef show():\n    print(counter)\n",
            "m.py",
            Language::Python,
        );
        assert!(edges.iter().any(|e| {
            e.edge_type == EdgeType::Writes && e.source_qn == "proj.m.bump"
        }));
        assert!(edges.iter().any(|e| {
            e.edge_type == EdgeType::Reads && e.source_qn == "proj.m.show"
        }));
    }

    #[test]
    fn augmented_assignment_emits_both() {
        let edges = edges_for(
            "counter = 0\n\ndef bump():\n    counter += 1\n",
            "m.py",
            Language::Python,
        );
        let bump_edges: Vec<_> = edges
            .iter()
            .filter(|e| e.source_qn == "proj.m.bump")
            .collect();
        assert!(bump_edges.iter().any(|e| e.edge_type == EdgeType::Reads));
        assert!(bump_edges.iter().any(|e| e.edge_type == EdgeType::Writes));
    }

    #[test]
    fn duplicate_references_dedupe() {
        let edges = edges_for(
            "counter = 0\n\ndef show():\n    print(counter)\n    print(counter)\n",
            "m.py",
            Language::Python,
        );
        let reads: Vec<_> = edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Reads && e.source_qn == "proj.m.show")
            .collect();
        assert_eq!(reads.len(), 1);
    }
}
