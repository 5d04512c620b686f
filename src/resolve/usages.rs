//! USAGE pass: identifier references resolved to non-Variable symbols.
//!
//! The walk skips call callee subtrees (the CALLS pass owns those), import
//! statements, and the name field of any declaration. Variable targets are
//! dropped here; READS/WRITES covers them.

use std::collections::HashSet;

use super::{
    ResolveContext, ResolvedEdge, cached_module_qn, enclosing_caller, flush_edges, run_parallel,
};
use crate::error::IndexResult;
use crate::lang;
use crate::parsing::{CachedTree, node_text, walk};
use crate::registry::ResolutionQuery;
use crate::storage::GraphStore;
use crate::types::{EdgeType, NodeLabel};

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "field_identifier",
    "property_identifier",
    "simple_identifier",
    "constant",
];

pub fn run(ctx: &ResolveContext<'_>, store: &dyn GraphStore) -> IndexResult<usize> {
    let edges = run_parallel(ctx, |rel, cached| resolve_file(ctx, rel, cached));
    flush_edges(ctx.project, "usages", edges, store)
}

fn resolve_file(ctx: &ResolveContext<'_>, rel: &str, cached: &CachedTree) -> Vec<ResolvedEdge> {
    let Some(spec) = lang::for_language(cached.language) else {
        return Vec::new();
    };

    let module = cached_module_qn(ctx.project, rel);
    let imports = ctx.imports_for(rel);
    let source = cached.source.as_slice();

    let accept = |label: NodeLabel| label != NodeLabel::Variable;
    let mut skip: HashSet<usize> = HashSet::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();

    walk(cached.tree.root_node(), &mut |node| {
        let kind = node.kind();

        if spec.import_node_types.contains(&kind) {
            return false;
        }
        if spec.call_node_types.contains(&kind) {
            // The callee subtree belongs to the CALLS pass; arguments are
            // still walked.
            if let Some(callee) = node
                .child_by_field_name("function")
                .or_else(|| node.child_by_field_name("callee"))
            {
                walk(callee, &mut |n| {
                    skip.insert(n.id());
                    true
                });
            }
            return true;
        }

        if !IDENTIFIER_KINDS.contains(&kind) {
            return true;
        }
        if skip.contains(&node.id()) {
            return false;
        }
        // The name field of a declaration is the definition itself.
        if let Some(parent) = node.parent()
            && parent
                .child_by_field_name("name")
                .is_some_and(|n| n.id() == node.id())
        {
            return false;
        }

        let text = node_text(node, source);
        if text.is_empty() || !text.chars().next().is_some_and(char::is_alphabetic) {
            return false;
        }

        let caller = enclosing_caller(node, spec, cached.language, &module, source);
        let query = ResolutionQuery {
            callee: text,
            module_qn: &module,
            imports,
            type_map: None,
            enclosing_class: caller.class_qn.as_deref(),
        };
        if let Some(res) = ctx.registry.resolve_filtered(&query, &accept)
            && res.qn != caller.qn
            && seen.insert((caller.qn.clone(), res.qn.clone()))
        {
            out.push(ResolvedEdge::new(caller.qn, res.qn, EdgeType::Usage));
        }
        false
    });
    out
}
