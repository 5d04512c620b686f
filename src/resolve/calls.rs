//! CALLS pass: call expressions resolved through the layered strategy,
//! with the fuzzy fallback tagging its edges.

use std::collections::HashSet;

use super::{
    ResolveContext, ResolvedEdge, cached_module_qn, callee_name, enclosing_caller, flush_edges,
    receiver_bindings, run_parallel,
};
use crate::error::IndexResult;
use crate::lang;
use crate::parsing::{CachedTree, walk};
use crate::registry::ResolutionQuery;
use crate::storage::GraphStore;
use crate::types::{EdgeType, NodeLabel};

pub fn run(ctx: &ResolveContext<'_>, store: &dyn GraphStore) -> IndexResult<usize> {
    let edges = run_parallel(ctx, |rel, cached| resolve_file(ctx, rel, cached));
    flush_edges(ctx.project, "calls", edges, store)
}

fn resolve_file(ctx: &ResolveContext<'_>, rel: &str, cached: &CachedTree) -> Vec<ResolvedEdge> {
    let Some(spec) = lang::for_language(cached.language) else {
        return Vec::new();
    };
    if spec.call_node_types.is_empty() {
        return Vec::new();
    }

    let module = cached_module_qn(ctx.project, rel);
    let imports = ctx.imports_for(rel);
    let source = cached.source.as_slice();
    let type_map = super::build_type_map(cached, spec, &module, ctx.registry, imports);

    let accept = |label: NodeLabel| label != NodeLabel::Variable;
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();

    walk(cached.tree.root_node(), &mut |node| {
        if !spec.call_node_types.contains(&node.kind()) {
            return true;
        }
        let Some(callee) = callee_name(cached.language, node, source) else {
            return true;
        };

        let caller = enclosing_caller(node, spec, cached.language, &module, source);
        let bound = receiver_bindings(&type_map, &caller, cached.language, source);
        let query = ResolutionQuery {
            callee: &callee,
            module_qn: &module,
            imports,
            type_map: Some(&bound),
            enclosing_class: caller.class_qn.as_deref(),
        };

        let resolution = ctx
            .registry
            .resolve_filtered(&query, &accept)
            .or_else(|| ctx.registry.resolve_fuzzy(&query, &accept));

        if let Some(res) = resolution
            && seen.insert((caller.qn.clone(), res.qn.clone()))
        {
            let mut edge = ResolvedEdge::new(caller.qn, res.qn, EdgeType::Calls);
            if res.fuzzy {
                edge = edge.with_prop("resolutionMode", "fuzzy");
            }
            out.push(edge);
        }
        // Arguments can hold further calls.
        true
    });
    out
}
