//! USES_TYPE pass: type references in parameter annotations and function
//! bodies, resolved to class/interface/enum targets.

use std::collections::HashSet;

use super::{
    ResolveContext, ResolvedEdge, cached_module_qn, enclosing_caller, flush_edges, run_parallel,
};
use crate::error::IndexResult;
use crate::lang::{self, Language};
use crate::parsing::{CachedTree, node_text, walk};
use crate::registry::ResolutionQuery;
use crate::storage::GraphStore;
use crate::types::{EdgeType, NodeLabel};

const TYPE_REFERENCE_KINDS: &[&str] = &["type_identifier", "user_type", "named_type"];

pub fn run(ctx: &ResolveContext<'_>, store: &dyn GraphStore) -> IndexResult<usize> {
    let edges = run_parallel(ctx, |rel, cached| resolve_file(ctx, rel, cached));
    flush_edges(ctx.project, "uses_type", edges, store)
}

fn resolve_file(ctx: &ResolveContext<'_>, rel: &str, cached: &CachedTree) -> Vec<ResolvedEdge> {
    let Some(spec) = lang::for_language(cached.language) else {
        return Vec::new();
    };
    if spec.function_node_types.is_empty() {
        return Vec::new();
    }

    let module = cached_module_qn(ctx.project, rel);
    let imports = ctx.imports_for(rel);
    let source = cached.source.as_slice();

    let accept = |label: NodeLabel| {
        matches!(
            label,
            NodeLabel::Class
                | NodeLabel::Interface
                | NodeLabel::Enum
                | NodeLabel::Type
                | NodeLabel::Union
        )
    };
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();

    walk(cached.tree.root_node(), &mut |node| {
        let kind = node.kind();
        let is_type_ref = TYPE_REFERENCE_KINDS.contains(&kind)
            || (cached.language == Language::Python && kind == "type");
        if !is_type_ref {
            return true;
        }

        let text = node_text(node, source);
        let name = text.trim_start_matches(['*', '&', '[', ']']).trim();
        let name = name.split('<').next().unwrap_or("").trim();
        if name.is_empty() || !name.chars().next().is_some_and(char::is_alphabetic) {
            return false;
        }

        let caller = enclosing_caller(node, spec, cached.language, &module, source);
        if caller.fn_node.is_none() {
            // Field and alias declarations are structural, not usage.
            return false;
        }
        // The annotation on a method of the type itself is not a usage.
        if caller
            .class_qn
            .as_deref()
            .is_some_and(|class| class.rsplit('.').next() == Some(name))
        {
            return false;
        }

        let query = ResolutionQuery {
            callee: name,
            module_qn: &module,
            imports,
            type_map: None,
            enclosing_class: caller.class_qn.as_deref(),
        };
        if let Some(res) = ctx.registry.resolve_filtered(&query, &accept)
            && seen.insert((caller.qn.clone(), res.qn.clone()))
        {
            out.push(ResolvedEdge::new(caller.qn, res.qn, EdgeType::UsesType));
        }
        false
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{AstCache, parse};
    use crate::pipeline::CancelToken;
    use crate::registry::NameRegistry;
    use std::collections::HashMap;

    #[test]
    fn parameter_annotation_emits_uses_type() {
        let source = "package m\n\ntype Request struct{}\n\nfunc Handle(r *Request) {}\n";
        let bytes = source.as_bytes().to_vec();
        let tree = parse(Language::Go, &bytes).unwrap();
        let mut cache = AstCache::new();
        cache.insert(
            "m/h.go",
            crate::parsing::CachedTree {
                tree,
                source: bytes,
                language: Language::Go,
            },
        );

        let registry = NameRegistry::new();
        registry.insert("proj.m.h.Request", "Request", NodeLabel::Class);
        registry.insert("proj.m.h.Handle", "Handle", NodeLabel::Function);

        let imports = HashMap::new();
        let files = vec!["m/h.go".to_string()];
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
        let edges = run_parallel(&ctx, |rel, cached| resolve_file(&ctx, rel, cached));

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_qn, "proj.m.h.Handle");
        assert_eq!(edges[0].target_qn, "proj.m.h.Request");
        assert_eq!(edges[0].edge_type, EdgeType::UsesType);
    }
}
