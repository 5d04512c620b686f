//! THROWS/RAISES pass.
//!
//! Declared exception lists (languages with a throws clause) emit THROWS
//! with `declared: true`; throw/raise statements in function bodies emit
//! RAISES with `declared: false`. Built-in exception names are stripped.

use std::collections::HashSet;
use tree_sitter::Node as TsNode;

use super::{
    ResolveContext, ResolvedEdge, cached_module_qn, enclosing_caller, flush_edges, run_parallel,
};
use crate::error::IndexResult;
use crate::lang;
use crate::parsing::{CachedTree, node_text, walk};
use crate::registry::ResolutionQuery;
use crate::storage::GraphStore;
use crate::types::{EdgeType, NodeLabel};

const BUILTIN_EXCEPTIONS: &[&str] = &[
    "Error",
    "Exception",
    "BaseException",
    "RuntimeError",
    "ValueError",
    "TypeError",
    "KeyError",
    "IndexError",
    "StopIteration",
    "NotImplementedError",
    "ArgumentError",
    "StandardError",
    "RuntimeException",
    "IllegalArgumentException",
    "IllegalStateException",
    "NullPointerException",
    "IOException",
    "panic",
];

pub fn run(ctx: &ResolveContext<'_>, store: &dyn GraphStore) -> IndexResult<usize> {
    let edges = run_parallel(ctx, |rel, cached| resolve_file(ctx, rel, cached));
    flush_edges(ctx.project, "throws", edges, store)
}

fn resolve_file(ctx: &ResolveContext<'_>, rel: &str, cached: &CachedTree) -> Vec<ResolvedEdge> {
    let Some(spec) = lang::for_language(cached.language) else {
        return Vec::new();
    };
    if spec.throw_node_types.is_empty() && spec.throws_clause_field.is_none() {
        return Vec::new();
    }

    let module = cached_module_qn(ctx.project, rel);
    let imports = ctx.imports_for(rel);
    let source = cached.source.as_slice();

    let accept = |label: NodeLabel| {
        matches!(
            label,
            NodeLabel::Class | NodeLabel::Interface | NodeLabel::Type | NodeLabel::Enum
        )
    };
    let mut seen: HashSet<(String, String, EdgeType)> = HashSet::new();
    let mut out = Vec::new();

    walk(cached.tree.root_node(), &mut |node| {
        let kind = node.kind();

        // Declared exception lists on function nodes.
        if spec.function_node_types.contains(&kind)
            && let Some(clause_kind) = spec.throws_clause_field
        {
            let clause = node.child_by_field_name(clause_kind).or_else(|| {
                let mut cursor = node.walk();
                node.children(&mut cursor).find(|c| c.kind() == clause_kind)
            });
            if let Some(clause) = clause {
                let caller = match node.child_by_field_name("body") {
                    Some(body) => enclosing_caller(body, spec, cached.language, &module, source),
                    None => return true,
                };
                for name in exception_names(clause, source) {
                    let query = ResolutionQuery {
                        callee: &name,
                        module_qn: &module,
                        imports,
                        type_map: None,
                        enclosing_class: caller.class_qn.as_deref(),
                    };
                    if let Some(res) = ctx.registry.resolve_filtered(&query, &accept)
                        && seen.insert((caller.qn.clone(), res.qn.clone(), EdgeType::Throws))
                    {
                        out.push(
                            ResolvedEdge::new(caller.qn.clone(), res.qn, EdgeType::Throws)
                                .with_prop("declared", true),
                        );
                    }
                }
            }
            return true;
        }

        // throw / raise statements in bodies.
        if spec.throw_node_types.contains(&kind) {
            let Some(name) = thrown_type_name(node, source) else {
                return true;
            };
            let caller = enclosing_caller(node, spec, cached.language, &module, source);
            let query = ResolutionQuery {
                callee: &name,
                module_qn: &module,
                imports,
                type_map: None,
                enclosing_class: caller.class_qn.as_deref(),
            };
            if let Some(res) = ctx.registry.resolve_filtered(&query, &accept)
                && seen.insert((caller.qn.clone(), res.qn.clone(), EdgeType::Raises))
            {
                out.push(
                    ResolvedEdge::new(caller.qn, res.qn, EdgeType::Raises)
                        .with_prop("declared", false),
                );
            }
            return true;
        }

        true
    });
    out
}

/// Exception type names under a throws clause, built-ins stripped.
fn exception_names(clause: TsNode<'_>, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    walk(clause, &mut |n| {
        if n.kind() == "identifier" || n.kind() == "type_identifier" || n.kind() == "scoped_type_identifier" {
            let text = node_text(n, source);
            let simple = text.rsplit('.').next().unwrap_or(text);
            if !simple.is_empty() && !BUILTIN_EXCEPTIONS.contains(&simple) {
                names.push(text.to_string());
            }
            return false;
        }
        true
    });
    names.sort();
    names.dedup();
    names
}

/// The exception type of a throw/raise statement: constructor call target,
/// object-creation type, or a bare identifier.
fn thrown_type_name(node: TsNode<'_>, source: &[u8]) -> Option<String> {
    let mut found = None;
    walk(node, &mut |n| {
        if found.is_some() {
            return false;
        }
        match n.kind() {
            "object_creation_expression" | "new_expression" => {
                found = n
                    .child_by_field_name("type")
                    .or_else(|| n.child_by_field_name("constructor"))
                    .map(|t| node_text(t, source).to_string());
                false
            }
            "call" | "call_expression" => {
                found = n
                    .child_by_field_name("function")
                    .map(|f| node_text(f, source).to_string());
                false
            }
            "identifier" | "type_identifier" => {
                found = Some(node_text(n, source).to_string());
                false
            }
            _ => true,
        }
    });

    let name = found?;
    let simple = name.rsplit('.').next().unwrap_or(&name);
    if simple.is_empty() || BUILTIN_EXCEPTIONS.contains(&simple) {
        None
    } else {
        Some(name)
    }
}
