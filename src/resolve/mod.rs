//! Edge resolution passes: CALLS, USAGE, READS/WRITES, THROWS/RAISES,
//! USES_TYPE and the CONFIGURES heuristic.
//!
//! Every pass follows the same shape: select cached files whose language
//! spec declares the relevant node kinds, resolve them in parallel with
//! read-only access to the registry and import maps, then flush edges
//! serially through one QN→id batch lookup. A file that fails resolves to
//! nothing; a flush failure fails the pass but not the run.

pub mod calls;
pub mod configures;
pub mod reads_writes;
pub mod throws;
pub mod usages;
pub mod uses_type;

use rayon::prelude::*;
use std::collections::HashMap;
use tree_sitter::Node as TsNode;

use crate::error::{IndexError, IndexResult};
use crate::extract::{go_receiver_name, go_receiver_type};
use crate::imports::ImportMap;
use crate::lang::{Language, LanguageSpec};
use crate::parsing::{AstCache, CachedTree, node_text};
use crate::pipeline::CancelToken;
use crate::registry::{NameRegistry, TypeMap};
use crate::storage::GraphStore;
use crate::types::{Edge, EdgeType, NodeLabel, Properties, PropValue, module_qn};

/// An edge resolved to qualified names, before QN→id lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEdge {
    pub source_qn: String,
    pub target_qn: String,
    pub edge_type: EdgeType,
    pub properties: Properties,
}

impl ResolvedEdge {
    pub fn new(
        source_qn: impl Into<String>,
        target_qn: impl Into<String>,
        edge_type: EdgeType,
    ) -> Self {
        Self {
            source_qn: source_qn.into(),
            target_qn: target_qn.into(),
            edge_type,
            properties: Properties::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Read-only context shared by the resolution passes of one run.
pub struct ResolveContext<'a> {
    pub project: &'a str,
    pub cache: &'a AstCache,
    pub registry: &'a NameRegistry,
    /// Import maps keyed by relative path.
    pub imports: &'a HashMap<String, ImportMap>,
    /// Files to resolve in this pass (full run: all cached files;
    /// incremental: changed plus dependents).
    pub files: &'a [String],
    pub threads: usize,
    pub cancel: &'a CancelToken,
}

impl<'a> ResolveContext<'a> {
    pub fn imports_for(&self, rel_path: &str) -> &ImportMap {
        static EMPTY: std::sync::LazyLock<ImportMap> = std::sync::LazyLock::new(ImportMap::new);
        self.imports.get(rel_path).unwrap_or(&EMPTY)
    }
}

/// Parallel per-file map with a hard barrier: results are collected before
/// the caller starts its serial flush. Cancellation skips not-yet-started
/// files; in-flight files finish.
pub(crate) fn run_parallel<F>(ctx: &ResolveContext<'_>, per_file: F) -> Vec<ResolvedEdge>
where
    F: Fn(&str, &CachedTree) -> Vec<ResolvedEdge> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ctx.threads.clamp(1, ctx.files.len().max(1)))
        .build();

    let resolve_one = |rel: &String| -> Vec<ResolvedEdge> {
        if ctx.cancel.is_cancelled() {
            return Vec::new();
        }
        match ctx.cache.get(rel) {
            Some(cached) => per_file(rel, cached),
            None => Vec::new(),
        }
    };

    match pool {
        Ok(pool) => pool.install(|| ctx.files.par_iter().flat_map_iter(resolve_one).collect()),
        Err(_) => ctx.files.iter().flat_map(resolve_one).collect(),
    }
}

/// Serial flush: batch-resolve the union of endpoint names, silently drop
/// edges with an unknown endpoint, insert the rest.
pub(crate) fn flush_edges(
    project: &str,
    pass: &str,
    edges: Vec<ResolvedEdge>,
    store: &dyn GraphStore,
) -> IndexResult<usize> {
    if edges.is_empty() {
        return Ok(0);
    }

    let mut qns: Vec<String> = edges
        .iter()
        .flat_map(|e| [e.source_qn.clone(), e.target_qn.clone()])
        .collect();
    qns.sort();
    qns.dedup();

    let wrap = |source| IndexError::StoreBatch {
        pass: pass.to_string(),
        source,
    };
    let ids = store.find_node_ids_by_qns(project, &qns).map_err(wrap)?;

    let mut real = Vec::with_capacity(edges.len());
    for edge in edges {
        let (Some(&source), Some(&target)) = (ids.get(&edge.source_qn), ids.get(&edge.target_qn))
        else {
            continue;
        };
        let mut e = Edge::new(project, source, target, edge.edge_type);
        e.properties = edge.properties;
        real.push(e);
    }
    let inserted = real.len();
    store.insert_edge_batch(&real).map_err(wrap)?;
    tracing::debug!(pass, edges = inserted, "flushed edges");
    Ok(inserted)
}

/// The caller of an AST node: nearest enclosing function (with its class,
/// when it is a method), or the module itself.
pub(crate) struct Caller<'t> {
    pub qn: String,
    pub class_qn: Option<String>,
    pub fn_node: Option<TsNode<'t>>,
}

pub(crate) fn enclosing_caller<'t>(
    node: TsNode<'t>,
    spec: &LanguageSpec,
    language: Language,
    module: &str,
    source: &[u8],
) -> Caller<'t> {
    let mut fn_node = None;
    let mut current = node.parent();
    while let Some(n) = current {
        if spec.function_node_types.contains(&n.kind()) {
            fn_node = Some(n);
            break;
        }
        current = n.parent();
    }

    let Some(func) = fn_node else {
        return Caller {
            qn: module.to_string(),
            class_qn: None,
            fn_node: None,
        };
    };

    let fn_name = func
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string());

    // Go methods scope to their receiver type.
    let mut class_qn = None;
    if language == Language::Go
        && func.kind() == "method_declaration"
        && let Some(receiver_type) = go_receiver_type(func, source)
    {
        class_qn = Some(format!("{module}.{receiver_type}"));
    }

    // Otherwise look for a class-family ancestor.
    if class_qn.is_none() {
        let mut up = func.parent();
        while let Some(n) = up {
            if spec.class_node_types.contains(&n.kind()) {
                let class_name = n
                    .child_by_field_name("name")
                    .or_else(|| n.child_by_field_name("type"))
                    .map(|c| {
                        node_text(c, source)
                            .split('<')
                            .next()
                            .unwrap_or("")
                            .trim()
                            .to_string()
                    })
                    .filter(|s| !s.is_empty());
                if let Some(class_name) = class_name {
                    class_qn = Some(format!("{module}.{class_name}"));
                }
                break;
            }
            up = n.parent();
        }
    }

    let qn = match (&class_qn, &fn_name) {
        (Some(class), Some(name)) => format!("{class}.{name}"),
        (None, Some(name)) => format!("{module}.{name}"),
        _ => module.to_string(),
    };

    Caller {
        qn,
        class_qn,
        fn_node: Some(func),
    }
}

/// Extract the callee string of a call node, per language. Qualified forms
/// keep their dots (`h.validate`, `pkg.Fn`); scope operators normalise to
/// dots.
pub(crate) fn callee_name(language: Language, node: TsNode<'_>, source: &[u8]) -> Option<String> {
    let raw = match language {
        Language::Ruby => {
            let method = node.child_by_field_name("method")?;
            let method_text = node_text(method, source).to_string();
            match node.child_by_field_name("receiver") {
                Some(receiver) => {
                    format!("{}.{method_text}", node_text(receiver, source))
                }
                None => method_text,
            }
        }
        Language::Elixir => {
            let target = node.child_by_field_name("target")?;
            node_text(target, source).to_string()
        }
        Language::Java => match node.kind() {
            "object_creation_expression" => {
                let ty = node.child_by_field_name("type")?;
                node_text(ty, source).to_string()
            }
            _ => {
                let name = node.child_by_field_name("name")?;
                let name_text = node_text(name, source).to_string();
                match node.child_by_field_name("object") {
                    Some(object) => format!("{}.{name_text}", node_text(object, source)),
                    None => name_text,
                }
            }
        },
        Language::Php => match node.kind() {
            "member_call_expression" | "scoped_call_expression" => {
                let name = node.child_by_field_name("name")?;
                let name_text = node_text(name, source).to_string();
                match node.child_by_field_name("object") {
                    Some(object) => format!(
                        "{}.{name_text}",
                        node_text(object, source).trim_start_matches('$')
                    ),
                    None => name_text,
                }
            }
            "object_creation_expression" => {
                let mut found = None;
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "name" || child.kind().contains("identifier") {
                        found = Some(node_text(child, source).to_string());
                        break;
                    }
                }
                found?
            }
            _ => {
                let function = node.child_by_field_name("function")?;
                node_text(function, source).to_string()
            }
        },
        _ => {
            let function = node
                .child_by_field_name("function")
                .or_else(|| node.child_by_field_name("callee"))
                .or_else(|| node.named_child(0))?;
            node_text(function, source).to_string()
        }
    };

    let cleaned = raw
        .replace("::", ".")
        .replace(':', ".")
        .replace(['(', ')'], "");
    let cleaned = cleaned.trim().trim_start_matches('&').trim_start_matches('*');
    if cleaned.is_empty() || cleaned.len() > 200 || cleaned.contains(char::is_whitespace) {
        return None;
    }
    Some(cleaned.to_string())
}

/// Infer variable → class bindings for one file: constructor-looking
/// assignments plus `var x Type` declarations. Method receivers and
/// `self`/`this` are layered on per call site.
pub(crate) fn build_type_map(
    cached: &CachedTree,
    spec: &LanguageSpec,
    module: &str,
    registry: &NameRegistry,
    imports: &ImportMap,
) -> TypeMap {
    let mut map = TypeMap::new();
    let source = cached.source.as_slice();
    let class_accept = |label: NodeLabel| {
        matches!(
            label,
            NodeLabel::Class | NodeLabel::Interface | NodeLabel::Type | NodeLabel::Enum
        )
    };

    crate::parsing::walk(cached.tree.root_node(), &mut |node| {
        let kind = node.kind();

        // Go: var x Type
        if cached.language == Language::Go && kind == "var_spec" {
            if let (Some(name), Some(ty)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("type"),
            ) {
                bind_type(
                    &mut map,
                    node_text(name, source),
                    node_text(ty, source),
                    module,
                    registry,
                    imports,
                    &class_accept,
                );
            }
            return false;
        }

        if !spec.assignment_node_types.contains(&kind) {
            return true;
        }

        let (lhs, rhs) = match (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) {
            (Some(l), Some(r)) => (l, r),
            _ => match (node.child_by_field_name("name"), node.child_by_field_name("value")) {
                (Some(l), Some(r)) => (l, r),
                _ => return true,
            },
        };

        let var_name = node_text(lhs, source);
        let var_name = var_name.split(',').next().unwrap_or(var_name).trim();
        if var_name.is_empty() || var_name.contains(['.', '[']) {
            return true;
        }

        // Go wraps both sides of := in expression lists.
        let rhs = if rhs.kind() == "expression_list" {
            match rhs.named_child(0) {
                Some(inner) => inner,
                None => return true,
            }
        } else {
            rhs
        };

        let type_name = match rhs.kind() {
            // x := Type{...}
            "composite_literal" => rhs
                .child_by_field_name("type")
                .map(|t| node_text(t, source).to_string()),
            // x = new Class(...)
            "new_expression" | "object_creation_expression" => rhs
                .child_by_field_name("constructor")
                .or_else(|| rhs.child_by_field_name("type"))
                .map(|t| node_text(t, source).to_string()),
            // x = ClassName(...) — constructor by convention.
            "call" | "call_expression" => rhs
                .child_by_field_name("function")
                .map(|f| node_text(f, source).to_string())
                .filter(|name| {
                    name.rsplit('.')
                        .next()
                        .and_then(|s| s.chars().next())
                        .is_some_and(|c| c.is_uppercase())
                }),
            _ => None,
        };

        if let Some(type_name) = type_name {
            bind_type(
                &mut map,
                var_name,
                &type_name,
                module,
                registry,
                imports,
                &class_accept,
            );
        }
        true
    });
    map
}

fn bind_type(
    map: &mut TypeMap,
    var_name: &str,
    type_name: &str,
    module: &str,
    registry: &NameRegistry,
    imports: &ImportMap,
    accept: &dyn Fn(NodeLabel) -> bool,
) {
    let type_name = type_name
        .trim_start_matches(['*', '&'])
        .split('<')
        .next()
        .unwrap_or("")
        .trim();
    if type_name.is_empty() {
        return;
    }
    let query = crate::registry::ResolutionQuery {
        callee: type_name,
        module_qn: module,
        imports,
        type_map: None,
        enclosing_class: None,
    };
    if let Some(hit) = registry.resolve_filtered(&query, accept) {
        map.insert(var_name.to_string(), hit.qn);
    }
}

/// Extend a type map with the receiver binding of the enclosing method:
/// Go `(r *Receiver)` and the dynamic-language `self`/`this`.
pub(crate) fn receiver_bindings(
    base: &TypeMap,
    caller: &Caller<'_>,
    language: Language,
    source: &[u8],
) -> TypeMap {
    let mut map = base.clone();
    if let Some(class_qn) = &caller.class_qn {
        if language == Language::Go
            && let Some(func) = caller.fn_node
            && let Some(receiver) = go_receiver_name(func, source)
        {
            map.insert(receiver, class_qn.clone());
        }
        map.insert("self".to_string(), class_qn.clone());
        map.insert("this".to_string(), class_qn.clone());
    }
    map
}

/// Module qualified name for a cached file.
pub(crate) fn cached_module_qn(project: &str, rel_path: &str) -> String {
    module_qn(project, rel_path)
}
