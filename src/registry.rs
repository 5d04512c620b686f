//! Name registry: every defined symbol indexed by qualified and simple
//! name, plus the layered resolution strategy used by all edge passes.
//!
//! The registry is built once, serially, between extraction and
//! resolution; resolver threads then hold read guards only. A read/write
//! lock guards the two inner maps and no interior mutability leaks out.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::IndexResult;
use crate::imports::ImportMap;
use crate::storage::GraphStore;
use crate::types::NodeLabel;

/// Variable name → class qualified name, inferred per resolution task.
pub type TypeMap = HashMap<String, String>;

/// A successful name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub qn: String,
    pub label: NodeLabel,
    pub fuzzy: bool,
}

/// One callee lookup: the string being resolved plus the caller's context.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionQuery<'a> {
    pub callee: &'a str,
    pub module_qn: &'a str,
    pub imports: &'a ImportMap,
    pub type_map: Option<&'a TypeMap>,
    pub enclosing_class: Option<&'a str>,
}

#[derive(Default)]
struct Inner {
    by_qn: HashMap<String, NodeLabel>,
    by_simple: HashMap<String, Vec<String>>,
}

/// Symbol index shared across resolver threads.
#[derive(Default)]
pub struct NameRegistry {
    inner: RwLock<Inner>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one symbol. Writes happen only while the registry is being
    /// (re)built; no resolver runs concurrently.
    pub fn insert(&self, qn: &str, simple_name: &str, label: NodeLabel) {
        let mut inner = self.inner.write();
        inner.by_qn.insert(qn.to_string(), label);
        inner
            .by_simple
            .entry(simple_name.to_string())
            .or_default()
            .push(qn.to_string());
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.by_qn.clear();
        inner.by_simple.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_qn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_qn.is_empty()
    }

    /// Rebuild from the store's definition nodes. Candidate lists are
    /// sorted so ambiguous lookups resolve deterministically.
    pub fn build_from_store(&self, store: &dyn GraphStore, project: &str) -> IndexResult<()> {
        use crate::error::IndexError;

        self.clear();
        let labels = [
            NodeLabel::Module,
            NodeLabel::Function,
            NodeLabel::Method,
            NodeLabel::Class,
            NodeLabel::Interface,
            NodeLabel::Type,
            NodeLabel::Enum,
            NodeLabel::Union,
            NodeLabel::Macro,
            NodeLabel::Variable,
            NodeLabel::Field,
        ];
        let mut inner = self.inner.write();
        for label in labels {
            let nodes = store
                .find_nodes_by_label(project, label)
                .map_err(|source| IndexError::StoreBatch {
                    pass: "build_registry".to_string(),
                    source,
                })?;
            for node in nodes {
                inner.by_qn.insert(node.qualified_name.clone(), label);
                inner
                    .by_simple
                    .entry(node.name.clone())
                    .or_default()
                    .push(node.qualified_name);
            }
        }
        for candidates in inner.by_simple.values_mut() {
            candidates.sort();
            candidates.dedup();
        }
        Ok(())
    }

    pub fn label_of(&self, qn: &str) -> Option<NodeLabel> {
        self.inner.read().by_qn.get(qn).copied()
    }

    /// Layered resolution: import map, then same module, then unique
    /// project-wide simple name, then suffix match broken by import
    /// distance. Returns `None` when every strategy misses; callers may
    /// then try [`NameRegistry::resolve_fuzzy`].
    pub fn resolve(&self, query: &ResolutionQuery<'_>) -> Option<Resolution> {
        self.resolve_filtered(query, &|_| true)
    }

    /// `resolve` with a label filter; used to exclude Variables from USAGE
    /// targets and to restrict READS/WRITES to Variables.
    pub fn resolve_filtered(
        &self,
        query: &ResolutionQuery<'_>,
        accept: &dyn Fn(NodeLabel) -> bool,
    ) -> Option<Resolution> {
        let inner = self.inner.read();
        let exact = |qn: &str| -> Option<Resolution> {
            inner
                .by_qn
                .get(qn)
                .copied()
                .filter(|label| accept(*label))
                .map(|label| Resolution {
                    qn: qn.to_string(),
                    label,
                    fuzzy: false,
                })
        };

        // self.X resolves against the enclosing class before anything else.
        if let Some(class_qn) = query.enclosing_class
            && let Some(rest) = query
                .callee
                .strip_prefix("self.")
                .or_else(|| query.callee.strip_prefix("this."))
            && let Some(hit) = exact(&format!("{class_qn}.{rest}"))
        {
            return Some(hit);
        }

        let (prefix, suffix) = match query.callee.split_once('.') {
            Some((p, s)) => (p, Some(s)),
            None => (query.callee, None),
        };

        // Method dispatch: a type-map binding for the receiver wins first.
        if let (Some(type_map), Some(suffix)) = (query.type_map, suffix)
            && let Some(class_qn) = type_map.get(prefix)
            && let Some(hit) = exact(&format!("{class_qn}.{suffix}"))
        {
            return Some(hit);
        }

        // 1. Import map.
        if let Some(target) = query.imports.get(prefix) {
            let candidate = match suffix {
                Some(s) => format!("{target}.{s}"),
                None => target.clone(),
            };
            if let Some(hit) = exact(&candidate) {
                return Some(hit);
            }
            if let Some(s) = suffix {
                let head = format!("{target}.");
                let tail = format!(".{s}");
                if let Some(candidates) = inner.by_simple.get(simple_name(s)) {
                    let mut scan: Vec<&String> = candidates
                        .iter()
                        .filter(|qn| qn.starts_with(&head) && qn.ends_with(&tail))
                        .collect();
                    scan.sort();
                    if let Some(qn) = scan.first()
                        && let Some(hit) = exact(qn)
                    {
                        return Some(hit);
                    }
                }
            }
        }

        // 2. Same module.
        if let Some(hit) = exact(&format!("{}.{}", query.module_qn, query.callee)) {
            return Some(hit);
        }
        if let Some(s) = suffix
            && let Some(hit) = exact(&format!("{}.{s}", query.module_qn))
        {
            return Some(hit);
        }

        // 3. Unique project-wide simple name, keyed on the suffix for
        // dotted callees.
        let simple = simple_name(suffix.unwrap_or(query.callee));
        let candidates = inner.by_simple.get(simple)?;
        let accepted: Vec<&String> = candidates
            .iter()
            .filter(|qn| inner.by_qn.get(*qn).copied().is_some_and(|l| accept(l)))
            .collect();
        if accepted.len() == 1 {
            return exact(accepted[0]);
        }

        // 4. Full-callee suffix match broken by import distance.
        let full_tail = format!(".{}", query.callee);
        let pool: Vec<&&String> = accepted
            .iter()
            .filter(|qn| qn.ends_with(&full_tail))
            .collect();
        best_by_distance(pool.into_iter().map(|qn| qn.as_str()), query.module_qn)
            .and_then(|qn| exact(qn))
    }

    /// Fuzzy fallback: match the simple name only and take the
    /// import-distance winner. Edges built from this carry
    /// `resolutionMode: "fuzzy"`.
    pub fn resolve_fuzzy(
        &self,
        query: &ResolutionQuery<'_>,
        accept: &dyn Fn(NodeLabel) -> bool,
    ) -> Option<Resolution> {
        let inner = self.inner.read();
        let simple = simple_name(query.callee);
        let candidates = inner.by_simple.get(simple)?;
        let accepted: Vec<&str> = candidates
            .iter()
            .filter(|qn| inner.by_qn.get(*qn).copied().is_some_and(|l| accept(l)))
            .map(|qn| qn.as_str())
            .collect();
        let winner = best_by_distance(accepted.into_iter(), query.module_qn)?;
        let label = inner.by_qn.get(winner).copied()?;
        Some(Resolution {
            qn: winner.to_string(),
            label,
            fuzzy: true,
        })
    }
}

/// Number of leading dot-separated segments two qualified names share.
pub fn import_distance(a: &str, b: &str) -> usize {
    a.split('.')
        .zip(b.split('.'))
        .take_while(|(x, y)| x == y)
        .count()
}

/// Last dot-segment of a possibly-qualified name.
fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Import-distance winner; ties go to the lexicographically smallest
/// candidate so resolution is deterministic.
fn best_by_distance<'a>(
    candidates: impl Iterator<Item = &'a str>,
    module_qn: &str,
) -> Option<&'a str> {
    let mut sorted: Vec<&str> = candidates.collect();
    sorted.sort();
    let mut best: Option<(&str, usize)> = None;
    for qn in sorted {
        let distance = import_distance(qn, module_qn);
        match best {
            Some((_, prev)) if distance <= prev => {}
            _ => best = Some((qn, distance)),
        }
    }
    best.map(|(qn, _)| qn)
}
