//! Decorator tagging: tokens that recur across decorated symbols become
//! candidate tags, written back onto each decorated node.

use std::collections::{HashMap, HashSet};

use crate::error::IndexResult;
use crate::storage::GraphStore;
use crate::types::{Node, NodeLabel, PropValue};

const DECORATED_LABELS: [NodeLabel; 3] =
    [NodeLabel::Function, NodeLabel::Method, NodeLabel::Class];

pub fn run(project: &str, store: &dyn GraphStore) -> IndexResult<usize> {
    let wrap = |source| crate::error::IndexError::StoreBatch {
        pass: "decorator_tags".to_string(),
        source,
    };

    let mut decorated: Vec<(Node, HashSet<String>)> = Vec::new();
    for label in DECORATED_LABELS {
        for node in store.find_nodes_by_label(project, label).map_err(wrap)? {
            let Some(decorators) = node.prop("decorators") else {
                continue;
            };
            let tokens: HashSet<String> = decorators
                .string_items()
                .iter()
                .flat_map(|d| tokenize(d))
                .collect();
            decorated.push((node, tokens));
        }
    }

    // A token is a candidate tag when it appears on at least two distinct
    // nodes.
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, tokens) in &decorated {
        for token in tokens {
            *counts.entry(token.as_str()).or_default() += 1;
        }
    }
    let candidates: HashSet<&str> = counts
        .iter()
        .filter(|(_, count)| **count >= 2)
        .map(|(token, _)| *token)
        .collect();

    let mut updated = 0usize;
    for (node, tokens) in &decorated {
        let mut tags: Vec<String> = tokens
            .iter()
            .filter(|t| candidates.contains(t.as_str()))
            .cloned()
            .collect();
        tags.sort();

        let current: Vec<String> = node
            .prop("decorator_tags")
            .map(|v| v.string_items().iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        // Stale tags are overwritten; no surviving candidates empties the
        // list.
        if current != tags {
            let mut patched = node.clone();
            patched
                .properties
                .insert("decorator_tags".to_string(), PropValue::from(tags));
            store.upsert_node(&patched).map_err(wrap)?;
            updated += 1;
        }
    }
    Ok(updated)
}

/// Word tokens of a decorator string, lowercased, short noise dropped.
fn tokenize(decorator: &str) -> Vec<String> {
    decorator
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::Node;

    #[test]
    fn shared_tokens_become_tags() {
        let store = MemoryStore::new();
        store
            .upsert_node_batch(&[
                Node::new("p", NodeLabel::Function, "a", "p.m.a", "m.py")
                    .with_prop("decorators", vec!["app.route('/a')".to_string()]),
                Node::new("p", NodeLabel::Function, "b", "p.m.b", "m.py")
                    .with_prop("decorators", vec!["app.route('/b')".to_string()]),
                Node::new("p", NodeLabel::Function, "c", "p.m.c", "m.py")
                    .with_prop("decorators", vec!["lru_cache()".to_string()]),
            ])
            .unwrap();

        run("p", &store).unwrap();

        let a = store.find_node_by_qn("p", "p.m.a").unwrap().unwrap();
        let tags = a.prop("decorator_tags").unwrap().string_items();
        assert!(tags.contains(&"route"));
        assert!(tags.contains(&"app"));

        // Unshared tokens yield no tags.
        let c = store.find_node_by_qn("p", "p.m.c").unwrap().unwrap();
        assert!(c.prop("decorator_tags").unwrap().string_items().is_empty());
    }

    #[test]
    fn tokenizer_drops_punctuation_and_short_noise() {
        assert_eq!(tokenize("app.route('/x')"), vec!["app", "route"]);
        assert!(tokenize("a.b").is_empty());
    }
}
