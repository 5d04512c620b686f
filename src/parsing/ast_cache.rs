//! Per-run AST cache.
//!
//! Keyed by relative path. Each entry owns the parse tree, the backing
//! source bytes and the language tag. Entries are inserted serially after
//! parallel parse tasks complete (transfer is by move) and are read-only
//! while resolution passes run. The whole cache is dropped before
//! store-only passes to release memory.

use std::collections::HashMap;
use tree_sitter::Tree;

use crate::lang::Language;

/// One cached parse: tree plus the bytes its nodes point into.
pub struct CachedTree {
    pub tree: Tree,
    pub source: Vec<u8>,
    pub language: Language,
}

/// Owned tree cache for one pipeline run.
#[derive(Default)]
pub struct AstCache {
    entries: HashMap<String, CachedTree>,
}

impl AstCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parsed file; replaces any previous entry for the path.
    pub fn insert(&mut self, rel_path: impl Into<String>, entry: CachedTree) {
        self.entries.insert(rel_path.into(), entry);
    }

    pub fn get(&self, rel_path: &str) -> Option<&CachedTree> {
        self.entries.get(rel_path)
    }

    pub fn contains(&self, rel_path: &str) -> bool {
        self.entries.contains_key(rel_path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every owned tree. Called once all AST-dependent passes finish.
    pub fn release(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse;

    #[test]
    fn insert_get_release() {
        let src = b"package main\n".to_vec();
        let tree = parse(Language::Go, &src).unwrap();
        let mut cache = AstCache::new();
        cache.insert(
            "main.go",
            CachedTree {
                tree,
                source: src,
                language: Language::Go,
            },
        );

        assert!(cache.contains("main.go"));
        assert_eq!(cache.len(), 1);
        let entry = cache.get("main.go").unwrap();
        assert_eq!(entry.language, Language::Go);

        cache.release();
        assert!(cache.is_empty());
        assert!(!cache.contains("main.go"));
    }
}
