//! Thin wrapper over tree-sitter: one opaque tree per file and a uniform
//! pre-order walk.
//!
//! Parsers are cached per thread because tree-sitter parsers are cheap to
//! reuse but not shareable. Trees own their memory and may be moved across
//! threads into the AST cache.

use std::cell::RefCell;
use std::collections::HashMap;
use tree_sitter::{Node, Tree};

use crate::lang::Language;

/// tree-sitter grammar for a language, when one is bundled.
pub fn grammar_for(language: Language) -> Option<tree_sitter::Language> {
    match language {
        Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
        Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
        Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
        Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
        Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
        Language::C => Some(tree_sitter_c::LANGUAGE.into()),
        Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
        Language::CSharp => Some(tree_sitter_c_sharp::LANGUAGE.into()),
        Language::Kotlin => Some(tree_sitter_kotlin::language()),
        Language::Ruby => Some(tree_sitter_ruby::LANGUAGE.into()),
        Language::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
        Language::Lua => Some(tree_sitter_lua::LANGUAGE.into()),
        Language::Swift => Some(tree_sitter_swift::LANGUAGE.into()),
        _ => None,
    }
}

/// Whether a grammar is bundled for this language.
pub fn has_grammar(language: Language) -> bool {
    grammar_for(language).is_some()
}

thread_local! {
    static PARSERS: RefCell<HashMap<Language, tree_sitter::Parser>> =
        RefCell::new(HashMap::new());
}

/// Parse source bytes into an owned tree. Returns an error string when no
/// grammar is bundled or the parser gives up; callers record it per file.
pub fn parse(language: Language, source: &[u8]) -> Result<Tree, String> {
    let grammar =
        grammar_for(language).ok_or_else(|| format!("no grammar bundled for {language}"))?;

    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(language) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let mut p = tree_sitter::Parser::new();
                p.set_language(&grammar)
                    .map_err(|e| format!("failed to load {language} grammar: {e}"))?;
                e.insert(p)
            }
        };
        parser
            .parse(source, None)
            .ok_or_else(|| format!("{language} parser returned no tree"))
    })
}

/// Pre-order walk. The visitor returns whether to descend into the node's
/// children.
pub fn walk<'t, F>(node: Node<'t>, visit: &mut F)
where
    F: FnMut(Node<'t>) -> bool,
{
    if !visit(node) {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, visit);
    }
}

/// Text of a node, empty on invalid UTF-8 slices.
pub fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_go_source() {
        let src = b"package main\nfunc main() {}\n";
        let tree = parse(Language::Go, src).unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
    }

    #[test]
    fn missing_grammar_is_an_error_not_a_panic() {
        let err = parse(Language::Haskell, b"main = print 1\n").unwrap_err();
        assert!(err.contains("no grammar"));
    }

    #[test]
    fn walk_respects_descend_flag() {
        let src = b"package main\nfunc a() { b() }\n";
        let tree = parse(Language::Go, src).unwrap();

        let mut all = 0usize;
        walk(tree.root_node(), &mut |_| {
            all += 1;
            true
        });

        // Stopping at function declarations must visit strictly fewer nodes.
        let mut pruned = 0usize;
        walk(tree.root_node(), &mut |n| {
            pruned += 1;
            n.kind() != "function_declaration"
        });
        assert!(pruned < all);
    }

    #[test]
    fn node_text_slices_source() {
        let src = b"package main\nfunc hello() {}\n";
        let tree = parse(Language::Go, src).unwrap();
        let mut found = false;
        walk(tree.root_node(), &mut |n| {
            if n.kind() == "identifier" && node_text(n, src) == "hello" {
                found = true;
            }
            true
        });
        assert!(found);
    }
}
