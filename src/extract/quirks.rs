//! Per-language extraction hooks.
//!
//! Everything here is a small deviation from the generic walk: names that
//! live on an enclosing assignment, homoiconic definition forms, block
//! labels, and the per-language export rules.

use tree_sitter::Node;

use crate::lang::Language;
use crate::parsing::node_text;

/// Resolve a function name from an anonymous-assignment context: the
/// function node itself is nameless and the name lives on the parent
/// declarator or assignment.
pub fn assignment_context_name(language: Language, node: Node<'_>, source: &[u8]) -> Option<String> {
    let parent = node.parent()?;
    match language {
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            // const f = () => {} / const f = function () {}
            if parent.kind() == "variable_declarator" {
                return parent
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string());
            }
            if parent.kind() == "pair" {
                return parent
                    .child_by_field_name("key")
                    .map(|n| node_text(n, source).to_string());
            }
            None
        }
        Language::Lua => {
            // local f = function() end
            if parent.kind() == "variable_declaration" || parent.kind() == "assignment_statement" {
                let lhs = parent.named_child(0)?;
                return Some(node_text(lhs, source).split(',').next()?.trim().to_string());
            }
            None
        }
        Language::R => {
            // f <- function(...)
            if parent.kind() == "binary_operator" {
                let lhs = parent.child_by_field_name("lhs").or_else(|| parent.named_child(0))?;
                return Some(node_text(lhs, source).to_string());
            }
            None
        }
        Language::OCaml => {
            // let f = ...
            node.child_by_field_name("pattern")
                .map(|n| node_text(n, source).to_string())
        }
        _ => None,
    }
}

/// Haskell type signatures share shape with bindings but define nothing.
pub fn is_non_definition(language: Language, node: Node<'_>) -> bool {
    language == Language::Haskell && node.kind() == "signature"
}

/// Elixir definition forms, recognised from a `call` node's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElixirForm {
    Module,
    Function,
    Test,
}

/// Classify an Elixir `call` node. `defmodule` opens a container whose body
/// is walked for nested defs; `def`/`defp` and `test`/`describe` emit
/// function symbols.
pub fn elixir_form(node: Node<'_>, source: &[u8]) -> Option<(ElixirForm, String)> {
    if node.kind() != "call" {
        return None;
    }
    let target = node.child_by_field_name("target")?;
    let keyword = node_text(target, source);
    let form = match keyword {
        "defmodule" => ElixirForm::Module,
        "def" | "defp" => ElixirForm::Function,
        "test" | "describe" => ElixirForm::Test,
        _ => return None,
    };
    let args = node
        .child_by_field_name("arguments")
        .or_else(|| node.named_child(1))?;
    let first = args.named_child(0)?;
    let mut name = node_text(first, source).to_string();
    if form == ElixirForm::Function {
        // def foo(bar) — keep the call head's function name only.
        if let Some(idx) = name.find('(') {
            name.truncate(idx);
        }
    }
    let name = name.trim_matches(['"', '\'']).trim().to_string();
    if name.is_empty() { None } else { Some((form, name)) }
}

/// HCL blocks are named `block-kind.label.label`, e.g.
/// `resource.aws_instance.web`.
pub fn hcl_block_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    if node.kind() != "block" {
        return None;
    }
    let mut parts = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => parts.push(node_text(child, source).to_string()),
            "string_lit" => {
                parts.push(node_text(child, source).trim_matches('"').to_string())
            }
            _ => break,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

/// Per-language export rule for a named symbol.
pub fn is_exported(language: Language, name: &str, node: Node<'_>, source: &[u8]) -> bool {
    match language {
        Language::Go => name.chars().next().is_some_and(|c| c.is_uppercase()),
        Language::Python => !name.starts_with('_'),
        Language::Java | Language::CSharp | Language::Kotlin => {
            name.chars().next().is_some_and(|c| c.is_uppercase())
        }
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            has_export_ancestor(node)
        }
        Language::Rust => {
            let mut cursor = node.walk();
            node.children(&mut cursor)
                .any(|c| c.kind() == "visibility_modifier" && node_text(c, source).starts_with("pub"))
        }
        _ => !name.starts_with('_'),
    }
}

/// JS/TS `export` detection, also used for `is_entry_point`.
pub fn has_export_ancestor(node: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "export_statement" {
            return true;
        }
        // Stop at the enclosing statement list; exports wrap declarations
        // directly.
        if n.kind() == "statement_block" || n.kind() == "program" {
            return false;
        }
        current = n.parent();
    }
    false
}

/// Decorator strings attached to a definition node.
pub fn decorators(language: Language, node: Node<'_>, source: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    match language {
        Language::Python => {
            if let Some(parent) = node.parent()
                && parent.kind() == "decorated_definition"
            {
                let mut cursor = parent.walk();
                for child in parent.named_children(&mut cursor) {
                    if child.kind() == "decorator" {
                        out.push(node_text(child, source).trim_start_matches('@').to_string());
                    }
                }
            }
        }
        Language::Java | Language::Kotlin => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "modifiers" || child.kind() == "annotation" {
                    let mut inner = child.walk();
                    for m in child.children(&mut inner) {
                        if m.kind() == "annotation" || m.kind() == "marker_annotation" {
                            out.push(node_text(m, source).trim_start_matches('@').to_string());
                        }
                    }
                    if child.kind() == "annotation" {
                        out.push(node_text(child, source).trim_start_matches('@').to_string());
                    }
                }
            }
        }
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "decorator" {
                    out.push(node_text(child, source).trim_start_matches('@').to_string());
                }
            }
        }
        _ => {}
    }
    out.sort();
    out.dedup();
    out
}

/// Docstring for a definition: Python first-statement string, otherwise the
/// comment block immediately above.
pub fn docstring(language: Language, node: Node<'_>, source: &[u8]) -> Option<String> {
    if language == Language::Python {
        let body = node.child_by_field_name("body")?;
        let first = body.named_child(0)?;
        if first.kind() == "expression_statement" {
            let inner = first.named_child(0)?;
            if inner.kind() == "string" {
                let text = node_text(inner, source);
                let trimmed = text
                    .trim_matches(['"', '\''])
                    .trim()
                    .to_string();
                return if trimmed.is_empty() { None } else { Some(trimmed) };
            }
        }
        return None;
    }

    // Walk preceding comment siblings; the decorated wrapper sits between
    // the comment and the definition in some grammars.
    let anchor = node
        .parent()
        .filter(|p| p.kind() == "decorated_definition")
        .unwrap_or(node);
    let mut lines = Vec::new();
    let mut sibling = anchor.prev_sibling();
    while let Some(prev) = sibling {
        if !prev.kind().contains("comment") {
            break;
        }
        let text = node_text(prev, source)
            .trim_start_matches('/')
            .trim_start_matches('*')
            .trim()
            .to_string();
        lines.push(text);
        sibling = prev.prev_sibling();
    }
    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

/// Decorator prefixes that mark a symbol as a service entry point (route
/// handlers and background tasks).
pub const ENTRY_POINT_DECORATOR_PREFIXES: &[&str] = &[
    "app.route",
    "app.get",
    "app.post",
    "app.put",
    "app.delete",
    "router.",
    "blueprint.",
    "api.",
    "celery.task",
    "shared_task",
    "task",
    "Get",
    "Post",
    "Put",
    "Delete",
    "GetMapping",
    "PostMapping",
    "RequestMapping",
];

/// Whether any decorator marks this symbol as an entry point.
pub fn decorator_marks_entry_point(decorators: &[String]) -> bool {
    decorators.iter().any(|d| {
        ENTRY_POINT_DECORATOR_PREFIXES
            .iter()
            .any(|prefix| d.starts_with(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{parse, walk};

    #[test]
    fn js_arrow_function_name_from_declarator() {
        let src = b"const handler = () => { return 1; };\n";
        let tree = parse(Language::JavaScript, src).unwrap();
        let mut name = None;
        walk(tree.root_node(), &mut |n| {
            if n.kind() == "arrow_function" {
                name = assignment_context_name(Language::JavaScript, n, src);
            }
            true
        });
        assert_eq!(name.as_deref(), Some("handler"));
    }

    #[test]
    fn python_decorators_and_docstring() {
        let src = b"@app.route('/x')\ndef handler():\n    \"\"\"Handles X.\"\"\"\n    pass\n";
        let tree = parse(Language::Python, src).unwrap();
        let mut found = (Vec::new(), None);
        walk(tree.root_node(), &mut |n| {
            if n.kind() == "function_definition" {
                found = (
                    decorators(Language::Python, n, src),
                    docstring(Language::Python, n, src),
                );
            }
            true
        });
        assert_eq!(found.0, vec!["app.route('/x')".to_string()]);
        assert_eq!(found.1.as_deref(), Some("Handles X."));
        assert!(decorator_marks_entry_point(&found.0));
    }

    #[test]
    fn go_export_rule() {
        let src = b"package p\nfunc Public() {}\nfunc private() {}\n";
        let tree = parse(Language::Go, src).unwrap();
        let root = tree.root_node();
        let mut results = Vec::new();
        walk(root, &mut |n| {
            if n.kind() == "function_declaration"
                && let Some(name) = n.child_by_field_name("name")
            {
                let text = node_text(name, src).to_string();
                results.push((text.clone(), is_exported(Language::Go, &text, n, src)));
            }
            true
        });
        assert_eq!(
            results,
            vec![("Public".to_string(), true), ("private".to_string(), false)]
        );
    }

    #[test]
    fn js_export_marks_entry_point() {
        let src = b"export function api() {}\nfunction local() {}\n";
        let tree = parse(Language::JavaScript, src).unwrap();
        let mut flags = Vec::new();
        walk(tree.root_node(), &mut |n| {
            if n.kind() == "function_declaration" {
                flags.push(has_export_ancestor(n));
            }
            true
        });
        assert_eq!(flags, vec![true, false]);
    }
}
