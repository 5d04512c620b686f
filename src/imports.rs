//! Per-module import resolution: local name → target qualified name.
//!
//! The map feeds both the name-resolution strategy and incremental
//! dependent-file discovery. Total by contract: unknown languages yield an
//! empty map, and resolution then falls back to name-based strategies.

use std::collections::HashMap;
use tree_sitter::{Node as TsNode, Tree};

use crate::lang::Language;
use crate::parsing::{node_text, walk};

/// Local name (alias or last segment) → target qualified name.
pub type ImportMap = HashMap<String, String>;

/// Build the import map for one parsed file.
pub fn parse_imports(
    tree: &Tree,
    source: &[u8],
    language: Language,
    project: &str,
    rel_path: &str,
) -> ImportMap {
    let mut map = ImportMap::new();
    let root = tree.root_node();
    match language {
        Language::Go => collect_go(root, source, project, &mut map),
        Language::Python => collect_python(root, source, project, rel_path, &mut map),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            collect_js(root, source, project, rel_path, &mut map)
        }
        Language::Rust => collect_rust(root, source, project, &mut map),
        Language::Java => collect_java(root, source, &mut map),
        Language::C | Language::Cpp => collect_c_includes(root, source, project, rel_path, &mut map),
        _ => {}
    }
    map
}

/// Go: alias or last slash-segment; a path segment equal to the project
/// name re-roots the target inside the project. Blank (`_`) and dot (`.`)
/// imports are not recorded.
fn collect_go(root: TsNode<'_>, source: &[u8], project: &str, map: &mut ImportMap) {
    walk(root, &mut |node| {
        if node.kind() != "import_spec" {
            return node.kind() == "source_file"
                || node.kind() == "import_declaration"
                || node.kind() == "import_spec_list";
        }

        let Some(path_node) = node.child_by_field_name("path") else {
            return false;
        };
        let path = node_text(path_node, source).trim_matches('"').to_string();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some(last) = segments.last() else {
            return false;
        };

        let local = match node.child_by_field_name("name") {
            Some(alias) => {
                let text = node_text(alias, source);
                if text == "_" || text == "." {
                    return false;
                }
                text.to_string()
            }
            None => (*last).to_string(),
        };

        let target = match segments.iter().position(|s| *s == project) {
            Some(idx) if idx + 1 < segments.len() => {
                format!("{project}.{}", segments[idx + 1..].join("."))
            }
            Some(_) => project.to_string(),
            None => segments.join("."),
        };
        map.insert(local, target);
        false
    });
}

/// Python: `import a.b`, `import a.b as c`, `from a.b import c, d`,
/// `from ..x import y`.
fn collect_python(
    root: TsNode<'_>,
    source: &[u8],
    project: &str,
    rel_path: &str,
    map: &mut ImportMap,
) {
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        match node.kind() {
            "import_statement" => {
                let mut inner = node.walk();
                for child in node.named_children(&mut inner) {
                    match child.kind() {
                        "dotted_name" => {
                            let path = node_text(child, source);
                            let local = path.rsplit('.').next().unwrap_or(path).to_string();
                            map.insert(local, format!("{project}.{path}"));
                        }
                        "aliased_import" => {
                            let Some(name) = child.child_by_field_name("name") else {
                                continue;
                            };
                            let Some(alias) = child.child_by_field_name("alias") else {
                                continue;
                            };
                            let path = node_text(name, source);
                            map.insert(
                                node_text(alias, source).to_string(),
                                format!("{project}.{path}"),
                            );
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                let Some(module) = node.child_by_field_name("module_name") else {
                    continue;
                };
                let Some(base) = python_module_base(module, source, project, rel_path) else {
                    continue;
                };
                let mut inner = node.walk();
                for child in node.named_children(&mut inner) {
                    if child.id() == module.id() {
                        continue;
                    }
                    match child.kind() {
                        "dotted_name" => {
                            let name = node_text(child, source);
                            let local = name.rsplit('.').next().unwrap_or(name).to_string();
                            map.insert(local, format!("{base}.{name}"));
                        }
                        "aliased_import" => {
                            let Some(name) = child.child_by_field_name("name") else {
                                continue;
                            };
                            let Some(alias) = child.child_by_field_name("alias") else {
                                continue;
                            };
                            map.insert(
                                node_text(alias, source).to_string(),
                                format!("{base}.{}", node_text(name, source)),
                            );
                        }
                        "wildcard_import" => {}
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

/// Qualified base for a Python `from X import …` module: absolute modules
/// get the project prefix; relative modules walk up the current file's
/// directory by the number of leading dots.
fn python_module_base(
    module: TsNode<'_>,
    source: &[u8],
    project: &str,
    rel_path: &str,
) -> Option<String> {
    let text = node_text(module, source);
    if !text.starts_with('.') {
        return Some(format!("{project}.{text}"));
    }

    let dots = text.chars().take_while(|c| *c == '.').count();
    let remainder = &text[dots..];

    let mut dir: Vec<&str> = rel_path.split('/').collect();
    dir.pop(); // file name
    for _ in 1..dots {
        dir.pop()?;
    }

    let mut parts = vec![project.to_string()];
    parts.extend(dir.iter().map(|s| s.to_string()));
    if !remainder.is_empty() {
        parts.push(remainder.to_string());
    }
    Some(parts.join("."))
}

/// JS/TS: relative sources resolve against the importing file's directory;
/// bare package specifiers stay as dotted paths outside the project.
fn collect_js(
    root: TsNode<'_>,
    source: &[u8],
    project: &str,
    rel_path: &str,
    map: &mut ImportMap,
) {
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        if node.kind() != "import_statement" {
            continue;
        }
        let Some(source_node) = node.child_by_field_name("source") else {
            continue;
        };
        let spec = node_text(source_node, source).trim_matches(['"', '\'']).to_string();
        let Some(base) = js_module_base(&spec, project, rel_path) else {
            continue;
        };

        let mut names: Vec<(String, Option<String>)> = Vec::new();
        walk(node, &mut |n| {
            match n.kind() {
                "import_specifier" => {
                    let name = n
                        .child_by_field_name("name")
                        .map(|x| node_text(x, source).to_string());
                    let alias = n
                        .child_by_field_name("alias")
                        .map(|x| node_text(x, source).to_string());
                    if let Some(name) = name {
                        names.push((name, alias));
                    }
                    false
                }
                "namespace_import" => {
                    // import * as ns from './x' — ns maps to the module.
                    let mut inner = n.walk();
                    for child in n.named_children(&mut inner) {
                        if child.kind() == "identifier" {
                            map.insert(node_text(child, source).to_string(), base.clone());
                        }
                    }
                    false
                }
                "identifier" if n.parent().is_some_and(|p| p.kind() == "import_clause") => {
                    // Default import binds the module itself.
                    map.insert(node_text(n, source).to_string(), base.clone());
                    false
                }
                _ => true,
            }
        });
        for (name, alias) in names {
            map.insert(alias.unwrap_or_else(|| name.clone()), format!("{base}.{name}"));
        }
    }
}

fn js_module_base(spec: &str, project: &str, rel_path: &str) -> Option<String> {
    if spec.starts_with("./") || spec.starts_with("../") {
        let mut dir: Vec<String> = rel_path.split('/').map(String::from).collect();
        dir.pop(); // file name
        let mut remainder: Vec<&str> = spec.split('/').collect();
        while let Some(first) = remainder.first() {
            match *first {
                "." => {
                    remainder.remove(0);
                }
                ".." => {
                    remainder.remove(0);
                    dir.pop()?;
                }
                _ => break,
            }
        }
        let mut parts = vec![project.to_string()];
        parts.extend(dir);
        parts.extend(remainder.iter().map(|s| {
            s.trim_end_matches(".ts")
                .trim_end_matches(".tsx")
                .trim_end_matches(".js")
                .trim_end_matches(".jsx")
                .to_string()
        }));
        Some(parts.join("."))
    } else {
        // Bare package specifier: keep as an external dotted path.
        Some(spec.replace('/', "."))
    }
}

/// Rust: `use` declarations. `crate::` re-roots at the project; aliases via
/// `as` win over the last path segment.
fn collect_rust(root: TsNode<'_>, source: &[u8], project: &str, map: &mut ImportMap) {
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        if node.kind() != "use_declaration" {
            continue;
        }
        let Some(argument) = node.child_by_field_name("argument") else {
            continue;
        };
        collect_rust_use(argument, source, project, "", map);
    }
}

fn collect_rust_use(
    node: TsNode<'_>,
    source: &[u8],
    project: &str,
    prefix: &str,
    map: &mut ImportMap,
) {
    match node.kind() {
        "use_as_clause" => {
            let Some(path) = node.child_by_field_name("path") else {
                return;
            };
            let Some(alias) = node.child_by_field_name("alias") else {
                return;
            };
            let target = rust_path_to_qn(&join_rust_path(prefix, node_text(path, source)), project);
            map.insert(node_text(alias, source).to_string(), target);
        }
        "scoped_use_list" => {
            let base = node
                .child_by_field_name("path")
                .map(|p| join_rust_path(prefix, node_text(p, source)))
                .unwrap_or_else(|| prefix.to_string());
            if let Some(list) = node.child_by_field_name("list") {
                let mut cursor = list.walk();
                for child in list.named_children(&mut cursor) {
                    collect_rust_use(child, source, project, &base, map);
                }
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_rust_use(child, source, project, prefix, map);
            }
        }
        "use_wildcard" => {}
        "self" => {}
        _ => {
            let path = join_rust_path(prefix, node_text(node, source));
            let Some(local) = path.rsplit("::").next().map(str::to_string) else {
                return;
            };
            if local == "self" || local == "*" || local.is_empty() {
                return;
            }
            map.insert(local, rust_path_to_qn(&path, project));
        }
    }
}

fn join_rust_path(prefix: &str, tail: &str) -> String {
    if prefix.is_empty() {
        tail.to_string()
    } else {
        format!("{prefix}::{tail}")
    }
}

fn rust_path_to_qn(path: &str, project: &str) -> String {
    let dotted = path.replace("::", ".");
    match dotted.strip_prefix("crate.") {
        Some(rest) => format!("{project}.{rest}"),
        None => dotted,
    }
}

/// Java: last segment of the imported path; target stays a plain dotted
/// path and resolves through the name-based fallbacks.
fn collect_java(root: TsNode<'_>, source: &[u8], map: &mut ImportMap) {
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        if node.kind() != "import_declaration" {
            continue;
        }
        let mut inner = node.walk();
        for child in node.named_children(&mut inner) {
            if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
                let path = node_text(child, source).to_string();
                if let Some(local) = path.rsplit('.').next() {
                    if local != "*" {
                        map.insert(local.to_string(), path.clone());
                    }
                }
            }
        }
    }
}

/// C/C++: quoted includes map the header's stem to the sibling module.
fn collect_c_includes(
    root: TsNode<'_>,
    source: &[u8],
    project: &str,
    rel_path: &str,
    map: &mut ImportMap,
) {
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        if node.kind() != "preproc_include" {
            continue;
        }
        let Some(path_node) = node.child_by_field_name("path") else {
            continue;
        };
        if path_node.kind() != "string_literal" {
            continue; // system includes are outside the project
        }
        let header = node_text(path_node, source).trim_matches('"').to_string();
        let stem = header
            .rsplit('/')
            .next()
            .and_then(|f| f.rsplit_once('.').map(|(s, _)| s.to_string()))
            .unwrap_or_else(|| header.clone());

        let mut dir: Vec<&str> = rel_path.split('/').collect();
        dir.pop();
        let mut parts = vec![project.to_string()];
        parts.extend(dir.iter().map(|s| s.to_string()));
        parts.push(
            header
                .rsplit_once('.')
                .map(|(s, _)| s.replace('/', "."))
                .unwrap_or_else(|| header.replace('/', ".")),
        );
        map.insert(stem, parts.join("."));
    }
}
