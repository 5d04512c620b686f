//! TESTS and TESTS_FILE linkage.
//!
//! TESTS: a CALLS edge whose source lives in a test file, targets a
//! non-test file, and whose source function name matches the language's
//! test-function pattern. TESTS_FILE: per test module, a naming-convention
//! match first, IMPORTS fallback second.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::IndexResult;
use crate::extract::lang_is_test_file;
use crate::lang::Language;
use crate::storage::GraphStore;
use crate::types::{Edge, EdgeType, Node, NodeId, NodeLabel, PropValue};

static GO_TEST_FN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Test\w").expect("regex"));
static SNAKE_TEST_FN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^test_").expect("regex"));
static JAVA_TEST_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^test)|(Test$)").expect("regex"));
static JS_TEST_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(describe|it|test)$").expect("regex"));
static GENERIC_TEST_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^test").expect("regex"));

fn test_fn_pattern(language: Language) -> &'static Regex {
    match language {
        Language::Go => &GO_TEST_FN,
        Language::Python | Language::Ruby | Language::Rust | Language::Elixir => &SNAKE_TEST_FN,
        Language::Java | Language::Kotlin | Language::CSharp => &JAVA_TEST_FN,
        Language::JavaScript | Language::TypeScript | Language::Tsx => &JS_TEST_FN,
        _ => &GENERIC_TEST_FN,
    }
}

pub fn run(project: &str, store: &dyn GraphStore) -> IndexResult<(usize, usize)> {
    let wrap = |source| crate::error::IndexError::StoreBatch {
        pass: "tests".to_string(),
        source,
    };

    let calls = store.find_edges_by_type(project, EdgeType::Calls).map_err(wrap)?;
    let mut ids: Vec<NodeId> = calls.iter().flat_map(|e| [e.source, e.target]).collect();
    ids.sort();
    ids.dedup();
    let nodes: HashMap<NodeId, Node> = store
        .find_nodes_by_ids(&ids)
        .map_err(wrap)?
        .into_iter()
        .filter_map(|n| n.id.map(|id| (id, n)))
        .collect();

    let mut test_edges = Vec::new();
    for call in &calls {
        let (Some(source), Some(target)) = (nodes.get(&call.source), nodes.get(&call.target))
        else {
            continue;
        };
        let Some(language) = Language::from_path(std::path::Path::new(&source.file_path)) else {
            continue;
        };
        if !lang_is_test_file(language, &source.file_path) {
            continue;
        }
        if lang_is_test_file(language, &target.file_path) {
            continue;
        }
        if !test_fn_pattern(language).is_match(&source.name) {
            continue;
        }
        test_edges.push(Edge::new(project, call.source, call.target, EdgeType::Tests));
    }
    let tests_count = test_edges.len();
    store.insert_edge_batch(&test_edges).map_err(wrap)?;

    // TESTS_FILE per test module.
    let modules = store
        .find_nodes_by_label(project, NodeLabel::Module)
        .map_err(wrap)?;
    let by_path: HashMap<&str, &Node> = modules
        .iter()
        .map(|m| (m.file_path.as_str(), m))
        .collect();

    let mut file_edges = Vec::new();
    for module in &modules {
        let is_test = module
            .prop("is_test")
            .and_then(PropValue::as_bool)
            .unwrap_or(false);
        if !is_test {
            continue;
        }
        let (Some(module_id), Some(language)) = (
            module.id,
            Language::from_path(std::path::Path::new(&module.file_path)),
        ) else {
            continue;
        };

        let mut linked = false;
        if let Some(candidate) = tested_file_candidate(language, &module.file_path)
            && let Some(target) = by_path.get(candidate.as_str())
            && let Some(target_id) = target.id
        {
            file_edges.push(Edge::new(project, module_id, target_id, EdgeType::TestsFile));
            linked = true;
        }

        if !linked {
            // Fall back to this module's imports of non-test modules.
            let imports = store
                .find_edges_by_source_and_type(module_id, EdgeType::Imports)
                .map_err(wrap)?;
            for import in imports {
                let targets = store.find_nodes_by_ids(&[import.target]).map_err(wrap)?;
                let Some(target) = targets.first() else {
                    continue;
                };
                let target_is_test = target
                    .prop("is_test")
                    .and_then(PropValue::as_bool)
                    .unwrap_or(false);
                if target.label == NodeLabel::Module && !target_is_test {
                    file_edges.push(Edge::new(
                        project,
                        module_id,
                        import.target,
                        EdgeType::TestsFile,
                    ));
                }
            }
        }
    }
    let files_count = file_edges.len();
    store.insert_edge_batch(&file_edges).map_err(wrap)?;

    Ok((tests_count, files_count))
}

/// Naming-convention counterpart of a test file, e.g. `foo_test.go →
/// foo.go`, `test_foo.py → foo.py`, `foo.test.ts → foo.ts`.
fn tested_file_candidate(language: Language, rel_path: &str) -> Option<String> {
    let (dir, base) = match rel_path.rsplit_once('/') {
        Some((dir, base)) => (Some(dir), base),
        None => (None, rel_path),
    };
    let candidate = match language {
        Language::Go => base.strip_suffix("_test.go").map(|s| format!("{s}.go")),
        Language::Python => base
            .strip_prefix("test_")
            .map(|s| s.to_string())
            .or_else(|| base.strip_suffix("_test.py").map(|s| format!("{s}.py"))),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            let collapsed = base.replace(".test.", ".").replace(".spec.", ".");
            (collapsed != base).then_some(collapsed)
        }
        Language::Java | Language::Kotlin | Language::CSharp => {
            let (stem, ext) = base.rsplit_once('.')?;
            stem.strip_suffix("Test").map(|s| format!("{s}.{ext}"))
        }
        Language::Ruby => base.strip_suffix("_spec.rb").map(|s| format!("{s}.rb")),
        _ => None,
    }?;
    Some(match dir {
        Some(dir) => format!("{dir}/{candidate}"),
        None => candidate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn naming_convention_candidates() {
        assert_eq!(
            tested_file_candidate(Language::Go, "pkg/handler_test.go"),
            Some("pkg/handler.go".to_string())
        );
        assert_eq!(
            tested_file_candidate(Language::Python, "tests/test_billing.py"),
            Some("tests/billing.py".to_string())
        );
        assert_eq!(
            tested_file_candidate(Language::TypeScript, "src/app.test.ts"),
            Some("src/app.ts".to_string())
        );
        assert_eq!(tested_file_candidate(Language::Go, "pkg/handler.go"), None);
    }

    #[test]
    fn test_function_patterns() {
        assert!(test_fn_pattern(Language::Go).is_match("TestServe"));
        assert!(!test_fn_pattern(Language::Go).is_match("Serve"));
        assert!(test_fn_pattern(Language::Python).is_match("test_serve"));
        assert!(test_fn_pattern(Language::JavaScript).is_match("describe"));
    }

    #[test]
    fn calls_from_test_files_become_tests_edges() {
        let store = MemoryStore::new();
        let ids = store
            .upsert_node_batch(&[
                Node::new(
                    "p",
                    NodeLabel::Function,
                    "TestServe",
                    "p.h_test.TestServe",
                    "pkg/h_test.go",
                ),
                Node::new("p", NodeLabel::Function, "Serve", "p.h.Serve", "pkg/h.go"),
                Node::new("p", NodeLabel::Function, "helper", "p.h_test.helper", "pkg/h_test.go"),
            ])
            .unwrap();
        store
            .insert_edge_batch(&[
                Edge::new(
                    "p",
                    ids["p.h_test.TestServe"],
                    ids["p.h.Serve"],
                    EdgeType::Calls,
                ),
                Edge::new(
                    "p",
                    ids["p.h_test.helper"],
                    ids["p.h.Serve"],
                    EdgeType::Calls,
                ),
            ])
            .unwrap();

        let (tests, _) = run("p", &store).unwrap();
        assert_eq!(tests, 1);
        let edges = store.find_edges_by_type("p", EdgeType::Tests).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, ids["p.h_test.TestServe"]);
    }
}
