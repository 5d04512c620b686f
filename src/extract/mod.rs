//! Definition extraction: one pure pass over one file's AST.
//!
//! `parse_file` has no dependency on the store or the name registry and may
//! run concurrently for any number of files. It reads the file, parses it,
//! emits node descriptors and pending edges keyed by qualified name, and
//! returns errors as data instead of raising them.

mod quirks;
mod symbols;

pub use quirks::ENTRY_POINT_DECORATOR_PREFIXES;
pub(crate) use symbols::{go_receiver_name, go_receiver_type};

use std::collections::BTreeMap;
use std::path::Path;
use tree_sitter::Node as TsNode;

use crate::imports::{self, ImportMap};
use crate::lang::{self, Language};
use crate::parsing::{self, CachedTree};
use crate::types::{module_qn, Node, NodeLabel, PendingEdge, PropValue};

/// A discovered file: path relative to the repository root plus its
/// detected language.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub rel_path: String,
    pub language: Language,
}

impl FileInfo {
    pub fn new(rel_path: impl Into<String>, language: Language) -> Self {
        Self {
            rel_path: rel_path.into(),
            language,
        }
    }
}

/// Everything one file contributes to the definitions pass. The parse tree
/// and source ride along so the serial flush can move them into the AST
/// cache without re-parsing.
pub struct Extraction {
    pub rel_path: String,
    pub language: Language,
    pub module_qn: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<PendingEdge>,
    pub imports: ImportMap,
    pub error: Option<String>,
    pub parsed: Option<CachedTree>,
}

impl Extraction {
    fn failed(file: &FileInfo, module_qn: String, error: String) -> Self {
        Self {
            rel_path: file.rel_path.clone(),
            language: file.language,
            module_qn,
            nodes: Vec::new(),
            edges: Vec::new(),
            imports: ImportMap::new(),
            error: Some(error),
            parsed: None,
        }
    }
}

/// Extract definitions from one file.
pub fn parse_file(project: &str, root: &Path, file: &FileInfo) -> Extraction {
    let module = module_qn(project, &file.rel_path);

    let raw = match std::fs::read(root.join(&file.rel_path)) {
        Ok(bytes) => bytes,
        Err(e) => return Extraction::failed(file, module, format!("read failed: {e}")),
    };
    let source = strip_bom(raw);

    let Some(spec) = lang::for_language(file.language) else {
        return Extraction::failed(file, module, format!("no spec for {}", file.language));
    };

    let tree = match parsing::parse(file.language, &source) {
        Ok(tree) => tree,
        Err(reason) => return Extraction::failed(file, module, reason),
    };

    let import_map = imports::parse_imports(&tree, &source, file.language, project, &file.rel_path);

    let mut walker = symbols::SymbolWalker {
        project,
        rel_path: &file.rel_path,
        language: file.language,
        spec,
        source: &source,
        module_qn: module.clone(),
        nodes: Vec::new(),
        edges: Vec::new(),
        constants: BTreeMap::new(),
    };

    let root_node = tree.root_node();
    parsing::walk(root_node, &mut |n| walker.visit(n));

    let module_node = build_module_node(project, file, &walker, &import_map, root_node);
    let mut nodes = vec![module_node];
    nodes.append(&mut walker.nodes);

    Extraction {
        rel_path: file.rel_path.clone(),
        language: file.language,
        module_qn: module,
        nodes,
        edges: walker.edges,
        imports: import_map,
        error: None,
        parsed: Some(CachedTree {
            tree,
            source,
            language: file.language,
        }),
    }
}

fn strip_bom(bytes: Vec<u8>) -> Vec<u8> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes[3..].to_vec()
    } else {
        bytes
    }
}

/// Build the Module node, enriched with the file-level summary the walk
/// collected.
fn build_module_node(
    project: &str,
    file: &FileInfo,
    walker: &symbols::SymbolWalker<'_>,
    import_map: &ImportMap,
    root: TsNode<'_>,
) -> Node {
    let name = file
        .rel_path
        .rsplit('/')
        .next()
        .unwrap_or(&file.rel_path)
        .rsplit_once('.')
        .map(|(stem, _)| stem.to_string())
        .unwrap_or_else(|| file.rel_path.clone());

    let exports: Vec<String> = walker
        .nodes
        .iter()
        .filter(|n| {
            n.prop("is_exported")
                .and_then(PropValue::as_bool)
                .unwrap_or(false)
        })
        .map(|n| n.name.clone())
        .collect();

    let global_vars: Vec<String> = walker
        .nodes
        .iter()
        .filter(|n| n.label == NodeLabel::Variable)
        .map(|n| n.name.clone())
        .collect();

    let symbols: Vec<PropValue> = walker
        .nodes
        .iter()
        .filter(|n| n.label.is_symbol())
        .map(|n| {
            let mut m = BTreeMap::new();
            m.insert("name".to_string(), PropValue::from(n.name.clone()));
            m.insert("kind".to_string(), PropValue::from(n.label.as_str()));
            m.insert("line".to_string(), PropValue::from(n.start_line as usize));
            PropValue::Map(m)
        })
        .collect();

    let mut import_targets: Vec<String> = import_map.values().cloned().collect();
    import_targets.sort();
    import_targets.dedup();

    let constants: BTreeMap<String, String> = walker.constants.clone();

    let mut node = Node::new(
        project,
        NodeLabel::Module,
        name,
        walker.module_qn.clone(),
        file.rel_path.clone(),
    )
    .with_lines(1, root.end_position().row as u32 + 1)
    .with_prop("language", file.language.name())
    .with_prop("is_test", lang_is_test_file(file.language, &file.rel_path))
    .with_prop("imports_count", import_map.len())
    .with_prop("exports", exports)
    .with_prop("global_vars", global_vars)
    .with_prop("import_targets", import_targets);

    if !symbols.is_empty() {
        node = node.with_prop("symbols", PropValue::List(symbols));
    }
    if !constants.is_empty() {
        node = node.with_prop("constants", PropValue::from(constants));
    }
    node
}

/// Test-file naming conventions per language.
pub fn lang_is_test_file(language: Language, rel_path: &str) -> bool {
    let base = rel_path.rsplit('/').next().unwrap_or(rel_path);
    match language {
        Language::Go => base.ends_with("_test.go"),
        Language::Python => base.starts_with("test_") || base.ends_with("_test.py"),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            base.contains(".test.") || base.contains(".spec.") || rel_path.contains("__tests__/")
        }
        Language::Java | Language::CSharp | Language::Kotlin => {
            base.starts_with("Test") || base.contains("Test.")
        }
        Language::Rust => rel_path.starts_with("tests/") || base.ends_with("_test.rs"),
        Language::Ruby => base.ends_with("_spec.rb") || base.starts_with("test_"),
        Language::Elixir => base.ends_with("_test.exs"),
        _ => base.to_lowercase().contains("test"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeType;
    use std::fs;
    use tempfile::TempDir;

    fn extract_from(source: &str, rel_path: &str, language: Language) -> Extraction {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, source).unwrap();
        parse_file("proj", dir.path(), &FileInfo::new(rel_path, language))
    }

    fn node_by_name<'a>(ex: &'a Extraction, name: &str) -> Option<&'a Node> {
        ex.nodes.iter().find(|n| n.name == name)
    }

    #[test]
    fn go_functions_and_methods() {
        let ex = extract_from(
            "package handler\n\ntype Handler struct {\n\tcount int\n}\n\nfunc (h *Handler) Serve() {\n\th.validate()\n}\n\nfunc (h *Handler) validate() {}\n\nfunc New() *Handler { return &Handler{} }\n",
            "handler/h.go",
            Language::Go,
        );
        assert!(ex.error.is_none());

        let class = node_by_name(&ex, "Handler").unwrap();
        assert_eq!(class.label, NodeLabel::Class);
        assert_eq!(class.qualified_name, "proj.handler.h.Handler");

        let serve = node_by_name(&ex, "Serve").unwrap();
        assert_eq!(serve.label, NodeLabel::Method);
        assert_eq!(serve.qualified_name, "proj.handler.h.Handler.Serve");
        assert_eq!(
            serve.prop("is_exported").and_then(PropValue::as_bool),
            Some(true)
        );

        let new_fn = node_by_name(&ex, "New").unwrap();
        assert_eq!(new_fn.label, NodeLabel::Function);

        // Methods hang off the class, functions off the module.
        assert!(ex.edges.iter().any(|e| {
            e.edge_type == EdgeType::DefinesMethod
                && e.source_qn == "proj.handler.h.Handler"
                && e.target_qn == "proj.handler.h.Handler.Serve"
        }));
        assert!(ex.edges.iter().any(|e| {
            e.edge_type == EdgeType::Defines && e.target_qn == "proj.handler.h.New"
        }));
        // The struct field is attached as a Field.
        assert!(ex.edges.iter().any(|e| {
            e.edge_type == EdgeType::DefinesField
                && e.target_qn == "proj.handler.h.Handler.count"
        }));
    }

    #[test]
    fn python_class_with_methods_and_docstring() {
        let ex = extract_from(
            "class A:\n    def foo(self):\n        \"\"\"Docs.\"\"\"\n        self.bar()\n\n    def bar(self):\n        pass\n\nMAX_RETRIES = 3\n",
            "pkg/a.py",
            Language::Python,
        );
        assert!(ex.error.is_none());

        let class = node_by_name(&ex, "A").unwrap();
        assert_eq!(class.label, NodeLabel::Class);

        let foo = node_by_name(&ex, "foo").unwrap();
        assert_eq!(foo.label, NodeLabel::Method);
        assert_eq!(foo.qualified_name, "proj.pkg.a.A.foo");
        assert_eq!(
            foo.prop("docstring").and_then(PropValue::as_str),
            Some("Docs.")
        );

        // Constant-looking top-level assignment lands on the module node.
        let module = ex.nodes.iter().find(|n| n.label == NodeLabel::Module).unwrap();
        let constants = module.prop("constants").and_then(PropValue::as_map).unwrap();
        assert_eq!(
            constants.get("MAX_RETRIES").and_then(PropValue::as_str),
            Some("3")
        );
    }

    #[test]
    fn rust_impl_attaches_methods_and_implements() {
        let ex = extract_from(
            "pub struct Engine;\n\npub trait Runner {\n    fn run(&self);\n}\n\nimpl Runner for Engine {\n    fn run(&self) {}\n}\n",
            "src/engine.rs",
            Language::Rust,
        );
        assert!(ex.error.is_none());

        let run = ex
            .nodes
            .iter()
            .find(|n| n.qualified_name == "proj.src.engine.Engine.run")
            .unwrap();
        assert_eq!(run.label, NodeLabel::Method);

        assert!(ex.edges.iter().any(|e| {
            e.edge_type == EdgeType::Implements
                && e.source_qn == "proj.src.engine.Engine"
                && e.target_qn == "proj.src.engine.Runner"
        }));
    }

    #[test]
    fn module_summary_properties() {
        let ex = extract_from(
            "package util\n\nimport \"fmt\"\n\nvar registry = map[string]string{}\n\nfunc Print() { fmt.Println() }\n",
            "util/u.go",
            Language::Go,
        );
        let module = ex.nodes.iter().find(|n| n.label == NodeLabel::Module).unwrap();
        assert_eq!(module.qualified_name, "proj.util.u");
        assert_eq!(
            module.prop("is_test").and_then(PropValue::as_bool),
            Some(false)
        );
        let exports = module.prop("exports").unwrap().string_items();
        assert!(exports.contains(&"Print"));
        let globals = module.prop("global_vars").unwrap().string_items();
        assert!(globals.contains(&"registry"));
    }

    #[test]
    fn parse_failure_is_data_not_panic() {
        let ex = extract_from("main :: IO ()\nmain = pure ()\n", "app/Main.hs", Language::Haskell);
        assert!(ex.error.is_some());
        assert!(ex.nodes.is_empty());
        assert!(ex.parsed.is_none());
    }

    #[test]
    fn bom_is_stripped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.py");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"def f():\n    pass\n");
        fs::write(&path, bytes).unwrap();
        let ex = parse_file("proj", dir.path(), &FileInfo::new("m.py", Language::Python));
        assert!(ex.error.is_none());
        assert!(node_by_name(&ex, "f").is_some());
    }

    #[test]
    fn test_file_detection() {
        assert!(lang_is_test_file(Language::Go, "pkg/h_test.go"));
        assert!(!lang_is_test_file(Language::Go, "pkg/h.go"));
        assert!(lang_is_test_file(Language::Python, "tests/test_a.py"));
        assert!(lang_is_test_file(Language::TypeScript, "src/app.test.ts"));
    }
}
