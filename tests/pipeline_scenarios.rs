//! End-to-end pipeline scenarios against the in-memory store.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use cartograph::storage::GraphStore;
use cartograph::types::PropValue;
use cartograph::{EdgeType, MemoryStore, Node, NodeLabel, Orchestrator, Settings};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn run(store: &MemoryStore, root: &Path) -> (String, cartograph::RunStats) {
    let settings = Arc::new(Settings::default());
    let orchestrator = Orchestrator::new(settings, store, root);
    let project = orchestrator.project().to_string();
    let stats = orchestrator.run().unwrap();
    (project, stats)
}

fn node_by_suffix(store: &MemoryStore, project: &str, label: NodeLabel, suffix: &str) -> Node {
    store
        .find_nodes_by_label(project, label)
        .unwrap()
        .into_iter()
        .find(|n| n.qualified_name.ends_with(suffix))
        .unwrap_or_else(|| panic!("no {label} node ending with {suffix}"))
}

fn calls_between(store: &MemoryStore, project: &str) -> Vec<(String, String, bool)> {
    let edges = store.find_edges_by_type(project, EdgeType::Calls).unwrap();
    let mut out = Vec::new();
    for edge in edges {
        let nodes = store.find_nodes_by_ids(&[edge.source, edge.target]).unwrap();
        let source = nodes
            .iter()
            .find(|n| n.id == Some(edge.source))
            .map(|n| n.qualified_name.clone())
            .unwrap_or_default();
        let target = nodes
            .iter()
            .find(|n| n.id == Some(edge.target))
            .map(|n| n.qualified_name.clone())
            .unwrap_or_default();
        let fuzzy = edge
            .properties
            .get("resolutionMode")
            .and_then(PropValue::as_str)
            == Some("fuzzy");
        out.push((source, target, fuzzy));
    }
    out
}

#[test]
fn go_calls_with_receiver_scoping() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "handler/h.go",
        "package handler\n\ntype Handler struct{}\n\nfunc (h *Handler) Serve() {\n\th.validate()\n}\n\nfunc (h *Handler) validate() {}\n",
    );

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    let calls = calls_between(&store, &project);
    assert_eq!(calls.len(), 1);
    let (source, target, fuzzy) = &calls[0];
    assert!(source.ends_with("handler.h.Handler.Serve"), "source {source}");
    assert!(target.ends_with("handler.h.Handler.validate"), "target {target}");
    assert!(!fuzzy);
}

#[test]
fn python_self_resolution() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.py",
        "class A:\n    def foo(self):\n        self.bar()\n\n    def bar(self):\n        pass\n",
    );

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    let calls = calls_between(&store, &project);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.ends_with(".A.foo"));
    assert!(calls[0].1.ends_with(".A.bar"));
}

#[test]
fn import_map_resolution_without_fuzz()
{
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.py", "def thing():\n    pass\n");
    write(
        dir.path(),
        "a.py",
        "import b\n\ndef caller():\n    b.thing()\n",
    );

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    let calls = calls_between(&store, &project);
    let hit = calls
        .iter()
        .find(|(source, _, _)| source.ends_with(".a.caller"))
        .expect("caller edge");
    assert!(hit.1.ends_with(".b.thing"));
    assert!(!hit.2, "exact import-map hit must not be fuzzy");
}

#[test]
fn unique_simple_name_resolves_unknown_prefix_without_fuzz() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "lib.py", "def thing():\n    pass\n");
    write(
        dir.path(),
        "a.py",
        "def caller():\n    unknown.thing()\n",
    );

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    let calls = calls_between(&store, &project);
    let hit = calls
        .iter()
        .find(|(source, _, _)| source.ends_with(".a.caller"))
        .expect("caller edge");
    assert!(hit.1.ends_with(".lib.thing"));
    assert!(
        !hit.2,
        "a globally unique simple name wins before the fuzzy fallback"
    );
}

#[test]
fn fuzzy_fallback_is_tagged() {
    // Two project-wide `thing`s: no strategy matches the full callee, so
    // the fuzzy pass picks the import-distance winner and tags the edge.
    let dir = TempDir::new().unwrap();
    write(dir.path(), "lib.py", "def thing():\n    pass\n");
    write(dir.path(), "util.py", "def thing():\n    pass\n");
    write(
        dir.path(),
        "a.py",
        "def caller():\n    unknown.thing()\n",
    );

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    let calls = calls_between(&store, &project);
    let hit = calls
        .iter()
        .find(|(source, _, _)| source.ends_with(".a.caller"))
        .expect("caller edge");
    // Equal import distance resolves to the lexicographically smallest.
    assert!(hit.1.ends_with(".lib.thing"));
    assert!(hit.2, "ambiguous simple name resolves fuzzily");
}

#[test]
fn incremental_noop_commits_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.py", "def alpha():\n    pass\n");

    let store = MemoryStore::new();
    let (project, first) = run(&store, dir.path());
    assert!(!first.noop);
    let nodes_before = store.count_nodes(&project).unwrap();
    let edges_before = store.count_edges(&project).unwrap();
    let hashes_before = store.get_file_hashes(&project).unwrap();
    assert_eq!(store.checkpoint_count(), 1);

    let (_, second) = run(&store, dir.path());
    assert!(second.noop);
    assert_eq!(store.count_nodes(&project).unwrap(), nodes_before);
    assert_eq!(store.count_edges(&project).unwrap(), edges_before);
    assert_eq!(store.get_file_hashes(&project).unwrap(), hashes_before);
    // No data written, no optimisation.
    assert_eq!(store.checkpoint_count(), 1);
}

#[test]
fn incremental_reindexes_changed_and_dependent_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.py", "def alpha():\n    pass\n");
    write(
        dir.path(),
        "b.py",
        "import a\n\ndef beta():\n    a.alpha()\n",
    );
    write(
        dir.path(),
        "c.py",
        "def gamma():\n    delta()\n\ndef delta():\n    pass\n",
    );

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    let alpha_before = node_by_suffix(&store, &project, NodeLabel::Function, ".a.alpha");
    let gamma_before = node_by_suffix(&store, &project, NodeLabel::Function, ".c.gamma");
    let calls = calls_between(&store, &project);
    assert!(calls.iter().any(|(s, t, _)| s.ends_with(".b.beta") && t.ends_with(".a.alpha")));
    assert!(calls.iter().any(|(s, t, _)| s.ends_with(".c.gamma") && t.ends_with(".c.delta")));

    // Rewrite alpha's body; same name, changed content.
    write(dir.path(), "a.py", "def alpha():\n    return 1\n");
    let (_, stats) = run(&store, dir.path());
    assert!(!stats.noop);
    assert_eq!(stats.files_indexed, 1);

    // alpha was deleted and re-created under the same qualified name.
    let alpha_after = node_by_suffix(&store, &project, NodeLabel::Function, ".a.alpha");
    assert_eq!(alpha_before.qualified_name, alpha_after.qualified_name);
    assert_ne!(alpha_before.id, alpha_after.id, "node must be re-created");

    // The dependent module's call edge was re-resolved to the new node.
    let calls = calls_between(&store, &project);
    assert!(calls.iter().any(|(s, t, _)| s.ends_with(".b.beta") && t.ends_with(".a.alpha")));

    // The unrelated module was untouched: same node, edge still present.
    let gamma_after = node_by_suffix(&store, &project, NodeLabel::Function, ".c.gamma");
    assert_eq!(gamma_before.id, gamma_after.id, "unrelated node must survive");
    assert!(calls.iter().any(|(s, t, _)| s.ends_with(".c.gamma") && t.ends_with(".c.delta")));
}

#[test]
fn dockerfile_secret_filter() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app.py", "def serve():\n    pass\n");
    write(
        dir.path(),
        "Dockerfile",
        "FROM python:3.12\nENV API_KEY=sk-abcdefghijklmnopqrstuvwx\nENV DATABASE_URL=https://db.example/path\n",
    );

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    let infra = store
        .find_nodes_by_label(&project, NodeLabel::InfraFile)
        .unwrap();
    let dockerfile = infra
        .iter()
        .find(|n| n.file_path == "Dockerfile")
        .expect("Dockerfile node");
    let env = dockerfile
        .prop("env_vars")
        .and_then(PropValue::as_map)
        .unwrap();
    assert_eq!(
        env.get("DATABASE_URL").and_then(PropValue::as_str),
        Some("https://db.example/path")
    );
    assert!(!env.contains_key("API_KEY"));
}

#[test]
fn every_symbol_has_exactly_one_defining_edge() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "m.py",
        "GLOBAL = 1\n\nclass A:\n    def m(self):\n        pass\n\ndef f():\n    pass\n",
    );

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    let defining = [
        EdgeType::Defines,
        EdgeType::DefinesMethod,
        EdgeType::DefinesField,
    ];
    let mut incoming: std::collections::HashMap<cartograph::NodeId, usize> =
        std::collections::HashMap::new();
    for edge_type in defining {
        for edge in store.find_edges_by_type(&project, edge_type).unwrap() {
            *incoming.entry(edge.target).or_default() += 1;
        }
    }

    for label in [
        NodeLabel::Function,
        NodeLabel::Method,
        NodeLabel::Class,
        NodeLabel::Variable,
    ] {
        for node in store.find_nodes_by_label(&project, label).unwrap() {
            let id = node.id.unwrap();
            assert_eq!(
                incoming.get(&id),
                Some(&1),
                "{} must have exactly one defining edge",
                node.qualified_name
            );
        }
    }
}

#[test]
fn all_edges_stay_within_the_project() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.py", "import b\n\ndef f():\n    b.g()\n");
    write(dir.path(), "b.py", "def g():\n    pass\n");

    let store = MemoryStore::new();
    let (project, _) = run(&store, dir.path());

    for edge in store.find_edges_by_type(&project, EdgeType::Calls).unwrap() {
        assert_eq!(edge.project, project);
        for node in store.find_nodes_by_ids(&[edge.source, edge.target]).unwrap() {
            assert_eq!(node.project, project);
        }
    }
}
