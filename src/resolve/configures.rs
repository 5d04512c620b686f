//! CONFIGURES heuristic.
//!
//! Config-language files (YAML, HCL, env-style) stop at structural
//! indexing, but their top-level keys often name the modules they
//! configure. A key that uniquely matches a Module's simple name links the
//! config file's File node to that module.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{ResolvedEdge, flush_edges};
use crate::error::IndexResult;
use crate::extract::FileInfo;
use crate::imports::ImportMap;
use crate::pipeline::CancelToken;
use crate::registry::{NameRegistry, ResolutionQuery};
use crate::storage::GraphStore;
use crate::types::{EdgeType, NodeLabel, file_qn};

static TOP_LEVEL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_-]*)\s*[:=]").expect("valid key pattern")
});

pub fn run(
    project: &str,
    root: &Path,
    config_files: &[FileInfo],
    registry: &NameRegistry,
    store: &dyn GraphStore,
    cancel: &CancelToken,
) -> IndexResult<usize> {
    let empty = ImportMap::new();
    let mut edges = Vec::new();

    for file in config_files {
        if cancel.is_cancelled() {
            break;
        }
        let Ok(content) = std::fs::read_to_string(root.join(&file.rel_path)) else {
            continue;
        };
        let source_qn = file_qn(project, &file.rel_path);

        for line in content.lines() {
            let Some(captures) = TOP_LEVEL_KEY.captures(line) else {
                continue;
            };
            let key = captures.get(1).map(|m| m.as_str()).unwrap_or("");
            let query = ResolutionQuery {
                callee: key,
                module_qn: project,
                imports: &empty,
                type_map: None,
                enclosing_class: None,
            };
            // Unique module match only; ambiguity means noise, not signal.
            if let Some(res) =
                registry.resolve_filtered(&query, &|label| label == NodeLabel::Module)
                && !res.fuzzy
            {
                let edge = ResolvedEdge::new(source_qn.clone(), res.qn, EdgeType::Configures);
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }
    }
    flush_edges(project, "configures", edges, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_pattern_matches_top_level_only() {
        assert!(TOP_LEVEL_KEY.is_match("billing:"));
        assert!(TOP_LEVEL_KEY.is_match("worker_count = 4"));
        assert!(!TOP_LEVEL_KEY.is_match("  nested: 1"));
        assert!(!TOP_LEVEL_KEY.is_match("- list_item"));
    }
}
