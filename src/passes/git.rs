//! Git co-change linkage.
//!
//! The history reader is an external collaborator; this pass turns its
//! co-change pairs into FILE_CHANGES_WITH edges between File nodes.

use std::path::Path;

use crate::error::IndexResult;
use crate::resolve::{ResolvedEdge, flush_edges};
use crate::storage::GraphStore;
use crate::types::{EdgeType, file_qn};

/// One commit-co-change observation between two files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoChange {
    pub file_a: String,
    pub file_b: String,
    pub count: u32,
}

/// External collaborator reading commit history.
pub trait GitHistoryReader: Send + Sync {
    fn co_change_pairs(&self, root: &Path) -> IndexResult<Vec<CoChange>>;
}

pub fn run(
    project: &str,
    root: &Path,
    reader: &dyn GitHistoryReader,
    store: &dyn GraphStore,
) -> IndexResult<usize> {
    let wrap = |source| crate::error::IndexError::StoreBatch {
        pass: "git_history".to_string(),
        source,
    };
    store
        .delete_edges_by_type(project, EdgeType::FileChangesWith)
        .map_err(wrap)?;

    let pairs = reader.co_change_pairs(root)?;
    let edges: Vec<ResolvedEdge> = pairs
        .into_iter()
        .filter(|p| p.file_a != p.file_b)
        .map(|pair| {
            ResolvedEdge::new(
                file_qn(project, &pair.file_a),
                file_qn(project, &pair.file_b),
                EdgeType::FileChangesWith,
            )
            .with_prop("count", pair.count as usize)
        })
        .collect();
    // Files no longer in the graph drop out at the QN lookup.
    flush_edges(project, "git_history", edges, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{Node, NodeLabel};

    struct FixedHistory(Vec<CoChange>);

    impl GitHistoryReader for FixedHistory {
        fn co_change_pairs(&self, _root: &Path) -> IndexResult<Vec<CoChange>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn pairs_become_edges_and_unknown_files_drop() {
        let store = MemoryStore::new();
        store
            .upsert_node_batch(&[
                Node::new("p", NodeLabel::File, "a.go", "p.a.__file__", "a.go"),
                Node::new("p", NodeLabel::File, "b.go", "p.b.__file__", "b.go"),
            ])
            .unwrap();

        let reader = FixedHistory(vec![
            CoChange {
                file_a: "a.go".to_string(),
                file_b: "b.go".to_string(),
                count: 4,
            },
            CoChange {
                file_a: "a.go".to_string(),
                file_b: "vanished.go".to_string(),
                count: 2,
            },
        ]);

        let inserted = run("p", Path::new("/repo"), &reader, &store).unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(
            store
                .count_edges_by_type("p", EdgeType::FileChangesWith)
                .unwrap(),
            1
        );
    }
}
