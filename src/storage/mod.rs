//! Store boundary: the contract the pipeline writes through, plus the
//! in-memory reference implementation used by tests and the CLI.
//!
//! The persistent graph store is an external collaborator; the pipeline
//! only ever sees this trait. All writes inside a run are serialised by
//! the orchestrator's single-threaded flush and bracketed by
//! `with_transaction`.

mod memory;

pub use memory::MemoryStore;

use std::collections::HashMap;

use crate::error::{IndexResult, StoreResult};
use crate::types::{Edge, EdgeType, Node, NodeId, NodeLabel};

/// Graph store contract.
///
/// Batch operations are idempotent: node upserts key on
/// `(project, qualified_name)`, edge inserts on
/// `(project, source, target, type)` with duplicates ignored.
pub trait GraphStore: Send + Sync {
    /// Ensure the project root node exists; returns its id.
    fn upsert_project(&self, name: &str, root_path: &str) -> StoreResult<NodeId>;

    /// Upsert a batch of nodes, returning qualified name → id for every
    /// node in the batch. Property maps are patched, not replaced.
    fn upsert_node_batch(&self, nodes: &[Node]) -> StoreResult<HashMap<String, NodeId>>;

    /// Insert edges; duplicates (by identity key) are ignored.
    fn insert_edge_batch(&self, edges: &[Edge]) -> StoreResult<()>;

    /// Single-node upsert for property patches.
    fn upsert_node(&self, node: &Node) -> StoreResult<NodeId>;

    fn find_node_by_qn(&self, project: &str, qn: &str) -> StoreResult<Option<Node>>;
    fn find_nodes_by_ids(&self, ids: &[NodeId]) -> StoreResult<Vec<Node>>;
    fn find_nodes_by_label(&self, project: &str, label: NodeLabel) -> StoreResult<Vec<Node>>;
    fn find_edges_by_type(&self, project: &str, edge_type: EdgeType) -> StoreResult<Vec<Edge>>;
    fn find_edges_by_source_and_type(
        &self,
        source: NodeId,
        edge_type: EdgeType,
    ) -> StoreResult<Vec<Edge>>;
    fn find_node_ids_by_qns(
        &self,
        project: &str,
        qns: &[String],
    ) -> StoreResult<HashMap<String, NodeId>>;
    fn list_files_for_project(&self, project: &str) -> StoreResult<Vec<String>>;

    /// Delete all nodes emitted from one file; their edges cascade.
    fn delete_nodes_by_file(&self, project: &str, rel_path: &str) -> StoreResult<usize>;
    fn delete_nodes_by_label(&self, project: &str, label: NodeLabel) -> StoreResult<usize>;
    fn delete_edges_by_type(&self, project: &str, edge_type: EdgeType) -> StoreResult<usize>;
    fn delete_edges_by_source_file(
        &self,
        project: &str,
        rel_path: &str,
        edge_type: EdgeType,
    ) -> StoreResult<usize>;

    fn get_file_hashes(&self, project: &str) -> StoreResult<HashMap<String, u64>>;
    fn upsert_file_hash_batch(&self, project: &str, hashes: &[(String, u64)]) -> StoreResult<()>;
    fn delete_file_hash(&self, project: &str, rel_path: &str) -> StoreResult<()>;

    /// Run `f` against a transaction-bound handle: commit on success, roll
    /// back on error. The error is returned unchanged.
    fn with_transaction(
        &self,
        f: &mut dyn FnMut(&dyn GraphStore) -> IndexResult<()>,
    ) -> IndexResult<()>;

    /// Opt-in durability relaxation for the duration of a run.
    fn begin_bulk_write(&self) -> StoreResult<()>;
    fn end_bulk_write(&self) -> StoreResult<()>;

    /// Optimise after a data-writing run.
    fn checkpoint(&self) -> StoreResult<()>;

    fn count_nodes(&self, project: &str) -> StoreResult<usize>;
    fn count_edges(&self, project: &str) -> StoreResult<usize>;
    fn count_edges_by_type(&self, project: &str, edge_type: EdgeType) -> StoreResult<usize>;
}
