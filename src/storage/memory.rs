//! In-memory graph store.
//!
//! Reference implementation of the store contract: id assignment, batch
//! upserts keyed by qualified name, idempotent edge inserts, cascade
//! deletes, the file-hash table, and snapshot transactions. Duplicate edge
//! inserts are ignored entirely, so the first write's properties win.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use super::GraphStore;
use crate::error::{IndexResult, StoreResult};
use crate::types::{Edge, EdgeType, Node, NodeId, NodeLabel};

#[derive(Default, Clone)]
struct Inner {
    next_id: u32,
    nodes: HashMap<NodeId, Node>,
    qn_index: HashMap<(String, String), NodeId>,
    edges: Vec<Edge>,
    edge_keys: HashSet<(String, NodeId, NodeId, EdgeType)>,
    file_hashes: HashMap<(String, String), u64>,
    bulk_write: bool,
    checkpoints: usize,
}

impl Inner {
    fn assign_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId::new(self.next_id).expect("id counter starts at 1")
    }

    fn upsert(&mut self, node: &Node) -> NodeId {
        let key = (node.project.clone(), node.qualified_name.clone());
        if let Some(&id) = self.qn_index.get(&key) {
            let existing = self.nodes.get_mut(&id).expect("indexed node exists");
            existing.label = node.label;
            existing.name = node.name.clone();
            existing.file_path = node.file_path.clone();
            existing.start_line = node.start_line;
            existing.end_line = node.end_line;
            for (k, v) in &node.properties {
                existing.properties.insert(k.clone(), v.clone());
            }
            id
        } else {
            let id = self.assign_id();
            let mut stored = node.clone();
            stored.id = Some(id);
            self.nodes.insert(id, stored);
            self.qn_index.insert(key, id);
            id
        }
    }

    fn remove_nodes(&mut self, ids: &[NodeId]) {
        let removed: HashSet<NodeId> = ids.iter().copied().collect();
        for id in ids {
            if let Some(node) = self.nodes.remove(id) {
                self.qn_index
                    .remove(&(node.project.clone(), node.qualified_name.clone()));
            }
        }
        self.edges
            .retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
        self.edge_keys
            .retain(|(_, s, t, _)| !removed.contains(s) && !removed.contains(t));
    }
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of checkpoint calls so far. Observability hook for tests
    /// asserting that no-op runs skip optimisation.
    pub fn checkpoint_count(&self) -> usize {
        self.inner.lock().checkpoints
    }

    /// Whether bulk-write mode is currently active.
    pub fn bulk_write_active(&self) -> bool {
        self.inner.lock().bulk_write
    }
}

impl GraphStore for MemoryStore {
    fn upsert_project(&self, name: &str, root_path: &str) -> StoreResult<NodeId> {
        let node = Node::new(name, NodeLabel::Project, name, name, "")
            .with_prop("root_path", root_path);
        Ok(self.inner.lock().upsert(&node))
    }

    fn upsert_node_batch(&self, nodes: &[Node]) -> StoreResult<HashMap<String, NodeId>> {
        let mut inner = self.inner.lock();
        let mut out = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let id = inner.upsert(node);
            out.insert(node.qualified_name.clone(), id);
        }
        Ok(out)
    }

    fn insert_edge_batch(&self, edges: &[Edge]) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        for edge in edges {
            let key = (
                edge.project.clone(),
                edge.source,
                edge.target,
                edge.edge_type,
            );
            if inner.edge_keys.insert(key) {
                inner.edges.push(edge.clone());
            }
        }
        Ok(())
    }

    fn upsert_node(&self, node: &Node) -> StoreResult<NodeId> {
        Ok(self.inner.lock().upsert(node))
    }

    fn find_node_by_qn(&self, project: &str, qn: &str) -> StoreResult<Option<Node>> {
        let inner = self.inner.lock();
        Ok(inner
            .qn_index
            .get(&(project.to_string(), qn.to_string()))
            .and_then(|id| inner.nodes.get(id))
            .cloned())
    }

    fn find_nodes_by_ids(&self, ids: &[NodeId]) -> StoreResult<Vec<Node>> {
        let inner = self.inner.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.nodes.get(id))
            .cloned()
            .collect())
    }

    fn find_nodes_by_label(&self, project: &str, label: NodeLabel) -> StoreResult<Vec<Node>> {
        let inner = self.inner.lock();
        let mut nodes: Vec<Node> = inner
            .nodes
            .values()
            .filter(|n| n.project == project && n.label == label)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        Ok(nodes)
    }

    fn find_edges_by_type(&self, project: &str, edge_type: EdgeType) -> StoreResult<Vec<Edge>> {
        let inner = self.inner.lock();
        Ok(inner
            .edges
            .iter()
            .filter(|e| e.project == project && e.edge_type == edge_type)
            .cloned()
            .collect())
    }

    fn find_edges_by_source_and_type(
        &self,
        source: NodeId,
        edge_type: EdgeType,
    ) -> StoreResult<Vec<Edge>> {
        let inner = self.inner.lock();
        Ok(inner
            .edges
            .iter()
            .filter(|e| e.source == source && e.edge_type == edge_type)
            .cloned()
            .collect())
    }

    fn find_node_ids_by_qns(
        &self,
        project: &str,
        qns: &[String],
    ) -> StoreResult<HashMap<String, NodeId>> {
        let inner = self.inner.lock();
        let mut out = HashMap::new();
        for qn in qns {
            if let Some(&id) = inner.qn_index.get(&(project.to_string(), qn.clone())) {
                out.insert(qn.clone(), id);
            }
        }
        Ok(out)
    }

    fn list_files_for_project(&self, project: &str) -> StoreResult<Vec<String>> {
        let inner = self.inner.lock();
        let mut files: Vec<String> = inner
            .nodes
            .values()
            .filter(|n| n.project == project && !n.file_path.is_empty())
            .map(|n| n.file_path.clone())
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn delete_nodes_by_file(&self, project: &str, rel_path: &str) -> StoreResult<usize> {
        let mut inner = self.inner.lock();
        let ids: Vec<NodeId> = inner
            .nodes
            .iter()
            .filter(|(_, n)| n.project == project && n.file_path == rel_path)
            .map(|(id, _)| *id)
            .collect();
        inner.remove_nodes(&ids);
        Ok(ids.len())
    }

    fn delete_nodes_by_label(&self, project: &str, label: NodeLabel) -> StoreResult<usize> {
        let mut inner = self.inner.lock();
        let ids: Vec<NodeId> = inner
            .nodes
            .iter()
            .filter(|(_, n)| n.project == project && n.label == label)
            .map(|(id, _)| *id)
            .collect();
        inner.remove_nodes(&ids);
        Ok(ids.len())
    }

    fn delete_edges_by_type(&self, project: &str, edge_type: EdgeType) -> StoreResult<usize> {
        let mut inner = self.inner.lock();
        let before = inner.edges.len();
        inner
            .edges
            .retain(|e| !(e.project == project && e.edge_type == edge_type));
        inner
            .edge_keys
            .retain(|(p, _, _, t)| !(p == project && *t == edge_type));
        Ok(before - inner.edges.len())
    }

    fn delete_edges_by_source_file(
        &self,
        project: &str,
        rel_path: &str,
        edge_type: EdgeType,
    ) -> StoreResult<usize> {
        let mut inner = self.inner.lock();
        let source_ids: HashSet<NodeId> = inner
            .nodes
            .iter()
            .filter(|(_, n)| n.project == project && n.file_path == rel_path)
            .map(|(id, _)| *id)
            .collect();
        let before = inner.edges.len();
        inner.edges.retain(|e| {
            !(e.project == project && e.edge_type == edge_type && source_ids.contains(&e.source))
        });
        inner.edge_keys.retain(|(p, s, _, t)| {
            !(p == project && *t == edge_type && source_ids.contains(s))
        });
        Ok(before - inner.edges.len())
    }

    fn get_file_hashes(&self, project: &str) -> StoreResult<HashMap<String, u64>> {
        let inner = self.inner.lock();
        Ok(inner
            .file_hashes
            .iter()
            .filter(|((p, _), _)| p == project)
            .map(|((_, path), digest)| (path.clone(), *digest))
            .collect())
    }

    fn upsert_file_hash_batch(&self, project: &str, hashes: &[(String, u64)]) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        for (path, digest) in hashes {
            inner
                .file_hashes
                .insert((project.to_string(), path.clone()), *digest);
        }
        Ok(())
    }

    fn delete_file_hash(&self, project: &str, rel_path: &str) -> StoreResult<()> {
        self.inner
            .lock()
            .file_hashes
            .remove(&(project.to_string(), rel_path.to_string()));
        Ok(())
    }

    fn with_transaction(
        &self,
        f: &mut dyn FnMut(&dyn GraphStore) -> IndexResult<()>,
    ) -> IndexResult<()> {
        let snapshot = self.inner.lock().clone();
        match f(self) {
            Ok(()) => Ok(()),
            Err(err) => {
                *self.inner.lock() = snapshot;
                Err(err)
            }
        }
    }

    fn begin_bulk_write(&self) -> StoreResult<()> {
        self.inner.lock().bulk_write = true;
        Ok(())
    }

    fn end_bulk_write(&self) -> StoreResult<()> {
        self.inner.lock().bulk_write = false;
        Ok(())
    }

    fn checkpoint(&self) -> StoreResult<()> {
        self.inner.lock().checkpoints += 1;
        Ok(())
    }

    fn count_nodes(&self, project: &str) -> StoreResult<usize> {
        Ok(self
            .inner
            .lock()
            .nodes
            .values()
            .filter(|n| n.project == project)
            .count())
    }

    fn count_edges(&self, project: &str) -> StoreResult<usize> {
        Ok(self
            .inner
            .lock()
            .edges
            .iter()
            .filter(|e| e.project == project)
            .count())
    }

    fn count_edges_by_type(&self, project: &str, edge_type: EdgeType) -> StoreResult<usize> {
        Ok(self
            .inner
            .lock()
            .edges
            .iter()
            .filter(|e| e.project == project && e.edge_type == edge_type)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;

    fn node(project: &str, qn: &str, label: NodeLabel, file: &str) -> Node {
        let name = qn.rsplit('.').next().unwrap().to_string();
        Node::new(project, label, name, qn, file)
    }

    #[test]
    fn upsert_is_idempotent_by_qn() {
        let store = MemoryStore::new();
        let first = store
            .upsert_node_batch(&[node("p", "p.m.f", NodeLabel::Function, "m.go")])
            .unwrap();
        let second = store
            .upsert_node_batch(&[node("p", "p.m.f", NodeLabel::Function, "m.go")])
            .unwrap();
        assert_eq!(first["p.m.f"], second["p.m.f"]);
        assert_eq!(store.count_nodes("p").unwrap(), 1);
    }

    #[test]
    fn upsert_patches_properties() {
        let store = MemoryStore::new();
        let n1 = node("p", "p.m", NodeLabel::Module, "m.go").with_prop("a", 1usize);
        store.upsert_node(&n1).unwrap();
        let n2 = node("p", "p.m", NodeLabel::Module, "m.go").with_prop("b", 2usize);
        store.upsert_node(&n2).unwrap();

        let stored = store.find_node_by_qn("p", "p.m").unwrap().unwrap();
        assert!(stored.prop("a").is_some());
        assert!(stored.prop("b").is_some());
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let store = MemoryStore::new();
        let ids = store
            .upsert_node_batch(&[
                node("p", "p.a", NodeLabel::Function, "a.go"),
                node("p", "p.b", NodeLabel::Function, "b.go"),
            ])
            .unwrap();
        let edge = Edge::new("p", ids["p.a"], ids["p.b"], EdgeType::Calls);
        let tagged = Edge::new("p", ids["p.a"], ids["p.b"], EdgeType::Calls)
            .with_prop("resolutionMode", "fuzzy");

        store.insert_edge_batch(&[edge, tagged]).unwrap();
        let edges = store.find_edges_by_type("p", EdgeType::Calls).unwrap();
        assert_eq!(edges.len(), 1);
        // First write wins: the fuzzy tag never overwrites an exact edge.
        assert!(edges[0].properties.is_empty());
    }

    #[test]
    fn delete_by_file_cascades_edges() {
        let store = MemoryStore::new();
        let ids = store
            .upsert_node_batch(&[
                node("p", "p.a.f", NodeLabel::Function, "a.go"),
                node("p", "p.b.g", NodeLabel::Function, "b.go"),
            ])
            .unwrap();
        store
            .insert_edge_batch(&[Edge::new("p", ids["p.a.f"], ids["p.b.g"], EdgeType::Calls)])
            .unwrap();

        store.delete_nodes_by_file("p", "a.go").unwrap();
        assert_eq!(store.count_nodes("p").unwrap(), 1);
        assert_eq!(store.count_edges("p").unwrap(), 0);
    }

    #[test]
    fn delete_edges_by_source_file_is_per_type() {
        let store = MemoryStore::new();
        let ids = store
            .upsert_node_batch(&[
                node("p", "p.a.f", NodeLabel::Function, "a.go"),
                node("p", "p.b.g", NodeLabel::Function, "b.go"),
            ])
            .unwrap();
        store
            .insert_edge_batch(&[
                Edge::new("p", ids["p.a.f"], ids["p.b.g"], EdgeType::Calls),
                Edge::new("p", ids["p.a.f"], ids["p.b.g"], EdgeType::Usage),
            ])
            .unwrap();

        let removed = store
            .delete_edges_by_source_file("p", "a.go", EdgeType::Calls)
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count_edges_by_type("p", EdgeType::Usage).unwrap(), 1);
        assert_eq!(store.count_edges_by_type("p", EdgeType::Calls).unwrap(), 0);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = MemoryStore::new();
        store
            .upsert_node(&node("p", "p.keep", NodeLabel::Function, "k.go"))
            .unwrap();

        let result = store.with_transaction(&mut |tx| {
            tx.upsert_node(&node("p", "p.doomed", NodeLabel::Function, "d.go"))?;
            Err(IndexError::Cancelled)
        });
        assert!(matches!(result, Err(IndexError::Cancelled)));
        assert!(store.find_node_by_qn("p", "p.doomed").unwrap().is_none());
        assert!(store.find_node_by_qn("p", "p.keep").unwrap().is_some());
    }

    #[test]
    fn file_hash_table_round_trip() {
        let store = MemoryStore::new();
        store
            .upsert_file_hash_batch("p", &[("a.go".to_string(), 1), ("b.go".to_string(), 2)])
            .unwrap();
        let hashes = store.get_file_hashes("p").unwrap();
        assert_eq!(hashes.get("a.go"), Some(&1));

        store.delete_file_hash("p", "a.go").unwrap();
        let hashes = store.get_file_hashes("p").unwrap();
        assert!(!hashes.contains_key("a.go"));
        assert!(hashes.contains_key("b.go"));
    }
}
