//! Pipeline orchestration.
//!
//! `Orchestrator::run` discovers and hashes files, classifies changed
//! against stored hashes, and executes either the full or the incremental
//! plan inside one store transaction bracketed by bulk-write mode.
//! CPU-bound stages run on a bounded thread pool with a hard barrier
//! before each single-threaded flush; the cancellation token is polled
//! between passes and between per-file tasks.

mod cancel;
mod hashing;
mod walker;

pub use cancel::CancelToken;
pub use hashing::hash_bytes;
pub use walker::FileWalker;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::extract::{self, Extraction, FileInfo};
use crate::imports::ImportMap;
use crate::infra;
use crate::lang;
use crate::parsing::{self, AstCache};
use crate::passes;
use crate::passes::git::GitHistoryReader;
use crate::passes::http::HttpLinkDiscoverer;
use crate::registry::NameRegistry;
use crate::resolve::{self, ResolveContext};
use crate::storage::GraphStore;
use crate::types::{
    Edge, EdgeType, Node, NodeLabel, PendingEdge, module_qn, project_name_from_path,
};

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub project: String,
    pub files_seen: usize,
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub nodes: usize,
    pub edges: usize,
    pub noop: bool,
    pub duration: Duration,
}

/// Drives one repository through the multi-pass indexing pipeline.
pub struct Orchestrator<'s> {
    settings: Arc<Settings>,
    store: &'s dyn GraphStore,
    root: PathBuf,
    project: String,
    cancel: CancelToken,
    http: Option<Box<dyn HttpLinkDiscoverer>>,
    git: Option<Box<dyn GitHistoryReader>>,
}

impl<'s> Orchestrator<'s> {
    pub fn new(settings: Arc<Settings>, store: &'s dyn GraphStore, root: &Path) -> Self {
        Self {
            settings,
            store,
            project: project_name_from_path(root),
            root: root.to_path_buf(),
            cancel: CancelToken::new(),
            http: None,
            git: None,
        }
    }

    pub fn with_http_discoverer(mut self, discoverer: Box<dyn HttpLinkDiscoverer>) -> Self {
        self.http = Some(discoverer);
        self
    }

    pub fn with_git_history(mut self, reader: Box<dyn GitHistoryReader>) -> Self {
        self.git = Some(reader);
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Token callers may use to cancel a running index from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Index the repository: full when no prior hashes exist, incremental
    /// otherwise.
    pub fn run(&self) -> IndexResult<RunStats> {
        let started = Instant::now();

        let files = FileWalker::new(self.settings.clone()).discover(&self.root)?;
        self.cancel.check()?;

        let threads = self
            .settings
            .indexing
            .parallel_threads
            .clamp(1, files.len().max(1));
        let hashes = hashing::hash_files(&self.root, &files, threads, &self.cancel);
        self.cancel.check()?;
        let prior = self.store.get_file_hashes(&self.project)?;

        self.store.begin_bulk_write()?;

        let mut noop = false;
        let mut files_indexed = 0usize;
        let result = self.store.with_transaction(&mut |tx| {
            if prior.is_empty() {
                files_indexed = files.len();
                self.full_pass(tx, &files, &hashes, threads)
            } else {
                let outcome = self.incremental_pass(tx, &files, &hashes, &prior, threads)?;
                noop = outcome.noop;
                files_indexed = outcome.reindexed;
                Ok(())
            }
        });
        self.store.end_bulk_write()?;
        result?;

        let wrote = !noop;
        if wrote {
            self.store.checkpoint()?;
        }

        let stats = RunStats {
            project: self.project.clone(),
            files_seen: files.len(),
            files_indexed,
            files_unchanged: files.len() - files_indexed,
            nodes: self.store.count_nodes(&self.project)?,
            edges: self.store.count_edges(&self.project)?,
            noop,
            duration: started.elapsed(),
        };
        info!(
            project = %stats.project,
            files = stats.files_seen,
            indexed = stats.files_indexed,
            nodes = stats.nodes,
            edges = stats.edges,
            took_ms = stats.duration.as_millis() as u64,
            "indexing run finished"
        );
        Ok(stats)
    }

    /// Cancellation check plus a pass-start trace line.
    fn check(&self, pass: &str) -> IndexResult<()> {
        self.cancel.check()?;
        debug!(pass, "starting pass");
        Ok(())
    }

    /// Pass-level failures are logged and suppressed; cancellation and
    /// fatal errors propagate.
    fn suppress<T>(&self, pass: &str, result: IndexResult<T>) -> IndexResult<()> {
        match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(pass, error = %err, "pass failed; continuing");
                Ok(())
            }
        }
    }

    // ---- full plan -------------------------------------------------------

    fn full_pass(
        &self,
        store: &dyn GraphStore,
        files: &[FileInfo],
        hashes: &[(String, u64)],
        threads: usize,
    ) -> IndexResult<()> {
        self.check("structure")?;
        self.structure_pass(store, files)?;

        self.check("infra")?;
        self.suppress("infra", infra::run(&self.project, &self.root, store, &self.cancel))?;

        self.check("definitions")?;
        let mut cache = AstCache::new();
        let mut import_maps: HashMap<String, ImportMap> = HashMap::new();
        self.definitions_pass(store, files, threads, &mut cache, &mut import_maps)?;

        self.check("decorator_tags")?;
        self.suppress(
            "decorator_tags",
            passes::decorator_tags::run(&self.project, store),
        )?;

        self.check("build_registry")?;
        let registry = NameRegistry::new();
        registry.build_from_store(store, &self.project)?;

        self.check("inherits")?;
        self.suppress("inherits", passes::inherits::run(&self.project, &registry, store))?;
        self.check("decorates")?;
        self.suppress("decorates", passes::decorates::run(&self.project, &registry, store))?;

        self.check("imports")?;
        let all_import_files: Vec<String> = import_maps.keys().cloned().collect();
        self.imports_pass(store, &import_maps, &all_import_files)?;

        let mut resolve_files: Vec<String> = cache.paths().map(String::from).collect();
        resolve_files.sort();
        self.resolution_passes(store, &cache, &registry, &import_maps, &resolve_files, threads)?;

        self.check("configures")?;
        let config_files: Vec<FileInfo> = files
            .iter()
            .filter(|f| f.language.is_config_language())
            .cloned()
            .collect();
        self.suppress(
            "configures",
            resolve::configures::run(
                &self.project,
                &self.root,
                &config_files,
                &registry,
                store,
                &self.cancel,
            ),
        )?;

        // All AST-dependent passes are done; free the trees before the
        // store-only tail.
        cache.release();

        self.store_only_tail(store)?;

        self.check("update_hashes")?;
        store.upsert_file_hash_batch(&self.project, hashes)?;

        self.log_edge_counts(store);
        Ok(())
    }

    /// The AST-independent tail shared by full and incremental plans.
    fn store_only_tail(&self, store: &dyn GraphStore) -> IndexResult<()> {
        self.check("tests")?;
        self.suppress("tests", passes::test_links::run(&self.project, store))?;

        self.check("communities")?;
        self.suppress("communities", passes::communities::run(&self.project, store))?;

        self.check("http_links")?;
        if let Some(http) = &self.http {
            let sites = passes::http::env_call_sites(&self.project, store)?;
            self.suppress("http_links", http.discover(store, &self.project, &sites))?;
        }

        self.check("implements")?;
        self.suppress("implements", passes::implements::run(&self.project, store))?;

        self.check("git_history")?;
        if let Some(git) = &self.git {
            self.suppress(
                "git_history",
                passes::git::run(&self.project, &self.root, git.as_ref(), store),
            )?;
        }
        Ok(())
    }

    // ---- incremental plan ------------------------------------------------

    fn incremental_pass(
        &self,
        store: &dyn GraphStore,
        files: &[FileInfo],
        hashes: &[(String, u64)],
        prior: &HashMap<String, u64>,
        threads: usize,
    ) -> IndexResult<IncrementalOutcome> {
        let digest_by_path: HashMap<&str, u64> =
            hashes.iter().map(|(p, d)| (p.as_str(), *d)).collect();

        let mut changed: Vec<FileInfo> = Vec::new();
        let mut unchanged: Vec<FileInfo> = Vec::new();
        for file in files {
            let digest = digest_by_path.get(file.rel_path.as_str()).copied();
            if digest.is_some() && prior.get(&file.rel_path) == digest.as_ref() {
                unchanged.push(file.clone());
            } else {
                changed.push(file.clone());
            }
        }
        let current_paths: HashSet<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        let vanished: Vec<String> = prior
            .keys()
            .filter(|path| !current_paths.contains(path.as_str()))
            .cloned()
            .collect();

        if changed.is_empty() && vanished.is_empty() {
            info!(project = %self.project, "incremental.noop");
            return Ok(IncrementalOutcome {
                noop: true,
                reindexed: 0,
            });
        }
        info!(
            changed = changed.len(),
            unchanged = unchanged.len(),
            vanished = vanished.len(),
            "incremental plan"
        );

        // Stale nodes go first so the idempotent structure pass can
        // re-create the file pseudo-nodes for changed files.
        self.check("delete_stale")?;
        for path in &vanished {
            store.delete_nodes_by_file(&self.project, path)?;
            store.delete_file_hash(&self.project, path)?;
        }
        for file in &changed {
            store.delete_nodes_by_file(&self.project, &file.rel_path)?;
        }

        self.check("structure")?;
        self.structure_pass(store, files)?;
        self.check("infra")?;
        self.suppress("infra", infra::run(&self.project, &self.root, store, &self.cancel))?;

        self.check("definitions")?;
        let mut cache = AstCache::new();
        let mut import_maps: HashMap<String, ImportMap> = HashMap::new();
        self.definitions_pass(store, &changed, threads, &mut cache, &mut import_maps)?;

        self.check("decorator_tags")?;
        self.suppress(
            "decorator_tags",
            passes::decorator_tags::run(&self.project, store),
        )?;

        self.check("build_registry")?;
        let registry = NameRegistry::new();
        registry.build_from_store(store, &self.project)?;

        // Dependents: unchanged files whose import map refers to a changed
        // module's QN or its folder QN.
        self.check("dependents")?;
        let changed_prefixes: Vec<String> = changed
            .iter()
            .flat_map(|f| {
                let qn = module_qn(&self.project, &f.rel_path);
                let folder = qn.rsplit_once('.').map(|(head, _)| head.to_string());
                std::iter::once(qn).chain(folder)
            })
            .collect();
        let modules_by_path: HashMap<String, Node> = store
            .find_nodes_by_label(&self.project, NodeLabel::Module)?
            .into_iter()
            .map(|m| (m.file_path.clone(), m))
            .collect();
        let dependents: Vec<FileInfo> = unchanged
            .iter()
            .filter(|f| {
                let targets = match import_maps.get(&f.rel_path) {
                    Some(map) => map.values().cloned().collect::<Vec<_>>(),
                    None => modules_by_path
                        .get(&f.rel_path)
                        .map(|m| {
                            passes::stored_import_map(m)
                                .values()
                                .cloned()
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default(),
                };
                targets.iter().any(|target| {
                    changed_prefixes.iter().any(|prefix| {
                        target == prefix || target.starts_with(&format!("{prefix}."))
                    })
                })
            })
            .cloned()
            .collect();

        // Dependents re-parse on demand: their nodes are intact but their
        // edges must re-resolve against the new registry.
        self.check("reparse_dependents")?;
        self.parse_into_cache(&dependents, threads, &mut cache, &mut import_maps);

        let mut files_to_resolve: Vec<String> = changed
            .iter()
            .chain(dependents.iter())
            .map(|f| f.rel_path.clone())
            .collect();
        files_to_resolve.sort();
        files_to_resolve.dedup();

        self.check("delete_edges")?;
        for rel in &files_to_resolve {
            for edge_type in EdgeType::AST_DERIVED {
                store.delete_edges_by_source_file(&self.project, rel, edge_type)?;
            }
        }

        self.check("inherits")?;
        store.delete_edges_by_type(&self.project, EdgeType::Inherits)?;
        self.suppress("inherits", passes::inherits::run(&self.project, &registry, store))?;
        self.check("decorates")?;
        store.delete_edges_by_type(&self.project, EdgeType::Decorates)?;
        self.suppress("decorates", passes::decorates::run(&self.project, &registry, store))?;

        // Changed files lost their IMPORTS edges with their module node;
        // dependents lost theirs when the changed module was re-created.
        self.check("imports")?;
        self.imports_pass(store, &import_maps, &files_to_resolve)?;

        self.resolution_passes(
            store,
            &cache,
            &registry,
            &import_maps,
            &files_to_resolve,
            threads,
        )?;

        self.check("configures")?;
        store.delete_edges_by_type(&self.project, EdgeType::Configures)?;
        let config_files: Vec<FileInfo> = files
            .iter()
            .filter(|f| f.language.is_config_language())
            .cloned()
            .collect();
        self.suppress(
            "configures",
            resolve::configures::run(
                &self.project,
                &self.root,
                &config_files,
                &registry,
                store,
                &self.cancel,
            ),
        )?;

        cache.release();

        // DB-derived passes: delete all edges of the type and rerun.
        self.check("refresh_db_passes")?;
        store.delete_edges_by_type(&self.project, EdgeType::Tests)?;
        store.delete_edges_by_type(&self.project, EdgeType::TestsFile)?;
        self.store_only_tail(store)?;

        self.check("update_hashes")?;
        store.upsert_file_hash_batch(&self.project, hashes)?;

        self.log_edge_counts(store);
        Ok(IncrementalOutcome {
            noop: false,
            reindexed: changed.len(),
        })
    }

    // ---- individual passes ----------------------------------------------

    /// Project, folder/package and file pseudo-nodes plus containment
    /// edges. Idempotent.
    fn structure_pass(&self, store: &dyn GraphStore, files: &[FileInfo]) -> IndexResult<()> {
        let mut dirs: HashSet<String> = HashSet::new();
        for file in files {
            let mut current = file.rel_path.as_str();
            while let Some((dir, _)) = current.rsplit_once('/') {
                dirs.insert(dir.to_string());
                current = dir;
            }
        }
        let mut dirs: Vec<String> = dirs.into_iter().collect();
        dirs.sort();

        let indicator_names: HashSet<&str> = lang::all_languages()
            .iter()
            .filter_map(|l| lang::for_language(*l))
            .flat_map(|spec| spec.package_indicators.iter().copied())
            .collect();

        let mut nodes = Vec::new();
        let mut pending = Vec::new();
        for dir in &dirs {
            let label = if self.is_package_dir(dir, &indicator_names) {
                NodeLabel::Package
            } else {
                NodeLabel::Folder
            };
            let qn = format!("{}.{}", self.project, dir.replace('/', "."));
            let name = dir.rsplit('/').next().unwrap_or(dir).to_string();
            nodes.push(Node::new(&self.project, label, name, qn.clone(), dir.clone()));

            let parent_qn = match dir.rsplit_once('/') {
                Some((parent, _)) => format!("{}.{}", self.project, parent.replace('/', ".")),
                None => self.project.clone(),
            };
            let edge_type = if label == NodeLabel::Package {
                EdgeType::ContainsPackage
            } else {
                EdgeType::ContainsFolder
            };
            pending.push(PendingEdge::new(parent_qn, qn, edge_type));
        }

        for file in files {
            let qn = crate::types::file_qn(&self.project, &file.rel_path);
            let name = file
                .rel_path
                .rsplit('/')
                .next()
                .unwrap_or(&file.rel_path)
                .to_string();
            nodes.push(
                Node::new(&self.project, NodeLabel::File, name, qn.clone(), file.rel_path.clone())
                    .with_prop("language", file.language.name()),
            );
            let parent_qn = match file.rel_path.rsplit_once('/') {
                Some((dir, _)) => format!("{}.{}", self.project, dir.replace('/', ".")),
                None => self.project.clone(),
            };
            pending.push(PendingEdge::new(parent_qn, qn, EdgeType::ContainsFile));
        }

        let ids = store.upsert_node_batch(&nodes)?;
        let project_id = store.upsert_project(&self.project, &self.root.to_string_lossy())?;
        let mut edges = Vec::new();
        for edge in pending {
            let source = if edge.source_qn == self.project {
                Some(project_id)
            } else {
                ids.get(&edge.source_qn).copied()
            };
            let (Some(source), Some(&target)) = (source, ids.get(&edge.target_qn)) else {
                continue;
            };
            edges.push(Edge::new(&self.project, source, target, edge.edge_type));
        }
        store.insert_edge_batch(&edges)?;
        Ok(())
    }

    fn is_package_dir(&self, dir: &str, indicators: &HashSet<&str>) -> bool {
        let Ok(entries) = std::fs::read_dir(self.root.join(dir)) else {
            return false;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if indicators.contains(name) {
                return true;
            }
            // Globbed indicators like *.csproj.
            if indicators.iter().any(|pattern| {
                pattern
                    .strip_prefix("*")
                    .is_some_and(|suffix| name.ends_with(suffix))
            }) {
                return true;
            }
        }
        false
    }

    /// Parallel extraction, serial flush: nodes per file, then one batched
    /// pending-edge resolution, trees moved into the cache.
    fn definitions_pass(
        &self,
        store: &dyn GraphStore,
        files: &[FileInfo],
        threads: usize,
        cache: &mut AstCache,
        import_maps: &mut HashMap<String, ImportMap>,
    ) -> IndexResult<()> {
        let parseable: Vec<FileInfo> = files
            .iter()
            .filter(|f| parsing::has_grammar(f.language) && !f.language.is_config_language())
            .cloned()
            .collect();

        let extractions = self.parallel_extract(&parseable, threads);

        let mut pending: Vec<PendingEdge> = Vec::new();
        for mut extraction in extractions {
            self.cancel.check()?;
            if let Some(error) = &extraction.error {
                warn!(file = %extraction.rel_path, error = %error, "file skipped");
                continue;
            }
            store
                .upsert_node_batch(&extraction.nodes)
                .map_err(|source| IndexError::StoreBatch {
                    pass: "definitions".to_string(),
                    source,
                })?;
            pending.append(&mut extraction.edges);
            if let Some(parsed) = extraction.parsed.take() {
                cache.insert(extraction.rel_path.clone(), parsed);
            }
            import_maps.insert(extraction.rel_path.clone(), extraction.imports);
        }

        // One batched QN→id resolution for all defining edges; unknown
        // names drop silently.
        let mut qns: Vec<String> = pending
            .iter()
            .flat_map(|e| [e.source_qn.clone(), e.target_qn.clone()])
            .collect();
        qns.sort();
        qns.dedup();
        let ids = store
            .find_node_ids_by_qns(&self.project, &qns)
            .map_err(|source| IndexError::StoreBatch {
                pass: "definitions".to_string(),
                source,
            })?;
        let mut edges = Vec::new();
        for edge in pending {
            let (Some(&source), Some(&target)) =
                (ids.get(&edge.source_qn), ids.get(&edge.target_qn))
            else {
                continue;
            };
            let mut real = Edge::new(&self.project, source, target, edge.edge_type);
            real.properties = edge.properties;
            edges.push(real);
        }
        store
            .insert_edge_batch(&edges)
            .map_err(|source| IndexError::StoreBatch {
                pass: "definitions".to_string(),
                source,
            })?;
        Ok(())
    }

    fn parallel_extract(&self, files: &[FileInfo], threads: usize) -> Vec<Extraction> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.clamp(1, files.len().max(1)))
            .build();
        let extract_one = |file: &FileInfo| -> Option<Extraction> {
            if self.cancel.is_cancelled() {
                return None;
            }
            Some(extract::parse_file(&self.project, &self.root, file))
        };
        match pool {
            Ok(pool) => pool.install(|| {
                files
                    .par_iter()
                    .filter_map(extract_one)
                    .collect::<Vec<_>>()
            }),
            Err(_) => files.iter().filter_map(extract_one).collect(),
        }
    }

    /// Parse files into the cache without writing nodes (incremental
    /// dependents keep their stored symbols).
    fn parse_into_cache(
        &self,
        files: &[FileInfo],
        threads: usize,
        cache: &mut AstCache,
        import_maps: &mut HashMap<String, ImportMap>,
    ) {
        let parseable: Vec<FileInfo> = files
            .iter()
            .filter(|f| !cache.contains(&f.rel_path) && parsing::has_grammar(f.language))
            .cloned()
            .collect();
        for mut extraction in self.parallel_extract(&parseable, threads) {
            if extraction.error.is_some() {
                continue;
            }
            if let Some(parsed) = extraction.parsed.take() {
                cache.insert(extraction.rel_path.clone(), parsed);
            }
            import_maps.insert(extraction.rel_path.clone(), extraction.imports);
        }
    }

    /// IMPORTS edges for the given source files, from their import maps.
    /// An import of a symbol links to the symbol's module.
    fn imports_pass(
        &self,
        store: &dyn GraphStore,
        import_maps: &HashMap<String, ImportMap>,
        source_files: &[String],
    ) -> IndexResult<()> {
        let wrap = |source| IndexError::StoreBatch {
            pass: "imports".to_string(),
            source,
        };

        let mut lookups: Vec<String> = Vec::new();
        for rel in source_files {
            let Some(map) = import_maps.get(rel) else { continue };
            lookups.push(module_qn(&self.project, rel));
            for target in map.values() {
                lookups.push(target.clone());
                if let Some((parent, _)) = target.rsplit_once('.') {
                    lookups.push(parent.to_string());
                }
            }
        }
        lookups.sort();
        lookups.dedup();
        let ids = store.find_node_ids_by_qns(&self.project, &lookups).map_err(wrap)?;

        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for rel in source_files {
            let Some(map) = import_maps.get(rel) else { continue };
            let source_qn = module_qn(&self.project, rel);
            let Some(&source_id) = ids.get(&source_qn) else { continue };
            for target in map.values() {
                let target_id = ids.get(target).copied().or_else(|| {
                    target
                        .rsplit_once('.')
                        .and_then(|(parent, _)| ids.get(parent).copied())
                });
                let Some(target_id) = target_id else { continue };
                if target_id != source_id && seen.insert((source_id, target_id)) {
                    edges.push(Edge::new(&self.project, source_id, target_id, EdgeType::Imports));
                }
            }
        }
        store.insert_edge_batch(&edges).map_err(wrap)?;
        Ok(())
    }

    /// The call/usage/uses-type/throws/reads-writes family, in pass order.
    fn resolution_passes(
        &self,
        store: &dyn GraphStore,
        cache: &AstCache,
        registry: &NameRegistry,
        import_maps: &HashMap<String, ImportMap>,
        files: &[String],
        threads: usize,
    ) -> IndexResult<()> {
        let ctx = ResolveContext {
            project: &self.project,
            cache,
            registry,
            imports: import_maps,
            files,
            threads,
            cancel: &self.cancel,
        };

        self.check("calls")?;
        self.suppress("calls", resolve::calls::run(&ctx, store))?;
        self.check("usages")?;
        self.suppress("usages", resolve::usages::run(&ctx, store))?;
        self.check("uses_type")?;
        self.suppress("uses_type", resolve::uses_type::run(&ctx, store))?;
        self.check("throws")?;
        self.suppress("throws", resolve::throws::run(&ctx, store))?;
        self.check("reads_writes")?;
        self.suppress("reads_writes", resolve::reads_writes::run(&ctx, store))?;
        Ok(())
    }

    fn log_edge_counts(&self, store: &dyn GraphStore) {
        for edge_type in EdgeType::ALL {
            match store.count_edges_by_type(&self.project, edge_type) {
                Ok(count) if count > 0 => info!(edge_type = %edge_type, count, "edges"),
                Ok(_) => {}
                Err(err) => warn!(edge_type = %edge_type, error = %err, "count failed"),
            }
        }
    }
}

struct IncrementalOutcome {
    noop: bool,
    reindexed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn full_run_builds_structure_definitions_and_calls() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "handler/h.go",
            "package handler\n\ntype Handler struct{}\n\nfunc (h *Handler) Serve() {\n\th.validate()\n}\n\nfunc (h *Handler) validate() {}\n",
        );

        let store = MemoryStore::new();
        let settings = Arc::new(Settings::default());
        let orchestrator = Orchestrator::new(settings, &store, dir.path());
        let project = orchestrator.project().to_string();
        let stats = orchestrator.run().unwrap();

        assert!(!stats.noop);
        assert_eq!(stats.files_seen, 1);
        assert!(stats.nodes > 0);

        let calls = store.find_edges_by_type(&project, EdgeType::Calls).unwrap();
        assert_eq!(calls.len(), 1);
        let endpoints = store
            .find_nodes_by_ids(&[calls[0].source, calls[0].target])
            .unwrap();
        let qns: Vec<&str> = endpoints.iter().map(|n| n.qualified_name.as_str()).collect();
        assert!(qns.iter().any(|qn| qn.ends_with("Handler.Serve")));
        assert!(qns.iter().any(|qn| qn.ends_with("Handler.validate")));

        assert_eq!(store.checkpoint_count(), 1);
        assert!(!store.bulk_write_active());
    }

    #[test]
    fn cancelled_run_rolls_back_and_keeps_hashes_empty() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.go", "package a\nfunc A() {}\n");

        let store = MemoryStore::new();
        let settings = Arc::new(Settings::default());
        let orchestrator = Orchestrator::new(settings, &store, dir.path());
        let project = orchestrator.project().to_string();
        orchestrator.cancel_token().cancel();

        let result = orchestrator.run();
        assert!(matches!(result, Err(IndexError::Cancelled)));
        assert!(store.get_file_hashes(&project).unwrap().is_empty());
        assert_eq!(store.checkpoint_count(), 0);
    }

    #[test]
    fn package_directories_are_detected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "svc/go.mod", "module svc\n");
        write(&dir, "svc/main.go", "package main\nfunc main() {}\n");

        let store = MemoryStore::new();
        let settings = Arc::new(Settings::default());
        let orchestrator = Orchestrator::new(settings, &store, dir.path());
        let project = orchestrator.project().to_string();
        orchestrator.run().unwrap();

        let packages = store.find_nodes_by_label(&project, NodeLabel::Package).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].file_path, "svc");
    }
}
