//! Infrastructure-file scanning.
//!
//! Dockerfiles, compose files, .env files and shell scripts become
//! InfraFile nodes carrying the schema the HTTP-linking collaborator
//! consumes. Every scanner applies the secret filter. Terraform and
//! cloudbuild scanning stay with the external scanners; their node schema
//! is the same.

mod compose;
mod dockerfile;
mod dotenv;
mod secret;
mod shell;

pub use secret::{filter_env, is_secret_key, is_secret_value};

use std::path::Path;
use walkdir::WalkDir;

use crate::error::{IndexError, IndexResult};
use crate::pipeline::CancelToken;
use crate::storage::GraphStore;
use crate::types::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfraKind {
    Dockerfile,
    Compose,
    DotEnv,
    Shell,
}

fn classify(file_name: &str) -> Option<InfraKind> {
    if file_name == "Dockerfile" || file_name.starts_with("Dockerfile.") {
        return Some(InfraKind::Dockerfile);
    }
    if (file_name.starts_with("docker-compose") || file_name.starts_with("compose"))
        && (file_name.ends_with(".yml") || file_name.ends_with(".yaml"))
    {
        return Some(InfraKind::Compose);
    }
    if file_name == ".env" || file_name.starts_with(".env.") {
        return Some(InfraKind::DotEnv);
    }
    if file_name.ends_with(".sh") {
        return Some(InfraKind::Shell);
    }
    None
}

/// Scan the repository for infrastructure files and upsert their nodes.
pub fn run(
    project: &str,
    root: &Path,
    store: &dyn GraphStore,
    cancel: &CancelToken,
) -> IndexResult<usize> {
    let mut nodes: Vec<Node> = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            name != ".git" && name != "node_modules" && name != "target"
        })
    {
        if cancel.is_cancelled() {
            break;
        }
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(kind) = classify(file_name) else {
            continue;
        };
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };

        match kind {
            InfraKind::Dockerfile => nodes.push(dockerfile::scan(project, &rel, &content)),
            InfraKind::Compose => nodes.extend(compose::scan(project, &rel, &content)),
            InfraKind::DotEnv => nodes.push(dotenv::scan(project, &rel, &content)),
            InfraKind::Shell => nodes.push(shell::scan(project, &rel, &content)),
        }
    }

    let count = nodes.len();
    store
        .upsert_node_batch(&nodes)
        .map_err(|source| IndexError::StoreBatch {
            pass: "infra".to_string(),
            source,
        })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::NodeLabel;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn classification() {
        assert_eq!(classify("Dockerfile"), Some(InfraKind::Dockerfile));
        assert_eq!(classify("Dockerfile.prod"), Some(InfraKind::Dockerfile));
        assert_eq!(classify("docker-compose.yml"), Some(InfraKind::Compose));
        assert_eq!(classify(".env.local"), Some(InfraKind::DotEnv));
        assert_eq!(classify("deploy.sh"), Some(InfraKind::Shell));
        assert_eq!(classify("main.go"), None);
    }

    #[test]
    fn scan_writes_infra_nodes() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Dockerfile"),
            "FROM alpine\nENV DATABASE_URL=https://db.example/path\n",
        )
        .unwrap();
        fs::write(dir.path().join(".env"), "APP_ENV=dev\n").unwrap();

        let store = MemoryStore::new();
        let cancel = CancelToken::new();
        let count = run("p", dir.path(), &store, &cancel).unwrap();
        assert_eq!(count, 2);

        let infra = store.find_nodes_by_label("p", NodeLabel::InfraFile).unwrap();
        assert_eq!(infra.len(), 2);
        assert!(infra.iter().any(|n| n.qualified_name == "p.Dockerfile.__infra__"));
    }
}
