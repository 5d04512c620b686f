//! HTTP link discovery boundary.
//!
//! The discoverer itself is an external collaborator. The core's job is to
//! feed it the extra call sites hiding in InfraFile environment bindings
//! (service URLs wired through env vars) and to invoke it after the graph
//! is otherwise complete.

use crate::error::{IndexResult, StoreResult};
use crate::storage::GraphStore;
use crate::types::NodeLabel;

/// An env-var binding that looks like a service URL, lifted from an
/// InfraFile node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCallSite {
    /// Qualified name of the InfraFile node the binding came from.
    pub source_qn: String,
    pub var: String,
    pub url: String,
}

/// External collaborator emitting HTTP_CALLS / HANDLES / ASYNC_CALLS.
pub trait HttpLinkDiscoverer: Send + Sync {
    fn discover(
        &self,
        store: &dyn GraphStore,
        project: &str,
        extra_call_sites: &[EnvCallSite],
    ) -> IndexResult<()>;
}

const ENV_PROPERTY_KEYS: [&str; 3] = ["env_vars", "environment", "deploy_env_vars"];

/// Collect URL-valued env bindings from every InfraFile node.
pub fn env_call_sites(project: &str, store: &dyn GraphStore) -> StoreResult<Vec<EnvCallSite>> {
    let mut sites = Vec::new();
    for node in store.find_nodes_by_label(project, NodeLabel::InfraFile)? {
        for key in ENV_PROPERTY_KEYS {
            let Some(bindings) = node.prop(key).and_then(|v| v.as_map()) else {
                continue;
            };
            for (var, value) in bindings {
                let Some(url) = value.as_str() else { continue };
                if url.starts_with("http://") || url.starts_with("https://") {
                    sites.push(EnvCallSite {
                        source_qn: node.qualified_name.clone(),
                        var: var.clone(),
                        url: url.to_string(),
                    });
                }
            }
        }
    }
    sites.sort_by(|a, b| (&a.source_qn, &a.var).cmp(&(&b.source_qn, &b.var)));
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{Node, PropValue};
    use std::collections::BTreeMap;

    #[test]
    fn url_bindings_are_lifted() {
        let store = MemoryStore::new();
        let mut env = BTreeMap::new();
        env.insert(
            "BILLING_URL".to_string(),
            PropValue::from("https://billing.internal/api"),
        );
        env.insert("RETRIES".to_string(), PropValue::from("3"));
        store
            .upsert_node(
                &Node::new(
                    "p",
                    NodeLabel::InfraFile,
                    "Dockerfile",
                    "p.Dockerfile.__infra__",
                    "Dockerfile",
                )
                .with_prop("env_vars", PropValue::Map(env)),
            )
            .unwrap();

        let sites = env_call_sites("p", &store).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].var, "BILLING_URL");
        assert_eq!(sites[0].url, "https://billing.internal/api");
    }
}
