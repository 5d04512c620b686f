//! Store-only post-processing passes. No AST access: everything here reads
//! nodes and edges written by earlier passes, which is what lets the AST
//! cache be released first.

pub mod communities;
pub mod decorates;
pub mod decorator_tags;
pub mod git;
pub mod http;
pub mod implements;
pub mod inherits;
pub mod test_links;

use std::collections::HashMap;

use crate::imports::ImportMap;
use crate::storage::GraphStore;
use crate::types::Node;

/// Pseudo import map reconstructed from a module's stored `import_targets`
/// property: local name is the target's last segment. Lets store-only
/// passes resolve names the way AST passes do.
pub(crate) fn stored_import_map(module: &Node) -> ImportMap {
    let mut map = ImportMap::new();
    if let Some(targets) = module.prop("import_targets") {
        for target in targets.string_items() {
            if let Some(local) = target.rsplit('.').next() {
                map.insert(local.to_string(), target.to_string());
            }
        }
    }
    map
}

/// Module nodes by qualified name, fetched once per pass.
pub(crate) fn modules_by_qn(
    store: &dyn GraphStore,
    project: &str,
) -> crate::error::StoreResult<HashMap<String, Node>> {
    Ok(store
        .find_nodes_by_label(project, crate::types::NodeLabel::Module)?
        .into_iter()
        .map(|n| (n.qualified_name.clone(), n))
        .collect())
}
