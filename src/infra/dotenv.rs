//! .env file scanner.

use std::collections::BTreeMap;

use super::secret;
use crate::types::{Node, NodeLabel, PropValue, module_qn};

pub fn scan(project: &str, rel_path: &str, content: &str) -> Node {
    let mut env_vars = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        env_vars.insert(
            key.trim().to_string(),
            value.trim().trim_matches(['"', '\'']).to_string(),
        );
    }
    let env_vars = secret::filter_env(env_vars, false);

    let qn = format!("{}.__infra__", module_qn(project, rel_path));
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path).to_string();
    Node::new(project, NodeLabel::InfraFile, name, qn, rel_path)
        .with_prop("infra_type", "dotenv")
        .with_prop("env_vars", PropValue::from(env_vars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_with_secret_filtering() {
        let content = "# local overrides\nexport DATABASE_URL=postgres://localhost/app\nAPP_ENV=dev\nSECRET_TOKEN=abc123\n";
        let node = scan("p", ".env", content);
        let env = node.prop("env_vars").and_then(PropValue::as_map).unwrap();
        assert_eq!(
            env.get("DATABASE_URL").and_then(PropValue::as_str),
            Some("postgres://localhost/app")
        );
        assert_eq!(env.get("APP_ENV").and_then(PropValue::as_str), Some("dev"));
        assert!(!env.contains_key("SECRET_TOKEN"));
    }
}
