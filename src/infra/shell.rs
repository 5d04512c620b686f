//! Shell script scanner: shebang, exported env vars, sourced files and
//! docker invocations.

use std::collections::BTreeMap;

use super::secret;
use crate::types::{Node, NodeLabel, PropValue, module_qn};

pub fn scan(project: &str, rel_path: &str, content: &str) -> Node {
    let mut shebang = None;
    let mut env_vars = BTreeMap::new();
    let mut sources: Vec<String> = Vec::new();
    let mut docker_commands: Vec<String> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if idx == 0 && line.starts_with("#!") {
            shebang = Some(line.to_string());
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("export ")
            && let Some((key, value)) = rest.split_once('=')
        {
            env_vars.insert(
                key.trim().to_string(),
                value.trim().trim_matches(['"', '\'']).to_string(),
            );
            continue;
        }
        if let Some(rest) = line.strip_prefix("source ").or_else(|| line.strip_prefix(". ")) {
            if let Some(target) = rest.split_whitespace().next() {
                sources.push(target.to_string());
            }
            continue;
        }
        if line.starts_with("docker ") || line.starts_with("docker-compose ") {
            docker_commands.push(line.to_string());
        }
    }
    let env_vars = secret::filter_env(env_vars, false);

    let qn = format!("{}.__infra__", module_qn(project, rel_path));
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path).to_string();
    let mut node = Node::new(project, NodeLabel::InfraFile, name, qn, rel_path)
        .with_prop("infra_type", "shell")
        .with_prop("env_vars", PropValue::from(env_vars))
        .with_prop("sources", sources)
        .with_prop("docker_commands", docker_commands);
    if let Some(shebang) = shebang {
        node = node.with_prop("shebang", shebang);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shebang_sources_and_docker_lines() {
        let content = "#!/usr/bin/env bash\nset -euo pipefail\nsource ./common.sh\nexport REGION=eu-west-1\nexport DB_PASSWORD=hunter2\ndocker build -t app .\n";
        let node = scan("p", "deploy/run.sh", content);

        assert_eq!(
            node.prop("shebang").and_then(PropValue::as_str),
            Some("#!/usr/bin/env bash")
        );
        assert_eq!(node.prop("sources").unwrap().string_items(), vec!["./common.sh"]);
        assert_eq!(
            node.prop("docker_commands").unwrap().string_items(),
            vec!["docker build -t app ."]
        );
        let env = node.prop("env_vars").and_then(PropValue::as_map).unwrap();
        assert!(env.contains_key("REGION"));
        assert!(!env.contains_key("DB_PASSWORD"));
    }
}
