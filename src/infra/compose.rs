//! docker-compose scanner: one InfraFile node per service.
//!
//! Environment bindings are filtered by value only; compose keys routinely
//! reference secrets without containing them.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::secret;
use crate::types::{Node, NodeLabel, PropValue, module_qn};

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: BTreeMap<String, Service>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Service {
    image: Option<String>,
    build: Option<BuildSpec>,
    ports: Vec<String>,
    expose: Vec<String>,
    environment: Option<Environment>,
    depends_on: Option<DependsOn>,
    networks: Vec<String>,
    container_name: Option<String>,
    volumes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BuildSpec {
    Context(String),
    Detailed { context: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Environment {
    Map(BTreeMap<String, serde_yaml::Value>),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, serde_yaml::Value>),
}

/// Scan a compose file into one node per service. Unparseable YAML yields
/// no nodes; infra scanning never fails a run.
pub fn scan(project: &str, rel_path: &str, content: &str) -> Vec<Node> {
    let Ok(file) = serde_yaml::from_str::<ComposeFile>(content) else {
        return Vec::new();
    };

    let base = module_qn(project, rel_path);
    file.services
        .into_iter()
        .map(|(service_name, service)| {
            let qn = format!("{base}::{service_name}");
            let mut node = Node::new(
                project,
                NodeLabel::InfraFile,
                service_name.clone(),
                qn,
                rel_path,
            )
            .with_prop("infra_type", "compose-service")
            .with_prop("service_name", service_name);

            if let Some(image) = service.image {
                node = node.with_prop("image", image);
            }
            if let Some(build) = service.build {
                let context = match build {
                    BuildSpec::Context(context) => Some(context),
                    BuildSpec::Detailed { context } => context,
                };
                if let Some(context) = context {
                    node = node.with_prop("build_context", context);
                }
            }
            node = node
                .with_prop("ports", service.ports)
                .with_prop("expose", service.expose)
                .with_prop("networks", service.networks)
                .with_prop("volumes", service.volumes);
            if let Some(container_name) = service.container_name {
                node = node.with_prop("container_name", container_name);
            }

            let depends_on: Vec<String> = match service.depends_on {
                Some(DependsOn::List(list)) => list,
                Some(DependsOn::Map(map)) => map.into_keys().collect(),
                None => Vec::new(),
            };
            node = node.with_prop("depends_on", depends_on);

            let bindings: BTreeMap<String, String> = match service.environment {
                Some(Environment::Map(map)) => map
                    .into_iter()
                    .map(|(k, v)| (k, yaml_scalar(&v)))
                    .collect(),
                Some(Environment::List(items)) => items
                    .iter()
                    .filter_map(|item| {
                        let (k, v) = item.split_once('=')?;
                        Some((k.to_string(), v.to_string()))
                    })
                    .collect(),
                None => BTreeMap::new(),
            };
            node.with_prop(
                "environment",
                PropValue::from(secret::filter_env(bindings, true)),
            )
        })
        .collect()
}

fn yaml_scalar(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn services_become_nodes_with_value_only_filtering() {
        let content = "services:\n  api:\n    image: app:latest\n    ports:\n      - \"8080:8080\"\n    environment:\n      JWT_PRIVATE_KEY_ID: key-2024\n      LEAKED: sk-abcdefghijklmnopqrstuv12\n    depends_on:\n      - db\n  db:\n    image: postgres:16\n";
        let nodes = scan("p", "docker-compose.yml", content);
        assert_eq!(nodes.len(), 2);

        let api = nodes.iter().find(|n| n.name == "api").unwrap();
        assert_eq!(api.qualified_name, "p.docker-compose::api");
        assert_eq!(api.prop("image").and_then(PropValue::as_str), Some("app:latest"));
        assert_eq!(api.prop("depends_on").unwrap().string_items(), vec!["db"]);

        let env = api.prop("environment").and_then(PropValue::as_map).unwrap();
        // Value-only filtering: the key referencing a secret survives, the
        // leaked value does not.
        assert!(env.contains_key("JWT_PRIVATE_KEY_ID"));
        assert!(!env.contains_key("LEAKED"));
    }

    #[test]
    fn malformed_yaml_yields_nothing() {
        assert!(scan("p", "docker-compose.yml", ":\n  - broken").is_empty());
    }
}
