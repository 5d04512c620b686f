//! Dockerfile scanner.

use std::collections::BTreeMap;

use super::secret;
use crate::types::{Node, NodeLabel, PropValue, module_qn};

pub fn scan(project: &str, rel_path: &str, content: &str) -> Node {
    let mut base_images: Vec<String> = Vec::new();
    let mut stages: Vec<PropValue> = Vec::new();
    let mut exposed_ports: Vec<String> = Vec::new();
    let mut env_vars: BTreeMap<String, String> = BTreeMap::new();
    let mut build_args: Vec<String> = Vec::new();
    let mut workdir = None;
    let mut cmd = None;
    let mut entrypoint = None;
    let mut healthcheck = None;
    let mut user = None;

    for line in logical_lines(content) {
        let Some((instruction, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let rest = rest.trim();
        match instruction.to_ascii_uppercase().as_str() {
            "FROM" => {
                let mut parts = rest.split_whitespace();
                let Some(image) = parts.next() else { continue };
                base_images.push(image.to_string());
                let alias = match (parts.next(), parts.next()) {
                    (Some(kw), Some(name)) if kw.eq_ignore_ascii_case("as") => Some(name),
                    _ => None,
                };
                if let Some(name) = alias {
                    let mut stage = BTreeMap::new();
                    stage.insert("name".to_string(), PropValue::from(name));
                    stage.insert("image".to_string(), PropValue::from(image));
                    stages.push(PropValue::Map(stage));
                }
            }
            "ENV" => {
                for (key, value) in env_bindings(rest) {
                    env_vars.insert(key, value);
                }
            }
            "EXPOSE" => {
                exposed_ports.extend(rest.split_whitespace().map(|p| p.to_string()));
            }
            "ARG" => {
                let name = rest.split('=').next().unwrap_or(rest).trim();
                if !name.is_empty() {
                    build_args.push(name.to_string());
                }
            }
            "WORKDIR" => workdir = Some(rest.to_string()),
            "CMD" => cmd = Some(rest.to_string()),
            "ENTRYPOINT" => entrypoint = Some(rest.to_string()),
            "HEALTHCHECK" => healthcheck = Some(rest.to_string()),
            "USER" => user = Some(rest.to_string()),
            _ => {}
        }
    }

    let env_vars = secret::filter_env(env_vars, false);

    let qn = format!("{}.__infra__", module_qn(project, rel_path));
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path).to_string();
    let mut node = Node::new(project, NodeLabel::InfraFile, name, qn, rel_path)
        .with_prop("infra_type", "dockerfile")
        .with_prop("env_vars", PropValue::from(env_vars))
        .with_prop("exposed_ports", exposed_ports)
        .with_prop("build_args", build_args);

    if let Some(first) = base_images.first() {
        node = node.with_prop("base_image", first.clone());
    }
    node = node.with_prop("base_images", base_images);
    if !stages.is_empty() {
        node = node.with_prop("stages", PropValue::List(stages));
    }
    if let Some(workdir) = workdir {
        node = node.with_prop("workdir", workdir);
    }
    if let Some(cmd) = cmd {
        node = node.with_prop("cmd", cmd);
    }
    if let Some(entrypoint) = entrypoint {
        node = node.with_prop("entrypoint", entrypoint);
    }
    if let Some(healthcheck) = healthcheck {
        node = node.with_prop("healthcheck", healthcheck);
    }
    if let Some(user) = user {
        node = node.with_prop("user", user);
    }
    node
}

/// Physical lines joined over trailing backslashes, comments dropped.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = String::new();
    for raw in content.lines() {
        let line = raw.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_suffix('\\') {
            pending.push_str(stripped);
            pending.push(' ');
            continue;
        }
        pending.push_str(line);
        if !pending.trim().is_empty() {
            lines.push(pending.trim().to_string());
        }
        pending.clear();
    }
    if !pending.trim().is_empty() {
        lines.push(pending.trim().to_string());
    }
    lines
}

/// `ENV` bindings in both `K=V K2=V2` and legacy `K V` forms.
fn env_bindings(rest: &str) -> Vec<(String, String)> {
    if rest.contains('=') {
        rest.split_whitespace()
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                Some((key.to_string(), value.trim_matches('"').to_string()))
            })
            .collect()
    } else {
        match rest.split_once(char::is_whitespace) {
            Some((key, value)) => vec![(key.to_string(), value.trim().trim_matches('"').to_string())],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_dockerfile_schema() {
        let content = "FROM golang:1.22 AS build\nWORKDIR /src\nARG VERSION=dev\nENV APP_PORT=8080 DATABASE_URL=https://db.example/path\nFROM alpine:3.20\nEXPOSE 8080\nUSER app\nCMD [\"/bin/server\"]\n";
        let node = scan("p", "Dockerfile", content);

        assert_eq!(node.label, NodeLabel::InfraFile);
        assert_eq!(node.qualified_name, "p.Dockerfile.__infra__");
        assert_eq!(
            node.prop("base_image").and_then(PropValue::as_str),
            Some("golang:1.22")
        );
        assert_eq!(node.prop("base_images").unwrap().string_items().len(), 2);
        assert_eq!(
            node.prop("workdir").and_then(PropValue::as_str),
            Some("/src")
        );
        assert_eq!(node.prop("exposed_ports").unwrap().string_items(), vec!["8080"]);
        assert_eq!(node.prop("build_args").unwrap().string_items(), vec!["VERSION"]);

        let env = node.prop("env_vars").and_then(PropValue::as_map).unwrap();
        assert_eq!(env.get("APP_PORT").and_then(PropValue::as_str), Some("8080"));
    }

    #[test]
    fn secret_env_bindings_are_rejected() {
        let content = "FROM alpine\nENV API_KEY=sk-abcdefghijklmnopqrstuvwx\nENV DATABASE_URL=https://db.example/path\n";
        let node = scan("p", "Dockerfile", content);
        let env = node.prop("env_vars").and_then(PropValue::as_map).unwrap();
        assert!(env.contains_key("DATABASE_URL"));
        assert!(!env.contains_key("API_KEY"));
    }
}
