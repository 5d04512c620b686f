//! The walk itself: symbol emission for functions, classes, fields,
//! variables, macros and the per-language containers.

use std::collections::BTreeMap;
use tree_sitter::Node as TsNode;

use super::quirks::{self, ElixirForm};
use crate::lang::{Language, LanguageSpec};
use crate::parsing::{node_text, walk};
use crate::types::{EdgeType, Node, NodeLabel, PendingEdge, PropValue};

/// Mutable state for one file's extraction walk.
pub(super) struct SymbolWalker<'a> {
    pub(super) project: &'a str,
    pub(super) rel_path: &'a str,
    pub(super) language: Language,
    pub(super) spec: &'static LanguageSpec,
    pub(super) source: &'a [u8],
    pub(super) module_qn: String,
    pub(super) nodes: Vec<Node>,
    pub(super) edges: Vec<PendingEdge>,
    pub(super) constants: BTreeMap<String, String>,
}

impl<'a> SymbolWalker<'a> {
    /// Pre-order visitor. Returns whether to descend.
    pub(super) fn visit(&mut self, node: TsNode<'_>) -> bool {
        let kind = node.kind();

        if quirks::is_non_definition(self.language, node) {
            return false;
        }

        if self.language == Language::Elixir
            && let Some((form, name)) = quirks::elixir_form(node, self.source)
        {
            return self.emit_elixir(node, form, name);
        }

        if self.language == Language::Hcl && kind == "block" {
            self.emit_hcl_block(node);
            return false;
        }

        if matches!(self.language, Language::C | Language::Cpp) && kind == "preproc_function_def" {
            self.emit_macro(node);
            return false;
        }

        if self.language == Language::Rust && kind == "impl_item" {
            self.emit_rust_impl(node);
            return false;
        }

        if self.spec.function_node_types.contains(&kind) {
            let module = self.module_qn.clone();
            self.emit_function(node, &module, false);
            return false;
        }

        if self.spec.class_node_types.contains(&kind) {
            let module = self.module_qn.clone();
            if self.language == Language::Go && kind == "type_declaration" {
                self.emit_go_type_declaration(node);
            } else {
                self.emit_class_like(node, &module);
            }
            return false;
        }

        if self.spec.variable_node_types.contains(&kind) {
            self.emit_variables(node);
            // Descend where function values hide under declarators.
            return matches!(
                self.language,
                Language::JavaScript
                    | Language::TypeScript
                    | Language::Tsx
                    | Language::Lua
                    | Language::R
                    | Language::OCaml
            );
        }

        if self.spec.assignment_node_types.contains(&kind) {
            self.collect_constant(node);
            return true;
        }

        true
    }

    /// Emit a Function or Method node plus its defining edge.
    fn emit_function(&mut self, node: TsNode<'_>, container_qn: &str, force_method: bool) {
        let Some(name) = self.function_name(node) else {
            return;
        };

        let mut container = container_qn.to_string();
        let mut is_method = force_method;

        // Go methods attach to their receiver type, not the module.
        if self.language == Language::Go
            && node.kind() == "method_declaration"
            && let Some(receiver_type) = go_receiver_type(node, self.source)
        {
            container = format!("{}.{receiver_type}", self.module_qn);
            is_method = true;
        }

        let qn = format!("{container}.{name}");
        let decorators = quirks::decorators(self.language, node, self.source);
        let label = if is_method {
            NodeLabel::Method
        } else {
            NodeLabel::Function
        };

        let mut graph_node = Node::new(self.project, label, name.clone(), qn.clone(), self.rel_path)
            .with_lines(start_line(node), end_line(node));
        self.apply_function_props(&mut graph_node, node, &name, &decorators);
        self.nodes.push(graph_node);

        let edge_type = if is_method {
            EdgeType::DefinesMethod
        } else {
            EdgeType::Defines
        };
        self.edges
            .push(PendingEdge::new(container, qn, edge_type));
    }

    fn function_name(&self, node: TsNode<'_>) -> Option<String> {
        if let Some(name) = node.child_by_field_name("name") {
            let text = node_text(name, self.source);
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
        // Ruby singleton methods: def self.name
        if self.language == Language::Ruby
            && let Some(name) = node.child_by_field_name("method")
        {
            return Some(node_text(name, self.source).to_string());
        }
        quirks::assignment_context_name(self.language, node, self.source)
    }

    /// Generic class/struct/interface/enum emission with manual recursion
    /// into the body for methods, fields and nested containers.
    fn emit_class_like(&mut self, node: TsNode<'_>, container_qn: &str) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        if name.is_empty() {
            return;
        }

        let label = class_label(self.language, node.kind());
        let qn = format!("{container_qn}.{name}");

        let mut graph_node = Node::new(self.project, label, name.clone(), qn.clone(), self.rel_path)
            .with_lines(start_line(node), end_line(node))
            .with_prop(
                "is_exported",
                quirks::is_exported(self.language, &name, node, self.source),
            );

        let bases = self.base_class_names(node);
        if !bases.is_empty() {
            graph_node = graph_node.with_prop("base_classes", bases);
        }
        let decorators = quirks::decorators(self.language, node, self.source);
        if !decorators.is_empty() {
            graph_node = graph_node.with_prop("decorators", decorators);
        }
        self.nodes.push(graph_node);
        self.edges.push(PendingEdge::new(
            container_qn.to_string(),
            qn.clone(),
            EdgeType::Defines,
        ));

        let body = node.child_by_field_name("body").unwrap_or(node);
        self.emit_class_members(body, &qn);
    }

    fn emit_class_members(&mut self, body: TsNode<'_>, class_qn: &str) {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let kind = child.kind();

            if self.spec.function_node_types.contains(&kind)
                || (self.language == Language::Rust && kind == "function_signature_item")
            {
                self.emit_function(child, class_qn, true);
                continue;
            }
            if kind == "decorated_definition" {
                // Python wraps decorated methods one level down.
                let mut inner = child.walk();
                for grand in child.named_children(&mut inner) {
                    if self.spec.function_node_types.contains(&grand.kind()) {
                        self.emit_function(grand, class_qn, true);
                    }
                }
                continue;
            }
            if self.spec.field_node_types.contains(&kind) {
                self.emit_field(child, class_qn);
                continue;
            }
            if kind == "expression_statement" {
                // Python class-level assignments are fields.
                let mut inner = child.walk();
                for grand in child.named_children(&mut inner) {
                    if self.spec.field_node_types.contains(&grand.kind()) {
                        self.emit_field(grand, class_qn);
                    }
                }
                continue;
            }
            if self.spec.class_node_types.contains(&kind) {
                self.emit_class_like(child, class_qn);
            }
        }
    }

    fn emit_field(&mut self, node: TsNode<'_>, class_qn: &str) {
        let Some(name) = field_name(node, self.source) else {
            return;
        };
        let qn = format!("{class_qn}.{name}");
        let mut graph_node = Node::new(
            self.project,
            NodeLabel::Field,
            name,
            qn.clone(),
            self.rel_path,
        )
        .with_lines(start_line(node), end_line(node));
        if let Some(ty) = node.child_by_field_name("type") {
            graph_node = graph_node.with_prop("field_type", node_text(ty, self.source));
        }
        self.nodes.push(graph_node);
        self.edges.push(PendingEdge::new(
            class_qn.to_string(),
            qn,
            EdgeType::DefinesField,
        ));
    }

    /// Go `type` declarations: structs become classes with fields,
    /// interfaces collect their method set, the rest are plain types.
    fn emit_go_type_declaration(&mut self, node: TsNode<'_>) {
        let mut cursor = node.walk();
        for spec_node in node.named_children(&mut cursor) {
            if spec_node.kind() != "type_spec" {
                continue;
            }
            let Some(name_node) = spec_node.child_by_field_name("name") else {
                continue;
            };
            let name = node_text(name_node, self.source).to_string();
            let type_node = spec_node.child_by_field_name("type");
            let type_kind = type_node.map(|t| t.kind()).unwrap_or("");

            let label = match type_kind {
                "struct_type" => NodeLabel::Class,
                "interface_type" => NodeLabel::Interface,
                _ => NodeLabel::Type,
            };
            let qn = format!("{}.{name}", self.module_qn);

            self.nodes.push(
                Node::new(self.project, label, name.clone(), qn.clone(), self.rel_path)
                    .with_lines(start_line(spec_node), end_line(spec_node))
                    .with_prop(
                        "is_exported",
                        quirks::is_exported(self.language, &name, spec_node, self.source),
                    ),
            );
            self.edges.push(PendingEdge::new(
                self.module_qn.clone(),
                qn.clone(),
                EdgeType::Defines,
            ));

            let Some(type_node) = type_node else { continue };
            match type_kind {
                "struct_type" => self.emit_go_struct_fields(type_node, &qn),
                "interface_type" => self.emit_go_interface_methods(type_node, &qn),
                _ => {}
            }
        }
    }

    fn emit_go_struct_fields(&mut self, struct_type: TsNode<'_>, class_qn: &str) {
        let mut stack = vec![struct_type];
        while let Some(current) = stack.pop() {
            let mut cursor = current.walk();
            for child in current.named_children(&mut cursor) {
                if child.kind() == "field_declaration" {
                    self.emit_field(child, class_qn);
                } else if child.kind() == "field_declaration_list" {
                    stack.push(child);
                }
            }
        }
    }

    fn emit_go_interface_methods(&mut self, interface_type: TsNode<'_>, interface_qn: &str) {
        let mut stack = vec![interface_type];
        while let Some(current) = stack.pop() {
            let mut cursor = current.walk();
            for child in current.named_children(&mut cursor) {
                match child.kind() {
                    "method_spec" | "method_elem" => {
                        let Some(name_node) = child.child_by_field_name("name") else {
                            continue;
                        };
                        let name = node_text(name_node, self.source).to_string();
                        let qn = format!("{interface_qn}.{name}");
                        let mut graph_node = Node::new(
                            self.project,
                            NodeLabel::Method,
                            name,
                            qn.clone(),
                            self.rel_path,
                        )
                        .with_lines(start_line(child), end_line(child));
                        graph_node =
                            graph_node.with_prop("signature", node_text(child, self.source));
                        self.nodes.push(graph_node);
                        self.edges.push(PendingEdge::new(
                            interface_qn.to_string(),
                            qn,
                            EdgeType::DefinesMethod,
                        ));
                    }
                    _ => stack.push(child),
                }
            }
        }
    }

    /// Rust `impl` blocks: methods attach to the implemented type; a trait
    /// impl additionally records IMPLEMENTS.
    fn emit_rust_impl(&mut self, node: TsNode<'_>) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let type_name = node_text(type_node, self.source)
            .split('<')
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        if type_name.is_empty() {
            return;
        }
        let type_qn = format!("{}.{type_name}", self.module_qn);

        if let Some(trait_node) = node.child_by_field_name("trait") {
            let trait_name = node_text(trait_node, self.source)
                .split('<')
                .next()
                .unwrap_or("")
                .rsplit("::")
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            if !trait_name.is_empty() {
                self.edges.push(PendingEdge::new(
                    type_qn.clone(),
                    format!("{}.{trait_name}", self.module_qn),
                    EdgeType::Implements,
                ));
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                if child.kind() == "function_item" {
                    self.emit_function(child, &type_qn, true);
                }
            }
        }
    }

    /// C/C++ function-like preprocessor macros.
    fn emit_macro(&mut self, node: TsNode<'_>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let qn = format!("{}::macro::{name}", self.module_qn);
        self.nodes.push(
            Node::new(self.project, NodeLabel::Macro, name, qn.clone(), self.rel_path)
                .with_lines(start_line(node), end_line(node)),
        );
        self.edges.push(PendingEdge::new(
            self.module_qn.clone(),
            qn,
            EdgeType::Defines,
        ));
    }

    /// Elixir homoiconic forms. Returns the descend flag for the walk.
    fn emit_elixir(&mut self, node: TsNode<'_>, form: ElixirForm, name: String) -> bool {
        match form {
            ElixirForm::Module => {
                let qn = format!("{}.{name}", self.module_qn);
                self.nodes.push(
                    Node::new(self.project, NodeLabel::Class, name, qn.clone(), self.rel_path)
                        .with_lines(start_line(node), end_line(node)),
                );
                self.edges.push(PendingEdge::new(
                    self.module_qn.clone(),
                    qn.clone(),
                    EdgeType::Defines,
                ));
                // Walk the defmodule body for nested defs.
                let source = self.source;
                let mut nested = Vec::new();
                walk(node, &mut |n| {
                    if n.id() == node.id() {
                        return true;
                    }
                    if let Some((inner_form, inner_name)) = quirks::elixir_form(n, source) {
                        nested.push((n.id(), inner_form, inner_name, start_line(n), end_line(n)));
                        return false;
                    }
                    true
                });
                for (_, inner_form, inner_name, start, end) in nested {
                    let (label, edge) = match inner_form {
                        ElixirForm::Module => (NodeLabel::Class, EdgeType::Defines),
                        _ => (NodeLabel::Method, EdgeType::DefinesMethod),
                    };
                    let inner_qn = format!("{qn}.{inner_name}");
                    let mut graph_node = Node::new(
                        self.project,
                        label,
                        inner_name,
                        inner_qn.clone(),
                        self.rel_path,
                    )
                    .with_lines(start, end);
                    if inner_form == ElixirForm::Test {
                        graph_node = graph_node.with_prop("is_test", true);
                    }
                    self.nodes.push(graph_node);
                    self.edges
                        .push(PendingEdge::new(qn.clone(), inner_qn, edge));
                }
                false
            }
            ElixirForm::Function | ElixirForm::Test => {
                let qn = format!("{}.{name}", self.module_qn);
                let mut graph_node = Node::new(
                    self.project,
                    NodeLabel::Function,
                    name,
                    qn.clone(),
                    self.rel_path,
                )
                .with_lines(start_line(node), end_line(node));
                if form == ElixirForm::Test {
                    graph_node = graph_node.with_prop("is_test", true);
                }
                self.nodes.push(graph_node);
                self.edges.push(PendingEdge::new(
                    self.module_qn.clone(),
                    qn,
                    EdgeType::Defines,
                ));
                false
            }
        }
    }

    /// HCL blocks become typed symbols named `kind.label.label`.
    fn emit_hcl_block(&mut self, node: TsNode<'_>) {
        let Some(name) = quirks::hcl_block_name(node, self.source) else {
            return;
        };
        let qn = format!("{}.{name}", self.module_qn);
        self.nodes.push(
            Node::new(self.project, NodeLabel::Type, name, qn.clone(), self.rel_path)
                .with_lines(start_line(node), end_line(node)),
        );
        self.edges.push(PendingEdge::new(
            self.module_qn.clone(),
            qn,
            EdgeType::Defines,
        ));
    }

    /// Top-level variable declarations. Declarators holding function values
    /// are left for the walk to pick up as named functions.
    fn emit_variables(&mut self, node: TsNode<'_>) {
        self.collect_constant(node);
        for (name, value_kind, decl) in declared_variables(self.language, node, self.source) {
            if let Some(kind) = value_kind
                && self.spec.function_node_types.contains(&kind.as_str())
            {
                continue;
            }
            let qn = format!("{}.{name}", self.module_qn);
            if self.nodes.iter().any(|n| n.qualified_name == qn) {
                continue;
            }
            self.nodes.push(
                Node::new(self.project, NodeLabel::Variable, name, qn.clone(), self.rel_path)
                    .with_lines(start_line(decl), end_line(decl)),
            );
            self.edges.push(PendingEdge::new(
                self.module_qn.clone(),
                qn,
                EdgeType::Defines,
            ));
        }
    }

    /// Constant-looking top-level assignments: UPPER_CASE names bound to
    /// literal (or literal-concatenated) values.
    fn collect_constant(&mut self, node: TsNode<'_>) {
        for (name, _, decl) in declared_variables(self.language, node, self.source) {
            if !is_constant_name(&name) {
                continue;
            }
            let value = decl
                .child_by_field_name("value")
                .or_else(|| decl.child_by_field_name("right"));
            if let Some(value) = value
                && let Some(text) = self.resolve_constant_expr(value)
            {
                self.constants.insert(name, text);
            }
        }
    }

    /// Local constant propagation: literals, references to already-seen
    /// constants, and string concatenations over both.
    fn resolve_constant_expr(&self, node: TsNode<'_>) -> Option<String> {
        let kind = node.kind();
        if kind.contains("string") {
            return Some(
                node_text(node, self.source)
                    .trim_matches(['"', '\'', '`'])
                    .to_string(),
            );
        }
        if kind.contains("int")
            || kind.contains("float")
            || kind.contains("number")
            || kind == "true"
            || kind == "false"
        {
            return Some(node_text(node, self.source).to_string());
        }
        if kind == "identifier" || kind == "constant" {
            return self.constants.get(node_text(node, self.source)).cloned();
        }
        if kind.contains("binary") || kind == "concatenated_string" {
            let mut parts = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                parts.push(self.resolve_constant_expr(child)?);
            }
            if parts.is_empty() {
                return None;
            }
            return Some(parts.concat());
        }
        None
    }

    fn base_class_names(&self, node: TsNode<'_>) -> Vec<String> {
        const BASE_CLAUSE_KINDS: &[&str] = &[
            "superclasses",
            "argument_list",
            "class_heritage",
            "extends_clause",
            "base_class_clause",
            "super_interfaces",
            "extends_interfaces",
            "superclass",
            "delegation_specifier",
        ];
        let mut out = Vec::new();

        if let Some(sc) = node.child_by_field_name("superclasses") {
            collect_type_names(sc, self.source, &mut out);
        }
        if let Some(sc) = node.child_by_field_name("superclass") {
            collect_type_names(sc, self.source, &mut out);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if !BASE_CLAUSE_KINDS.contains(&child.kind()) {
                continue;
            }
            if node.child_by_field_name("superclasses").map(|n| n.id()) == Some(child.id())
                || node.child_by_field_name("superclass").map(|n| n.id()) == Some(child.id())
            {
                continue;
            }
            // An argument_list directly under class_definition is Python's
            // superclass list; elsewhere it is a call argument list.
            if child.kind() == "argument_list" && self.language != Language::Python {
                continue;
            }
            collect_type_names(child, self.source, &mut out);
        }
        out.sort();
        out.dedup();
        out
    }

    fn apply_function_props(
        &self,
        graph_node: &mut Node,
        node: TsNode<'_>,
        name: &str,
        decorators: &[String],
    ) {
        let body = node.child_by_field_name("body");
        let signature = match body {
            Some(body) if body.start_byte() > node.start_byte() => {
                String::from_utf8_lossy(&self.source[node.start_byte()..body.start_byte()])
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            _ => node_text(node, self.source)
                .lines()
                .next()
                .unwrap_or("")
                .trim()
                .to_string(),
        };
        let signature: String = signature.chars().take(240).collect();

        let mut param_types = Vec::new();
        if let Some(params) = node
            .child_by_field_name("parameters")
            .or_else(|| node.child_by_field_name("parameter_list"))
        {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                if let Some(ty) = param.child_by_field_name("type") {
                    param_types.push(node_text(ty, self.source).to_string());
                }
            }
        }

        let return_field = match self.language {
            Language::Go => "result",
            Language::Java | Language::CSharp => "type",
            _ => "return_type",
        };
        let mut return_types: Vec<String> = Vec::new();
        if let Some(result) = node.child_by_field_name(return_field) {
            if result.kind() == "parameter_list" || result.kind() == "tuple_type" {
                let mut cursor = result.walk();
                for item in result.named_children(&mut cursor) {
                    let ty = item
                        .child_by_field_name("type")
                        .unwrap_or(item);
                    return_types.push(node_text(ty, self.source).to_string());
                }
            } else {
                return_types.push(node_text(result, self.source).to_string());
            }
        }

        let mut complexity = 1usize;
        walk(node, &mut |n| {
            if self.spec.branching_node_types.contains(&n.kind()) {
                complexity += 1;
            }
            true
        });

        let is_entry_point = name == "main"
            || (matches!(
                self.language,
                Language::JavaScript | Language::TypeScript | Language::Tsx
            ) && quirks::has_export_ancestor(node))
            || quirks::decorator_marks_entry_point(decorators);

        let lines = end_line(node).saturating_sub(start_line(node)) as usize + 1;

        graph_node
            .properties
            .insert("signature".to_string(), PropValue::from(signature));
        graph_node
            .properties
            .insert("lines".to_string(), PropValue::from(lines));
        graph_node
            .properties
            .insert("complexity".to_string(), PropValue::from(complexity));
        graph_node.properties.insert(
            "is_entry_point".to_string(),
            PropValue::from(is_entry_point),
        );
        graph_node.properties.insert(
            "is_exported".to_string(),
            PropValue::from(quirks::is_exported(self.language, name, node, self.source)),
        );
        if !param_types.is_empty() {
            graph_node
                .properties
                .insert("param_types".to_string(), PropValue::from(param_types));
        }
        if let Some(first) = return_types.first() {
            graph_node
                .properties
                .insert("return_type".to_string(), PropValue::from(first.clone()));
        }
        if return_types.len() > 1 {
            graph_node
                .properties
                .insert("return_types".to_string(), PropValue::from(return_types));
        }
        if !decorators.is_empty() {
            graph_node.properties.insert(
                "decorators".to_string(),
                PropValue::from(decorators.to_vec()),
            );
        }
        if let Some(doc) = quirks::docstring(self.language, node, self.source) {
            graph_node
                .properties
                .insert("docstring".to_string(), PropValue::from(doc));
        }
    }
}

fn start_line(node: TsNode<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

fn end_line(node: TsNode<'_>) -> u32 {
    node.end_position().row as u32 + 1
}

fn is_constant_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().any(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Label for a class-family node kind.
fn class_label(language: Language, kind: &str) -> NodeLabel {
    match kind {
        k if k.contains("interface") || k.contains("trait") || k.contains("protocol") => {
            NodeLabel::Interface
        }
        k if k.contains("enum") => NodeLabel::Enum,
        k if k.contains("union") => NodeLabel::Union,
        "type_item" | "type_alias_declaration" | "type_definition" => NodeLabel::Type,
        "module" if language == Language::Ruby => NodeLabel::Class,
        _ => NodeLabel::Class,
    }
}

/// Receiver type of a Go method, pointer stripped: `(h *Handler)` → Handler.
pub(crate) fn go_receiver_type(node: TsNode<'_>, source: &[u8]) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    for param in receiver.named_children(&mut cursor) {
        if let Some(ty) = param.child_by_field_name("type") {
            let text = node_text(ty, source).trim_start_matches(['*', '&']).trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Receiver variable name of a Go method: `(h *Handler)` → h.
pub(crate) fn go_receiver_name(node: TsNode<'_>, source: &[u8]) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    for param in receiver.named_children(&mut cursor) {
        if let Some(name) = param.child_by_field_name("name") {
            return Some(node_text(name, source).to_string());
        }
    }
    None
}

fn field_name(node: TsNode<'_>, source: &[u8]) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(node_text(name, source).to_string());
    }
    if let Some(left) = node.child_by_field_name("left") {
        let text = node_text(left, source);
        if !text.contains([',', '[', '.']) {
            return Some(text.to_string());
        }
        return None;
    }
    if let Some(declarator) = node.child_by_field_name("declarator") {
        if let Some(name) = declarator.child_by_field_name("name") {
            return Some(node_text(name, source).to_string());
        }
        return Some(node_text(declarator, source).to_string());
    }
    None
}

/// Declared (name, value-kind, declarator-node) triples for a variable or
/// assignment statement, across the per-language declaration shapes.
fn declared_variables<'t>(
    language: Language,
    node: TsNode<'t>,
    source: &[u8],
) -> Vec<(String, Option<String>, TsNode<'t>)> {
    let mut out = Vec::new();
    let kind = node.kind();

    match language {
        Language::Go => {
            // var_declaration/const_declaration wrap var_spec/const_spec.
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "var_spec" || child.kind() == "const_spec" {
                    if let Some(name) = child.child_by_field_name("name") {
                        let value_kind = child
                            .child_by_field_name("value")
                            .map(|v| v.kind().to_string());
                        out.push((node_text(name, source).to_string(), value_kind, child));
                    }
                }
            }
        }
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "variable_declarator"
                    && let Some(name) = child.child_by_field_name("name")
                {
                    let value_kind = child
                        .child_by_field_name("value")
                        .map(|v| v.kind().to_string());
                    out.push((node_text(name, source).to_string(), value_kind, child));
                }
            }
        }
        Language::Python => {
            if kind == "assignment"
                && let Some(left) = node.child_by_field_name("left")
                && left.kind() == "identifier"
            {
                let value_kind = node
                    .child_by_field_name("right")
                    .map(|v| v.kind().to_string());
                out.push((node_text(left, source).to_string(), value_kind, node));
            }
        }
        Language::Rust => {
            if (kind == "static_item" || kind == "const_item")
                && let Some(name) = node.child_by_field_name("name")
            {
                let value_kind = node
                    .child_by_field_name("value")
                    .map(|v| v.kind().to_string());
                out.push((node_text(name, source).to_string(), value_kind, node));
            }
        }
        Language::R => {
            if kind == "binary_operator"
                && let Some(op) = node.child_by_field_name("operator")
                && matches!(node_text(op, source), "<-" | "<<-" | "=")
                && let Some(lhs) = node.child_by_field_name("lhs")
                && lhs.kind() == "identifier"
            {
                let value_kind = node
                    .child_by_field_name("rhs")
                    .map(|v| v.kind().to_string());
                out.push((node_text(lhs, source).to_string(), value_kind, node));
            }
        }
        _ => {
            if let Some(name) = node.child_by_field_name("name") {
                let value_kind = node
                    .child_by_field_name("value")
                    .map(|v| v.kind().to_string());
                out.push((node_text(name, source).to_string(), value_kind, node));
            } else if let Some(left) = node.child_by_field_name("left") {
                if left.kind().contains("identifier") {
                    let value_kind = node
                        .child_by_field_name("right")
                        .map(|v| v.kind().to_string());
                    out.push((node_text(left, source).to_string(), value_kind, node));
                }
            }
        }
    }
    out
}

fn collect_type_names(node: TsNode<'_>, source: &[u8], out: &mut Vec<String>) {
    walk(node, &mut |n| {
        let kind = n.kind();
        if kind == "identifier" || kind == "type_identifier" || kind == "constant" {
            let text = node_text(n, source);
            if !text.is_empty() && text.chars().next().is_some_and(|c| c.is_alphabetic()) {
                out.push(text.to_string());
            }
            return false;
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_name_shape() {
        assert!(is_constant_name("MAX_RETRIES"));
        assert!(is_constant_name("TIMEOUT2"));
        assert!(!is_constant_name("maxRetries"));
        assert!(!is_constant_name("_"));
        assert!(!is_constant_name(""));
    }

    #[test]
    fn class_labels() {
        assert_eq!(
            class_label(Language::Rust, "trait_item"),
            NodeLabel::Interface
        );
        assert_eq!(class_label(Language::Rust, "enum_item"), NodeLabel::Enum);
        assert_eq!(class_label(Language::Rust, "union_item"), NodeLabel::Union);
        assert_eq!(class_label(Language::Rust, "type_item"), NodeLabel::Type);
        assert_eq!(
            class_label(Language::Python, "class_definition"),
            NodeLabel::Class
        );
    }
}
