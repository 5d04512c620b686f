//! Core graph types: node labels, edge types, property values, and the
//! node/edge records exchanged with the store.
//!
//! Property bags are modelled as a tagged sum (`PropValue`) rather than an
//! arbitrary JSON value so every property documented for the schema stays a
//! typed scalar, a list, or a string-keyed map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::Path;

/// Store-assigned node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

/// Label of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Project,
    Folder,
    Package,
    Module,
    File,
    Function,
    Method,
    Class,
    Interface,
    Type,
    Enum,
    Union,
    Macro,
    Variable,
    Field,
    Community,
    Route,
    InfraFile,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Folder => "Folder",
            Self::Package => "Package",
            Self::Module => "Module",
            Self::File => "File",
            Self::Function => "Function",
            Self::Method => "Method",
            Self::Class => "Class",
            Self::Interface => "Interface",
            Self::Type => "Type",
            Self::Enum => "Enum",
            Self::Union => "Union",
            Self::Macro => "Macro",
            Self::Variable => "Variable",
            Self::Field => "Field",
            Self::Community => "Community",
            Self::Route => "Route",
            Self::InfraFile => "InfraFile",
        }
    }

    /// Labels that represent a defined symbol, i.e. carry exactly one
    /// incoming DEFINES / DEFINES_METHOD / DEFINES_FIELD edge.
    pub fn is_symbol(&self) -> bool {
        matches!(
            self,
            Self::Function
                | Self::Method
                | Self::Class
                | Self::Interface
                | Self::Type
                | Self::Enum
                | Self::Union
                | Self::Macro
                | Self::Variable
                | Self::Field
        )
    }

    /// Labels the name registry indexes for resolution.
    pub fn is_resolvable(&self) -> bool {
        self.is_symbol() || matches!(self, Self::Module)
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeType {
    Calls,
    Usage,
    Imports,
    Defines,
    DefinesMethod,
    DefinesField,
    Inherits,
    Implements,
    Decorates,
    UsesType,
    Throws,
    Raises,
    Reads,
    Writes,
    Configures,
    MemberOf,
    Tests,
    TestsFile,
    HttpCalls,
    Handles,
    AsyncCalls,
    FileChangesWith,
    ContainsFile,
    ContainsFolder,
    ContainsPackage,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calls => "CALLS",
            Self::Usage => "USAGE",
            Self::Imports => "IMPORTS",
            Self::Defines => "DEFINES",
            Self::DefinesMethod => "DEFINES_METHOD",
            Self::DefinesField => "DEFINES_FIELD",
            Self::Inherits => "INHERITS",
            Self::Implements => "IMPLEMENTS",
            Self::Decorates => "DECORATES",
            Self::UsesType => "USES_TYPE",
            Self::Throws => "THROWS",
            Self::Raises => "RAISES",
            Self::Reads => "READS",
            Self::Writes => "WRITES",
            Self::Configures => "CONFIGURES",
            Self::MemberOf => "MEMBER_OF",
            Self::Tests => "TESTS",
            Self::TestsFile => "TESTS_FILE",
            Self::HttpCalls => "HTTP_CALLS",
            Self::Handles => "HANDLES",
            Self::AsyncCalls => "ASYNC_CALLS",
            Self::FileChangesWith => "FILE_CHANGES_WITH",
            Self::ContainsFile => "CONTAINS_FILE",
            Self::ContainsFolder => "CONTAINS_FOLDER",
            Self::ContainsPackage => "CONTAINS_PACKAGE",
        }
    }

    /// Edge types derived from a file's AST. In incremental mode these are
    /// deleted per source file before the file is re-resolved.
    pub const AST_DERIVED: [EdgeType; 8] = [
        Self::Calls,
        Self::Usage,
        Self::UsesType,
        Self::Throws,
        Self::Raises,
        Self::Reads,
        Self::Writes,
        Self::Configures,
    ];

    /// Every edge type, for end-of-run count logging.
    pub const ALL: [EdgeType; 25] = [
        Self::Calls,
        Self::Usage,
        Self::Imports,
        Self::Defines,
        Self::DefinesMethod,
        Self::DefinesField,
        Self::Inherits,
        Self::Implements,
        Self::Decorates,
        Self::UsesType,
        Self::Throws,
        Self::Raises,
        Self::Reads,
        Self::Writes,
        Self::Configures,
        Self::MemberOf,
        Self::Tests,
        Self::TestsFile,
        Self::HttpCalls,
        Self::Handles,
        Self::AsyncCalls,
        Self::FileChangesWith,
        Self::ContainsFile,
        Self::ContainsFolder,
        Self::ContainsPackage,
    ];
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed property value. Closed over the shapes the schema documents:
/// scalars, lists, and string-keyed maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<PropValue>),
    Map(BTreeMap<String, PropValue>),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, PropValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// String items of a list value; non-string items are skipped.
    pub fn string_items(&self) -> Vec<&str> {
        self.as_list()
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for PropValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value.into_iter().map(PropValue::Str).collect())
    }
}

impl From<BTreeMap<String, String>> for PropValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Map(
            value
                .into_iter()
                .map(|(k, v)| (k, PropValue::Str(v)))
                .collect(),
        )
    }
}

/// Property bag attached to nodes and edges.
pub type Properties = BTreeMap<String, PropValue>;

/// A symbol or container in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Assigned by the store; `None` until the first upsert.
    pub id: Option<NodeId>,
    pub project: String,
    pub label: NodeLabel,
    pub name: String,
    pub qualified_name: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub properties: Properties,
}

impl Node {
    pub fn new(
        project: impl Into<String>,
        label: NodeLabel,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            project: project.into(),
            label,
            name: name.into(),
            qualified_name: qualified_name.into(),
            file_path: file_path.into(),
            start_line: 0,
            end_line: 0,
            properties: Properties::new(),
        }
    }

    pub fn with_lines(mut self, start: u32, end: u32) -> Self {
        self.start_line = start;
        self.end_line = end;
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn prop(&self, key: &str) -> Option<&PropValue> {
        self.properties.get(key)
    }
}

/// A typed relation between two stored nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub project: String,
    pub source: NodeId,
    pub target: NodeId,
    pub edge_type: EdgeType,
    pub properties: Properties,
}

impl Edge {
    pub fn new(project: impl Into<String>, source: NodeId, target: NodeId, edge_type: EdgeType) -> Self {
        Self {
            project: project.into(),
            source,
            target,
            edge_type,
            properties: Properties::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// An edge described by qualified names, produced by pure extractors.
/// Becomes a real `Edge` once both names resolve to store ids; if either
/// name is unknown at flush time the edge is silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEdge {
    pub source_qn: String,
    pub target_qn: String,
    pub edge_type: EdgeType,
    pub properties: Properties,
}

impl PendingEdge {
    pub fn new(
        source_qn: impl Into<String>,
        target_qn: impl Into<String>,
        edge_type: EdgeType,
    ) -> Self {
        Self {
            source_qn: source_qn.into(),
            target_qn: target_qn.into(),
            edge_type,
            properties: Properties::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Derive the project name from the repository root path: slash-normalise,
/// replace separators with dashes, trim leading dashes. An empty result
/// maps to "root".
pub fn project_name_from_path(root: &Path) -> String {
    let normalised = root.to_string_lossy().replace('\\', "/");
    let name: String = normalised
        .chars()
        .map(|c| if c == '/' { '-' } else { c })
        .collect();
    let trimmed = name.trim_start_matches('-').trim_end_matches('-');
    if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turn a relative file path into the dotted module path, extension removed.
pub fn dotted_module_path(rel_path: &str) -> String {
    let without_ext = match rel_path.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem,
        _ => rel_path,
    };
    without_ext.replace('/', ".")
}

/// Module qualified name for a file: `<project>.<dotted path>`.
pub fn module_qn(project: &str, rel_path: &str) -> String {
    format!("{project}.{}", dotted_module_path(rel_path))
}

/// Qualified name of the file pseudo-node for a module.
pub fn file_qn(project: &str, rel_path: &str) -> String {
    format!("{}.__file__", module_qn(project, rel_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn project_name_derivation() {
        assert_eq!(
            project_name_from_path(Path::new("/home/dev/acme-api")),
            "home-dev-acme-api"
        );
        assert_eq!(project_name_from_path(Path::new("/")), "root");
        assert_eq!(project_name_from_path(&PathBuf::from("")), "root");
    }

    #[test]
    fn module_qualified_names() {
        assert_eq!(
            module_qn("proj", "handler/h.go"),
            "proj.handler.h"
        );
        assert_eq!(module_qn("proj", "pkg/util.py"), "proj.pkg.util");
        assert_eq!(file_qn("proj", "pkg/util.py"), "proj.pkg.util.__file__");
        // No extension to strip.
        assert_eq!(module_qn("proj", "Makefile"), "proj.Makefile");
    }

    #[test]
    fn prop_value_accessors() {
        let v = PropValue::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(v.string_items(), vec!["a", "b"]);
        assert_eq!(PropValue::from(true).as_bool(), Some(true));
        assert_eq!(PropValue::from(3usize).as_int(), Some(3));
        assert!(PropValue::from("x").as_bool().is_none());
    }

    #[test]
    fn node_builder() {
        let node = Node::new("p", NodeLabel::Function, "foo", "p.m.foo", "m.go")
            .with_lines(3, 9)
            .with_prop("is_exported", false);
        assert_eq!(node.start_line, 3);
        assert_eq!(node.prop("is_exported").and_then(PropValue::as_bool), Some(false));
        assert!(node.id.is_none());
        assert!(node.label.is_symbol());
    }

    #[test]
    fn ast_derived_edge_set() {
        assert!(EdgeType::AST_DERIVED.contains(&EdgeType::Calls));
        assert!(EdgeType::AST_DERIVED.contains(&EdgeType::Configures));
        assert!(!EdgeType::AST_DERIVED.contains(&EdgeType::Imports));
        assert!(!EdgeType::AST_DERIVED.contains(&EdgeType::Defines));
    }
}
