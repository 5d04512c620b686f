//! Per-language AST node-kind tables.
//!
//! Kind names follow each language's tree-sitter grammar. Entries exist for
//! every supported language even when no grammar is bundled; adding a
//! grammar dependency is then enough to light a language up.

use super::Language;

/// Node-kind table for one language. Consulted, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct LanguageSpec {
    pub language: Language,
    pub function_node_types: &'static [&'static str],
    pub class_node_types: &'static [&'static str],
    pub field_node_types: &'static [&'static str],
    pub call_node_types: &'static [&'static str],
    pub import_node_types: &'static [&'static str],
    pub variable_node_types: &'static [&'static str],
    pub assignment_node_types: &'static [&'static str],
    pub branching_node_types: &'static [&'static str],
    pub throw_node_types: &'static [&'static str],
    /// Child kind (or field name) of a function node holding its declared
    /// exception list, for languages that have one.
    pub throws_clause_field: Option<&'static str>,
    /// Filenames whose presence in a directory marks it as a package.
    pub package_indicators: &'static [&'static str],
}

const GO: LanguageSpec = LanguageSpec {
    language: Language::Go,
    function_node_types: &["function_declaration", "method_declaration"],
    class_node_types: &["type_declaration"],
    field_node_types: &["field_declaration"],
    call_node_types: &["call_expression"],
    import_node_types: &["import_declaration"],
    variable_node_types: &["var_declaration", "const_declaration"],
    assignment_node_types: &["assignment_statement", "short_var_declaration"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "expression_switch_statement",
        "type_switch_statement",
        "select_statement",
    ],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["go.mod"],
};

const PYTHON: LanguageSpec = LanguageSpec {
    language: Language::Python,
    function_node_types: &["function_definition"],
    class_node_types: &["class_definition"],
    field_node_types: &["assignment", "typed_parameter"],
    call_node_types: &["call"],
    import_node_types: &["import_statement", "import_from_statement"],
    variable_node_types: &["assignment"],
    assignment_node_types: &["assignment", "augmented_assignment"],
    branching_node_types: &[
        "if_statement",
        "elif_clause",
        "for_statement",
        "while_statement",
        "except_clause",
        "conditional_expression",
        "match_statement",
    ],
    throw_node_types: &["raise_statement"],
    throws_clause_field: None,
    package_indicators: &["__init__.py", "pyproject.toml", "setup.py"],
};

const RUST: LanguageSpec = LanguageSpec {
    language: Language::Rust,
    function_node_types: &["function_item"],
    class_node_types: &[
        "struct_item",
        "enum_item",
        "trait_item",
        "union_item",
        "type_item",
        "impl_item",
    ],
    field_node_types: &["field_declaration"],
    call_node_types: &["call_expression", "macro_invocation"],
    import_node_types: &["use_declaration"],
    variable_node_types: &["static_item", "const_item"],
    assignment_node_types: &["assignment_expression", "let_declaration"],
    branching_node_types: &[
        "if_expression",
        "match_expression",
        "while_expression",
        "for_expression",
        "loop_expression",
    ],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["Cargo.toml"],
};

const JAVASCRIPT: LanguageSpec = LanguageSpec {
    language: Language::JavaScript,
    function_node_types: &[
        "function_declaration",
        "function_expression",
        "arrow_function",
        "method_definition",
        "generator_function_declaration",
    ],
    class_node_types: &["class_declaration", "class"],
    field_node_types: &["field_definition"],
    call_node_types: &["call_expression", "new_expression"],
    import_node_types: &["import_statement"],
    variable_node_types: &["variable_declaration", "lexical_declaration"],
    assignment_node_types: &["assignment_expression", "augmented_assignment_expression"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "switch_statement",
        "ternary_expression",
        "catch_clause",
    ],
    throw_node_types: &["throw_statement"],
    throws_clause_field: None,
    package_indicators: &["package.json"],
};

const TYPESCRIPT: LanguageSpec = LanguageSpec {
    language: Language::TypeScript,
    function_node_types: &[
        "function_declaration",
        "function_expression",
        "arrow_function",
        "method_definition",
        "generator_function_declaration",
    ],
    class_node_types: &[
        "class_declaration",
        "abstract_class_declaration",
        "interface_declaration",
        "enum_declaration",
        "type_alias_declaration",
    ],
    field_node_types: &["public_field_definition", "property_signature"],
    call_node_types: &["call_expression", "new_expression"],
    import_node_types: &["import_statement"],
    variable_node_types: &["variable_declaration", "lexical_declaration"],
    assignment_node_types: &["assignment_expression", "augmented_assignment_expression"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "switch_statement",
        "ternary_expression",
        "catch_clause",
    ],
    throw_node_types: &["throw_statement"],
    throws_clause_field: None,
    package_indicators: &["package.json", "tsconfig.json"],
};

const TSX: LanguageSpec = LanguageSpec {
    language: Language::Tsx,
    ..TYPESCRIPT
};

const JAVA: LanguageSpec = LanguageSpec {
    language: Language::Java,
    function_node_types: &["method_declaration", "constructor_declaration"],
    class_node_types: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "record_declaration",
    ],
    field_node_types: &["field_declaration"],
    call_node_types: &["method_invocation", "object_creation_expression"],
    import_node_types: &["import_declaration"],
    variable_node_types: &["local_variable_declaration"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "enhanced_for_statement",
        "while_statement",
        "switch_expression",
        "catch_clause",
        "ternary_expression",
    ],
    throw_node_types: &["throw_statement"],
    throws_clause_field: Some("throws"),
    package_indicators: &["pom.xml", "build.gradle", "build.gradle.kts"],
};

const C: LanguageSpec = LanguageSpec {
    language: Language::C,
    function_node_types: &["function_definition"],
    class_node_types: &["struct_specifier", "enum_specifier", "union_specifier"],
    field_node_types: &["field_declaration"],
    call_node_types: &["call_expression"],
    import_node_types: &["preproc_include"],
    variable_node_types: &["declaration"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "switch_statement",
        "conditional_expression",
    ],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["Makefile", "CMakeLists.txt"],
};

const CPP: LanguageSpec = LanguageSpec {
    language: Language::Cpp,
    function_node_types: &["function_definition"],
    class_node_types: &[
        "class_specifier",
        "struct_specifier",
        "enum_specifier",
        "union_specifier",
    ],
    field_node_types: &["field_declaration"],
    call_node_types: &["call_expression"],
    import_node_types: &["preproc_include"],
    variable_node_types: &["declaration"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "switch_statement",
        "conditional_expression",
        "catch_clause",
    ],
    throw_node_types: &["throw_statement"],
    throws_clause_field: None,
    package_indicators: &["CMakeLists.txt"],
};

const CSHARP: LanguageSpec = LanguageSpec {
    language: Language::CSharp,
    function_node_types: &[
        "method_declaration",
        "constructor_declaration",
        "local_function_statement",
    ],
    class_node_types: &[
        "class_declaration",
        "interface_declaration",
        "struct_declaration",
        "enum_declaration",
        "record_declaration",
    ],
    field_node_types: &["field_declaration", "property_declaration"],
    call_node_types: &["invocation_expression", "object_creation_expression"],
    import_node_types: &["using_directive"],
    variable_node_types: &["variable_declaration"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "foreach_statement",
        "while_statement",
        "switch_statement",
        "conditional_expression",
        "catch_clause",
    ],
    throw_node_types: &["throw_statement", "throw_expression"],
    throws_clause_field: None,
    package_indicators: &["*.csproj", "*.sln"],
};

const KOTLIN: LanguageSpec = LanguageSpec {
    language: Language::Kotlin,
    function_node_types: &["function_declaration"],
    class_node_types: &["class_declaration", "object_declaration"],
    field_node_types: &["property_declaration"],
    call_node_types: &["call_expression"],
    import_node_types: &["import_header"],
    variable_node_types: &["property_declaration"],
    assignment_node_types: &["assignment"],
    branching_node_types: &[
        "if_expression",
        "for_statement",
        "while_statement",
        "when_expression",
        "catch_block",
    ],
    throw_node_types: &["throw"],
    throws_clause_field: None,
    package_indicators: &["build.gradle.kts", "build.gradle"],
};

const SCALA: LanguageSpec = LanguageSpec {
    language: Language::Scala,
    function_node_types: &["function_definition"],
    class_node_types: &["class_definition", "object_definition", "trait_definition"],
    field_node_types: &["val_definition", "var_definition"],
    call_node_types: &["call_expression"],
    import_node_types: &["import_declaration"],
    variable_node_types: &["val_definition", "var_definition"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &[
        "if_expression",
        "match_expression",
        "for_expression",
        "while_expression",
        "catch_clause",
    ],
    throw_node_types: &["throw_expression"],
    throws_clause_field: None,
    package_indicators: &["build.sbt"],
};

const RUBY: LanguageSpec = LanguageSpec {
    language: Language::Ruby,
    function_node_types: &["method", "singleton_method"],
    class_node_types: &["class", "module"],
    field_node_types: &[],
    call_node_types: &["call"],
    import_node_types: &[],
    variable_node_types: &["assignment"],
    assignment_node_types: &["assignment", "operator_assignment"],
    branching_node_types: &[
        "if",
        "unless",
        "while",
        "until",
        "for",
        "case",
        "rescue",
        "conditional",
    ],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["Gemfile", "*.gemspec"],
};

const PHP: LanguageSpec = LanguageSpec {
    language: Language::Php,
    function_node_types: &["function_definition", "method_declaration"],
    class_node_types: &[
        "class_declaration",
        "interface_declaration",
        "trait_declaration",
        "enum_declaration",
    ],
    field_node_types: &["property_declaration"],
    call_node_types: &[
        "function_call_expression",
        "member_call_expression",
        "scoped_call_expression",
        "object_creation_expression",
    ],
    import_node_types: &["namespace_use_declaration"],
    variable_node_types: &["const_declaration"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "foreach_statement",
        "while_statement",
        "switch_statement",
        "conditional_expression",
        "catch_clause",
    ],
    throw_node_types: &["throw_expression"],
    throws_clause_field: None,
    package_indicators: &["composer.json"],
};

const LUA: LanguageSpec = LanguageSpec {
    language: Language::Lua,
    function_node_types: &["function_declaration", "function_definition"],
    class_node_types: &[],
    field_node_types: &[],
    call_node_types: &["function_call"],
    import_node_types: &[],
    variable_node_types: &["variable_declaration"],
    assignment_node_types: &["assignment_statement", "variable_declaration"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "repeat_statement",
    ],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &[],
};

const SWIFT: LanguageSpec = LanguageSpec {
    language: Language::Swift,
    function_node_types: &["function_declaration", "init_declaration"],
    class_node_types: &["class_declaration", "protocol_declaration"],
    field_node_types: &["property_declaration"],
    call_node_types: &["call_expression"],
    import_node_types: &["import_declaration"],
    variable_node_types: &["property_declaration"],
    assignment_node_types: &["assignment"],
    branching_node_types: &[
        "if_statement",
        "guard_statement",
        "for_statement",
        "while_statement",
        "switch_statement",
        "catch_block",
    ],
    throw_node_types: &["throw_keyword"],
    throws_clause_field: Some("throws"),
    package_indicators: &["Package.swift"],
};

const DART: LanguageSpec = LanguageSpec {
    language: Language::Dart,
    function_node_types: &["function_signature", "method_signature"],
    class_node_types: &["class_definition", "enum_declaration", "mixin_declaration"],
    field_node_types: &["declaration"],
    call_node_types: &["invocation_expression"],
    import_node_types: &["import_specification"],
    variable_node_types: &["initialized_variable_definition"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "switch_statement",
        "catch_clause",
    ],
    throw_node_types: &["throw_expression"],
    throws_clause_field: None,
    package_indicators: &["pubspec.yaml"],
};

const GROOVY: LanguageSpec = LanguageSpec {
    language: Language::Groovy,
    function_node_types: &["function_definition", "method_definition"],
    class_node_types: &["class_definition", "interface_definition"],
    field_node_types: &["field_declaration"],
    call_node_types: &["method_invocation"],
    import_node_types: &["import_declaration"],
    variable_node_types: &["variable_definition"],
    assignment_node_types: &["assignment"],
    branching_node_types: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "switch_statement",
        "catch_clause",
    ],
    throw_node_types: &["throw_statement"],
    throws_clause_field: None,
    package_indicators: &["build.gradle"],
};

const ELIXIR: LanguageSpec = LanguageSpec {
    language: Language::Elixir,
    // Elixir definitions are ordinary calls (def/defp/defmodule); the
    // extractor special-cases the call targets.
    function_node_types: &[],
    class_node_types: &[],
    field_node_types: &[],
    call_node_types: &["call"],
    import_node_types: &[],
    variable_node_types: &[],
    assignment_node_types: &["binary_operator"],
    branching_node_types: &["if", "case", "cond", "with", "rescue_block"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["mix.exs"],
};

const HASKELL: LanguageSpec = LanguageSpec {
    language: Language::Haskell,
    function_node_types: &["function"],
    class_node_types: &["data_type", "newtype", "type_synomym", "class"],
    field_node_types: &["field"],
    call_node_types: &["apply"],
    import_node_types: &["import"],
    variable_node_types: &["bind"],
    assignment_node_types: &[],
    branching_node_types: &["conditional", "case", "guards"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["*.cabal", "stack.yaml"],
};

const OCAML: LanguageSpec = LanguageSpec {
    language: Language::OCaml,
    function_node_types: &["let_binding"],
    class_node_types: &["type_definition", "module_definition"],
    field_node_types: &["field_declaration"],
    call_node_types: &["application_expression"],
    import_node_types: &["open_module"],
    variable_node_types: &["value_definition"],
    assignment_node_types: &[],
    branching_node_types: &["if_expression", "match_expression", "try_expression"],
    throw_node_types: &["raise_expression"],
    throws_clause_field: None,
    package_indicators: &["dune-project"],
};

const ERLANG: LanguageSpec = LanguageSpec {
    language: Language::Erlang,
    function_node_types: &["fun_decl"],
    class_node_types: &[],
    field_node_types: &["record_field"],
    call_node_types: &["call"],
    import_node_types: &["import_attribute"],
    variable_node_types: &[],
    assignment_node_types: &["match_expr"],
    branching_node_types: &["if_expr", "case_expr", "receive_expr", "try_expr"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["rebar.config"],
};

const ZIG: LanguageSpec = LanguageSpec {
    language: Language::Zig,
    function_node_types: &["function_declaration"],
    class_node_types: &["container_declaration"],
    field_node_types: &["container_field"],
    call_node_types: &["call_expression"],
    import_node_types: &[],
    variable_node_types: &["variable_declaration"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &["if_expression", "for_expression", "while_expression", "switch_expression"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["build.zig"],
};

const R: LanguageSpec = LanguageSpec {
    language: Language::R,
    // `f <- function(...)` names live on the assignment; handled by the
    // anonymous-assignment quirk.
    function_node_types: &["function_definition"],
    class_node_types: &[],
    field_node_types: &[],
    call_node_types: &["call"],
    import_node_types: &[],
    variable_node_types: &["binary_operator"],
    assignment_node_types: &["binary_operator"],
    branching_node_types: &["if_statement", "for_statement", "while_statement", "repeat_statement"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["DESCRIPTION"],
};

const PERL: LanguageSpec = LanguageSpec {
    language: Language::Perl,
    function_node_types: &["subroutine_declaration_statement"],
    class_node_types: &["package_statement"],
    field_node_types: &[],
    call_node_types: &["function_call_expression", "method_call_expression"],
    import_node_types: &["use_statement"],
    variable_node_types: &["variable_declaration"],
    assignment_node_types: &["assignment_expression"],
    branching_node_types: &["conditional_statement", "for_statement", "while_statement"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &["Makefile.PL", "cpanfile"],
};

const SQL: LanguageSpec = LanguageSpec {
    language: Language::Sql,
    function_node_types: &["create_function_statement"],
    class_node_types: &["create_table_statement", "create_view_statement"],
    field_node_types: &["column_definition"],
    call_node_types: &["invocation"],
    import_node_types: &[],
    variable_node_types: &[],
    assignment_node_types: &[],
    branching_node_types: &["case_expression"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &[],
};

const YAML: LanguageSpec = LanguageSpec {
    language: Language::Yaml,
    function_node_types: &[],
    class_node_types: &[],
    field_node_types: &[],
    call_node_types: &[],
    import_node_types: &[],
    variable_node_types: &[],
    assignment_node_types: &[],
    branching_node_types: &[],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &[],
};

const HCL: LanguageSpec = LanguageSpec {
    language: Language::Hcl,
    function_node_types: &[],
    // HCL blocks become typed symbols named block-kind.label.label.
    class_node_types: &["block"],
    field_node_types: &["attribute"],
    call_node_types: &["function_call"],
    import_node_types: &[],
    variable_node_types: &["attribute"],
    assignment_node_types: &["attribute"],
    branching_node_types: &["conditional"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &[],
};

const SCSS: LanguageSpec = LanguageSpec {
    language: Language::Scss,
    function_node_types: &["mixin_statement", "function_statement"],
    class_node_types: &[],
    field_node_types: &[],
    call_node_types: &["include_statement"],
    import_node_types: &["use_statement", "import_statement"],
    variable_node_types: &["declaration"],
    assignment_node_types: &["declaration"],
    branching_node_types: &["if_statement", "each_statement", "for_statement"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &[],
};

const BASH: LanguageSpec = LanguageSpec {
    language: Language::Bash,
    function_node_types: &["function_definition"],
    class_node_types: &[],
    field_node_types: &[],
    call_node_types: &["command"],
    import_node_types: &[],
    variable_node_types: &["variable_assignment"],
    assignment_node_types: &["variable_assignment"],
    branching_node_types: &["if_statement", "for_statement", "while_statement", "case_statement"],
    throw_node_types: &[],
    throws_clause_field: None,
    package_indicators: &[],
};

static ALL: [Language; 30] = [
    Language::Go,
    Language::Python,
    Language::Rust,
    Language::JavaScript,
    Language::TypeScript,
    Language::Tsx,
    Language::Java,
    Language::C,
    Language::Cpp,
    Language::CSharp,
    Language::Kotlin,
    Language::Scala,
    Language::Ruby,
    Language::Php,
    Language::Lua,
    Language::Swift,
    Language::Dart,
    Language::Groovy,
    Language::Elixir,
    Language::Haskell,
    Language::OCaml,
    Language::Erlang,
    Language::Zig,
    Language::R,
    Language::Perl,
    Language::Sql,
    Language::Yaml,
    Language::Hcl,
    Language::Scss,
    Language::Bash,
];

/// All languages with a spec entry.
pub fn all_languages() -> &'static [Language] {
    &ALL
}

/// Spec table for a language. `None` never happens for the built-in set but
/// the contract keeps a missing spec non-fatal.
pub fn for_language(language: Language) -> Option<&'static LanguageSpec> {
    let spec = match language {
        Language::Go => &GO,
        Language::Python => &PYTHON,
        Language::Rust => &RUST,
        Language::JavaScript => &JAVASCRIPT,
        Language::TypeScript => &TYPESCRIPT,
        Language::Tsx => &TSX,
        Language::Java => &JAVA,
        Language::C => &C,
        Language::Cpp => &CPP,
        Language::CSharp => &CSHARP,
        Language::Kotlin => &KOTLIN,
        Language::Scala => &SCALA,
        Language::Ruby => &RUBY,
        Language::Php => &PHP,
        Language::Lua => &LUA,
        Language::Swift => &SWIFT,
        Language::Dart => &DART,
        Language::Groovy => &GROOVY,
        Language::Elixir => &ELIXIR,
        Language::Haskell => &HASKELL,
        Language::OCaml => &OCAML,
        Language::Erlang => &ERLANG,
        Language::Zig => &ZIG,
        Language::R => &R,
        Language::Perl => &PERL,
        Language::Sql => &SQL,
        Language::Yaml => &YAML,
        Language::Hcl => &HCL,
        Language::Scss => &SCSS,
        Language::Bash => &BASH,
    };
    Some(spec)
}
