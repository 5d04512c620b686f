//! Language detection and the per-language AST spec registry.
//!
//! The spec registry is pure configuration: for each supported language it
//! names the tree-sitter node kinds that mean function, class, call,
//! import, variable, assignment, branch and throw, plus the filenames whose
//! presence marks a directory as a package. It is consulted during every
//! pass and never mutated at runtime. A missing spec is non-fatal: the file
//! is skipped past structural indexing.

mod specs;

pub use specs::{LanguageSpec, all_languages, for_language};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Go,
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Tsx,
    Java,
    C,
    Cpp,
    CSharp,
    Kotlin,
    Scala,
    Ruby,
    Php,
    Lua,
    Swift,
    Dart,
    Groovy,
    Elixir,
    Haskell,
    OCaml,
    Erlang,
    Zig,
    R,
    Perl,
    Sql,
    Yaml,
    Hcl,
    Scss,
    Bash,
}

impl Language {
    /// Detect language from a file extension (lowercased).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "go" => Some(Self::Go),
            "py" | "pyi" => Some(Self::Python),
            "rs" => Some(Self::Rust),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "java" => Some(Self::Java),
            "c" | "h" => Some(Self::C),
            "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Some(Self::Cpp),
            "cs" => Some(Self::CSharp),
            "kt" | "kts" => Some(Self::Kotlin),
            "scala" | "sc" => Some(Self::Scala),
            "rb" | "rake" | "gemspec" => Some(Self::Ruby),
            "php" | "php5" | "php7" | "php8" | "phtml" => Some(Self::Php),
            "lua" => Some(Self::Lua),
            "swift" => Some(Self::Swift),
            "dart" => Some(Self::Dart),
            "groovy" | "gradle" => Some(Self::Groovy),
            "ex" | "exs" => Some(Self::Elixir),
            "hs" => Some(Self::Haskell),
            "ml" | "mli" => Some(Self::OCaml),
            "erl" | "hrl" => Some(Self::Erlang),
            "zig" => Some(Self::Zig),
            "r" => Some(Self::R),
            "pl" | "pm" => Some(Self::Perl),
            "sql" => Some(Self::Sql),
            "yml" | "yaml" => Some(Self::Yaml),
            "tf" | "hcl" => Some(Self::Hcl),
            "scss" => Some(Self::Scss),
            "sh" | "bash" => Some(Self::Bash),
            _ => None,
        }
    }

    /// Detect language from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Key used for per-language configuration sections.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Lua => "lua",
            Self::Swift => "swift",
            Self::Dart => "dart",
            Self::Groovy => "groovy",
            Self::Elixir => "elixir",
            Self::Haskell => "haskell",
            Self::OCaml => "ocaml",
            Self::Erlang => "erlang",
            Self::Zig => "zig",
            Self::R => "r",
            Self::Perl => "perl",
            Self::Sql => "sql",
            Self::Yaml => "yaml",
            Self::Hcl => "hcl",
            Self::Scss => "scss",
            Self::Bash => "bash",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Go => "Go",
            Self::Python => "Python",
            Self::Rust => "Rust",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Tsx => "TSX",
            Self::Java => "Java",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::CSharp => "C#",
            Self::Kotlin => "Kotlin",
            Self::Scala => "Scala",
            Self::Ruby => "Ruby",
            Self::Php => "PHP",
            Self::Lua => "Lua",
            Self::Swift => "Swift",
            Self::Dart => "Dart",
            Self::Groovy => "Groovy",
            Self::Elixir => "Elixir",
            Self::Haskell => "Haskell",
            Self::OCaml => "OCaml",
            Self::Erlang => "Erlang",
            Self::Zig => "Zig",
            Self::R => "R",
            Self::Perl => "Perl",
            Self::Sql => "SQL",
            Self::Yaml => "YAML",
            Self::Hcl => "HCL",
            Self::Scss => "SCSS",
            Self::Bash => "Bash",
        }
    }

    /// Languages that are configuration rather than program code. These
    /// stop at structural indexing and feed the CONFIGURES heuristic.
    pub fn is_config_language(&self) -> bool {
        matches!(self, Self::Yaml | Self::Hcl | Self::Scss)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_from_extension() {
        assert_eq!(Language::from_extension("go"), Some(Language::Go));
        assert_eq!(Language::from_extension("PY"), Some(Language::Python));
        assert_eq!(Language::from_extension("tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_extension("hpp"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("tf"), Some(Language::Hcl));
        assert_eq!(Language::from_extension("md"), None);
    }

    #[test]
    fn detection_from_path() {
        assert_eq!(
            Language::from_path(Path::new("pkg/server/main.go")),
            Some(Language::Go)
        );
        assert_eq!(Language::from_path(Path::new("README")), None);
    }

    #[test]
    fn every_language_has_a_spec() {
        for lang in all_languages() {
            let spec = for_language(*lang);
            assert!(spec.is_some(), "missing spec for {lang}");
        }
    }

    #[test]
    fn spec_tables_are_consistent() {
        // A language that declares a throws clause field must also declare
        // function node kinds, since the clause hangs off a function.
        for lang in all_languages() {
            let spec = for_language(*lang).unwrap();
            if spec.throws_clause_field.is_some() {
                assert!(
                    !spec.function_node_types.is_empty(),
                    "{lang} declares a throws clause but no functions"
                );
            }
        }
    }
}
