//! Parser front-end: tree-sitter grammars, the pre-order walk primitive,
//! and the per-run AST cache.

mod ast_cache;
mod parser;

pub use ast_cache::{AstCache, CachedTree};
pub use parser::{grammar_for, has_grammar, node_text, parse, walk};
