//! cartograph: incremental code property graph indexing.
//!
//! A repository is indexed into a typed graph of symbols and relations
//! through a multi-pass pipeline: discovery, structure, definitions, name
//! registry, semantic-edge resolution, and store-only post-processing.
//! Parsing and resolution run CPU-parallel; all store writes are serial
//! and transactional. Re-indexing is incremental via content hashing plus
//! import-dependent-file invalidation.

pub mod config;
pub mod error;
pub mod extract;
pub mod imports;
pub mod infra;
pub mod lang;
pub mod logging;
pub mod parsing;
pub mod passes;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use error::{IndexError, IndexResult, StoreError, StoreResult};
pub use extract::FileInfo;
pub use lang::{Language, LanguageSpec};
pub use pipeline::{CancelToken, Orchestrator, RunStats};
pub use registry::{NameRegistry, Resolution, ResolutionQuery};
pub use storage::{GraphStore, MemoryStore};
pub use types::{Edge, EdgeType, Node, NodeId, NodeLabel, PendingEdge, PropValue};
