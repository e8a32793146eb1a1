//! Stubindex - search-index extraction from declaration stubs.
//!
//! Given the immutable stub tree of one parsed (but unresolved) source file,
//! stubindex computes the lightweight index occurrences every declaration
//! contributes: classes by short and full name, supertype references,
//! top-level functions and properties split by extension-ness, packages and
//! annotation usages. An external index store can then answer "find all
//! classes named X" without re-parsing or resolving anything.
//!
//! # Architecture
//!
//! - `name`: simple and qualified names
//! - `stubs`: the stub tree data model and its JSON interchange format
//! - `index`: index registry, sinks and the per-kind extractor
//! - `engine`: tree traversal and parallel batch indexing
//! - `config`: YAML configuration
//! - `report`: output formatting (pretty, JSON)
//!
//! Supertype references are recorded exactly as written in source. A match
//! in that index is a candidate to be confirmed by full resolution, not proof.

pub mod cli;
pub mod config;
pub mod engine;
pub mod index;
pub mod name;
pub mod report;
pub mod stubs;

pub use config::IndexConfig;
pub use engine::{index_stub, index_tree, FileIndex, IndexRun, Indexer};
pub use index::{
    IndexId, IndexKey, IndexRegistry, IndexSink, Occurrence, OccurrenceCollector,
    StubIndexError, StubIndexService, StubIndexServiceImpl,
};
pub use name::{FqName, Name, CLASS_OBJECT_NAME};
pub use stubs::{StubDocument, StubTree};

/// Initialize shared state.
///
/// Builds the process-wide index registry. Optional: the registry is also
/// built lazily on first use, but hosts that index from many threads may
/// prefer to pay that cost once at startup.
pub fn init() -> &'static IndexRegistry {
    IndexRegistry::global()
}
