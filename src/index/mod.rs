//! Stub index extraction.
//!
//! Maps each declaration stub to the lightweight index occurrences it
//! contributes, so that "all classes named X" or "everything in package P"
//! can be answered later without re-parsing or resolving source.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ Stub tree    │────▶│ StubIndexService │────▶│ IndexSink    │
//! │ (one file)   │     │ (per stub kind)  │     │ (per file)   │
//! └──────────────┘     └──────────────────┘     └──────────────┘
//!                               │
//!                               ▼
//!                      ┌──────────────────┐
//!                      │ IndexRegistry    │
//!                      │ (fixed keys)     │
//!                      └──────────────────┘
//! ```
//!
//! The service never walks the tree itself; see [`crate::engine`] for the
//! host side that visits every stub and dispatches on its kind.

mod keys;
mod service;
mod sink;

pub use keys::{IndexId, IndexKey, IndexRegistry};
pub use service::{StubIndexError, StubIndexService, StubIndexServiceImpl};
pub use sink::{FilteringSink, IndexFilter, IndexSink, Occurrence, OccurrenceCollector};
