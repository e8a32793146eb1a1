//! Host-side indexing engine.
//!
//! The extractor in [`crate::index`] handles one stub at a time. This module
//! owns the traversal: it visits every stub of a tree, dispatches on the stub
//! kind, and runs many files in parallel, each into its own sink.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::index::{
    FilteringSink, IndexFilter, IndexId, IndexSink, Occurrence, OccurrenceCollector,
    StubIndexError, StubIndexService, StubIndexServiceImpl,
};
use crate::stubs::{StubData, StubDocument, StubRef, StubTree};

/// Dispatch one stub to the extractor operation for its kind.
///
/// Structural wrappers contribute nothing.
pub fn index_stub(
    service: &dyn StubIndexService,
    node: StubRef<'_>,
    sink: &mut dyn IndexSink,
) -> Result<(), StubIndexError> {
    match node.data() {
        StubData::File(d) => service.index_file(&node.typed(d), sink),
        StubData::Class(d) => service.index_class(&node.typed(d), sink),
        StubData::Object(d) => service.index_object(&node.typed(d), sink)?,
        StubData::Function(d) => service.index_function(&node.typed(d), sink),
        StubData::Property(d) => service.index_property(&node.typed(d), sink),
        StubData::AnnotationEntry(d) => service.index_annotation(&node.typed(d), sink),
        StubData::Wrapper(_) => {}
    }
    Ok(())
}

/// Index every stub of a tree in pre-order.
///
/// Stops at the first structural defect. Occurrences already reported for
/// the file must then be discarded by the caller.
pub fn index_tree(
    service: &dyn StubIndexService,
    tree: &StubTree,
    sink: &mut dyn IndexSink,
) -> Result<(), StubIndexError> {
    for node in tree.iter() {
        index_stub(service, node, sink)?;
    }
    Ok(())
}

/// Index results for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileIndex {
    /// Source path recorded in the stub document.
    pub path: String,
    /// Stub document the tree was loaded from.
    pub stub_file: String,
    /// Sorted and de-duplicated.
    pub occurrences: Vec<Occurrence>,
}

/// Why a file produced no index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The stub document could not be read or parsed.
    Load,
    /// The stub tree violates its shape contract.
    Structure,
}

/// A file whose indexing was aborted.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub stub_file: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Results of indexing a batch of files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexRun {
    pub files: Vec<FileIndex>,
    pub failures: Vec<FileFailure>,
    /// Files matched by `excluded_paths`.
    pub excluded: usize,
    /// Files not started because an earlier file failed in fail-fast mode.
    pub skipped: usize,
}

impl IndexRun {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn total_occurrences(&self) -> usize {
        self.files.iter().map(|f| f.occurrences.len()).sum()
    }

    /// Occurrence counts per index across all files, in registry order.
    pub fn count_by_index(&self) -> Vec<(IndexId, usize)> {
        let mut counts = [0usize; IndexId::ALL.len()];
        for o in self.files.iter().flat_map(|f| &f.occurrences) {
            counts[o.index() as usize] += 1;
        }
        IndexId::ALL
            .iter()
            .zip(counts)
            .filter(|(_, n)| *n > 0)
            .map(|(id, n)| (*id, n))
            .collect()
    }
}

enum Outcome {
    Indexed(FileIndex),
    Failed(FileFailure),
    Excluded,
    Skipped,
}

/// Indexes a set of stub documents in parallel.
pub struct Indexer {
    base_dir: PathBuf,
    service: StubIndexServiceImpl<'static>,
    filter: IndexFilter,
    config: IndexConfig,
}

impl Indexer {
    /// Create an indexer; paths in results are reported relative to `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            service: StubIndexServiceImpl::global(),
            filter: IndexFilter::all(),
            config: IndexConfig::default(),
        }
    }

    /// Apply a validated config.
    pub fn with_config(mut self, config: IndexConfig) -> anyhow::Result<Self> {
        self.filter = config.index_filter()?;
        self.config = config;
        Ok(self)
    }

    /// Replace the index filter (overrides the config's selection).
    pub fn filter(mut self, filter: IndexFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = Some(fail_fast);
        self
    }

    pub fn threads(mut self, threads: Option<usize>) -> Self {
        if threads.is_some() {
            self.config.threads = threads;
        }
        self
    }

    /// Index the given stub documents.
    ///
    /// A failing file never affects the results of another. Output is sorted
    /// by stub file path so runs are deterministic.
    pub fn run(&self, files: &[PathBuf]) -> anyhow::Result<IndexRun> {
        let cancelled = AtomicBool::new(false);
        let work = || -> Vec<Outcome> {
            files
                .par_iter()
                .map(|path| self.index_path(path, &cancelled))
                .collect()
        };

        let outcomes = match self.config.threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()?
                .install(work),
            None => work(),
        };

        let mut run = IndexRun::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Indexed(file) => run.files.push(file),
                Outcome::Failed(failure) => run.failures.push(failure),
                Outcome::Excluded => run.excluded += 1,
                Outcome::Skipped => run.skipped += 1,
            }
        }

        run.files.sort_by(|a, b| a.stub_file.cmp(&b.stub_file));
        run.failures.sort_by(|a, b| a.stub_file.cmp(&b.stub_file));

        Ok(run)
    }

    /// Index one already-loaded document.
    pub fn index_document(
        &self,
        doc: &StubDocument,
        stub_file: &str,
    ) -> Result<FileIndex, FileFailure> {
        let tree = doc.to_tree().map_err(|e| FileFailure {
            stub_file: stub_file.to_string(),
            kind: FailureKind::Structure,
            message: e.to_string(),
        })?;

        let mut collector = OccurrenceCollector::new();
        let result = if self.filter.is_all() {
            index_tree(&self.service, &tree, &mut collector)
        } else {
            let mut sink = FilteringSink::new(&mut collector, &self.filter);
            index_tree(&self.service, &tree, &mut sink)
        };

        match result {
            Ok(()) => Ok(FileIndex {
                path: doc.path.clone(),
                stub_file: stub_file.to_string(),
                occurrences: collector.into_sorted(),
            }),
            // Partial occurrences are dropped with the collector.
            Err(e) => Err(FileFailure {
                stub_file: stub_file.to_string(),
                kind: FailureKind::Structure,
                message: e.to_string(),
            }),
        }
    }

    fn index_path(&self, path: &Path, cancelled: &AtomicBool) -> Outcome {
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
        let rel_path = relative.to_string_lossy().to_string();

        // Patterns may be written relative to the base dir or as `**/` globs.
        if self.config.is_path_excluded(relative) || self.config.is_path_excluded(path) {
            debug!(path = %rel_path, "excluded");
            return Outcome::Excluded;
        }

        if cancelled.load(Ordering::SeqCst) {
            return Outcome::Skipped;
        }

        let doc = match StubDocument::parse_file(path) {
            Ok(doc) => doc,
            Err(e) => {
                let message = format!("{:#}", e);
                warn!(path = %rel_path, error = %message, "failed to load stub document");
                self.cancel_if_fail_fast(cancelled);
                return Outcome::Failed(FileFailure {
                    stub_file: rel_path,
                    kind: FailureKind::Load,
                    message,
                });
            }
        };

        match self.index_document(&doc, &rel_path) {
            Ok(file) => {
                debug!(
                    path = %rel_path,
                    occurrences = file.occurrences.len(),
                    "indexed file"
                );
                Outcome::Indexed(file)
            }
            Err(failure) => {
                warn!(path = %rel_path, error = %failure.message, "failed to index file");
                self.cancel_if_fail_fast(cancelled);
                Outcome::Failed(failure)
            }
        }
    }

    fn cancel_if_fail_fast(&self, cancelled: &AtomicBool) {
        if self.config.should_fail_fast() {
            cancelled.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexRegistry;
    use tempfile::TempDir;

    const SIMPLE: &str = r#"
{
  "path": "p/q/A.kt",
  "package": "p.q",
  "children": [
    { "kind": "class", "name": "A", "fq_name": "p.q.A", "super_names": ["B", "C"], "top_level": true },
    { "kind": "function", "name": "foo", "fq_name": "p.q.foo", "top_level": true, "extension": true }
  ]
}
"#;

    const BROKEN_OWNER: &str = r#"
{
  "path": "p/Broken.kt",
  "package": "p",
  "children": [
    { "kind": "class_body", "children": [
      { "kind": "class_object", "children": [
        { "kind": "object", "class_object": true }
      ]}
    ]},
    { "kind": "class", "name": "Fine", "fq_name": "p.Fine", "top_level": true }
  ]
}
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_index_tree_dispatches_every_kind() {
        let doc: StubDocument = serde_json::from_str(SIMPLE).unwrap();
        let tree = doc.to_tree().unwrap();
        let service = StubIndexServiceImpl::global();
        let mut sink = OccurrenceCollector::new();
        index_tree(&service, &tree, &mut sink).unwrap();

        assert_eq!(sink.values(IndexId::PackagesByName), vec!["p.q"]);
        assert_eq!(sink.values(IndexId::ClassesByPackage), vec!["p.q"]);
        assert_eq!(
            sink.values(IndexId::TopLevelExtensionFunctionsByShortName),
            vec!["foo"]
        );
        assert_eq!(
            sink.values(IndexId::TopLevelFunctionsByFullName),
            vec!["p.q.foo"]
        );
    }

    #[test]
    fn test_wrappers_emit_nothing() {
        let doc: StubDocument = serde_json::from_str(
            r#"{ "path": "a.kt", "children": [ { "kind": "modifier_list" } ] }"#,
        )
        .unwrap();
        let tree = doc.to_tree().unwrap();
        let wrapper = tree.iter().nth(1).unwrap();

        let mut sink = OccurrenceCollector::new();
        index_stub(&StubIndexServiceImpl::global(), wrapper, &mut sink).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_run_isolates_failures() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "a.stubs.json", SIMPLE);
        let bad = write(temp.path(), "broken.stubs.json", BROKEN_OWNER);
        let garbage = write(temp.path(), "garbage.stubs.json", "{ not json");

        let run = Indexer::new(temp.path())
            .run(&[good, bad, garbage])
            .unwrap();

        assert_eq!(run.files.len(), 1);
        assert_eq!(run.files[0].stub_file, "a.stubs.json");
        assert_eq!(run.files[0].path, "p/q/A.kt");

        assert_eq!(run.failures.len(), 2);
        assert_eq!(run.failures[0].stub_file, "broken.stubs.json");
        assert_eq!(run.failures[0].kind, FailureKind::Structure);
        assert!(run.failures[0].message.contains("class object"));
        assert_eq!(run.failures[1].kind, FailureKind::Load);
        assert!(run.has_failures());
    }

    #[test]
    fn test_run_with_filter_and_threads() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "a.stubs.json", SIMPLE);

        let filter = IndexFilter::new(&["classes-*".to_string()], &[]).unwrap();
        let run = Indexer::new(temp.path())
            .filter(filter)
            .threads(Some(2))
            .run(&[good])
            .unwrap();

        let registry = IndexRegistry::global();
        assert_eq!(
            run.files[0].occurrences,
            vec![
                Occurrence::new(registry.key(IndexId::ClassesByShortName), "A"),
                Occurrence::new(registry.key(IndexId::ClassesByFullName), "p.q.A"),
                Occurrence::new(registry.key(IndexId::ClassesByPackage), "p.q"),
            ]
        );
        assert_eq!(
            run.count_by_index(),
            vec![
                (IndexId::ClassesByShortName, 1),
                (IndexId::ClassesByFullName, 1),
                (IndexId::ClassesByPackage, 1),
            ]
        );
    }

    #[test]
    fn test_fail_fast_on_single_thread() {
        let temp = TempDir::new().unwrap();
        let bad = write(temp.path(), "broken.stubs.json", BROKEN_OWNER);
        let good = write(temp.path(), "a.stubs.json", SIMPLE);

        let run = Indexer::new(temp.path())
            .fail_fast(true)
            .threads(Some(1))
            .run(&[bad, good])
            .unwrap();

        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.files.len() + run.skipped, 1);
    }

    #[test]
    fn test_excluded_paths() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("generated")).unwrap();
        let skipped = write(&temp.path().join("generated"), "a.stubs.json", SIMPLE);
        let kept = write(temp.path(), "b.stubs.json", SIMPLE);

        let config = IndexConfig {
            excluded_paths: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        let run = Indexer::new(temp.path())
            .with_config(config)
            .unwrap()
            .run(&[skipped, kept])
            .unwrap();

        assert_eq!(run.excluded, 1);
        assert_eq!(run.files.len(), 1);
        assert_eq!(run.files[0].stub_file, "b.stubs.json");
    }

    #[test]
    fn test_excluded_paths_relative_to_base_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("broken")).unwrap();
        let bad = write(&temp.path().join("broken"), "bad.stubs.json", BROKEN_OWNER);
        let kept = write(temp.path(), "a.stubs.json", SIMPLE);

        let config = IndexConfig {
            excluded_paths: vec!["broken/*.stubs.json".to_string()],
            ..Default::default()
        };
        let run = Indexer::new(temp.path())
            .with_config(config)
            .unwrap()
            .run(&[bad, kept])
            .unwrap();

        assert_eq!(run.excluded, 1);
        assert!(!run.has_failures());
        assert_eq!(run.files.len(), 1);
        assert_eq!(run.files[0].stub_file, "a.stubs.json");
    }
}
