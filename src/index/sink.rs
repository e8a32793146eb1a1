//! Sinks that receive index occurrences for the file being indexed.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;

use super::{IndexId, IndexKey};

/// Receives occurrences for one file. The file is implicit: a sink is
/// created per file by whoever drives the indexing.
pub trait IndexSink {
    fn occurrence(&mut self, key: IndexKey, value: &str);
}

/// One (index, key) pair reported for a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Occurrence {
    #[serde(rename = "index")]
    pub key: IndexKey,
    #[serde(rename = "key")]
    pub value: String,
}

impl Occurrence {
    pub fn new(key: IndexKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    pub fn index(&self) -> IndexId {
        self.key.id()
    }
}

/// Sink that simply records everything it receives.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceCollector {
    occurrences: Vec<Occurrence>,
}

impl OccurrenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Values recorded for one index, in report order.
    pub fn values(&self, index: IndexId) -> Vec<&str> {
        self.occurrences
            .iter()
            .filter(|o| o.index() == index)
            .map(|o| o.value.as_str())
            .collect()
    }

    /// Sorted, de-duplicated occurrences.
    ///
    /// Sinks are order-insensitive, so this is the canonical form for
    /// comparing two runs.
    pub fn into_sorted(mut self) -> Vec<Occurrence> {
        self.occurrences.sort();
        self.occurrences.dedup();
        self.occurrences
    }
}

impl IndexSink for OccurrenceCollector {
    fn occurrence(&mut self, key: IndexKey, value: &str) {
        self.occurrences.push(Occurrence::new(key, value));
    }
}

/// Include/exclude filter over index names.
///
/// An empty include list admits every index.
#[derive(Debug, Clone)]
pub struct IndexFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl IndexFilter {
    /// Admits every index.
    pub fn all() -> Self {
        Self {
            include: None,
            exclude: None,
        }
    }

    /// Build a filter from glob patterns such as `classes-*`.
    pub fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: build_glob_set(include)?,
            exclude: build_glob_set(exclude)?,
        })
    }

    pub fn allows(&self, index: IndexId) -> bool {
        let name = index.as_str();
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(name) {
                return false;
            }
        }
        match &self.include {
            Some(include) => include.is_match(name),
            None => true,
        }
    }

    pub fn is_all(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}

impl Default for IndexFilter {
    fn default() -> Self {
        Self::all()
    }
}

fn build_glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid index pattern {:?}: {}", pattern, e))?;
        builder.add(glob);
    }
    Ok(Some(builder.build()?))
}

/// Forwards only occurrences whose index passes the filter.
pub struct FilteringSink<'a, S: IndexSink> {
    inner: &'a mut S,
    filter: &'a IndexFilter,
}

impl<'a, S: IndexSink> FilteringSink<'a, S> {
    pub fn new(inner: &'a mut S, filter: &'a IndexFilter) -> Self {
        Self { inner, filter }
    }
}

impl<S: IndexSink> IndexSink for FilteringSink<'_, S> {
    fn occurrence(&mut self, key: IndexKey, value: &str) {
        if self.filter.allows(key.id()) {
            self.inner.occurrence(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexRegistry;

    #[test]
    fn test_collector_sorts_and_dedups() {
        let registry = IndexRegistry::global();
        let mut sink = OccurrenceCollector::new();
        sink.occurrence(registry.key(IndexId::SupertypeReferences), "B");
        sink.occurrence(registry.key(IndexId::ClassesByShortName), "A");
        sink.occurrence(registry.key(IndexId::SupertypeReferences), "B");

        assert_eq!(sink.values(IndexId::SupertypeReferences), vec!["B", "B"]);

        let sorted = sink.into_sorted();
        assert_eq!(
            sorted,
            vec![
                Occurrence::new(registry.key(IndexId::ClassesByShortName), "A"),
                Occurrence::new(registry.key(IndexId::SupertypeReferences), "B"),
            ]
        );
    }

    #[test]
    fn test_filter_include_and_exclude() {
        let filter = IndexFilter::new(
            &["classes-*".to_string()],
            &["classes-by-package".to_string()],
        )
        .unwrap();
        assert!(filter.allows(IndexId::ClassesByShortName));
        assert!(filter.allows(IndexId::ClassesByFullName));
        assert!(!filter.allows(IndexId::ClassesByPackage));
        assert!(!filter.allows(IndexId::FunctionsByShortName));
        assert!(IndexFilter::all().allows(IndexId::AnnotationsByShortName));
    }

    #[test]
    fn test_filter_rejects_bad_glob() {
        assert!(IndexFilter::new(&["[".to_string()], &[]).is_err());
    }

    #[test]
    fn test_filtering_sink() {
        let registry = IndexRegistry::global();
        let filter = IndexFilter::new(&["*-functions-*".to_string()], &[]).unwrap();
        let mut collector = OccurrenceCollector::new();
        {
            let mut sink = FilteringSink::new(&mut collector, &filter);
            sink.occurrence(registry.key(IndexId::ClassesByShortName), "A");
            sink.occurrence(
                registry.key(IndexId::TopLevelExtensionFunctionsByShortName),
                "foo",
            );
        }
        assert_eq!(
            collector.values(IndexId::TopLevelExtensionFunctionsByShortName),
            vec!["foo"]
        );
        assert_eq!(collector.into_sorted().len(), 1);
    }

    #[test]
    fn test_occurrence_json_shape() {
        let registry = IndexRegistry::global();
        let o = Occurrence::new(registry.key(IndexId::AnnotationsByShortName), "Deprecated");
        let json = serde_json::to_string(&o).unwrap();
        assert_eq!(
            json,
            r#"{"index":"annotations-by-short-name","key":"Deprecated"}"#
        );
    }
}
