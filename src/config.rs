//! Indexing configuration.
//!
//! Loaded from YAML. Every field is optional; a missing config file means
//! "index everything with default settings".

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::index::{IndexFilter, IndexId};

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["stubindex.yaml", ".stubindex.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct IndexConfig {
    #[serde(default)]
    pub version: String,
    /// Which indexes to report.
    #[serde(default)]
    pub indexes: IndexSelection,
    /// Glob patterns for stub documents to skip (e.g., "**/generated/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Stop scheduling new files after the first structural defect.
    #[serde(default)]
    pub fail_fast: Option<bool>,
    /// Worker threads (default: rayon's global pool).
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Include/exclude globs over index names.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct IndexSelection {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl IndexConfig {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: IndexConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Returns whether to stop on the first defect (defaults to false).
    pub fn should_fail_fast(&self) -> bool {
        self.fail_fast.unwrap_or(false)
    }

    /// Build the index filter described by `indexes`.
    pub fn index_filter(&self) -> anyhow::Result<IndexFilter> {
        IndexFilter::new(&self.indexes.include, &self.indexes.exclude)
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                if glob.compile_matcher().is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }
}

/// Look for a config file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Validate a config.
pub fn validate(config: &IndexConfig) -> anyhow::Result<()> {
    if let Some(0) = config.threads {
        anyhow::bail!("threads must be at least 1");
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    let filter = config.index_filter()?;

    // Plain names, in either list, must spell a known index exactly.
    for pattern in config.indexes.include.iter().chain(&config.indexes.exclude) {
        let is_literal = !pattern.contains(['*', '?', '[', '{']);
        if is_literal && IndexId::parse(pattern).is_none() {
            anyhow::bail!("unknown index {:?}", pattern);
        }
    }

    // An include pattern that matches nothing is almost certainly a typo.
    for pattern in &config.indexes.include {
        let single = IndexFilter::new(std::slice::from_ref(pattern), &[])?;
        if !IndexId::ALL.iter().any(|&id| single.allows(id)) {
            anyhow::bail!("index pattern {:?} matches no known index", pattern);
        }
    }

    if !IndexId::ALL.iter().any(|&id| filter.allows(id)) {
        anyhow::bail!("index selection excludes every index");
    }

    Ok(())
}
