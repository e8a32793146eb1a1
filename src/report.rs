//! Output formatting for index runs.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::{FailureKind, FileFailure, FileIndex, IndexRun};

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub files_indexed: usize,
    pub files_failed: usize,
    pub files_excluded: usize,
    pub files_skipped: usize,
    pub occurrences: Vec<JsonOccurrence>,
    pub failures: Vec<JsonFailure>,
    pub summary: Vec<SummaryEntry>,
}

/// One occurrence, attributed to its source file.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct JsonOccurrence {
    pub file: String,
    pub index: String,
    pub key: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct JsonFailure {
    pub file: String,
    pub kind: String,
    pub message: String,
}

/// Occurrence count for one index.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SummaryEntry {
    pub index: String,
    pub occurrences: usize,
}

/// Build the JSON report structure.
pub fn build_json(path: &str, run: &IndexRun) -> JsonReport {
    let occurrences = run
        .files
        .iter()
        .flat_map(|f| {
            f.occurrences.iter().map(move |o| JsonOccurrence {
                file: f.path.clone(),
                index: o.key.name().to_string(),
                key: o.value.clone(),
            })
        })
        .collect();

    let failures = run.failures.iter().map(failure_to_json).collect();

    let summary = run
        .count_by_index()
        .into_iter()
        .map(|(id, n)| SummaryEntry {
            index: id.as_str().to_string(),
            occurrences: n,
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        files_indexed: run.files.len(),
        files_failed: run.failures.len(),
        files_excluded: run.excluded,
        files_skipped: run.skipped,
        occurrences,
        failures,
        summary,
    }
}

/// Write results in JSON format.
pub fn write_json(path: &str, run: &IndexRun) -> anyhow::Result<()> {
    let report = build_json(path, run);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

fn failure_to_json(f: &FileFailure) -> JsonFailure {
    JsonFailure {
        file: f.stub_file.clone(),
        kind: failure_kind_str(f.kind).to_string(),
        message: f.message.clone(),
    }
}

fn failure_kind_str(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Load => "load",
        FailureKind::Structure => "structure",
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty terminal format.
pub fn write_pretty(path: &str, config_path: Option<&str>, run: &IndexRun) {
    // Header
    println!();
    print!("  ");
    print!("{}", "stubindex".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Indexing: ".dimmed());
    println!("{}", path);
    if let Some(config_path) = config_path {
        print!("  {}", "Config:   ".dimmed());
        println!("{}", config_path);
    }
    println!();

    for file in &run.files {
        write_file(file);
        println!();
    }

    if !run.failures.is_empty() {
        write_failures(&run.failures);
        println!();
    }

    let summary = run.count_by_index();
    if !summary.is_empty() {
        println!("  {}", "Summary:".bold());
        for (id, n) in summary {
            println!("    {:<50} {:>5}", id.as_str(), n);
        }
        println!();
    }

    write_final_status(run);
    println!();
}

fn write_file(file: &FileIndex) {
    print!("  {}", file.path.blue());
    println!("{}", format!("  ({})", file.stub_file).dimmed());

    // Group keys per index, keeping registry order.
    let mut grouped: BTreeMap<_, Vec<&str>> = BTreeMap::new();
    for o in &file.occurrences {
        grouped.entry(o.key).or_default().push(o.value.as_str());
    }

    for (key, values) in grouped {
        let rendered: Vec<String> = values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    "<default>".dimmed().to_string()
                } else {
                    v.to_string()
                }
            })
            .collect();
        println!("    {:<50} {}", key.name().dimmed(), rendered.join(", "));
    }
}

fn write_failures(failures: &[FileFailure]) {
    println!("  {} ({}):", "Failures".bold(), failures.len());
    println!();

    for f in failures {
        match f.kind {
            FailureKind::Structure => print!("    {} ", "DEFECT".red()),
            FailureKind::Load => print!("    {} ", "LOAD  ".yellow()),
        }
        println!("{}", f.stub_file.blue());
        println!("           {}", f.message);
    }
}

fn write_final_status(run: &IndexRun) {
    print!(
        "  {}",
        format!(
            "Files: {} indexed, {} failed",
            run.files.len(),
            run.failures.len()
        )
        .dimmed()
    );
    if run.excluded > 0 {
        print!("{}", format!(", {} excluded", run.excluded).dimmed());
    }
    if run.skipped > 0 {
        print!("{}", format!(", {} skipped", run.skipped).dimmed());
    }
    print!("  Occurrences: {}  ", run.total_occurrences());

    if run.has_failures() {
        print!("{}", "FAILED".red());
    } else {
        print!("{}", "OK".green());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexId, IndexRegistry, Occurrence};

    fn sample_run() -> IndexRun {
        let registry = IndexRegistry::global();
        IndexRun {
            files: vec![FileIndex {
                path: "p/A.kt".to_string(),
                stub_file: "A.stubs.json".to_string(),
                occurrences: vec![
                    Occurrence::new(registry.key(IndexId::PackagesByName), "p"),
                    Occurrence::new(registry.key(IndexId::ClassesByShortName), "A"),
                ],
            }],
            failures: vec![FileFailure {
                stub_file: "B.stubs.json".to_string(),
                kind: FailureKind::Structure,
                message: "boom".to_string(),
            }],
            excluded: 0,
            skipped: 0,
        }
    }

    #[test]
    fn test_build_json() {
        let report = build_json("stubs", &sample_run());
        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.files_failed, 1);
        assert_eq!(
            report.occurrences[1],
            JsonOccurrence {
                file: "p/A.kt".to_string(),
                index: "classes-by-short-name".to_string(),
                key: "A".to_string(),
            }
        );
        assert_eq!(report.failures[0].kind, "structure");
        assert_eq!(
            report.summary,
            vec![
                SummaryEntry {
                    index: "packages-by-name".to_string(),
                    occurrences: 1,
                },
                SummaryEntry {
                    index: "classes-by-short-name".to_string(),
                    occurrences: 1,
                },
            ]
        );
    }

    #[test]
    fn test_json_serializes() {
        let report = build_json("stubs", &sample_run());
        let json = serde_json::to_string(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["occurrences"][0]["index"], "packages-by-name");
        assert_eq!(parsed["failures"][0]["message"], "boom");
    }
}
