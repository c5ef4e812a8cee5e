//! In-memory representation of one test run, deserialized from the JSON
//! document the test runner writes with `--json --outputFile`.
//!
//! Parsed once by [`crate::parse`] and only read afterwards; annotations and
//! coverage rows are derived from it.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use path_slash::PathExt as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Aggregated results of a single test run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub success: bool,
    pub num_total_tests: u64,
    pub num_passed_tests: u64,
    pub num_failed_tests: u64,
    pub num_total_test_suites: u64,
    pub num_passed_test_suites: u64,
    pub num_failed_test_suites: u64,
    pub test_results: Vec<TestFileResult>,
    #[serde(default)]
    pub coverage_map: Option<CoverageMap>,
}

impl TestRun {
    /// Check the count invariants the runner is expected to uphold.
    pub fn check_counts(&self) -> std::result::Result<(), String> {
        if self.num_passed_tests.saturating_add(self.num_failed_tests) > self.num_total_tests {
            return Err(format!(
                "passed ({}) + failed ({}) tests exceed total ({})",
                self.num_passed_tests, self.num_failed_tests, self.num_total_tests
            ));
        }
        if self.num_passed_test_suites.saturating_add(self.num_failed_test_suites)
            > self.num_total_test_suites
        {
            return Err(format!(
                "passed ({}) + failed ({}) suites exceed total ({})",
                self.num_passed_test_suites,
                self.num_failed_test_suites,
                self.num_total_test_suites
            ));
        }
        Ok(())
    }

    /// All failed assertions paired with the file they belong to, in file
    /// order then assertion order.
    pub fn failed_assertions(&self) -> impl Iterator<Item = (&TestFileResult, &Assertion)> {
        self.test_results.iter().flat_map(|file| {
            file.assertion_results
                .iter()
                .filter(|a| a.status == AssertionStatus::Failed)
                .map(move |a| (file, a))
        })
    }
}

/// Results for one test file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFileResult {
    /// Jest calls this `name` in its JSON output.
    #[serde(alias = "name")]
    pub file_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assertion_results: Vec<Assertion>,
}

/// Outcome of a single `it`/`test` block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    pub status: AssertionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ancestor_titles: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failure_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStatus {
    Passed,
    Failed,
    Pending,
    Todo,
    Skipped,
    Disabled,
    Focused,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub line: u32,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Coverage keyed by absolute source path, in the order the runner wrote it.
pub type CoverageMap = IndexMap<String, FileCoverage>;

/// Raw Istanbul coverage for one file:
///   - `statementMap` + `s`: statement locations and hit counts
///   - `branchMap` + `b`:    branch locations and per-arm hit counts
///   - `fnMap` + `f`:        function locations and hit counts
///
/// Some serializers nest these under a `data` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct FileCoverage(pub Value);

/// Covered/total counts for one coverage metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metric {
    pub total: u64,
    pub covered: u64,
}

impl Metric {
    /// Percentage covered, truncated to two decimals. An empty metric counts
    /// as fully covered.
    #[must_use]
    pub fn pct(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        let covered = self.covered.min(self.total) as f64;
        ((100_000.0 * covered) / self.total as f64 / 10.0).floor() / 100.0
    }
}

/// The four Istanbul summary metrics for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageSummary {
    pub statements: Metric,
    pub branches: Metric,
    pub functions: Metric,
    pub lines: Metric,
}

impl FileCoverage {
    fn data(&self) -> &Value {
        match self.0.get("data") {
            Some(inner) if inner.is_object() => inner,
            _ => &self.0,
        }
    }

    /// Summarize this file, or `None` if the entry is missing any of the
    /// maps a summary needs.
    pub fn summary(&self) -> Option<CoverageSummary> {
        let data = self.data();
        let statement_map = object(data, "statementMap")?;
        let s = object(data, "s")?;
        object(data, "fnMap")?;
        let f = object(data, "f")?;
        object(data, "branchMap")?;
        let b = object(data, "b")?;

        let statements = Metric {
            total: s.len() as u64,
            covered: s.values().filter(|v| hit_count(v) > 0).count() as u64,
        };
        let functions = Metric {
            total: f.len() as u64,
            covered: f.values().filter(|v| hit_count(v) > 0).count() as u64,
        };

        let mut branches = Metric::default();
        for arms in b.values() {
            let arms = arms.as_array()?;
            branches.total += arms.len() as u64;
            branches.covered += arms.iter().filter(|v| hit_count(v) > 0).count() as u64;
        }

        // A line's hit count is the max over the statements starting on it.
        let mut line_hits: HashMap<u64, u64> = HashMap::new();
        for (idx, loc) in statement_map {
            let Some(line) = loc
                .get("start")
                .and_then(|start| start.get("line"))
                .and_then(Value::as_u64)
            else {
                continue;
            };
            let count = s.get(idx.as_str()).map(hit_count).unwrap_or(0);
            line_hits
                .entry(line)
                .and_modify(|e| *e = (*e).max(count))
                .or_insert(count);
        }
        let lines = Metric {
            total: line_hits.len() as u64,
            covered: line_hits.values().filter(|&&c| c > 0).count() as u64,
        };

        Some(CoverageSummary {
            statements,
            branches,
            functions,
            lines,
        })
    }
}

fn object<'a>(data: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    data.get(key).and_then(Value::as_object)
}

fn hit_count(v: &Value) -> u64 {
    v.as_u64().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    Failure,
}

/// A single annotation to attach to a GitHub check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    /// Source file path relative to the repo root.
    pub path: String,
    /// 1-based; 0 when the runner reported no location.
    pub start_line: u32,
    pub end_line: u32,
    pub annotation_level: AnnotationLevel,
    pub title: String,
    pub message: String,
}

/// Strip `base` from `path` and normalize separators to `/`. Paths outside
/// `base` are returned unchanged.
#[must_use]
pub fn relative_path(path: &str, base: &Path) -> String {
    match Path::new(path).strip_prefix(base) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_slash_lossy().into_owned(),
        _ => path.to_string(),
    }
}
