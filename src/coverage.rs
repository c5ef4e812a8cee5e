//! Per-file coverage table for the pull-request comment.

use std::fmt::Write;
use std::path::Path;

use crate::model::{relative_path, CoverageSummary, Metric, TestRun};

/// Prefix of every coverage comment. Also how previous comments are
/// recognized for deletion.
pub const COVERAGE_HEADER: &str = ":loop: **Code coverage**\n\n";

const COLUMNS: [&str; 5] = ["Filename", "Statements", "Branches", "Functions", "Lines"];

/// Outcome of summarizing a run's coverage map.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageReport {
    /// Zero rows when the run collected no coverage at all.
    Table(CoverageTable),
    /// A coverage map was present but no entry could be summarized, which
    /// usually means coverage collection is misconfigured.
    Unsummarizable,
}

/// One row per summarized file, in coverage-map order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageTable {
    pub rows: Vec<CoverageRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRow {
    /// Path relative to the base directory.
    pub path: String,
    pub summary: CoverageSummary,
}

impl CoverageRow {
    fn cells(&self) -> [String; 5] {
        let pct = |m: Metric| format!("{}%", m.pct());
        [
            self.path.clone(),
            pct(self.summary.statements),
            pct(self.summary.branches),
            pct(self.summary.functions),
            pct(self.summary.lines),
        ]
    }
}

/// Summarize every file in the run's coverage map, stripping `base_dir` from
/// the displayed paths.
pub fn summarize(run: &TestRun, base_dir: &Path) -> CoverageReport {
    let Some(map) = run.coverage_map.as_ref().filter(|m| !m.is_empty()) else {
        return CoverageReport::Table(CoverageTable::default());
    };

    let rows: Vec<CoverageRow> = map
        .iter()
        .filter_map(|(path, file)| match file.summary() {
            Some(summary) => Some(CoverageRow {
                path: relative_path(path, base_dir),
                summary,
            }),
            None => {
                tracing::debug!("no coverage summary for {path}, skipping");
                None
            }
        })
        .collect();

    if rows.is_empty() {
        return CoverageReport::Unsummarizable;
    }
    CoverageReport::Table(CoverageTable { rows })
}

impl CoverageTable {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the comment body: [`COVERAGE_HEADER`] followed by a Markdown
    /// table with a left-aligned filename column and right-aligned
    /// percentages.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let body: Vec<[String; 5]> = self.rows.iter().map(CoverageRow::cells).collect();

        let mut widths = COLUMNS.map(|c| c.chars().count().max(3));
        for cells in &body {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut md = String::from(COVERAGE_HEADER);
        write_row(&mut md, &COLUMNS.map(str::to_string), &widths);

        md.push('|');
        for (i, width) in widths.iter().enumerate() {
            let dashes = "-".repeat(width - 1);
            if i == 0 {
                write!(md, " :{dashes} |").unwrap();
            } else {
                write!(md, " {dashes}: |").unwrap();
            }
        }
        md.push('\n');

        for cells in &body {
            write_row(&mut md, cells, &widths);
        }
        md
    }
}

fn write_row(md: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    md.push('|');
    for (i, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        let pad = width - cell.chars().count();
        if i == 0 {
            write!(md, " {cell}{} |", " ".repeat(pad)).unwrap();
        } else {
            write!(md, " {}{cell} |", " ".repeat(pad)).unwrap();
        }
    }
    md.push('\n');
}
