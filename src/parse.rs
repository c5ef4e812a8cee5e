use std::path::Path;

use serde_json::error::Category;

use crate::error::{Error, Result};
use crate::model::TestRun;

/// Read the runner's JSON result document and deserialize it.
pub fn read_results(path: &Path) -> Result<TestRun> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_results_at(&content, path)
}

/// Parse a result document that is already in memory.
pub fn parse_results(content: &str) -> Result<TestRun> {
    parse_results_at(content, Path::new("<input>"))
}

fn parse_results_at(content: &str, path: &Path) -> Result<TestRun> {
    let run: TestRun = serde_json::from_str(content).map_err(|source| match source.classify() {
        // Well-formed JSON that doesn't match the expected shape.
        Category::Data => Error::Schema {
            path: path.to_path_buf(),
            message: source.to_string(),
        },
        Category::Io | Category::Syntax | Category::Eof => Error::Parse {
            path: path.to_path_buf(),
            source,
        },
    })?;

    run.check_counts().map_err(|message| Error::Schema {
        path: path.to_path_buf(),
        message,
    })?;

    tracing::debug!(
        files = run.test_results.len(),
        coverage = run.coverage_map.is_some(),
        "parsed {}",
        path.display()
    );
    Ok(run)
}
