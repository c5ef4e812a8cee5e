//! The check-run request published for every run.

use std::path::Path;

use serde::Serialize;

use crate::annotations::{self, strip_ansi};
use crate::model::{Annotation, TestRun};

/// GitHub rejects check-run requests carrying more annotations than this.
pub const MAX_ANNOTATIONS: usize = 50;

/// Which commit the check belongs to and what it is called.
#[derive(Debug, Clone)]
pub struct CheckTarget {
    pub name: String,
    /// Head of the pull request, or the triggering commit outside of one.
    pub head_sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
}

/// Body of `POST /repos/{owner}/{repo}/check-runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckRunRequest {
    pub name: String,
    pub head_sha: String,
    pub status: CheckStatus,
    pub conclusion: Conclusion,
    pub completed_at: String,
    pub output: CheckOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub annotations: Vec<Annotation>,
}

/// Build the check-run request for a finished run.
pub fn build_payload(run: &TestRun, base_dir: &Path, target: &CheckTarget) -> CheckRunRequest {
    let mut annotations = annotations::build(run, base_dir);
    let mut summary = summary(run);

    if annotations.len() > MAX_ANNOTATIONS {
        tracing::warn!(
            "{} failures found, only the first {MAX_ANNOTATIONS} are annotated",
            annotations.len()
        );
        summary.push_str(&format!(
            "\nShowing first {MAX_ANNOTATIONS} of {} annotations.",
            annotations.len()
        ));
        annotations.truncate(MAX_ANNOTATIONS);
    }

    let (conclusion, title) = if run.success {
        (Conclusion::Success, "Tests passed")
    } else {
        (Conclusion::Failure, "Tests failed")
    };

    CheckRunRequest {
        name: target.name.clone(),
        head_sha: target.head_sha.clone(),
        status: CheckStatus::Completed,
        conclusion,
        completed_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        output: CheckOutput {
            title: title.to_string(),
            summary,
            text: failure_text(run),
            annotations,
        },
    }
}

/// One-line count summary shown at the top of the check.
#[must_use]
pub fn summary(run: &TestRun) -> String {
    if run.success {
        let suites = run.num_passed_test_suites;
        // Only counts above one take the plural, zero included.
        let noun = if suites > 1 { "suites" } else { "suite" };
        format!("{} tests passing in {suites} {noun}.", run.num_passed_tests)
    } else {
        // The suites ratio reuses the failed *test* count as its numerator.
        format!(
            "Failed tests: {}/{}. Failed suites: {}/{}.",
            run.num_failed_tests,
            run.num_total_tests,
            run.num_failed_tests,
            run.num_total_test_suites
        )
    }
}

/// Raw runner output for every file, as a fenced block. `None` on success.
fn failure_text(run: &TestRun) -> Option<String> {
    if run.success {
        return None;
    }
    let messages = run
        .test_results
        .iter()
        .map(|file| strip_ansi(&file.message))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("```\n{}\n```", messages.trim_end()))
}
