//! One end-to-end run: test → parse → check run → coverage comment.

use crate::check::{self, CheckTarget};
use crate::comment::{self, Reconciled};
use crate::config::Config;
use crate::coverage::{self, CoverageReport};
use crate::error::Result;
use crate::github::Platform;
use crate::parse;
use crate::runner::{self, TestRunner};

/// What a completed run reports back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// The test run's own `success` flag.
    pub tests_passed: bool,
    pub comment: Reconciled,
}

/// Execute the test command and publish its results.
///
/// Fatal errors abort the remaining steps; steps already completed (e.g. the
/// check run) are not rolled back.
pub fn run(config: &Config, runner: &dyn TestRunner, platform: &dyn Platform) -> Result<Outcome> {
    let results_path = config.results_path();

    let changed_since = if config.changes_only {
        let base = config.github.base_ref();
        if base.is_none() {
            tracing::warn!("changes-only requested but no base commit is known, running all tests");
        }
        base
    } else {
        None
    };
    let args = runner::runner_args(&results_path, config.coverage_comment, changed_since);
    let command = runner::test_command(&config.test_command, &args)?;
    runner.run(&command, &config.working_directory);

    let results = parse::read_results(&results_path)?;
    tracing::info!(
        "{} tests: {} passed, {} failed",
        results.num_total_tests,
        results.num_passed_tests,
        results.num_failed_tests
    );

    let target = CheckTarget {
        name: config.check_name.clone(),
        head_sha: config.github.head_sha().to_string(),
    };
    let payload = check::build_payload(&results, &config.working_directory, &target);
    platform.create_check_run(&payload)?;

    let comment = if !config.coverage_comment {
        Reconciled::Skipped
    } else if let Some(pr_number) = config.github.pr_number() {
        let report = coverage::summarize(&results, &config.working_directory);
        if report == CoverageReport::Unsummarizable {
            tracing::warn!(
                "coverage map has no summarizable entries, is coverage collection configured? \
                 Leaving existing coverage comments untouched"
            );
        }
        comment::reconcile(platform, pr_number, &config.bot_login, &report)?
    } else {
        tracing::info!("not a pull request, skipping coverage comment");
        Reconciled::Skipped
    };

    Ok(Outcome {
        tests_passed: results.success,
        comment,
    })
}
