use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use covcheck::config::{resolve_working_directory, Config, GithubContext};
use covcheck::github::GithubClient;
use covcheck::runner::ShellRunner;
use covcheck::{action, comment};

/// covcheck — run a JS test suite and publish the results to GitHub as a
/// check run and a sticky coverage comment.
#[derive(Parser)]
#[command(name = "covcheck", version, about)]
struct Cli {
    /// Test command; `{{args}}` is replaced with the runner flags.
    #[arg(long, env = "INPUT_TEST-COMMAND", default_value = "npm test -- {{args}}")]
    test_command: String,

    /// Post a coverage table comment on pull requests.
    #[arg(long, env = "INPUT_COVERAGE-COMMENT", default_value_t = true, action = ArgAction::Set)]
    coverage_comment: bool,

    /// Only run tests related to files changed since the pull request base.
    #[arg(long, env = "INPUT_CHANGES-ONLY", default_value_t = false, action = ArgAction::Set)]
    changes_only: bool,

    /// Name of the check run.
    #[arg(long, env = "INPUT_CHECK-NAME", default_value = "Tests")]
    check_name: String,

    /// Directory the test command runs in.
    #[arg(long, env = "INPUT_WORKING-DIRECTORY", default_value = ".")]
    working_directory: PathBuf,

    /// Where the runner writes its JSON results, relative to the working directory.
    #[arg(long, env = "INPUT_RESULTS-FILE", default_value = "covcheck.results.json")]
    results_file: PathBuf,

    /// Login of the account the coverage comment is posted as.
    #[arg(long, env = "INPUT_BOT-LOGIN", default_value = "github-actions[bot]")]
    bot_login: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("COVCHECK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            tracing::error!("tests failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let github = GithubContext::from_env().context("Failed to read the GitHub Actions context")?;
    let working_directory = resolve_working_directory(&cli.working_directory)
        .context("Working directory is not accessible")?;

    let client = GithubClient::new(github.token.clone(), &github.api_url, github.repo.clone());
    let config = Config {
        test_command: cli.test_command,
        coverage_comment: cli.coverage_comment,
        changes_only: cli.changes_only,
        check_name: cli.check_name,
        working_directory,
        results_file: cli.results_file,
        bot_login: cli.bot_login,
        github,
    };

    let outcome = action::run(&config, &ShellRunner, &client)?;
    if let comment::Reconciled::Posted { deleted } = outcome.comment {
        tracing::info!("coverage comment updated ({deleted} previous removed)");
    }
    Ok(outcome.tests_passed)
}
