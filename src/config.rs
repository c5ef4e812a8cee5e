//! Run configuration: operator inputs plus the GitHub Actions context.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Everything a run needs, resolved once up front.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shell command with an `{{args}}` placeholder for the runner flags.
    pub test_command: String,
    pub coverage_comment: bool,
    pub changes_only: bool,
    pub check_name: String,
    /// Absolute; also the prefix stripped from reported paths.
    pub working_directory: PathBuf,
    pub results_file: PathBuf,
    /// Login of the account comments are posted as.
    pub bot_login: String,
    pub github: GithubContext,
}

/// Absolute form of the operator's working directory, without the `\\?\`
/// prefix Windows canonicalization adds, so it still prefixes the runner's
/// reported paths and works as a `cmd` working directory.
pub fn resolve_working_directory(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Results file resolved against the working directory.
    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        self.working_directory.join(&self.results_file)
    }
}

#[derive(Debug, Clone)]
pub struct GithubContext {
    pub token: String,
    pub api_url: String,
    /// `owner/name`
    pub repo: String,
    /// The commit that triggered the workflow.
    pub sha: String,
    pub pull_request: Option<PullRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub head_sha: Option<String>,
    pub base_sha: Option<String>,
}

impl GithubContext {
    /// Build a context from the standard GitHub Actions environment
    /// variables (`GITHUB_TOKEN`, `GITHUB_REPOSITORY`, `GITHUB_SHA`,
    /// `GITHUB_API_URL`, `GITHUB_EVENT_PATH`, `GITHUB_REF`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GithubContext::from_env`] with an explicit variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = var("GITHUB_TOKEN")
            .ok_or_else(|| Error::Config("GITHUB_TOKEN environment variable is required".into()))?;
        let repo = var("GITHUB_REPOSITORY").ok_or_else(|| {
            Error::Config("GITHUB_REPOSITORY environment variable is required".into())
        })?;
        let sha = var("GITHUB_SHA")
            .ok_or_else(|| Error::Config("GITHUB_SHA environment variable is required".into()))?;
        let api_url = var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let pull_request = var("GITHUB_EVENT_PATH")
            .and_then(|path| pull_request_from_event(Path::new(&path)))
            .or_else(|| {
                var("GITHUB_REF")
                    .and_then(|r| pr_number_from_ref(&r))
                    .map(|number| PullRequest {
                        number,
                        head_sha: None,
                        base_sha: None,
                    })
            });

        Ok(Self {
            token,
            api_url,
            repo,
            sha,
            pull_request,
        })
    }

    /// The commit the check run is attached to: the pull request head when
    /// there is one, otherwise the triggering commit.
    #[must_use]
    pub fn head_sha(&self) -> &str {
        self.pull_request
            .as_ref()
            .and_then(|pr| pr.head_sha.as_deref())
            .unwrap_or(&self.sha)
    }

    #[must_use]
    pub fn pr_number(&self) -> Option<u64> {
        self.pull_request.as_ref().map(|pr| pr.number)
    }

    /// Base commit to diff against when only changed files are tested.
    #[must_use]
    pub fn base_ref(&self) -> Option<&str> {
        self.pull_request.as_ref().and_then(|pr| pr.base_sha.as_deref())
    }
}

#[derive(Deserialize)]
struct Event {
    pull_request: Option<EventPullRequest>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: u64,
    head: Option<EventCommit>,
    base: Option<EventCommit>,
}

#[derive(Deserialize)]
struct EventCommit {
    sha: String,
}

fn pull_request_from_event(path: &Path) -> Option<PullRequest> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("could not read event payload {}: {e}", path.display());
            return None;
        }
    };
    let event: Event = match serde_json::from_str(&content) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!("could not parse event payload {}: {e}", path.display());
            return None;
        }
    };
    let pr = event.pull_request?;
    Some(PullRequest {
        number: pr.number,
        head_sha: pr.head.map(|c| c.sha),
        base_sha: pr.base.map(|c| c.sha),
    })
}

/// Extract PR number from GITHUB_REF (e.g. "refs/pull/42/merge" → 42).
fn pr_number_from_ref(github_ref: &str) -> Option<u64> {
    let parts: Vec<&str> = github_ref.split('/').collect();
    if parts.len() >= 3 && parts[0] == "refs" && parts[1] == "pull" {
        parts[2].parse().ok()
    } else {
        None
    }
}
