#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use covcheck::check::CheckRunRequest;
use covcheck::config::{Config, GithubContext, PullRequest};
use covcheck::error::{Error, Result};
use covcheck::github::{IssueComment, Platform, User};
use covcheck::runner::TestRunner;
use tempfile::TempDir;

pub const BOT: &str = "github-actions[bot]";
pub const RESULTS_FILE: &str = "results.json";

/// Write `fixture` as the results file of a fresh temp dir, replacing
/// `<ROOT>` with the dir's path. The caller must hold onto `TempDir`.
pub fn setup_results(fixture: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap().to_string();
    std::fs::write(dir.path().join(RESULTS_FILE), fixture.replace("<ROOT>", &root)).unwrap();
    let path = dir.path().to_path_buf();
    (dir, path)
}

pub fn config(working_directory: &Path, pr_number: Option<u64>) -> Config {
    Config {
        test_command: "npx jest {{args}}".to_string(),
        coverage_comment: true,
        changes_only: false,
        check_name: "Tests".to_string(),
        working_directory: working_directory.to_path_buf(),
        results_file: PathBuf::from(RESULTS_FILE),
        bot_login: BOT.to_string(),
        github: GithubContext {
            token: "token".to_string(),
            api_url: "https://api.github.invalid".to_string(),
            repo: "octo/app".to_string(),
            sha: "merge123".to_string(),
            pull_request: pr_number.map(|number| PullRequest {
                number,
                head_sha: Some("head456".to_string()),
                base_sha: Some("base789".to_string()),
            }),
        },
    }
}

/// Records the commands it was asked to run; the results file is expected
/// to be in place already.
#[derive(Default)]
pub struct RecordingRunner {
    pub commands: RefCell<Vec<String>>,
}

impl TestRunner for RecordingRunner {
    fn run(&self, command: &str, _working_directory: &Path) {
        self.commands.borrow_mut().push(command.to_string());
    }
}

#[derive(Default)]
struct State {
    comments: Vec<IssueComment>,
    next_id: u64,
    checks: Vec<CheckRunRequest>,
    calls: Vec<String>,
    fail_delete: Option<u64>,
}

/// In-memory pull request with a comment thread.
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<State>,
}

impl FakePlatform {
    pub fn with_comments(comments: &[(&str, &str)]) -> Self {
        let platform = Self::default();
        for (login, body) in comments {
            platform.push_comment(login, body);
        }
        platform
    }

    pub fn push_comment(&self, login: &str, body: &str) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.comments.push(IssueComment {
            id,
            body: Some(body.to_string()),
            user: Some(User {
                login: login.to_string(),
            }),
        });
    }

    pub fn fail_deleting(&self, comment_id: u64) {
        self.state.lock().unwrap().fail_delete = Some(comment_id);
    }

    pub fn comments(&self) -> Vec<IssueComment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn checks(&self) -> Vec<CheckRunRequest> {
        self.state.lock().unwrap().checks.clone()
    }

    /// Names of the API calls made so far, deletions in completion order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl Platform for FakePlatform {
    fn create_check_run(&self, request: &CheckRunRequest) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("create_check_run".to_string());
        state.checks.push(request.clone());
        Ok(())
    }

    fn list_comments(&self, _pr_number: u64) -> Result<Vec<IssueComment>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list_comments".to_string());
        Ok(state.comments.clone())
    }

    fn delete_comment(&self, comment_id: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete_comment {comment_id}"));
        if state.fail_delete == Some(comment_id) {
            return Err(Error::Api {
                action: "delete comment",
                status: 500,
                body: "boom".to_string(),
            });
        }
        state.comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    fn create_comment(&self, _pr_number: u64, body: &str) -> Result<()> {
        self.state.lock().unwrap().calls.push("create_comment".to_string());
        self.push_comment(BOT, body);
        Ok(())
    }
}
