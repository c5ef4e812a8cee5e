//! GitHub API access: the [`Platform`] capability the pipeline publishes
//! through, and its `ureq` implementation.

use serde::Deserialize;

use crate::check::CheckRunRequest;
use crate::error::{Error, Result};

/// Comments fetched per listing call. Only the first page is inspected.
pub const COMMENTS_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub body: Option<String>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

impl IssueComment {
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.login.as_str())
    }
}

/// The platform operations a run performs. Shared with the threads that
/// delete stale comments, hence `Sync`.
pub trait Platform: Sync {
    fn create_check_run(&self, request: &CheckRunRequest) -> Result<()>;

    /// First page of comments on a pull request.
    fn list_comments(&self, pr_number: u64) -> Result<Vec<IssueComment>>;

    fn delete_comment(&self, comment_id: u64) -> Result<()>;

    fn create_comment(&self, pr_number: u64, body: &str) -> Result<()>;
}

/// Blocking GitHub REST client for one repository.
pub struct GithubClient {
    token: String,
    api_url: String,
    repo: String,
}

impl GithubClient {
    /// `repo` is `owner/name`.
    pub fn new(token: String, api_url: &str, repo: String) -> Self {
        Self {
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repo, path)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        ureq::request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "covcheck")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }
}

fn api_error(action: &'static str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(status, resp) => Error::Api {
            action,
            status,
            body: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => Error::Http {
            action,
            message: t.to_string(),
        },
    }
}

impl Platform for GithubClient {
    fn create_check_run(&self, request: &CheckRunRequest) -> Result<()> {
        let action = "create check run";
        self.request("POST", &self.url("check-runs"))
            .send_json(request)
            .map_err(|e| api_error(action, e))?;
        tracing::info!("created check run '{}' on {}", request.name, request.head_sha);
        Ok(())
    }

    fn list_comments(&self, pr_number: u64) -> Result<Vec<IssueComment>> {
        let action = "list pull request comments";
        let url = self.url(&format!(
            "issues/{pr_number}/comments?per_page={COMMENTS_PER_PAGE}"
        ));
        let resp = self
            .request("GET", &url)
            .call()
            .map_err(|e| api_error(action, e))?;
        resp.into_json().map_err(|e| Error::Http {
            action,
            message: e.to_string(),
        })
    }

    fn delete_comment(&self, comment_id: u64) -> Result<()> {
        self.request("DELETE", &self.url(&format!("issues/comments/{comment_id}")))
            .call()
            .map_err(|e| api_error("delete comment", e))?;
        tracing::debug!("deleted comment {comment_id}");
        Ok(())
    }

    fn create_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.request("POST", &self.url(&format!("issues/{pr_number}/comments")))
            .send_json(serde_json::json!({ "body": body }))
            .map_err(|e| api_error("create comment", e))?;
        tracing::info!("comment posted to {}/pull/{pr_number}", self.repo);
        Ok(())
    }
}
