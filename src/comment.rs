//! Sticky coverage comment: at most one live coverage comment per pull
//! request.
//!
//! Only the first page of comments ([`COMMENTS_PER_PAGE`]) is inspected, so a
//! pull request with more comments than that may keep stale coverage
//! comments that sit past the first page.

use crate::coverage::{CoverageReport, COVERAGE_HEADER};
use crate::error::Result;
use crate::github::{IssueComment, Platform, COMMENTS_PER_PAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Nothing worth posting; existing comments were left alone.
    Skipped,
    Posted { deleted: usize },
}

/// A comment we posted on an earlier run: our author and our header.
#[must_use]
pub fn is_previous_coverage_comment(comment: &IssueComment, bot_login: &str) -> bool {
    comment.author() == Some(bot_login)
        && comment
            .body
            .as_deref()
            .is_some_and(|body| body.starts_with(COVERAGE_HEADER))
}

/// Replace any previous coverage comment on `pr_number` with a fresh one.
///
/// Deletions run concurrently. The new comment is posted only once every
/// deletion succeeded; the first deletion error aborts the reconcile.
pub fn reconcile(
    platform: &dyn Platform,
    pr_number: u64,
    bot_login: &str,
    report: &CoverageReport,
) -> Result<Reconciled> {
    let table = match report {
        CoverageReport::Table(table) if !table.is_empty() => table,
        _ => return Ok(Reconciled::Skipped),
    };

    let comments = platform.list_comments(pr_number)?;
    if comments.len() >= COMMENTS_PER_PAGE as usize {
        tracing::warn!(
            "pull request #{pr_number} has at least {COMMENTS_PER_PAGE} comments, \
             older coverage comments may not be removed"
        );
    }

    let stale: Vec<u64> = comments
        .iter()
        .filter(|c| is_previous_coverage_comment(c, bot_login))
        .map(|c| c.id)
        .collect();

    let outcomes: Vec<Result<()>> = std::thread::scope(|scope| {
        let handles: Vec<_> = stale
            .iter()
            .map(|&id| scope.spawn(move || platform.delete_comment(id)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });
    for outcome in outcomes {
        outcome?;
    }
    if !stale.is_empty() {
        tracing::info!("deleted {} previous coverage comment(s)", stale.len());
    }

    platform.create_comment(pr_number, &table.to_markdown())?;
    Ok(Reconciled::Posted {
        deleted: stale.len(),
    })
}
