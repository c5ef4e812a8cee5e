//! Invoking the test runner.
//!
//! The runner's exit status means nothing here: a failing suite exits
//! non-zero, and the outcome is read from the result document instead.

use std::borrow::Cow;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

static ARGS_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*args\s*\}\}").expect("placeholder pattern is valid"));

/// Flags that make the runner write the JSON document we parse.
#[must_use]
pub fn runner_args(
    results_file: &Path,
    coverage: bool,
    changed_since: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "--ci".to_string(),
        "--json".to_string(),
        "--testLocationInResults".to_string(),
        format!("--outputFile={}", results_file.display()),
    ];
    if coverage {
        args.push("--coverage".to_string());
    }
    if let Some(base) = changed_since {
        args.push(format!("--changedSince={base}"));
    }
    args
}

/// Substitute the runner flags into the command template. Templates
/// without an `{{args}}` placeholder get the flags appended after `--`.
///
/// Each flag is quoted for the shell that [`ShellRunner`] hands the command
/// to, so paths with spaces survive as one argument.
pub fn test_command(template: &str, args: &[String]) -> Result<String> {
    let args = args
        .iter()
        .map(|arg| quote(arg))
        .collect::<Result<Vec<_>>>()?
        .join(" ");
    if ARGS_PLACEHOLDER.is_match(template) {
        Ok(ARGS_PLACEHOLDER
            .replace_all(template, regex::NoExpand(&args))
            .into_owned())
    } else {
        Ok(format!("{} -- {args}", template.trim_end()))
    }
}

#[cfg(windows)]
fn quote(arg: &str) -> Result<Cow<'_, str>> {
    if arg.contains(char::is_whitespace) {
        Ok(Cow::Owned(format!("\"{arg}\"")))
    } else {
        Ok(Cow::Borrowed(arg))
    }
}

#[cfg(not(windows))]
fn quote(arg: &str) -> Result<Cow<'_, str>> {
    shlex::try_quote(arg).map_err(|e| {
        crate::error::Error::Config(format!("Cannot pass {arg:?} to the test command: {e}"))
    })
}

/// Runs the test command to completion.
pub trait TestRunner {
    /// Returns once the command has exited, whatever its status. Failing to
    /// start is logged, not returned.
    fn run(&self, command: &str, working_directory: &Path);
}

/// Runs the command through the platform shell, inheriting stdio so the
/// runner's own output lands in the CI log.
pub struct ShellRunner;

impl TestRunner for ShellRunner {
    fn run(&self, command: &str, working_directory: &Path) {
        tracing::info!("running `{command}` in {}", working_directory.display());

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        };

        match cmd.current_dir(working_directory).status() {
            Ok(status) if status.success() => tracing::debug!("test command succeeded"),
            Ok(status) => tracing::info!("test command exited with {status}"),
            Err(e) => tracing::error!("failed to run test command: {e}"),
        }
    }
}
