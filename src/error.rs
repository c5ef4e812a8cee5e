use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unexpected result document shape in {}: {message}", path.display())]
    Schema { path: PathBuf, message: String },

    #[error("GitHub API error while trying to {action} (HTTP {status}): {body}")]
    Api {
        action: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to {action}: {message}")]
    Http {
        action: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
