//! Error types for aircheck-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of one download attempt inside the retry loop.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("server returned status {status}")]
    Status { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("file exceeds the {limit} byte ceiling")]
    FileTooLarge { limit: u64 },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no archive url for show {show_id}")]
    NoArchiveUrl { show_id: String },

    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to promote {} to {}: {source}", .temp.display(), .path.display())]
    Rename {
        temp: PathBuf,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every attempt failed; the history is kept in attempt order.
    #[error("download failed after {} attempts, last error: {}", .attempts.len(), last_error(.attempts))]
    AllRetriesFailed { attempts: Vec<AttemptError> },
}

fn last_error(attempts: &[AttemptError]) -> String {
    attempts
        .last()
        .map(|err| err.to_string())
        .unwrap_or_else(|| "no attempt was made".to_string())
}
