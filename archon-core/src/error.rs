use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Malformed caller input. Surfaced directly; never retried.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Blank { field: &'static str },

    #[error("unsupported priority level: {value:?}")]
    Priority { value: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0:?} not found")]
    NotFound(String),

    /// On-disk content (or outbound task data) does not round-trip as JSON.
    #[error("invalid task data in store at {}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("task store i/o failed at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Token failures are distinct so callers can tell "tampered" from
/// "expired" from "garbage input".
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed or not valid base64")]
    Decode,

    #[error("token signature mismatch")]
    InvalidSignature,

    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("failed to serialize token envelope")]
    Envelope(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),
}
