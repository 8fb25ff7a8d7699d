//! Error type for rule synchronization.

use rule_model::RuleKind;
use thiserror::Error;

/// Errors raised by the repository, sequence generator, mirror and fleet push
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Config store failure: {0}")]
    Store(String),

    #[error("Malformed sequence state for {kind}: {value:?}")]
    MalformedState { kind: RuleKind, value: String },

    #[error("Failed to encode rules: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode rules: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Rule push to {address} failed: {reason}")]
    Push { address: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
