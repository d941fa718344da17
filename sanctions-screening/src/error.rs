//! Error types for sanctions screening

use thiserror::Error;
use uuid::Uuid;

/// Failure to build or install a watchlist
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The data source could not be fetched or read
    #[error("Watchlist source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// The document could not be parsed structurally
    #[error("Malformed watchlist document: {0}")]
    MalformedDocument(String),

    /// The document parsed but yielded no usable entries
    #[error("Watchlist from {source_name} contains no usable entries")]
    EmptyWatchlist { source_name: String },
}

impl LoadError {
    pub(crate) fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Sanctions screening error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// No watchlist has been installed yet
    #[error("Watchlist not initialized")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(Uuid),
}

pub type Result<T> = std::result::Result<T, Error>;
