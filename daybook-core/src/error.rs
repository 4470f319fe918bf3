//! Error kinds reported by the pipeline.

use thiserror::Error;

use crate::record::RawTransaction;

/// Boxed cause carried by [`Error::Io`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenient alias for fallible results returned by the pipeline.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required external parameter is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A record could not be normalized. The run aborts on the first one.
    #[error("invalid record #{index} ({reason}): {record}")]
    Validation {
        index: usize,
        reason: String,
        record: RawTransaction,
    },

    /// Fetching transactions or talking to the sheet failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Wrap an I/O-side failure, keeping the original cause reachable via `source()`.
    pub fn io(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Io {
            context: context.into(),
            source: source.into(),
        }
    }
}
