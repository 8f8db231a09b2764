//! Error taxonomy shared by the source chain, the analysis client and the store.
//!
//! The variants map onto distinct fallback policies at each call site:
//! a [`Error::MissingCredential`] is always surfaced to the caller, while
//! [`Error::Transport`] and [`Error::MalformedResponse`] trigger whatever
//! degradation the call site defines (next tier, fallback record, empty list).

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No API credential is configured for the completion service.
    #[error("no API credential configured")]
    MissingCredential,

    /// Network or HTTP-level failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote answered, but not in the shape we expected.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Aggregate analysis could not be produced.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    /// The local key-value store could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Error::MissingCredential)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedResponse(e.to_string())
    }
}
