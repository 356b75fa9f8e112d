//! The public error type of the crate.
//!
//! Internally, functions return `Res<T>` (an `anyhow::Result`) and attach context freely. At the
//! boundaries of the public API, errors are converted into [`Error`], which carries an
//! [`ErrorType`] so that callers can tell a stale version token from a missing exchange rate
//! without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// A currency was absent from a rate table during conversion.
    MissingRate,
    /// A payment with the requested id does not exist.
    NotFound,
    /// Neither the remote store nor the local fallback could provide the document.
    DataUnavailable,
    /// A save was rejected by the remote store or failed in transport.
    SaveFailed,
    /// The remote credential or the local session is missing or invalid.
    Auth,
    /// The remote store rejected a write because the version token is stale.
    Conflict,
    /// A network request failed or returned something unexpected.
    Request,
    /// The configuration or home directory is missing or invalid.
    Config,
    /// Anything else, e.g. a local file could not be written.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// The public error type. It wraps an `anyhow::Error` so that the full context chain is kept.
#[derive(Debug, thiserror::Error)]
#[error("{error_type}: {source:#}")]
pub struct Error {
    error_type: ErrorType,
    #[source]
    source: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, source: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            source: source.into(),
        }
    }

    /// Creates an error from a plain message.
    pub fn msg<M>(error_type: ErrorType, message: M) -> Self
    where
        M: Display + std::fmt::Debug + Send + Sync + 'static,
    {
        Self::new(error_type, anyhow::Error::msg(message))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Returns `true` if this error is of type `error_type`.
    pub fn is(&self, error_type: ErrorType) -> bool {
        self.error_type == error_type
    }
}

/// Converts internal results into the public `Result` type.
pub(crate) trait IntoResult<T> {
    /// Maps the error into an [`Error`] of `error_type`. If the chain already holds a public
    /// [`Error`], its type wins so that, e.g., an `Auth` failure deep in a call stays `Auth`.
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let error_type = e
                .downcast_ref::<Error>()
                .map(Error::error_type)
                .unwrap_or(error_type);
            Error::new(error_type, e)
        })
    }
}
