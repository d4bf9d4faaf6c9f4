//! Error types for the HTTP transport.

use http::StatusCode;
use platon::ErrorKind;

/// Errors that can occur while talking to the gateway.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The gateway could not be reached.
    #[error("no connectivity: {context}: {source}")]
    Connectivity {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The request did not complete in time.
    #[error("request timed out: {context}: {source}")]
    Timeout {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Any other HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// Failed to read the response body.
    #[error("Failed to read response body: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Composition, signing or resolution failed.
    #[error(transparent)]
    Core(#[from] platon::Error),
}

impl TransportError {
    /// Splits a reqwest send error into connectivity, timeout and the rest.
    pub(crate) fn from_send(context: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { context, source }
        } else if source.is_connect() {
            Self::Connectivity { context, source }
        } else {
            Self::Http { context, source }
        }
    }

    /// Returns `true` when the gateway could not be reached at all.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    /// Machine-checkable kind, shared with core errors.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connectivity { .. } => ErrorKind::NoInternet,
            Self::Core(err) => err.kind(),
            Self::Timeout { .. }
            | Self::Http { .. }
            | Self::HttpStatus { .. }
            | Self::ResponseBodyRead { .. } => ErrorKind::Unknown,
        }
    }
}

impl From<platon::error::ParseError> for TransportError {
    fn from(err: platon::error::ParseError) -> Self {
        Self::Core(err.into())
    }
}
