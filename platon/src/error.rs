//! Error types for request composition and response resolution.
//!
//! Every failure carries a human-readable message (its `Display`) and a
//! machine-checkable [`ErrorKind`] so callers can branch without matching on
//! strings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{Action, Field, UnknownWireValue};
use crate::signature::SignatureKey;

/// Machine-checkable classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The device or host has no network connectivity.
    NoInternet,
    /// The SDK was not configured, or configured with empty credentials.
    SdkAuth,
    /// A request model is missing data required by its operation.
    Validation,
    /// The gateway answered with a well-formed error envelope.
    FromServer,
    /// Response bytes did not match any known envelope.
    Parse,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Returns the stable snake-case code of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoInternet => "no_internet",
            Self::SdkAuth => "sdk_auth",
            Self::Validation => "validation",
            Self::FromServer => "from_server",
            Self::Parse => "parse",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the numeric code of this kind.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::NoInternet => 1,
            Self::SdkAuth => 2,
            Self::FromServer => 3,
            Self::Parse => 4,
            Self::Unknown => 5,
            Self::Validation => 6,
        }
    }

    /// Returns the message used when nothing more specific is known.
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::NoInternet => "No internet connection",
            Self::SdkAuth => "SDK initialization error",
            Self::Validation => "Request validation failed",
            Self::FromServer => "Error from server",
            Self::Parse => "Server data parsing fail",
            Self::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error of the `platon` crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credentials are missing, empty or malformed. No request was built.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A request model cannot be composed or signed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Response bytes do not match any known envelope or variant shape.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The gateway returned a well-formed error envelope.
    #[error("gateway error: {0}")]
    Server(#[from] GatewayError),
}

impl Error {
    /// Returns the machine-checkable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::SdkAuth,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Server(err) => err.kind,
        }
    }
}

/// Credentials could not be loaded or are unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration key is not set.
    #[error("missing configuration key {0}")]
    Missing(&'static str),

    /// A required configuration key is set to an empty string.
    #[error("configuration key {0} is empty")]
    Empty(&'static str),

    /// A URL-valued key does not hold a valid absolute URL.
    #[error("invalid URL in {key}: {source}")]
    InvalidUrl {
        /// The offending configuration key.
        key: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`Credentials`](crate::config::Credentials).
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A request model cannot be turned into a signed parameter set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A field required by the operation is missing or empty.
    #[error("missing required field {0}")]
    MissingField(Field),

    /// A field holds a value the gateway would reject.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// The offending field.
        field: Field,
        /// Why the value was rejected.
        reason: String,
    },

    /// Amounts cannot be negative.
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(String),

    /// The amount is not representable as a fixed-point decimal.
    #[error("amount is not a finite decimal: {0}")]
    InvalidAmount(String),

    /// The parameter set names neither an action nor a web payment type.
    #[error("parameter set has no action or payment field to select a signature")]
    MissingSignatureKey,

    /// No signature recipe is registered for this key.
    #[error("no signature recipe for {0}")]
    NoSignatureRecipe(SignatureKey),

    /// A field listed in the signature recipe is absent.
    #[error("signature for {key} requires field {field}")]
    MissingSignatureField {
        /// Recipe being applied.
        key: SignatureKey,
        /// The absent field.
        field: Field,
    },

    /// The action is created by the gateway and cannot be requested.
    #[error("action {0} is created by the gateway and cannot be requested")]
    NotClientInitiated(Action),
}

/// Response bytes do not describe a known response.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The bytes are not JSON.
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON document is not an object.
    #[error("response is not a JSON object")]
    NotAnObject,

    /// A field required by the selected variant is absent.
    #[error("response is missing field {0}")]
    MissingField(Field),

    /// A field has the wrong JSON type or an unusable value.
    #[error("response field {field} is invalid: {reason}")]
    InvalidField {
        /// The offending field.
        field: Field,
        /// What was wrong with it.
        reason: String,
    },

    /// A controlled-vocabulary field holds an unknown value.
    #[error(transparent)]
    UnknownValue(#[from] UnknownWireValue),

    /// A query string names a field outside the catalog.
    #[error("unknown parameter {0:?}")]
    UnknownParameter(String),
}

/// Well-formed error reported by the gateway, or built locally for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({kind}, code {code})")]
pub struct GatewayError {
    /// Message as reported by the gateway.
    pub message: String,
    /// Classification, [`ErrorKind::FromServer`] for gateway envelopes.
    pub kind: ErrorKind,
    /// Numeric error code, `0` when the gateway sent none.
    pub code: i64,
}

impl GatewayError {
    /// Creates a gateway-reported error.
    #[must_use]
    pub fn from_server(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::FromServer,
            code,
        }
    }

    /// Creates an error of the given kind carrying its default message.
    #[must_use]
    pub fn of_kind(kind: ErrorKind) -> Self {
        Self {
            message: kind.default_message().to_owned(),
            kind,
            code: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err = Error::from(ConfigError::Empty("CLIENT_PASS"));
        assert_eq!(err.kind(), ErrorKind::SdkAuth);

        let err = Error::from(ValidationError::MissingField(Field::OrderId));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "validation error: missing required field order_id"
        );

        let err = Error::from(ParseError::MissingField(Field::Result));
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = Error::from(GatewayError::from_server("bad hash", 0));
        assert_eq!(err.kind(), ErrorKind::FromServer);
    }

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::from_server("bad hash", 204_002);
        assert_eq!(err.to_string(), "bad hash (from_server, code 204002)");
    }

    #[test]
    fn test_default_messages() {
        let err = GatewayError::of_kind(ErrorKind::Parse);
        assert_eq!(err.message, "Server data parsing fail");
        assert_eq!(ErrorKind::NoInternet.code(), 1);
        assert_eq!(ErrorKind::Unknown.default_message(), "Unknown error");
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::FromServer).unwrap();
        assert_eq!(json, "\"from_server\"");
    }
}
