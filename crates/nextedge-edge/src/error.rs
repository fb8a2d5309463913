//! Error types for the edge handlers.

use nextedge_auth::SigningError;
use nextedge_core::CoreError;

/// Errors that abort an edge invocation.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// The request is routed to an origin that cannot be signed for.
    #[error("Unexpected origin type. Expected 'custom'. Got: {0}")]
    UnexpectedOrigin(String),

    /// The request carries no `host` header.
    #[error("request has no host header")]
    MissingHost,

    /// The host does not encode a region.
    #[error("cannot derive region from host {host:?}")]
    InvalidHost {
        /// The offending host.
        host: String,
        /// Underlying validation error.
        #[source]
        source: CoreError,
    },

    /// The body uses an encoding other than `base64` or `text`.
    #[error("unsupported body encoding: {0}")]
    UnsupportedBodyEncoding(String),

    /// The body data does not decode.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// CloudFront truncated the body, so its hash would not match what the
    /// origin receives.
    #[error("request body was truncated by CloudFront and cannot be signed")]
    TruncatedBody,

    /// The signer failed.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The event payload is not valid JSON for the handler.
    #[error("malformed event: {0}")]
    Event(#[from] serde_json::Error),

    /// The event has no record to process.
    #[error("event contains no records")]
    MissingRecord,
}

impl EdgeError {
    /// Stable error name reported to the Lambda runtime as `errorType`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::UnexpectedOrigin(_) => "UnexpectedOrigin",
            Self::MissingHost => "MissingHost",
            Self::InvalidHost { .. } => "InvalidHost",
            Self::UnsupportedBodyEncoding(_) => "UnsupportedBodyEncoding",
            Self::InvalidBody(_) => "InvalidBody",
            Self::TruncatedBody => "TruncatedBody",
            Self::Signing(SigningError::Credentials(_)) => "CredentialsError",
            Self::Signing(SigningError::ExpiredCredentials { .. }) => "ExpiredCredentials",
            Self::Signing(SigningError::InvalidHeaderValue(_)) => "InvalidHeaderValue",
            Self::Event(_) | Self::MissingRecord => "InvalidEvent",
        }
    }
}

/// Convenience result type for edge handlers.
pub type EdgeResult<T> = Result<T, EdgeError>;
