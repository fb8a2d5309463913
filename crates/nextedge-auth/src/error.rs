//! Error types for SigV4 signing.
//!
//! Credential resolution failures are represented by [`CredentialError`]; everything
//! that can go wrong while producing a signature is a [`SigningError`].

/// Errors raised by a [`CredentialProvider`](crate::CredentialProvider).
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// A required credential variable is not set.
    #[error("missing credential variable: {0}")]
    Missing(&'static str),

    /// The credential source could not produce credentials.
    #[error("credentials unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while signing a request.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// Credentials could not be resolved.
    #[error("failed to resolve credentials: {0}")]
    Credentials(#[from] CredentialError),

    /// The resolved credentials were already past their validity window.
    #[error("credentials for {access_key_id} expired at {expiration}")]
    ExpiredCredentials {
        /// Access key id of the expired credentials.
        access_key_id: String,
        /// Expiration timestamp (RFC 3339).
        expiration: String,
    },

    /// A header value contains characters that cannot be signed.
    #[error("header {0} has a value that cannot be signed")]
    InvalidHeaderValue(String),
}
