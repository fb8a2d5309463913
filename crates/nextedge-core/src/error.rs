//! Error types for the nextedge core.

/// Core error type for nextedge infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The host name does not follow the `<service>.<rest>.<region>.<domain>` convention.
    #[error("invalid host {0:?}: expected at least three dot-separated segments with a region at position 2")]
    InvalidHost(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
