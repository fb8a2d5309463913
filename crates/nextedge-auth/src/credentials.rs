//! Credential types, provider trait and implementations.
//!
//! The signer never reaches for a process-wide default: a [`CredentialProvider`]
//! is injected at construction and asked for [`Credentials`] once per signed
//! request. [`EnvironmentCredentialProvider`] reads the variables the Lambda
//! execution environment exports for the function role;
//! [`StaticCredentialProvider`] serves fixed credentials for tests and tooling.

use std::env;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CredentialError;

const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

/// Time-scoped signing credentials.
///
/// The secret key and session token are redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Create credentials without an expiration.
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
            expiration: None,
        }
    }

    /// Set the instant after which the credentials must not be used.
    #[must_use]
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// The access key id.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret access key.
    #[must_use]
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// The session token of temporary credentials.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// The expiration, if the credentials are time-limited.
    #[must_use]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Whether the credentials are no longer valid at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Source of signing credentials.
///
/// Resolution may involve I/O (a metadata endpoint, a secrets store), so it is
/// asynchronous. Implementations own any caching and refresh policy.
#[async_trait]
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Resolve the credentials to sign the next request with.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if no credentials can be produced.
    async fn resolve(&self) -> Result<Credentials, CredentialError>;
}

/// A provider that always returns the same credentials.
///
/// # Examples
///
/// ```
/// use nextedge_auth::{CredentialProvider, Credentials, StaticCredentialProvider};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let provider = StaticCredentialProvider::new(Credentials::new("AKID", "secret", None));
/// let credentials = provider.resolve().await.unwrap();
/// assert_eq!(credentials.access_key_id(), "AKID");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    /// Create a provider serving `credentials`.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn resolve(&self) -> Result<Credentials, CredentialError> {
        Ok(self.credentials.clone())
    }
}

/// A provider reading `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the
/// optional `AWS_SESSION_TOKEN` on every call.
///
/// The Lambda runtime rotates these variables for the function role between
/// sandbox lifetimes, so nothing is cached here.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentCredentialProvider;

impl EnvironmentCredentialProvider {
    /// Create the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve credentials through an arbitrary variable lookup.
    pub(crate) fn resolve_with(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials, CredentialError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_key_id =
            non_empty(ACCESS_KEY_ID_VAR).ok_or(CredentialError::Missing(ACCESS_KEY_ID_VAR))?;
        let secret_access_key = non_empty(SECRET_ACCESS_KEY_VAR)
            .ok_or(CredentialError::Missing(SECRET_ACCESS_KEY_VAR))?;
        let session_token = non_empty(SESSION_TOKEN_VAR);

        Ok(Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
        ))
    }
}

#[async_trait]
impl CredentialProvider for EnvironmentCredentialProvider {
    async fn resolve(&self) -> Result<Credentials, CredentialError> {
        Self::resolve_with(|key| env::var(key).ok())
    }
}
