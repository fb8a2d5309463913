//! AWS Signature Version 4 request signing for nextedge.
//!
//! This crate implements the signing side of SigV4: given a request model, a
//! region, a service name and a credential provider, it produces the headers
//! a regional AWS endpoint (here, a Lambda function URL behind a CDN) needs
//! to authenticate the request.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::{TimeZone, Utc};
//! use nextedge_auth::{Credentials, SignatureV4, SigningRequest, StaticCredentialProvider};
//! use nextedge_core::AwsRegion;
//!
//! let provider = StaticCredentialProvider::new(Credentials::new("AKID", "secret", None));
//! let signer = SignatureV4::new(Arc::new(provider), AwsRegion::new("eu-west-1"), "lambda");
//!
//! let mut request = SigningRequest::new("GET", "fn.lambda-url.eu-west-1.on.aws", "/");
//! request.headers.insert("Host", "fn.lambda-url.eu-west-1.on.aws");
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let credentials = Credentials::new("AKID", "secret", None);
//! let signed = signer.sign_with_credentials(request, &credentials, now).unwrap();
//! assert!(signed.headers.get("authorization").is_some());
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction per the SigV4 specification
//! - [`credentials`] - Credential types, provider trait and implementations
//! - [`error`] - Signing and credential error types
//! - [`hash`] - SHA-256 / HMAC-SHA256 incremental hash adapter
//! - [`request`] - The request model the signer operates on
//! - [`sigv4`] - SigV4 signer

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod hash;
pub mod request;
pub mod sigv4;

pub use credentials::{
    CredentialProvider, Credentials, EnvironmentCredentialProvider, StaticCredentialProvider,
};
pub use error::{CredentialError, SigningError};
pub use hash::Sha256Hash;
pub use request::{HeaderMap, QueryValue, SigningRequest};
pub use sigv4::{SignatureV4, SigningSettings};
