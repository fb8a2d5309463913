//! CloudFront edge handlers for nextedge.
//!
//! Two handlers sit in front of a Next.js deployment:
//!
//! - [`origin_auth`] runs on origin requests and signs them with SigV4 so a
//!   private Lambda function URL accepts them.
//! - [`cache_key`] runs on viewer requests and condenses the headers Next.js
//!   varies on into a single cache-key header.
//!
//! [`EdgeHandler`] wraps both behind one JSON-in, JSON-out entry point for the
//! runtime bootstrap.

pub mod cache_key;
pub mod error;
pub mod handler;
pub mod origin_auth;

pub use error::{EdgeError, EdgeResult};
pub use handler::EdgeHandler;
pub use origin_auth::{OriginAuthHandler, merge_signed_headers};
