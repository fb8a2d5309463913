//! Core types and configuration for the nextedge edge handlers.
//!
//! This crate provides the foundational pieces shared by the signing and
//! cache-key handlers: environment-driven configuration, the shared error
//! type, and the [`AwsRegion`] type together with the host naming convention
//! used to derive it.

mod config;
mod error;
mod types;

pub use config::{HandlerKind, LogFormat, NextEdgeConfig};
pub use error::{CoreError, CoreResult};
pub use types::AwsRegion;
