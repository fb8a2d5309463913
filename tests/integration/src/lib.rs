//! End-to-end tests for the nextedge edge handlers.
//!
//! Each test feeds a recorded CloudFront event from `fixtures/` through the
//! same entry points the bootstrap uses and checks the request CloudFront
//! would forward. Credentials and clock are fixed so signatures are stable.
//!
//! Run them with:
//! ```text
//! cargo test -p nextedge-integration
//! ```

use std::sync::{Arc, Once};

use chrono::{DateTime, TimeZone, Utc};

use nextedge_auth::{CredentialProvider, Credentials, StaticCredentialProvider};
use nextedge_core::NextEdgeConfig;
use nextedge_edge::EdgeHandler;

static INIT: Once = Once::new();

/// Access key id of the test credentials.
pub const ACCESS_KEY_ID: &str = "AKIDEXAMPLE";

/// Secret key of the test credentials.
pub const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Load a fixture event by file name.
///
/// # Panics
///
/// Panics if the fixture does not exist.
#[must_use]
pub fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read(&path).unwrap_or_else(|e| panic!("cannot read fixture {path}: {e}"))
}

/// Load a fixture event as JSON.
///
/// # Panics
///
/// Panics if the fixture does not exist or is not JSON.
#[must_use]
pub fn fixture_json(name: &str) -> serde_json::Value {
    serde_json::from_slice(&fixture(name)).unwrap_or_else(|e| panic!("invalid fixture {name}: {e}"))
}

/// The fixed signing time used by every test: 2024-05-01T10:30:00Z.
#[must_use]
pub fn signing_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Provider returning the test credentials, optionally with a session token.
#[must_use]
pub fn credential_provider(session_token: Option<&str>) -> Arc<dyn CredentialProvider> {
    Arc::new(StaticCredentialProvider::new(Credentials::new(
        ACCESS_KEY_ID,
        SECRET_ACCESS_KEY,
        session_token.map(str::to_owned),
    )))
}

/// Build the handler the bootstrap would run for `config`.
#[must_use]
pub fn edge_handler(config: &NextEdgeConfig) -> EdgeHandler {
    init_tracing();
    EdgeHandler::from_config(credential_provider(None), config)
}

mod test_cache_key;
mod test_origin_auth;
