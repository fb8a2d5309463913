//! Configuration management for the nextedge handlers.
//!
//! All configuration is driven by environment variables, which is the only
//! configuration channel an edge function has.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Which edge handler the bootstrap dispatches invocations to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlerKind {
    /// Sign origin requests for a private function URL.
    #[default]
    OriginAuth,
    /// Derive the cache key and propagate viewer geolocation.
    CacheKey,
}

impl HandlerKind {
    /// Stable name of the handler as used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OriginAuth => "origin-auth",
            Self::CacheKey => "cache-key",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "origin-auth" | "auth" => Ok(Self::OriginAuth),
            "cache-key" | "cachekey" => Ok(Self::CacheKey),
            other => Err(CoreError::Config(format!("unknown handler: {other}"))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Global configuration for the nextedge handlers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextEdgeConfig {
    /// Handler run by the bootstrap.
    pub handler: HandlerKind,
    /// Service name used in the SigV4 credential scope.
    pub signing_service: String,
    /// Whether the signer adds an `x-amz-content-sha256` header.
    pub apply_checksum: bool,
    /// Log level.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for NextEdgeConfig {
    fn default() -> Self {
        Self {
            handler: HandlerKind::default(),
            signing_service: "lambda".to_owned(),
            apply_checksum: true,
            log_level: "info".to_owned(),
            log_format: LogFormat::default(),
        }
    }
}

impl NextEdgeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `NEXTEDGE_HANDLER` names an unknown handler
    /// or `NEXTEDGE_SIGNING_SERVICE` is empty.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("NEXTEDGE_HANDLER") {
            config.handler = v.parse()?;
        }
        if let Some(v) = lookup("NEXTEDGE_SIGNING_SERVICE") {
            let v = v.trim();
            if v.is_empty() {
                return Err(CoreError::Config(
                    "NEXTEDGE_SIGNING_SERVICE must not be empty".to_owned(),
                ));
            }
            v.clone_into(&mut config.signing_service);
        }
        if let Some(v) = lookup("NEXTEDGE_APPLY_CHECKSUM") {
            config.apply_checksum = parse_bool(&v, true);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_format = if v.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Text
            };
        }

        Ok(config)
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim() {
        "1" | "true" | "yes" | "TRUE" | "YES" => true,
        "0" | "false" | "no" | "FALSE" | "NO" => false,
        _ => default,
    }
}
