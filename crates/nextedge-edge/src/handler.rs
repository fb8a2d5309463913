//! Payload-level dispatch to the configured edge handler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use nextedge_auth::CredentialProvider;
use nextedge_core::{HandlerKind, NextEdgeConfig};
use nextedge_model::{FunctionEvent, OriginRequestEvent};

use crate::cache_key;
use crate::error::EdgeResult;
use crate::origin_auth::OriginAuthHandler;

/// The handler a runtime invokes with raw event payloads.
#[derive(Debug, Clone)]
pub enum EdgeHandler {
    /// Sign origin requests.
    OriginAuth(OriginAuthHandler),
    /// Derive the cache key of viewer requests.
    CacheKey,
}

impl EdgeHandler {
    /// Build the handler selected by `config`.
    #[must_use]
    pub fn from_config(
        credential_provider: Arc<dyn CredentialProvider>,
        config: &NextEdgeConfig,
    ) -> Self {
        match config.handler {
            HandlerKind::OriginAuth => {
                Self::OriginAuth(OriginAuthHandler::from_config(credential_provider, config))
            }
            HandlerKind::CacheKey => Self::CacheKey,
        }
    }

    /// Which handler this is.
    #[must_use]
    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::OriginAuth(_) => HandlerKind::OriginAuth,
            Self::CacheKey => HandlerKind::CacheKey,
        }
    }

    /// Decode `payload`, run the handler and encode the returned request.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::Event`](crate::EdgeError::Event) if the payload does
    /// not match the handler's event schema, or any error of the handler.
    pub async fn invoke(&self, payload: &[u8], now: DateTime<Utc>) -> EdgeResult<Value> {
        match self {
            Self::OriginAuth(handler) => {
                let event: OriginRequestEvent = serde_json::from_slice(payload)?;
                let request = handler.handle_event(event, now).await?;
                Ok(serde_json::to_value(request)?)
            }
            Self::CacheKey => {
                let event: FunctionEvent = serde_json::from_slice(payload)?;
                Ok(serde_json::to_value(cache_key::handle_event(event))?)
            }
        }
    }
}
