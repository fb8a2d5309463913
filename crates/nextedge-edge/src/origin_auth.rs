//! Origin-request signing for private function URLs.
//!
//! CloudFront forwards the viewer request to a custom origin that only accepts
//! SigV4-authenticated calls. For every origin-request event this module:
//!
//! 1. rebuilds a [`SigningRequest`] from the CloudFront request (headers
//!    flattened, query decoded, body decoded),
//! 2. signs it for the region encoded in the origin host,
//! 3. writes the signing headers back in CloudFront's array-wrapped form.
//!
//! Everything else on the request (`uri`, `method`, `querystring`, `body`,
//! `origin`) passes through untouched. The inbound `x-forwarded-for` header is
//! dropped because the function URL would otherwise see it as signed input
//! that CloudFront rewrites after the function runs.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use nextedge_auth::{
    CredentialProvider, HeaderMap, SignatureV4, SigningRequest, SigningSettings,
};
use nextedge_core::{AwsRegion, NextEdgeConfig};
use nextedge_model::{CfBody, CfHeader, CfHeaders, CfRequest, OriginRequestEvent};

use crate::error::{EdgeError, EdgeResult};

/// Header stripped from every request before signing.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

const HOST_HEADER: &str = "host";

/// Signs origin requests with credentials from an injected provider.
#[derive(Debug, Clone)]
pub struct OriginAuthHandler {
    credential_provider: Arc<dyn CredentialProvider>,
    service: String,
    settings: SigningSettings,
}

impl OriginAuthHandler {
    /// Create a handler signing for `service` with default settings.
    #[must_use]
    pub fn new(credential_provider: Arc<dyn CredentialProvider>, service: impl Into<String>) -> Self {
        Self {
            credential_provider,
            service: service.into(),
            settings: SigningSettings::default(),
        }
    }

    /// Create a handler from the runtime configuration.
    #[must_use]
    pub fn from_config(
        credential_provider: Arc<dyn CredentialProvider>,
        config: &NextEdgeConfig,
    ) -> Self {
        Self::new(credential_provider, config.signing_service.as_str()).with_settings(
            SigningSettings {
                apply_checksum: config.apply_checksum,
            },
        )
    }

    /// Replace the signer settings.
    #[must_use]
    pub fn with_settings(mut self, settings: SigningSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The SigV4 service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Build the signer for one invocation against `region`.
    #[must_use]
    pub fn signer_for(&self, region: AwsRegion) -> SignatureV4 {
        SignatureV4::new(Arc::clone(&self.credential_provider), region, &self.service)
            .with_settings(self.settings)
    }

    /// Sign the request of an origin-request event.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::MissingRecord`] for an event without records, and
    /// any error of [`OriginAuthHandler::handle`].
    pub async fn handle_event(
        &self,
        event: OriginRequestEvent,
        now: DateTime<Utc>,
    ) -> EdgeResult<CfRequest> {
        let request = event.into_request().ok_or(EdgeError::MissingRecord)?;
        self.handle(request, now).await
    }

    /// Sign `request` as of `now` and return it with the signing headers merged in.
    ///
    /// # Errors
    ///
    /// Fails when the origin is not a custom origin, when the host is missing or
    /// does not encode a region, when the body cannot be decoded, or when
    /// signing fails. No partially signed request is ever returned.
    pub async fn handle(&self, mut request: CfRequest, now: DateTime<Utc>) -> EdgeResult<CfRequest> {
        let (signing_request, region) = build_signing_request(&mut request)?;
        let signer = self.signer_for(region);

        info!(
            method = %request.method,
            uri = %request.uri,
            region = %signer.region(),
            service = signer.service(),
            "Signing origin request"
        );

        let signed = signer.sign(signing_request, now).await?;

        merge_signed_headers(&mut request, &signed.headers);
        Ok(request)
    }
}

/// Rebuild the signable request from a CloudFront request.
///
/// Removes `x-forwarded-for` from `request` as a side effect; nothing else on
/// it is modified.
///
/// # Errors
///
/// Returns [`EdgeError::UnexpectedOrigin`] unless the origin is `custom`,
/// [`EdgeError::MissingHost`] / [`EdgeError::InvalidHost`] for hosts without a
/// region, and body decoding errors from [`decode_body`].
pub fn build_signing_request(request: &mut CfRequest) -> EdgeResult<(SigningRequest, AwsRegion)> {
    request
        .headers
        .retain(|name, _| !name.eq_ignore_ascii_case(FORWARDED_FOR_HEADER));

    ensure_custom_origin(request)?;

    let host = request
        .header_value(HOST_HEADER)
        .ok_or(EdgeError::MissingHost)?
        .to_owned();
    let region = AwsRegion::from_host(&host).map_err(|source| EdgeError::InvalidHost {
        host: host.clone(),
        source,
    })?;

    let mut signing_request = SigningRequest::new(request.method.as_str(), host, request.uri.as_str());
    for (key, value) in form_urlencoded::parse(request.querystring.as_bytes()) {
        signing_request.push_query(key, value);
    }
    signing_request.headers = flatten_headers(&request.headers);
    signing_request.body = request.body.as_ref().map(decode_body).transpose()?;

    debug!(
        region = %region,
        headers = signing_request.headers.len(),
        query_keys = signing_request.query.len(),
        has_body = signing_request.body.is_some(),
        "Rebuilt signing request"
    );

    Ok((signing_request, region))
}

fn ensure_custom_origin(request: &CfRequest) -> EdgeResult<()> {
    match &request.origin {
        Some(origin) if origin.custom.is_some() => Ok(()),
        Some(origin) => Err(EdgeError::UnexpectedOrigin(
            serde_json::to_string(origin).unwrap_or_default(),
        )),
        None => Err(EdgeError::UnexpectedOrigin("undefined".to_owned())),
    }
}

/// Flatten array-wrapped headers to one value per header.
///
/// Each header contributes its first entry, named by the entry's `key` (or the
/// map key when CloudFront omitted it). Later names win over earlier ones.
#[must_use]
pub fn flatten_headers(headers: &CfHeaders) -> HeaderMap {
    headers
        .iter()
        .filter_map(|(name, entries)| {
            let first = entries.first()?;
            let key = first.key.clone().unwrap_or_else(|| name.clone());
            Some((key, first.value.clone()))
        })
        .collect()
}

/// Decode a CloudFront body to raw bytes.
///
/// # Errors
///
/// Returns [`EdgeError::TruncatedBody`] for a truncated body,
/// [`EdgeError::InvalidBody`] for bad base64 and
/// [`EdgeError::UnsupportedBodyEncoding`] for encodings other than `base64`
/// and `text`.
pub fn decode_body(body: &CfBody) -> EdgeResult<Vec<u8>> {
    if body.input_truncated {
        return Err(EdgeError::TruncatedBody);
    }
    match body.encoding.as_str() {
        "base64" => BASE64_STANDARD
            .decode(body.data.as_bytes())
            .map_err(|e| EdgeError::InvalidBody(e.to_string())),
        "text" => Ok(body.data.clone().into_bytes()),
        other => Err(EdgeError::UnsupportedBodyEncoding(other.to_owned())),
    }
}

/// Write every signed header back onto the CloudFront request.
///
/// Each header becomes `headers[lower(name)] = [{key: name, value}]`, replacing
/// whatever was there before.
pub fn merge_signed_headers(request: &mut CfRequest, signed: &HeaderMap) {
    for (name, value) in signed.iter() {
        request
            .headers
            .insert(name.to_ascii_lowercase(), vec![CfHeader::new(name, value)]);
    }
}
