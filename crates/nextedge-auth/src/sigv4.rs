//! AWS Signature Version 4 signing.
//!
//! This module implements the signing flow:
//!
//! 1. Resolve credentials from the injected provider (the only await point).
//! 2. Drop any previously generated signature headers and stamp `x-amz-date`
//!    (plus `x-amz-security-token` for temporary credentials).
//! 3. Hash the payload and build the canonical request.
//! 4. Build the string to sign from the timestamp, credential scope and
//!    canonical request hash.
//! 5. Derive the signing key with the HMAC-SHA256 chain and sign.
//! 6. Attach the `authorization` header.
//!
//! The main entry point is [`SignatureV4::sign`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nextedge_core::AwsRegion;
use tracing::debug;

use crate::canonical::{build_canonical_request, build_signed_headers_string, canonicalize_headers};
use crate::credentials::{CredentialProvider, Credentials};
use crate::error::SigningError;
use crate::hash::{hmac_sha256, sha256_hex};
use crate::request::SigningRequest;

/// The only algorithm supported by this implementation.
const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Terminator of every SigV4 credential scope.
const SCOPE_TERMINATOR: &str = "aws4_request";

/// Header carrying the signature.
pub const AUTHORIZATION_HEADER: &str = "authorization";
/// Header carrying the signing timestamp.
pub const AMZ_DATE_HEADER: &str = "x-amz-date";
/// Header carrying the session token of temporary credentials.
pub const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";
/// Header carrying the payload hash.
pub const CONTENT_SHA256_HEADER: &str = "x-amz-content-sha256";

/// Headers the signer generates itself; stale copies are removed before signing.
const GENERATED_HEADERS: &[&str] = &[AUTHORIZATION_HEADER, AMZ_DATE_HEADER, "date"];

/// Signer behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningSettings {
    /// Add an `x-amz-content-sha256` header when the request has none.
    pub apply_checksum: bool,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            apply_checksum: true,
        }
    }
}

/// SigV4 signer bound to one region, service and credential provider.
#[derive(Debug, Clone)]
pub struct SignatureV4 {
    credential_provider: Arc<dyn CredentialProvider>,
    region: AwsRegion,
    service: String,
    settings: SigningSettings,
}

impl SignatureV4 {
    /// Create a signer with default settings.
    #[must_use]
    pub fn new(
        credential_provider: Arc<dyn CredentialProvider>,
        region: AwsRegion,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credential_provider,
            region,
            service: service.into(),
            settings: SigningSettings::default(),
        }
    }

    /// Replace the signer settings.
    #[must_use]
    pub fn with_settings(mut self, settings: SigningSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The region requests are signed for.
    #[must_use]
    pub fn region(&self) -> &AwsRegion {
        &self.region
    }

    /// The service name in the credential scope.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Resolve credentials and sign `request` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Credentials`] if the provider fails, and any error
    /// of [`SignatureV4::sign_with_credentials`].
    pub async fn sign(
        &self,
        request: SigningRequest,
        now: DateTime<Utc>,
    ) -> Result<SigningRequest, SigningError> {
        let credentials = self.credential_provider.resolve().await?;
        self.sign_with_credentials(request, &credentials, now)
    }

    /// Sign `request` with already resolved credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::ExpiredCredentials`] if the credentials are past
    /// their expiration at `now`, or [`SigningError::InvalidHeaderValue`] if a
    /// header value contains a line break.
    pub fn sign_with_credentials(
        &self,
        mut request: SigningRequest,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<SigningRequest, SigningError> {
        if credentials.is_expired_at(now) {
            return Err(SigningError::ExpiredCredentials {
                access_key_id: credentials.access_key_id().to_owned(),
                expiration: credentials
                    .expiration()
                    .map(|e| e.to_rfc3339())
                    .unwrap_or_default(),
            });
        }

        if let Some((name, _)) = request
            .headers
            .iter()
            .find(|(_, value)| value.contains(['\r', '\n']))
        {
            return Err(SigningError::InvalidHeaderValue(name.to_owned()));
        }

        let long_date = format_amz_date(now);
        let short_date = &long_date[..8];

        for name in GENERATED_HEADERS {
            request.headers.remove(name);
        }
        if let Some(token) = credentials.session_token() {
            request.headers.remove(SECURITY_TOKEN_HEADER);
            request.headers.insert(SECURITY_TOKEN_HEADER, token);
        }
        request.headers.insert(AMZ_DATE_HEADER, long_date.as_str());

        let payload_hash = match request.headers.get(CONTENT_SHA256_HEADER) {
            Some(existing) => existing.to_owned(),
            None => {
                let hash = sha256_hex(request.body.as_deref().unwrap_or_default());
                if self.settings.apply_checksum {
                    request.headers.insert(CONTENT_SHA256_HEADER, hash.as_str());
                }
                hash
            }
        };

        let canonical_headers = canonicalize_headers(&request.headers);
        let canonical_request = build_canonical_request(
            &request.method,
            &request.path,
            &request.query,
            &canonical_headers,
            &payload_hash,
        );

        debug!(canonical_request, "Built canonical request");

        let credential_scope = build_credential_scope(short_date, self.region.as_str(), &self.service);
        let string_to_sign = build_string_to_sign(
            &long_date,
            &credential_scope,
            &sha256_hex(canonical_request.as_bytes()),
        );

        debug!(string_to_sign, "Built string to sign");

        let signing_key = derive_signing_key(
            credentials.secret_access_key(),
            short_date,
            self.region.as_str(),
            &self.service,
        );
        let signature = compute_signature(&signing_key, &string_to_sign);
        let signed_headers = build_signed_headers_string(&canonical_headers);

        request.headers.insert(
            AUTHORIZATION_HEADER,
            format!(
                "{SIGNING_ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
                credentials.access_key_id()
            ),
        );

        debug!(
            access_key_id = %credentials.access_key_id(),
            region = %self.region,
            service = %self.service,
            signed_headers,
            "Signed request"
        );

        Ok(request)
    }
}

/// Format a timestamp as the SigV4 `YYYYMMDD'T'HHMMSS'Z'` form.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use nextedge_auth::sigv4::format_amz_date;
///
/// let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
/// assert_eq!(format_amz_date(now), "20150830T123600Z");
/// ```
#[must_use]
pub fn format_amz_date(time: DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Build the credential scope `date/region/service/aws4_request`.
#[must_use]
pub fn build_credential_scope(date: &str, region: &str, service: &str) -> String {
    format!("{date}/{region}/{service}/{SCOPE_TERMINATOR}")
}

/// Build the SigV4 string to sign.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
///
/// # Examples
///
/// ```
/// use nextedge_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/us-east-1/s3/aws4_request",
///     "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{SIGNING_ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key using HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Compute the HMAC-SHA256 signature of `data` using the given `signing_key`.
///
/// Returns the hex-encoded signature.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}
