//! Lambda@Edge origin-request event.
//!
//! ```json
//! {
//!   "Records": [{
//!     "cf": {
//!       "config": { "distributionId": "EDFDVBD6EXAMPLE", "eventType": "origin-request", ... },
//!       "request": {
//!         "clientIp": "203.0.113.178",
//!         "method": "GET",
//!         "uri": "/",
//!         "querystring": "",
//!         "headers": { "host": [{ "key": "Host", "value": "d111111abcdef8.cloudfront.net" }] },
//!         "origin": { "custom": { "domainName": "example.org", ... } }
//!       }
//!     }
//!   }]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Headers keyed by lower-cased name; each list holds one `{key, value}` entry
/// per header line.
pub type CfHeaders = BTreeMap<String, Vec<CfHeader>>;

/// The top-level event passed to an origin-request function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginRequestEvent {
    /// Always exactly one record.
    #[serde(rename = "Records")]
    pub records: Vec<CfRecord>,
}

impl OriginRequestEvent {
    /// Take the request out of the first record.
    #[must_use]
    pub fn into_request(self) -> Option<CfRequest> {
        self.records.into_iter().next().map(|record| record.cf.request)
    }
}

/// One event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfRecord {
    /// The CloudFront payload.
    pub cf: CfEvent,
}

/// The CloudFront payload of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfEvent {
    /// Distribution metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CfConfig>,
    /// The request being forwarded to the origin.
    pub request: CfRequest,
}

/// Distribution metadata of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfConfig {
    /// Distribution domain, e.g. `d111111abcdef8.cloudfront.net`.
    #[serde(default)]
    pub distribution_domain_name: String,
    /// Distribution id.
    #[serde(default)]
    pub distribution_id: String,
    /// Trigger, e.g. `origin-request`.
    #[serde(default)]
    pub event_type: String,
    /// Per-request id assigned by CloudFront.
    #[serde(default)]
    pub request_id: String,
}

/// A single header entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfHeader {
    /// Header name in its original case. CloudFront may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Header value.
    pub value: String,
}

impl CfHeader {
    /// Create an entry with both key and value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }
}

/// The request as seen by an origin-request function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfRequest {
    /// Viewer IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    /// Request headers.
    #[serde(default)]
    pub headers: CfHeaders,
    /// HTTP method.
    pub method: String,
    /// Raw query string without the leading `?`.
    #[serde(default)]
    pub querystring: String,
    /// Request path.
    pub uri: String,
    /// Origin the request is routed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<CfOrigin>,
    /// Request body, when the behaviour includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<CfBody>,
}

impl CfRequest {
    /// First value of a header, by lower-cased name.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|entries| entries.first())
            .map(|entry| entry.value.as_str())
    }
}

/// Origin of a request: a tagged union of `custom` and `s3`.
///
/// Exactly one variant is present in a well-formed event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfOrigin {
    /// Arbitrary HTTP(S) endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomOrigin>,
    /// S3 bucket origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Origin>,
}

/// Custom origin settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOrigin {
    /// Origin domain name.
    #[serde(default)]
    pub domain_name: String,
    /// Headers CloudFront adds on the way to the origin.
    #[serde(default)]
    pub custom_headers: CfHeaders,
    /// Path prefix.
    #[serde(default)]
    pub path: String,
    /// Origin port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// `http` or `https`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Remaining settings (timeouts, TLS protocols), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// S3 origin settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Origin {
    /// Bucket domain name.
    #[serde(default)]
    pub domain_name: String,
    /// Bucket region.
    #[serde(default)]
    pub region: String,
    /// Remaining settings, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body as delivered to the function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfBody {
    /// `read-only` or `replace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Encoded body data.
    #[serde(default)]
    pub data: String,
    /// `base64` or `text`.
    #[serde(default = "default_body_encoding")]
    pub encoding: String,
    /// Whether CloudFront cut the body to its size limit.
    #[serde(default)]
    pub input_truncated: bool,
}

fn default_body_encoding() -> String {
    "base64".to_owned()
}
