//! CloudFront Functions viewer-request event.
//!
//! Headers, cookies and query parameters are all maps from a lower-cased name
//! to a [`FunctionValue`], which holds either a single `value` or a
//! `multiValue` list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Map from lower-cased name to value object.
pub type FunctionValues = BTreeMap<String, FunctionValue>;

/// The event passed to a viewer-request function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionEvent {
    /// Event schema version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Distribution and request metadata, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Viewer metadata (e.g. IP), kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<Value>,
    /// The viewer request.
    pub request: FunctionRequest,
}

/// A viewer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub uri: String,
    /// Query parameters.
    #[serde(default)]
    pub querystring: FunctionValues,
    /// Request headers.
    #[serde(default)]
    pub headers: FunctionValues,
    /// Request cookies.
    #[serde(default)]
    pub cookies: FunctionValues,
}

/// A header, cookie or query value: single or multi-valued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionValue {
    /// The value of a single-valued entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// The values of a multi-valued entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_value: Option<Vec<FunctionValueEntry>>,
}

/// One element of a `multiValue` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionValueEntry {
    /// The value.
    pub value: String,
}

impl FunctionValue {
    /// Create a single-valued entry.
    #[must_use]
    pub fn single(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            multi_value: None,
        }
    }

    /// Create a multi-valued entry.
    #[must_use]
    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: None,
            multi_value: Some(
                values
                    .into_iter()
                    .map(|value| FunctionValueEntry {
                        value: value.into(),
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_viewer_request_event() {
        let event: FunctionEvent = serde_json::from_str(
            r#"{
                "version": "1.0",
                "context": { "eventType": "viewer-request" },
                "viewer": { "ip": "198.51.100.11" },
                "request": {
                    "method": "GET",
                    "uri": "/index.html",
                    "querystring": { "page": { "value": "2" } },
                    "headers": {
                        "host": { "value": "www.example.com" },
                        "accept": { "value": "text/html", "multiValue": [{ "value": "text/html" }, { "value": "*/*" }] }
                    },
                    "cookies": { "id": { "value": "CookieIdValue" } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(event.version.as_deref(), Some("1.0"));
        let request = event.request;
        assert_eq!(request.uri, "/index.html");
        assert_eq!(request.querystring["page"], FunctionValue::single("2"));
        assert_eq!(request.cookies["id"].value.as_deref(), Some("CookieIdValue"));
        let accept = &request.headers["accept"];
        assert_eq!(accept.multi_value.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_should_serialize_single_value_without_multi_value() {
        let json = serde_json::to_string(&FunctionValue::single("abc")).unwrap();
        assert_eq!(json, r#"{"value":"abc"}"#);

        let json = serde_json::to_string(&FunctionValue::multi(["a", "b"])).unwrap();
        assert_eq!(json, r#"{"multiValue":[{"value":"a"},{"value":"b"}]}"#);
    }

    #[test]
    fn test_should_default_missing_maps() {
        let request: FunctionRequest =
            serde_json::from_str(r#"{"method": "GET", "uri": "/"}"#).unwrap();
        assert!(request.headers.is_empty());
        assert!(request.cookies.is_empty());
        assert!(request.querystring.is_empty());
    }
}
