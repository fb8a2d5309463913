//! Canonical request construction for AWS Signature Version 4.
//!
//! This module implements the canonical request format as specified by AWS:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! The rules follow the SDK signer for non-S3 services: the path is normalized
//! and encoded a second time, query keys and values are encoded from their
//! decoded form, and a fixed set of hop-by-hop and client headers is never
//! signed.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::request::{HeaderMap, QueryValue};

/// The set of characters that must be percent-encoded.
///
/// Everything except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Headers that are never part of the signature.
const UNSIGNABLE_HEADERS: &[&str] = &[
    "authorization",
    "cache-control",
    "connection",
    "expect",
    "from",
    "keep-alive",
    "max-forwards",
    "pragma",
    "referer",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "user-agent",
    "x-amzn-trace-id",
];

/// Query parameter carrying a presigned signature; never signed itself.
const SIGNATURE_QUERY_PARAM: &str = "x-amz-signature";

/// Build the full canonical request string from its components.
///
/// `headers` must already be canonicalized with [`canonicalize_headers`].
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use nextedge_auth::canonical::build_canonical_request;
///
/// let mut headers = BTreeMap::new();
/// headers.insert("host".to_owned(), "example.amazonaws.com".to_owned());
///
/// let canonical = build_canonical_request(
///     "GET",
///     "/",
///     &BTreeMap::new(),
///     &headers,
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
/// );
/// assert!(canonical.starts_with("GET\n/\n\nhost:example.amazonaws.com\n\nhost\n"));
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    path: &str,
    query: &BTreeMap<String, QueryValue>,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> String {
    let canonical_uri = build_canonical_uri(path);
    let canonical_query = build_canonical_query_string(query);
    let canonical_headers = build_canonical_headers(headers);
    let signed_headers = build_signed_headers_string(headers);

    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers}\n{payload_hash}"
    )
}

/// Build the canonical URI.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment.
/// A leading slash, and a trailing slash after a non-empty path, are kept.
/// The result is then URI-encoded as a whole with `/` left intact, so an
/// already percent-encoded path is encoded a second time.
///
/// # Examples
///
/// ```
/// use nextedge_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/"), "/");
/// assert_eq!(build_canonical_uri("/a/./b/../c"), "/a/c");
/// assert_eq!(build_canonical_uri("/hello%20world"), "/hello%2520world");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    if path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    if !segments.is_empty() && path.ends_with('/') {
        normalized.push('/');
    }

    uri_encode(&normalized).replace("%2F", "/")
}

/// Build the canonical query string.
///
/// Keys and values are URI-encoded, pairs are sorted by encoded key, and the
/// values of a repeated key are emitted as sorted `key=value` pairs.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use nextedge_auth::canonical::build_canonical_query_string;
/// use nextedge_auth::QueryValue;
///
/// let mut query = BTreeMap::new();
/// query.insert("b".to_owned(), QueryValue::Single("2".to_owned()));
/// query.insert("a".to_owned(), QueryValue::Single("x y".to_owned()));
/// assert_eq!(build_canonical_query_string(&query), "a=x%20y&b=2");
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &BTreeMap<String, QueryValue>) -> String {
    let mut serialized: Vec<(String, String)> = query
        .iter()
        .filter(|(key, _)| !key.eq_ignore_ascii_case(SIGNATURE_QUERY_PARAM))
        .map(|(key, value)| {
            let encoded_key = uri_encode(key);
            let mut pairs: Vec<String> = value
                .values()
                .iter()
                .map(|v| format!("{encoded_key}={}", uri_encode(v)))
                .collect();
            pairs.sort_unstable();
            (encoded_key, pairs.join("&"))
        })
        .filter(|(_, pairs)| !pairs.is_empty())
        .collect();

    serialized.sort_by(|a, b| a.0.cmp(&b.0));

    serialized
        .into_iter()
        .map(|(_, pairs)| pairs)
        .collect::<Vec<_>>()
        .join("&")
}

/// Select and normalize the headers that take part in the signature.
///
/// Names are lowercased, unsignable names and `proxy-` / `sec-` prefixed names
/// are skipped, values are trimmed with internal whitespace runs collapsed to a
/// single space. When two names collide after lowercasing, the later one wins.
#[must_use]
pub fn canonicalize_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let lower_name = name.to_ascii_lowercase();
            if is_unsignable(&lower_name) {
                return None;
            }
            Some((lower_name, collapse_whitespace(value.trim())))
        })
        .collect()
}

/// Build the canonical headers block (`name:value` lines, sorted, no trailing newline).
#[must_use]
pub fn build_canonical_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the signed headers string as a semicolon-separated list of lowercase header names.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use nextedge_auth::canonical::build_signed_headers_string;
///
/// let mut headers = BTreeMap::new();
/// headers.insert("x-amz-date".to_owned(), String::new());
/// headers.insert("host".to_owned(), String::new());
/// assert_eq!(build_signed_headers_string(&headers), "host;x-amz-date");
/// ```
#[must_use]
pub fn build_signed_headers_string(headers: &BTreeMap<String, String>) -> String {
    headers.keys().map(String::as_str).collect::<Vec<_>>().join(";")
}

fn is_unsignable(lower_name: &str) -> bool {
    UNSIGNABLE_HEADERS.contains(&lower_name)
        || lower_name.starts_with("proxy-")
        || lower_name.starts_with("sec-")
}

/// URI-encode a string using the AWS SigV4 encoding rules.
fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Collapse consecutive whitespace characters in a string to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
