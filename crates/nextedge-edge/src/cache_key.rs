//! Viewer-request cache-key derivation.
//!
//! Next.js serves different payloads for the same URL depending on a handful
//! of request headers (RSC navigation, prefetch, router state) and, for the
//! image optimizer, on `accept`. Those headers are folded into one MD5 digest
//! exposed as `x-open-next-cache-key`, so the CDN cache policy only has to
//! whitelist a single header. Viewer geolocation headers are copied under the
//! `x-open-next-` prefix so they survive to the origin.

use md5::{Digest, Md5};
use tracing::debug;

use nextedge_model::{FunctionEvent, FunctionRequest, FunctionValue, FunctionValues};

/// Header holding the derived cache key.
pub const CACHE_KEY_HEADER: &str = "x-open-next-cache-key";

/// Cookie set while Next.js draft/preview mode is on.
pub const PRERENDER_BYPASS_COOKIE: &str = "__prerender_bypass";

const IMAGE_OPTIMIZER_PATH: &str = "/_next/image";

const KEY_HEADERS: &[&str] = &[
    "rsc",
    "next-router-prefetch",
    "next-router-state-tree",
    "next-url",
    "x-prerender-revalidate",
];

const GEO_FIELDS: &[&str] = &["city", "country", "region", "latitude", "longitude"];

/// Apply the cache-key transform to a viewer event and return its request.
#[must_use]
pub fn handle_event(event: FunctionEvent) -> FunctionRequest {
    apply_cache_key(event.request)
}

/// Set `x-forwarded-host`, the cache-key header and the geolocation headers.
#[must_use]
pub fn apply_cache_key(mut request: FunctionRequest) -> FunctionRequest {
    if let Some(host) = request.headers.get("host").cloned() {
        request.headers.insert("x-forwarded-host".to_owned(), host);
    }

    let cache_key = compute_cache_key(&request);
    debug!(uri = %request.uri, cache_key, "Derived cache key");
    request
        .headers
        .insert(CACHE_KEY_HEADER.to_owned(), FunctionValue::single(cache_key));

    copy_geo_headers(&mut request.headers);
    request
}

/// Hex MD5 of the key material for `request`.
#[must_use]
pub fn compute_cache_key(request: &FunctionRequest) -> String {
    let mut material = if request.uri.contains(IMAGE_OPTIMIZER_PATH) {
        header_value(&request.headers, "accept")
    } else {
        KEY_HEADERS
            .iter()
            .map(|name| header_value(&request.headers, name))
            .collect::<String>()
    };

    // Only the first occurrence counts, even when the cookie was sent twice.
    if let Some(cookie) = request.cookies.get(PRERENDER_BYPASS_COOKIE) {
        material.push_str(cookie.value.as_deref().unwrap_or_default());
    }

    hex::encode(Md5::digest(material.as_bytes()))
}

/// Read a header as one string: multi-values joined with `,`, missing as `""`.
#[must_use]
pub fn header_value(headers: &FunctionValues, name: &str) -> String {
    headers.get(name).map(value_of).unwrap_or_default()
}

fn value_of(value: &FunctionValue) -> String {
    match &value.multi_value {
        Some(entries) => entries
            .iter()
            .map(|entry| entry.value.as_str())
            .collect::<Vec<_>>()
            .join(","),
        None => value.value.clone().unwrap_or_default(),
    }
}

fn copy_geo_headers(headers: &mut FunctionValues) {
    for field in GEO_FIELDS {
        if let Some(value) = headers.get(&format!("cloudfront-viewer-{field}")).cloned() {
            headers.insert(format!("x-open-next-{field}"), value);
        }
    }
}
