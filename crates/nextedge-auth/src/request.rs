//! The request model the signer operates on.
//!
//! [`SigningRequest`] is a flat, protocol-agnostic view of an HTTP request:
//! single-valued headers, decoded query parameters and raw body bytes. It is
//! built from the CDN event, handed to the signer, and discarded once the
//! signed headers have been copied back.

use std::collections::BTreeMap;

/// The only protocol origin requests are signed for.
pub const HTTPS_PROTOCOL: &str = "https:";

/// A decoded query parameter value.
///
/// The first occurrence of a key is stored as [`QueryValue::Single`]; a repeated
/// key turns it into [`QueryValue::Multi`], preserving occurrence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A key that occurred once.
    Single(String),
    /// A key that occurred more than once, in order of occurrence.
    Multi(Vec<String>),
}

impl QueryValue {
    /// Record another occurrence of the same key.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => {
                let first = std::mem::take(first);
                *self = Self::Multi(vec![first, value]);
            }
            Self::Multi(values) => values.push(value),
        }
    }

    /// All values for the key, in order of occurrence.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multi(values) => values,
        }
    }
}

/// Insertion-ordered, single-valued header map.
///
/// Names keep the case they were inserted with. [`HeaderMap::insert`] replaces
/// an entry with the exact same name; lookups and removals ignore case, which
/// is how the signing protocol treats header names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Create an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing a previous value stored under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get the first value whose name matches case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a header with this name exists, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove every header whose name matches case-insensitively.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// Canonical request handed to the signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: String,
    /// Always [`HTTPS_PROTOCOL`].
    pub protocol: &'static str,
    /// Target host name.
    pub hostname: String,
    /// Request path as received (still percent-encoded).
    pub path: String,
    /// Decoded query parameters.
    pub query: BTreeMap<String, QueryValue>,
    /// Single-valued headers.
    pub headers: HeaderMap,
    /// Raw body bytes, if the request has a body.
    pub body: Option<Vec<u8>>,
}

impl SigningRequest {
    /// Create a request with no query, headers or body.
    #[must_use]
    pub fn new(method: impl Into<String>, hostname: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            protocol: HTTPS_PROTOCOL,
            hostname: hostname.into(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add one query parameter occurrence.
    pub fn push_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.query.entry(key.into()) {
            std::collections::btree_map::Entry::Occupied(mut entry) => entry.get_mut().push(value),
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(QueryValue::Single(value));
            }
        }
    }
}
