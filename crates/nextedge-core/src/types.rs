//! Common AWS type definitions shared across handlers.

use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Zero-based position of the region segment in a regional endpoint host.
const REGION_SEGMENT: usize = 2;

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Derive the region from a regional endpoint host name.
    ///
    /// Regional endpoints are named `<service>.<rest>.<region>.<domain...>`, so the
    /// region is the third dot-separated segment. This is a naming convention, not
    /// a DNS lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidHost`] if the host has fewer than three segments
    /// or the region segment is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use nextedge_core::AwsRegion;
    ///
    /// let region = AwsRegion::from_host("fn.lambda-url.eu-west-1.on.aws").unwrap();
    /// assert_eq!(region.as_str(), "eu-west-1");
    /// assert!(AwsRegion::from_host("localhost").is_err());
    /// ```
    pub fn from_host(host: &str) -> CoreResult<Self> {
        host.split('.')
            .nth(REGION_SEGMENT)
            .filter(|segment| !segment.is_empty())
            .map(Self::new)
            .ok_or_else(|| CoreError::InvalidHost(host.to_owned()))
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
