//! SHA-256 / HMAC-SHA256 incremental hash adapter.
//!
//! The signer needs two primitives: a plain digest (payload and canonical
//! request hashes) and a keyed MAC (signing key derivation and the final
//! signature). [`Sha256Hash`] exposes both behind one `update`/`finalize`
//! interface, selected by whether a secret is supplied at construction.

use std::fmt;

use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Incremental SHA-256 hash, keyed (HMAC) or unkeyed.
///
/// `finalize` consumes the hasher, so each instance yields exactly one digest.
///
/// # Examples
///
/// ```
/// use nextedge_auth::hash::Sha256Hash;
///
/// let mut hash = Sha256Hash::new(None);
/// hash.update(b"");
/// assert_eq!(
///     hex::encode(hash.finalize()),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub enum Sha256Hash {
    /// Plain SHA-256.
    Digest(Sha256),
    /// HMAC-SHA256 keyed by a secret.
    Mac(HmacSha256),
}

impl Sha256Hash {
    /// Create a hasher; `Some(secret)` selects HMAC, `None` a plain digest.
    #[must_use]
    pub fn new(secret: Option<&[u8]>) -> Self {
        match secret {
            Some(key) => Self::Mac(
                HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length"),
            ),
            None => Self::Digest(Sha256::new()),
        }
    }

    /// Feed more bytes into the hash.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Digest(hasher) => Digest::update(hasher, data),
            Self::Mac(mac) => Mac::update(mac, data),
        }
    }

    /// Produce the final 32-byte hash as an owned buffer.
    ///
    /// Synchronous: hashing never waits on I/O, and taking `self` by value
    /// rules out a second digest of the same instance at compile time.
    #[must_use]
    pub fn finalize(self) -> Vec<u8> {
        match self {
            Self::Digest(hasher) => hasher.finalize().to_vec(),
            Self::Mac(mac) => mac.finalize().into_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(_) => f.write_str("Sha256Hash::Digest"),
            Self::Mac(_) => f.write_str("Sha256Hash::Mac"),
        }
    }
}

/// Compute the SHA-256 hash of `data` and return it hex-encoded.
///
/// # Examples
///
/// ```
/// use nextedge_auth::hash::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hash = Sha256Hash::new(None);
    hash.update(data);
    hex::encode(hash.finalize())
}

/// Compute HMAC-SHA256 of `data` keyed by `key` and return the raw bytes.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Sha256Hash::new(Some(key));
    mac.update(data);
    mac.finalize()
}
