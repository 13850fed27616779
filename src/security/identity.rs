//! Caller identity derivation for rate limiting.
//!
//! Identities are salted SHA-256 digests of either the presented API key or
//! the caller's address, so the limiter never holds raw credentials and log
//! lines can carry the token safely. The salt lives for one process only.

use std::fmt;
use std::net::IpAddr;

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of the random per-process salt in bytes.
pub const SALT_LEN: usize = 32;

/// Hex characters kept from the digest.
pub const TOKEN_LEN: usize = 32;

/// Opaque, fixed-length identity of a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a caller is identified by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource<'a> {
    ApiKey(&'a str),
    Address(Option<IpAddr>),
}

impl IdentitySource<'_> {
    fn kind(&self) -> &'static str {
        match self {
            IdentitySource::ApiKey(_) => "key",
            IdentitySource::Address(_) => "ip",
        }
    }
}

/// Derives identity tokens with a process-wide salt.
#[derive(Clone)]
pub struct IdentityResolver {
    salt: [u8; SALT_LEN],
    key_based: bool,
}

impl IdentityResolver {
    /// Build a resolver with an explicit salt. `key_based` selects the
    /// presented key as identity source (used when authentication is required).
    pub fn new(salt: [u8; SALT_LEN], key_based: bool) -> Self {
        Self { salt, key_based }
    }

    /// Build a resolver with a fresh random salt.
    pub fn with_random_salt(key_based: bool) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::new(salt, key_based)
    }

    /// Pick the identity source for a request.
    pub fn source<'a>(&self, presented_key: Option<&'a str>, addr: Option<IpAddr>) -> IdentitySource<'a> {
        if self.key_based {
            IdentitySource::ApiKey(presented_key.map(str::trim).unwrap_or_default())
        } else {
            IdentitySource::Address(addr)
        }
    }

    /// Resolve the identity token for a request.
    pub fn resolve(&self, presented_key: Option<&str>, addr: Option<IpAddr>) -> IdentityToken {
        self.token_for(self.source(presented_key, addr))
    }

    /// Hash `salt || ":" || kind || ":" || value`.
    pub fn token_for(&self, source: IdentitySource<'_>) -> IdentityToken {
        let mut hasher = Sha256::new();
        hasher.update(self.salt);
        hasher.update(b":");
        hasher.update(source.kind().as_bytes());
        hasher.update(b":");
        match source {
            IdentitySource::ApiKey(key) => hasher.update(key.as_bytes()),
            IdentitySource::Address(Some(ip)) => hasher.update(ip.to_string().as_bytes()),
            IdentitySource::Address(None) => hasher.update(b"unknown"),
        }
        let digest = hex::encode(hasher.finalize());
        IdentityToken(digest[..TOKEN_LEN].to_string())
    }
}

impl fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("salt", &"<redacted>")
            .field("key_based", &self.key_based)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = [7u8; SALT_LEN];

    fn ip(raw: &str) -> Option<IpAddr> {
        Some(raw.parse().unwrap())
    }

    #[test]
    fn same_caller_same_token() {
        let resolver = IdentityResolver::new(SALT, true);
        let a = resolver.resolve(Some("secret"), ip("10.0.0.1"));
        let b = resolver.resolve(Some("  secret "), ip("10.0.0.2"));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), TOKEN_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_does_not_contain_source() {
        let resolver = IdentityResolver::new(SALT, true);
        let token = resolver.resolve(Some("abcdef"), None);
        assert!(!token.as_str().contains("abcdef"));
    }

    #[test]
    fn address_mode_ignores_key() {
        let resolver = IdentityResolver::new(SALT, false);
        let a = resolver.resolve(Some("one"), ip("192.168.1.1"));
        let b = resolver.resolve(Some("two"), ip("192.168.1.1"));
        let c = resolver.resolve(Some("one"), ip("192.168.1.2"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn salt_changes_token() {
        let a = IdentityResolver::new(SALT, true).resolve(Some("k"), None);
        let b = IdentityResolver::new([8u8; SALT_LEN], true).resolve(Some("k"), None);
        assert_ne!(a, b);
    }

    #[test]
    fn kinds_are_domain_separated() {
        let resolver = IdentityResolver::new(SALT, true);
        let by_key = resolver.token_for(IdentitySource::ApiKey("unknown"));
        let by_addr = resolver.token_for(IdentitySource::Address(None));
        assert_ne!(by_key, by_addr);
    }

    #[test]
    fn empty_key_still_resolves() {
        let resolver = IdentityResolver::new(SALT, true);
        assert_eq!(resolver.resolve(None, None), resolver.resolve(Some("   "), None));
    }

    #[test]
    fn debug_hides_salt() {
        let rendered = format!("{:?}", IdentityResolver::new(SALT, true));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("7, 7"));
    }
}
