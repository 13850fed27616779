//! Per-identity token bucket rate limiting.
//!
//! Buckets are continuous-valued so fractional rates (0.5 req/s) are exact.
//! State is memory-resident and never evicted: the map grows with the number
//! of distinct identities seen during the process lifetime.

use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::error::{GateError, Result};
use crate::security::identity::IdentityToken;

/// Token bucket state for one identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketState {
    /// Available tokens, within `[0, burst]`.
    pub tokens: f64,
    /// Seconds since the Unix epoch of the last check.
    pub last_refill: f64,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Request may proceed.
    Allowed,
    /// Request is refused; the caller may retry after the given delay.
    Denied { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }

    /// Retry hint in whole seconds, if denied.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Admission::Allowed => None,
            Admission::Denied { retry_after_secs } => Some(*retry_after_secs),
        }
    }
}

/// Token bucket store keyed by identity token.
pub struct RateLimiter {
    buckets: DashMap<IdentityToken, BucketState>,
    enabled: bool,
    rps: f64,
    burst: f64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            enabled: config.enabled,
            rps: config.requests_per_second,
            burst: config.burst_size,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check and, if allowed, consume one token for `identity` at `now_millis`.
    ///
    /// The whole refill/consume sequence runs under the map entry's lock,
    /// so concurrent checks for one identity never over-admit.
    pub fn admit(&self, identity: &IdentityToken, now_millis: u64) -> Result<Admission> {
        if !self.enabled {
            return Ok(Admission::Allowed);
        }
        if !(is_positive_finite(self.rps) && is_positive_finite(self.burst)) {
            return Err(GateError::RateLimitMisconfigured);
        }

        let now = now_millis as f64 / 1000.0;
        let mut bucket = self
            .buckets
            .entry(identity.clone())
            .or_insert_with(|| BucketState {
                tokens: self.burst,
                last_refill: now,
            });

        let elapsed = (now - bucket.last_refill).max(0.0);
        let mut tokens = (bucket.tokens + elapsed * self.rps).min(self.burst);
        bucket.last_refill = bucket.last_refill.max(now);

        if tokens >= 1.0 {
            tokens -= 1.0;
            bucket.tokens = tokens;
            Ok(Admission::Allowed)
        } else {
            bucket.tokens = tokens;
            let deficit = 1.0 - tokens;
            let retry_after_secs = ((deficit / self.rps).ceil() as u64).max(1);
            Ok(Admission::Denied { retry_after_secs })
        }
    }

    /// Snapshot of one identity's bucket.
    pub fn bucket(&self, identity: &IdentityToken) -> Option<BucketState> {
        self.buckets.get(identity).map(|entry| *entry)
    }

    /// Number of identities with a bucket.
    pub fn tracked_identities(&self) -> usize {
        self.buckets.len()
    }
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.enabled)
            .field("rps", &self.rps)
            .field("burst", &self.burst)
            .field("tracked_identities", &self.buckets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::identity::{IdentityResolver, SALT_LEN};
    use std::sync::Arc;

    const T0: u64 = 1_700_000_000_000;

    fn limiter(rps: f64, burst: f64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enabled: true,
            requests_per_second: rps,
            burst_size: burst,
        })
    }

    fn id(name: &str) -> IdentityToken {
        IdentityResolver::new([1u8; SALT_LEN], true).resolve(Some(name), None)
    }

    #[test]
    fn disabled_always_allows() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: false,
            requests_per_second: f64::NAN,
            burst_size: 0.0,
        });
        for _ in 0..100 {
            assert_eq!(limiter.admit(&id("a"), T0), Ok(Admission::Allowed));
        }
        assert_eq!(limiter.tracked_identities(), 0);
    }

    #[test]
    fn malformed_parameters_fail_closed() {
        for (rps, burst) in [(f64::NAN, 5.0), (0.0, 5.0), (-1.0, 5.0), (2.0, f64::INFINITY), (2.0, 0.0)] {
            assert_eq!(
                limiter(rps, burst).admit(&id("a"), T0),
                Err(GateError::RateLimitMisconfigured),
                "rps={rps} burst={burst}"
            );
        }
    }

    #[test]
    fn fresh_identity_is_admitted_with_full_bucket() {
        let limiter = limiter(2.0, 5.0);
        assert!(limiter.admit(&id("a"), T0).unwrap().is_allowed());
        let bucket = limiter.bucket(&id("a")).unwrap();
        assert_eq!(bucket.tokens, 4.0);
        assert_eq!(bucket.last_refill, T0 as f64 / 1000.0);
    }

    #[test]
    fn burst_then_deny() {
        let limiter = limiter(2.0, 5.0);
        for _ in 0..5 {
            assert!(limiter.admit(&id("a"), T0).unwrap().is_allowed());
        }
        assert_eq!(
            limiter.admit(&id("a"), T0),
            Ok(Admission::Denied { retry_after_secs: 1 })
        );
        // Other identities are unaffected.
        assert!(limiter.admit(&id("b"), T0).unwrap().is_allowed());
    }

    #[test]
    fn retry_after_tracks_fractional_rate() {
        let limiter = limiter(0.5, 1.0);
        let a = id("a");
        assert!(limiter.admit(&a, T0).unwrap().is_allowed());
        assert_eq!(limiter.admit(&a, T0).unwrap().retry_after(), Some(2));
        assert_eq!(limiter.admit(&a, T0 + 1_000).unwrap().retry_after(), Some(1));
        assert!(limiter.admit(&a, T0 + 2_000).unwrap().is_allowed());
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let limiter = limiter(100.0, 1.0);
        let a = id("a");
        assert!(limiter.admit(&a, T0).unwrap().is_allowed());
        assert_eq!(limiter.admit(&a, T0).unwrap().retry_after(), Some(1));
        assert!(limiter.admit(&a, T0 + 1_000).unwrap().is_allowed());
    }

    #[test]
    fn deny_persists_refill_without_consuming() {
        let limiter = limiter(0.5, 1.0);
        let a = id("a");
        limiter.admit(&a, T0).unwrap();
        limiter.admit(&a, T0 + 1_000).unwrap();
        let bucket = limiter.bucket(&a).unwrap();
        assert_eq!(bucket.tokens, 0.5);
        assert_eq!(bucket.last_refill, (T0 + 1_000) as f64 / 1000.0);
    }

    #[test]
    fn refill_is_capped_at_burst() {
        let limiter = limiter(10.0, 3.0);
        let a = id("a");
        limiter.admit(&a, T0).unwrap();
        limiter.admit(&a, T0 + 3_600_000).unwrap();
        assert_eq!(limiter.bucket(&a).unwrap().tokens, 2.0);
    }

    #[test]
    fn clock_going_backwards_does_not_rewind_state() {
        let limiter = limiter(1.0, 2.0);
        let a = id("a");
        limiter.admit(&a, T0 + 5_000).unwrap();
        limiter.admit(&a, T0).unwrap();
        let bucket = limiter.bucket(&a).unwrap();
        assert_eq!(bucket.last_refill, (T0 + 5_000) as f64 / 1000.0);
        assert_eq!(bucket.tokens, 0.0);
    }

    #[test]
    fn tokens_stay_within_bounds() {
        let limiter = limiter(0.7, 3.0);
        let a = id("a");
        let mut now = T0;
        for step in 0..500u64 {
            now += (step * 37) % 1_900;
            limiter.admit(&a, now).unwrap();
            let tokens = limiter.bucket(&a).unwrap().tokens;
            assert!((0.0..=3.0).contains(&tokens), "tokens={tokens} at step {step}");
        }
    }

    #[test]
    fn identical_sequences_are_deterministic() {
        let run = || {
            let limiter = limiter(1.5, 2.0);
            let a = id("a");
            (0..50u64)
                .map(|i| limiter.admit(&a, T0 + i * 333).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn concurrent_checks_never_over_admit() {
        let limiter = Arc::new(limiter(1.0, 5.0));
        let a = id("shared");
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let a = a.clone();
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.admit(&a, T0).unwrap().is_allowed())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 5);
        assert_eq!(limiter.bucket(&a).unwrap().tokens, 0.0);
    }
}
