//! EventSub webhook verification.
//!
//! A delivery is accepted only if its message id is new, its timestamp is
//! within [`FRESHNESS_WINDOW_SECS`] of now, and its `sha256=` HMAC over
//! `message id + timestamp + body` matches the shared secret. Checks run in
//! that order and stop at the first failure. Ids are recorded only once the
//! signature has been checked.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

pub const MESSAGE_ID_HEADER: &str = "Twitch-Eventsub-Message-Id";
pub const MESSAGE_TIMESTAMP_HEADER: &str = "Twitch-Eventsub-Message-Timestamp";
pub const MESSAGE_SIGNATURE_HEADER: &str = "Twitch-Eventsub-Message-Signature";
pub const MESSAGE_TYPE_HEADER: &str = "Twitch-Eventsub-Message-Type";

pub const FRESHNESS_WINDOW_SECS: i64 = 600;
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerifyError {
    #[error("missing header {0}")]
    MissingHeader(&'static str),

    #[error("message {0} was already received")]
    Replayed(String),

    #[error("invalid timestamp {0}")]
    InvalidTimestamp(String),

    #[error("timestamp {0} is outside the freshness window")]
    Stale(String),

    #[error("signature mismatch")]
    BadSignature,
}

/// The signed parts of a delivery, borrowed from the request.
#[derive(Debug, Clone, Copy)]
pub struct SignedMessage<'a> {
    pub message_id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
    pub body: &'a [u8],
}

/// Recently seen message ids with expiry, bounded to `capacity` entries.
#[derive(Debug)]
pub struct MessageIdCache {
    seen: DashMap<String, DateTime<Utc>>,
    capacity: usize,
    ttl: Duration,
}

impl MessageIdCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            seen: DashMap::with_capacity(capacity),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Whether `id` was recorded and has not expired at `now`.
    pub fn contains(&self, id: &str, now: DateTime<Utc>) -> bool {
        self.seen
            .get(id)
            .is_some_and(|seen_at| now - *seen_at < self.ttl)
    }

    /// Records `id` as seen at `now`. Returns `false` if it was already recorded and has not expired.
    pub fn insert(&self, id: &str, now: DateTime<Utc>) -> bool {
        if !self.seen.contains_key(id) && self.seen.len() >= self.capacity {
            self.evict(now);
        }

        match self.seen.entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                if now - *entry.get() < self.ttl {
                    return false;
                }
                entry.insert(now);
                true
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    fn evict(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.seen.retain(|_, seen_at| now - *seen_at < ttl);

        while self.seen.len() >= self.capacity {
            let oldest = self
                .seen
                .iter()
                .min_by_key(|entry| *entry.value())
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.seen.remove(&key);
                }
                None => break,
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

#[derive(Debug)]
pub struct Verifier {
    secret: String,
    window: Duration,
    seen: MessageIdCache,
}

impl Verifier {
    pub fn new(secret: impl Into<String>) -> Self {
        let window = Duration::seconds(FRESHNESS_WINDOW_SECS);
        Self::with_cache(
            secret,
            window,
            MessageIdCache::new(DEFAULT_CACHE_CAPACITY, window),
        )
    }

    pub fn with_cache(secret: impl Into<String>, window: Duration, seen: MessageIdCache) -> Self {
        Self {
            secret: secret.into(),
            window,
            seen,
        }
    }

    pub fn verify(&self, message: &SignedMessage<'_>) -> Result<(), VerifyError> {
        self.verify_at(message, Utc::now())
    }

    pub fn verify_at(
        &self,
        message: &SignedMessage<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), VerifyError> {
        if self.seen.contains(message.message_id, now) {
            return Err(VerifyError::Replayed(message.message_id.to_string()));
        }

        let sent_at = DateTime::parse_from_rfc3339(message.timestamp)
            .map_err(|_| VerifyError::InvalidTimestamp(message.timestamp.to_string()))?
            .with_timezone(&Utc);
        let age = now - sent_at;
        if age > self.window || age < -self.window {
            return Err(VerifyError::Stale(message.timestamp.to_string()));
        }

        let expected = message
            .signature
            .strip_prefix(SIGNATURE_PREFIX)
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
            .ok_or(VerifyError::BadSignature)?;

        let mut mac = self.mac();
        mac.update(message.message_id.as_bytes());
        mac.update(message.timestamp.as_bytes());
        mac.update(message.body);
        mac.verify_slice(&expected)
            .map_err(|_| VerifyError::BadSignature)?;

        // Only authentic deliveries take up cache slots.
        if !self.seen.insert(message.message_id, now) {
            return Err(VerifyError::Replayed(message.message_id.to_string()));
        }
        Ok(())
    }

    /// Computes the `sha256=` signature header value for a delivery.
    #[cfg(test)]
    pub fn sign(&self, message_id: &str, timestamp: &str, body: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(message_id.as_bytes());
        mac.update(timestamp.as_bytes());
        mac.update(body);
        format!(
            "{SIGNATURE_PREFIX}{}",
            hex::encode(mac.finalize().into_bytes())
        )
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC can take key of any size")
    }
}
