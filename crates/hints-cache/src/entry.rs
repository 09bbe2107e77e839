//! The cached link header value and its expiry.

use serde::{Deserialize, Serialize};

/// The single cached entry: last successfully fetched link header plus the
/// instant it goes stale.
///
/// An empty `value` means the entry was never populated. A stale value is
/// still servable; only a successful refresh overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Last successfully fetched link header ("" = never populated).
    pub value: String,
    /// Wall-clock instant (ms) after which the value is stale.
    pub expires_at: u64,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheEntry {
    /// Create an entry that starts already expired, so the first lookup
    /// always attempts a fetch.
    pub fn new() -> Self {
        Self {
            value: String::new(),
            expires_at: 0,
        }
    }

    /// Whether the entry is still fresh at `now` (ms). The expiry instant
    /// itself counts as expired, so a new entry is expired at t=0.
    pub fn is_fresh(&self, now: u64) -> bool {
        now < self.expires_at
    }

    /// Whether a value was ever successfully fetched.
    pub fn is_populated(&self) -> bool {
        !self.value.is_empty()
    }

    /// Overwrite value and expiry together. Called only on the success path,
    /// after the outbound call has settled.
    pub fn store(&mut self, value: String, expires_at: u64) {
        self.value = value;
        self.expires_at = expires_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_starts_expired() {
        let entry = CacheEntry::new();
        assert!(!entry.is_fresh(0));
        assert!(!entry.is_populated());
    }

    #[test]
    fn test_freshness_boundary() {
        let mut entry = CacheEntry::new();
        entry.store("</a>; rel=preload".to_string(), 30_000);
        assert!(entry.is_fresh(29_999));
        assert!(!entry.is_fresh(30_000));
        assert!(!entry.is_fresh(30_001));
    }

    #[test]
    fn test_store_overwrites_both_fields() {
        let mut entry = CacheEntry::new();
        entry.store("</a>; rel=preload".to_string(), 30_000);
        entry.store("</b>; rel=preload".to_string(), 60_000);
        assert_eq!(entry.value, "</b>; rel=preload");
        assert_eq!(entry.expires_at, 60_000);
    }
}
