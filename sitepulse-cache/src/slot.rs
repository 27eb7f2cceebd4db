//! Single cached payload plus the instant it was written.

use std::time::{Duration, Instant};

use bytes::Bytes;

/// One route's cached response body.
///
/// Payload and creation instant are stored together, so an empty slot never
/// carries a timestamp and a populated one always does.
#[derive(Clone, Debug, Default)]
pub struct CacheSlot {
    entry: Option<(Bytes, Instant)>,
}

impl CacheSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a payload is present and no older than `ttl` at `now`.
    ///
    /// An age of exactly `ttl` still counts as fresh.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        match &self.entry {
            Some((_, created_at)) => now.saturating_duration_since(*created_at) <= ttl,
            None => false,
        }
    }

    /// Returns the payload, fresh or not.
    pub fn read(&self) -> Option<Bytes> {
        self.entry.as_ref().map(|(payload, _)| payload.clone())
    }

    /// Returns the payload only if it is fresh.
    pub fn read_fresh(&self, ttl: Duration, now: Instant) -> Option<Bytes> {
        if self.is_fresh(ttl, now) {
            self.read()
        } else {
            None
        }
    }

    /// Replaces payload and creation instant.
    pub fn write(&mut self, payload: Bytes, now: Instant) {
        self.entry = Some((payload, now));
    }

    /// When the current payload was written.
    pub fn created_at(&self) -> Option<Instant> {
        self.entry.as_ref().map(|(_, created_at)| *created_at)
    }

    /// Age of the current payload at `now`.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.created_at()
            .map(|created_at| now.saturating_duration_since(created_at))
    }

    /// Returns true if the slot has never been written.
    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_slot() {
        let slot = CacheSlot::new();
        let now = Instant::now();
        assert!(slot.is_empty());
        assert!(slot.read().is_none());
        assert!(slot.created_at().is_none());
        assert!(!slot.is_fresh(Duration::from_secs(3600), now));
    }

    #[test]
    fn test_write_then_read() {
        let mut slot = CacheSlot::new();
        let now = Instant::now();
        slot.write(Bytes::from_static(b"[1,2]"), now);

        assert_eq!(slot.read().unwrap(), Bytes::from_static(b"[1,2]"));
        assert_eq!(slot.created_at(), Some(now));
        assert!(!slot.is_empty());
    }

    #[test]
    fn test_ttl_boundary_is_fresh() {
        let mut slot = CacheSlot::new();
        let start = Instant::now();
        let ttl = Duration::from_secs(60);
        slot.write(Bytes::from_static(b"{}"), start);

        assert!(slot.is_fresh(ttl, start + ttl));
        assert!(!slot.is_fresh(ttl, start + ttl + Duration::from_nanos(1)));
        assert!(slot.read_fresh(ttl, start + ttl + Duration::from_secs(1)).is_none());
        assert!(slot.read().is_some());
    }

    #[test]
    fn test_overwrite_resets_age() {
        let mut slot = CacheSlot::new();
        let start = Instant::now();
        slot.write(Bytes::from_static(b"old"), start);

        let later = start + Duration::from_secs(500);
        slot.write(Bytes::from_static(b"new"), later);

        assert_eq!(slot.read().unwrap(), Bytes::from_static(b"new"));
        assert_eq!(slot.age(later), Some(Duration::ZERO));
    }

    proptest! {
        #[test]
        fn prop_fresh_iff_within_ttl(ttl_ms in 0u64..1_000_000, elapsed_ms in 0u64..2_000_000) {
            let mut slot = CacheSlot::new();
            let start = Instant::now();
            let ttl = Duration::from_millis(ttl_ms);
            let now = start + Duration::from_millis(elapsed_ms);

            prop_assert!(!slot.is_fresh(ttl, now));

            slot.write(Bytes::from_static(b"x"), start);
            prop_assert_eq!(slot.is_fresh(ttl, now), elapsed_ms <= ttl_ms);
        }
    }
}
