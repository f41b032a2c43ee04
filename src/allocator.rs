//! # Sequence Allocator
//!
//! Issues sequence values per scheme. Every mutation is a read-modify-write of
//! the stored scheme performed while holding two locks: an in-process mutex for
//! the scheme id, then the store's own lock (which also excludes other
//! processes sharing a [`crate::storage::FileStore`]). Different schemes never
//! contend with each other.
//!
//! Before each mutation the scheme's epoch marker is compared with the clock;
//! crossing a reset boundary restarts the counter at the floor (the next value
//! issued is `1`).
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::{
    collections::HashMap,
    ops::Range,
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{
    constants::{DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_BACKOFF_MS, MAX_LOCK_BACKOFF_MS},
    context::Clock,
    error::{Error, Result},
    scheme::{NumberingScheme, SequenceState},
    storage::SchemeStore,
};

/// Per-scheme atomic counter over a [`SchemeStore`]
pub struct SequenceAllocator<S, C> {
    store: S,
    clock: C,
    local: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    attempts: u32,
    backoff: Duration,
}

/// Releases the store lock when dropped
struct StoreLock<'a, S: SchemeStore> {
    store: &'a S,
    id: &'a str,
}

impl<S: SchemeStore> Drop for StoreLock<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.store.unlock(self.id) {
            tracing::warn!(scheme = self.id, error = %e, "failed to release scheme lock");
        }
    }
}

impl<S: SchemeStore, C: Clock> SequenceAllocator<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            local: Mutex::new(HashMap::new()),
            attempts: DEFAULT_LOCK_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_LOCK_BACKOFF_MS),
        }
    }

    /// Sets how often a busy store lock is retried, and the base backoff between tries.
    #[must_use]
    pub fn with_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Allocates the next value for `scheme_id`.
    ///
    /// In fill-gaps mode the smallest reclaimed value is reused first.
    pub fn next_value(&self, scheme_id: &str) -> Result<u64> {
        self.allocate(scheme_id).map(|(value, _)| value)
    }

    /// Like [`next_value`](Self::next_value), also returning the instant the
    /// epoch was checked against. Date tokens rendered with the value must use
    /// that instant so they agree with the epoch the value belongs to.
    pub fn allocate(&self, scheme_id: &str) -> Result<(u64, DateTime<Utc>)> {
        let allocated = self.update(scheme_id, |scheme, now| {
            begin_epoch(scheme, now);
            if scheme.fill_gaps {
                if let Some(reused) = scheme.reclaimed.pop_first() {
                    return Ok((reused, now));
                }
            }
            Ok((scheme.advance(1)?, now))
        })?;
        tracing::debug!(scheme = scheme_id, value = allocated.0, "allocated sequence value");
        Ok(allocated)
    }

    /// Reserves `count` contiguous values in one locked update.
    ///
    /// The fill-gaps pool is not consulted. `count == 0` returns an empty range.
    pub fn reserve(&self, scheme_id: &str, count: u64) -> Result<Range<u64>> {
        self.allocate_block(scheme_id, count).map(|(range, _)| range)
    }

    /// [`reserve`](Self::reserve) plus the instant of the epoch check.
    pub fn allocate_block(&self, scheme_id: &str, count: u64) -> Result<(Range<u64>, DateTime<Utc>)> {
        let (range, now) = self.update(scheme_id, |scheme, now| {
            begin_epoch(scheme, now);
            let end = scheme.advance(count)? + 1;
            Ok((end - count..end, now))
        })?;
        tracing::debug!(scheme = scheme_id, start = range.start, end = range.end, "reserved sequence block");
        Ok((range, now))
    }

    /// The value the next [`next_value`](Self::next_value) call would return.
    /// Reads without locking or persisting anything.
    pub fn peek(&self, scheme_id: &str) -> Result<u64> {
        let scheme = self.store.get(scheme_id)?;
        Ok(scheme.next_value_at(self.clock.now()))
    }

    /// Sets the last-issued value so the next allocation returns `to + 1`.
    ///
    /// Moving below the highest value issued in the current epoch fails with
    /// [`Error::InvalidReset`] unless `force` is set. Reclaimed values above
    /// `to` are discarded.
    pub fn reset(&self, scheme_id: &str, to: u64, force: bool) -> Result<()> {
        self.update(scheme_id, |scheme, now| {
            begin_epoch(scheme, now);
            // A forced rewind keeps the high-water mark, so a later unforced
            // reset still cannot land below anything already issued
            let highest = scheme.highest_issued();
            if to < highest && !force {
                return Err(Error::InvalidReset {
                    requested: to,
                    highest,
                });
            }
            scheme.current_sequence = to;
            scheme.reclaimed.retain(|&v| v <= to);
            Ok(())
        })?;
        tracing::info!(scheme = scheme_id, to, force, "sequence reset");
        Ok(())
    }

    /// Returns an issued value to the fill-gaps pool (e.g. after its record was deleted).
    ///
    /// Returns `Ok(false)` when the scheme does not fill gaps or the value is already pooled.
    pub fn reclaim(&self, scheme_id: &str, value: u64) -> Result<bool> {
        self.update(scheme_id, |scheme, now| {
            begin_epoch(scheme, now);
            if value == 0 || value > scheme.current_sequence {
                return Err(Error::InvalidReclaim {
                    value,
                    current: scheme.current_sequence,
                });
            }
            if !scheme.fill_gaps {
                tracing::debug!(scheme = %scheme.id, value, "scheme does not fill gaps; value dropped");
                return Ok(false);
            }
            Ok(scheme.reclaimed.insert(value))
        })
    }

    /// Stores the settings of `scheme` (name, pattern, flags, defaults).
    ///
    /// The counter, high-water mark, epoch and reclaimed pool always come from
    /// the stored document, read under the scheme lock, so saving a copy taken
    /// before other allocations never rolls the counter back. A scheme that
    /// is not stored yet is saved as given.
    pub fn save_settings(&self, scheme: &NumberingScheme) -> Result<()> {
        self.locked(&scheme.id, || {
            let mut next = scheme.clone();
            match self.store.get(&scheme.id) {
                Ok(stored) => next.keep_counter_of(&stored),
                Err(Error::SchemeNotFound(_)) => {}
                Err(e) => return Err(e),
            }
            next.updated_at = Some(self.clock.now());
            self.store.save(&next)
        })?;
        tracing::debug!(scheme = %scheme.id, "scheme settings saved");
        Ok(())
    }

    /// Runs `f` on the stored scheme under both locks and persists the result.
    /// Nothing is saved when `f` fails. The clock is read once per update.
    pub(crate) fn update<T>(
        &self,
        scheme_id: &str,
        f: impl FnOnce(&mut NumberingScheme, DateTime<Utc>) -> Result<T>,
    ) -> Result<T> {
        self.locked(scheme_id, || {
            let mut scheme = self.store.get(scheme_id)?;
            let now = self.clock.now();
            let out = f(&mut scheme, now)?;
            scheme.updated_at = Some(now);
            self.store.save(&scheme)?;
            Ok(out)
        })
    }

    fn locked<T>(&self, scheme_id: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let local = self.local_lock(scheme_id);
        let _local = local.lock().unwrap_or_else(PoisonError::into_inner);
        let _store = self.acquire(scheme_id)?;
        f()
    }

    fn local_lock(&self, scheme_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.local.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(scheme_id.to_string()).or_default())
    }

    fn acquire<'a>(&'a self, scheme_id: &'a str) -> Result<StoreLock<'a, S>> {
        let cap = Duration::from_millis(MAX_LOCK_BACKOFF_MS);
        for attempt in 1..=self.attempts {
            if self.store.try_lock(scheme_id)? {
                return Ok(StoreLock {
                    store: &self.store,
                    id: scheme_id,
                });
            }
            tracing::debug!(scheme = scheme_id, attempt, "scheme locked, backing off");
            if attempt < self.attempts {
                thread::sleep((self.backoff * attempt).min(cap));
            }
        }

        tracing::warn!(scheme = scheme_id, attempts = self.attempts, "giving up on scheme lock");
        Err(Error::AllocationFailed {
            scheme: scheme_id.to_string(),
            attempts: self.attempts,
        })
    }
}

/// Applies a pending epoch reset, or records the first epoch marker.
fn begin_epoch(scheme: &mut NumberingScheme, now: DateTime<Utc>) {
    match scheme.state(now) {
        SequenceState::ResetPending { epoch } => {
            tracing::info!(
                scheme = %scheme.id,
                previous = ?scheme.epoch,
                epoch = %epoch,
                last = scheme.current_sequence,
                "reset boundary crossed, starting new epoch"
            );
            scheme.begin_epoch(epoch);
        }
        SequenceState::Active => scheme.touch_epoch(now),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::TimeZone;

    use super::*;
    use crate::{
        context::FixedClock,
        scheme::{Sector, SequenceReset},
        storage::MemoryStore,
    };

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap(),
        ))
    }

    fn allocator(scheme: NumberingScheme) -> SequenceAllocator<MemoryStore, Arc<FixedClock>> {
        SequenceAllocator::new(MemoryStore::with_schemes([scheme]), clock())
    }

    fn scheme() -> NumberingScheme {
        NumberingScheme::new("acc", Sector::Archive, "{SEQ:4}").unwrap()
    }

    #[test]
    fn test_next_value_increments_and_persists() {
        let alloc = allocator(scheme());
        assert_eq!(alloc.next_value("acc").unwrap(), 1);
        assert_eq!(alloc.next_value("acc").unwrap(), 2);
        let stored = alloc.store().get("acc").unwrap();
        assert_eq!(stored.current_sequence, 2);
        assert!(stored.updated_at.is_some());
    }

    #[test]
    fn test_peek_does_not_allocate() {
        let alloc = allocator(scheme());
        assert_eq!(alloc.peek("acc").unwrap(), 1);
        assert_eq!(alloc.peek("acc").unwrap(), 1);
        assert_eq!(alloc.next_value("acc").unwrap(), 1);
        assert_eq!(alloc.peek("acc").unwrap(), 2);
    }

    #[test]
    fn test_unknown_scheme() {
        let alloc = allocator(scheme());
        assert!(matches!(
            alloc.next_value("missing"),
            Err(Error::SchemeNotFound(_))
        ));
    }

    #[test]
    fn test_reset_below_issued_is_rejected() {
        let mut s = scheme();
        s.current_sequence = 10;
        let alloc = allocator(s);

        let err = alloc.reset("acc", 5, false).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidReset {
                requested: 5,
                highest: 10
            }
        ));
        assert_eq!(alloc.store().get("acc").unwrap().current_sequence, 10);

        alloc.reset("acc", 5, true).unwrap();
        assert_eq!(alloc.next_value("acc").unwrap(), 6);
    }

    #[test]
    fn test_forced_rewind_keeps_highest_issued() {
        let alloc = allocator(scheme());
        for _ in 0..10 {
            alloc.next_value("acc").unwrap();
        }
        alloc.reset("acc", 5, true).unwrap();

        // 10 was issued, so 7 is still below it
        let err = alloc.reset("acc", 7, false).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidReset {
                requested: 7,
                highest: 10
            }
        ));
        assert_eq!(alloc.store().get("acc").unwrap().current_sequence, 5);
        alloc.reset("acc", 10, false).unwrap();
    }

    #[test]
    fn test_new_epoch_clears_highest_issued() {
        let mut s = scheme();
        s.sequence_reset = SequenceReset::Yearly;
        s.epoch = Some("2023".to_string());
        s.current_sequence = 40;
        s.high_water = 90;
        let alloc = allocator(s);

        alloc.reset("acc", 2, false).unwrap();
        assert_eq!(alloc.store().get("acc").unwrap().high_water, 0);
    }

    #[test]
    fn test_exhausted_counter_fails_without_wrapping() {
        let alloc = allocator(scheme());
        alloc.reset("acc", u64::MAX, false).unwrap();

        let err = alloc.next_value("acc").unwrap_err();
        assert!(matches!(
            err,
            Error::SequenceExhausted {
                current: u64::MAX,
                requested: 1,
                ..
            }
        ));
        assert!(!err.is_transient());
        assert_eq!(alloc.store().get("acc").unwrap().current_sequence, u64::MAX);
        assert_eq!(alloc.peek("acc").unwrap(), u64::MAX);
    }

    #[test]
    fn test_oversized_block_fails_without_wrapping() {
        let alloc = allocator(scheme());
        assert_eq!(alloc.next_value("acc").unwrap(), 1);

        let err = alloc.reserve("acc", u64::MAX).unwrap_err();
        assert!(matches!(
            err,
            Error::SequenceExhausted {
                current: 1,
                requested: u64::MAX,
                ..
            }
        ));
        assert_eq!(alloc.next_value("acc").unwrap(), 2);

        // The largest block that still fits ends just below u64::MAX
        let range = alloc.reserve("acc", u64::MAX - 3).unwrap();
        assert_eq!(range, 3..u64::MAX);
        assert!(alloc.reserve("acc", 1).is_err());
    }

    #[test]
    fn test_allocate_returns_the_instant_used_for_the_epoch() {
        let mut s = scheme();
        s.sequence_reset = SequenceReset::Yearly;
        let alloc = allocator(s);
        let (value, at) = alloc.allocate("acc").unwrap();
        assert_eq!(value, 1);
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap());

        let (range, at) = alloc.allocate_block("acc", 2).unwrap();
        assert_eq!(range, 2..4);
        assert_eq!(alloc.store().get("acc").unwrap().updated_at, Some(at));
    }

    #[test]
    fn test_save_settings_keeps_stored_counter() {
        let mut s = scheme();
        s.fill_gaps = true;
        let alloc = allocator(s);
        let stale = alloc.store().get("acc").unwrap();

        for _ in 0..3 {
            alloc.next_value("acc").unwrap();
        }
        assert!(alloc.reclaim("acc", 2).unwrap());

        let mut edited = stale;
        edited.name = "Renamed".to_string();
        edited.pattern = "ACC-{SEQ:4}".to_string();
        alloc.save_settings(&edited).unwrap();

        let stored = alloc.store().get("acc").unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.pattern, "ACC-{SEQ:4}");
        assert_eq!(stored.current_sequence, 3);
        assert_eq!(stored.reclaimed, BTreeSet::from([2]));
        assert_eq!(alloc.next_value("acc").unwrap(), 2);
        assert_eq!(alloc.next_value("acc").unwrap(), 4);
    }

    #[test]
    fn test_save_settings_stores_new_scheme_as_given() {
        let alloc = allocator(scheme());
        let mut fresh = NumberingScheme::new("new", Sector::Library, "{SEQ}").unwrap();
        fresh.current_sequence = 7;
        alloc.save_settings(&fresh).unwrap();
        assert_eq!(alloc.next_value("new").unwrap(), 8);
    }

    #[test]
    fn test_save_settings_waits_for_the_lock() {
        let alloc = allocator(scheme()).with_retry(2, Duration::ZERO);
        assert!(alloc.store().try_lock("acc").unwrap());
        let err = alloc.save_settings(&scheme()).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { attempts: 2, .. }));
    }

    #[test]
    fn test_reset_forward_needs_no_force() {
        let alloc = allocator(scheme());
        alloc.reset("acc", 500, false).unwrap();
        assert_eq!(alloc.next_value("acc").unwrap(), 501);
    }

    #[test]
    fn test_yearly_boundary_restarts_at_one() {
        let mut s = scheme();
        s.sequence_reset = SequenceReset::Yearly;
        let alloc = allocator(s);

        for _ in 0..41 {
            alloc.next_value("acc").unwrap();
        }
        assert_eq!(alloc.next_value("acc").unwrap(), 42);
        assert_eq!(
            alloc.store().get("acc").unwrap().epoch.as_deref(),
            Some("2024")
        );

        alloc
            .clock()
            .set(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 1).unwrap());
        assert_eq!(alloc.peek("acc").unwrap(), 1);
        assert_eq!(alloc.next_value("acc").unwrap(), 1);
        assert_eq!(alloc.next_value("acc").unwrap(), 2);
        assert_eq!(
            alloc.store().get("acc").unwrap().epoch.as_deref(),
            Some("2025")
        );
    }

    #[test]
    fn test_reset_after_boundary_compares_against_new_epoch() {
        let mut s = scheme();
        s.sequence_reset = SequenceReset::Yearly;
        s.epoch = Some("2023".to_string());
        s.current_sequence = 900;
        let alloc = allocator(s);

        // Nothing issued yet in 2024, so a low reset is allowed
        alloc.reset("acc", 3, false).unwrap();
        assert_eq!(alloc.next_value("acc").unwrap(), 4);
    }

    #[test]
    fn test_fill_gaps_reuses_smallest_first() {
        let mut s = scheme();
        s.fill_gaps = true;
        let alloc = allocator(s);
        for _ in 0..5 {
            alloc.next_value("acc").unwrap();
        }

        assert!(alloc.reclaim("acc", 4).unwrap());
        assert!(alloc.reclaim("acc", 2).unwrap());
        assert!(!alloc.reclaim("acc", 2).unwrap());
        assert_eq!(alloc.peek("acc").unwrap(), 2);

        assert_eq!(alloc.next_value("acc").unwrap(), 2);
        assert_eq!(alloc.next_value("acc").unwrap(), 4);
        assert_eq!(alloc.next_value("acc").unwrap(), 6);
    }

    #[test]
    fn test_reclaim_without_fill_gaps_is_ignored() {
        let mut s = scheme();
        s.current_sequence = 3;
        let alloc = allocator(s);
        assert!(!alloc.reclaim("acc", 2).unwrap());
        assert_eq!(alloc.next_value("acc").unwrap(), 4);
    }

    #[test]
    fn test_reclaim_unissued_value_fails() {
        let mut s = scheme();
        s.fill_gaps = true;
        s.current_sequence = 3;
        let alloc = allocator(s);
        assert!(matches!(
            alloc.reclaim("acc", 4),
            Err(Error::InvalidReclaim { value: 4, current: 3 })
        ));
        assert!(alloc.reclaim("acc", 0).is_err());
    }

    #[test]
    fn test_reset_discards_pool_above_target() {
        let mut s = scheme();
        s.fill_gaps = true;
        s.current_sequence = 10;
        s.reclaimed = BTreeSet::from([3, 7, 9]);
        let alloc = allocator(s);

        alloc.reset("acc", 8, true).unwrap();
        assert_eq!(
            alloc.store().get("acc").unwrap().reclaimed,
            BTreeSet::from([3, 7])
        );
    }

    #[test]
    fn test_reserve_block() {
        let mut s = scheme();
        s.fill_gaps = true;
        s.current_sequence = 10;
        s.reclaimed = BTreeSet::from([2]);
        let alloc = allocator(s);

        assert_eq!(alloc.reserve("acc", 5).unwrap(), 11..16);
        assert_eq!(alloc.reserve("acc", 0).unwrap(), 16..16);
        // The pool is left for single allocations
        assert_eq!(alloc.next_value("acc").unwrap(), 2);
        assert_eq!(alloc.next_value("acc").unwrap(), 16);
    }

    #[test]
    fn test_busy_store_lock_fails_after_retries() {
        let alloc = allocator(scheme()).with_retry(3, Duration::ZERO);
        assert!(alloc.store().try_lock("acc").unwrap());

        let err = alloc.next_value("acc").unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { attempts: 3, .. }));
        assert!(err.is_transient());
        assert_eq!(alloc.store().get("acc").unwrap().current_sequence, 0);
    }

    #[test]
    fn test_failed_update_releases_lock() {
        let mut s = scheme();
        s.current_sequence = 10;
        let alloc = allocator(s);
        assert!(alloc.reset("acc", 1, false).is_err());
        assert_eq!(alloc.next_value("acc").unwrap(), 11);
    }

    #[test]
    fn test_concurrent_allocation_has_no_duplicates() {
        let alloc = allocator(scheme());
        let n = 64;

        let mut values: Vec<u64> = thread::scope(|scope| {
            let handles: Vec<_> = (0..n)
                .map(|_| scope.spawn(|| alloc.next_value("acc").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        values.sort_unstable();
        assert_eq!(values, (1..=n).collect::<Vec<_>>());
    }
}
