//! Staleness-bounded response cache.
//!
//! One slot per [`Period`]. Every value is stored with the contest window it
//! was built for, and reads name the window they want: a slot filled for last
//! month is a miss once the month rolls over, fresh or stale. Within a window a
//! slot answers fresh reads while younger than the TTL and keeps its last good
//! value for stale fallback. Nothing is ever evicted.
//!
//! Each slot also owns an async refresh guard and a refresh attempt counter.
//! Holders of the guard are the only ones fetching upstream for that slot.
//! Callers that waited on the guard compare the counter against the value they
//! saw before waiting, and reuse a failure recorded in between instead of
//! calling upstream again.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use super::time_window::TimeWindow;
use crate::models::{LeaderboardResponse, Period};
use crate::scrapers::UpstreamError;

#[derive(Debug)]
struct Cached {
    window: TimeWindow,
    data: Arc<LeaderboardResponse>,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheEntry {
    cached: Option<Cached>,
    attempts: u64,
    last_error: Option<UpstreamError>,
}

#[derive(Debug, Default)]
struct Slot {
    entry: Mutex<CacheEntry>,
    refresh: AsyncMutex<()>,
}

#[derive(Debug)]
pub struct LeaderboardCache {
    ttl: Duration,
    current: Slot,
    previous: Slot,
}

impl LeaderboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: Slot::default(),
            previous: Slot::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, period: Period) -> &Slot {
        match period {
            Period::Current => &self.current,
            Period::Previous => &self.previous,
        }
    }

    /// Cached value if it was built for `window` and `now - fetched_at < ttl`.
    pub fn get(
        &self,
        period: Period,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> Option<Arc<LeaderboardResponse>> {
        let entry = self.slot(period).entry.lock();
        match &entry.cached {
            Some(c) if c.window == *window && now - c.fetched_at < self.ttl => Some(c.data.clone()),
            _ => None,
        }
    }

    /// Overwrites the slot unconditionally and counts a successful attempt.
    pub fn put(
        &self,
        period: Period,
        window: TimeWindow,
        data: LeaderboardResponse,
        now: DateTime<Utc>,
    ) -> Arc<LeaderboardResponse> {
        let data = Arc::new(data);
        let mut entry = self.slot(period).entry.lock();
        entry.cached = Some(Cached {
            window,
            data: data.clone(),
            fetched_at: now,
        });
        entry.attempts += 1;
        entry.last_error = None;
        data
    }

    /// Whatever the slot holds for `window`, regardless of age.
    pub fn stale_fallback(
        &self,
        period: Period,
        window: &TimeWindow,
    ) -> Option<Arc<LeaderboardResponse>> {
        match &self.slot(period).entry.lock().cached {
            Some(c) if c.window == *window => Some(c.data.clone()),
            _ => None,
        }
    }

    /// When the slot was last written.
    pub fn fetched_at(&self, period: Period) -> Option<DateTime<Utc>> {
        self.slot(period)
            .entry
            .lock()
            .cached
            .as_ref()
            .map(|c| c.fetched_at)
    }

    /// Refresh attempts finished on this slot so far.
    pub fn attempts(&self, period: Period) -> u64 {
        self.slot(period).entry.lock().attempts
    }

    /// Counts a failed attempt; the value stays as it was.
    pub fn record_failure(&self, period: Period, error: UpstreamError) {
        let mut entry = self.slot(period).entry.lock();
        entry.attempts += 1;
        entry.last_error = Some(error);
    }

    /// The failure of the latest attempt, if one finished after `seen` and failed.
    pub fn failure_since(&self, period: Period, seen: u64) -> Option<UpstreamError> {
        let entry = self.slot(period).entry.lock();
        if entry.attempts == seen {
            return None;
        }
        entry.last_error.clone()
    }

    /// Serializes refreshes of one slot. Re-check [`get`](Self::get) after acquiring.
    pub async fn refresh_guard(&self, period: Period) -> AsyncMutexGuard<'_, ()> {
        self.slot(period).refresh.lock().await
    }

    /// The refresh guard if nobody holds it.
    pub fn try_refresh_guard(&self, period: Period) -> Option<AsyncMutexGuard<'_, ()>> {
        self.slot(period).refresh.try_lock().ok()
    }
}
