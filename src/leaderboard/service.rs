//! Per-platform leaderboard service.
//!
//! Request policy:
//! - fresh cache hit for this month's window: serve it, no upstream call
//! - miss while another request is refreshing: serve stale for this window if any
//! - miss: take the slot's refresh guard, re-check, fetch + normalize
//! - a refresh that failed while we waited: reuse its outcome, no upstream call
//! - refresh ok: store and serve
//! - refresh failed: serve the stale slot if it holds this window, else the error

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::LeaderboardCache;
use super::clock::Clock;
use super::pipeline::{normalize, WagerParsing};
use super::time_window::{current_month_range, previous_month_range, TimeWindow};
use crate::models::{LeaderboardResponse, Period, Platform};
use crate::scrapers::{LeaderboardSource, UpstreamError, UpstreamQuery};

/// Where a served leaderboard came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Cached,
    Fetched,
    Stale,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Cached => "HIT",
            Freshness::Fetched => "MISS",
            Freshness::Stale => "STALE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Served {
    pub response: Arc<LeaderboardResponse>,
    pub freshness: Freshness,
}

pub struct LeaderboardService {
    source: Arc<dyn LeaderboardSource>,
    cache: LeaderboardCache,
    clock: Arc<dyn Clock>,
    wager_parsing: WagerParsing,
}

impl LeaderboardService {
    pub fn new(
        source: Arc<dyn LeaderboardSource>,
        cache_ttl: Duration,
        clock: Arc<dyn Clock>,
        wager_parsing: WagerParsing,
    ) -> Self {
        Self {
            source,
            cache: LeaderboardCache::new(cache_ttl),
            clock,
            wager_parsing,
        }
    }

    pub fn platform(&self) -> Platform {
        self.source.platform()
    }

    pub fn cache(&self) -> &LeaderboardCache {
        &self.cache
    }

    pub fn window(&self, period: Period) -> TimeWindow {
        let now = self.clock.now();
        match period {
            Period::Current => current_month_range(now),
            Period::Previous => previous_month_range(now),
        }
    }

    pub async fn leaderboard(
        &self,
        period: Period,
        query: &UpstreamQuery,
    ) -> Result<Served, UpstreamError> {
        let platform = self.platform();
        let window = self.window(period);

        if let Some(response) = self.cache.get(period, &window, self.clock.now()) {
            debug!(%platform, %period, "serving from cache");
            return Ok(Served {
                response,
                freshness: Freshness::Cached,
            });
        }

        let seen = self.cache.attempts(period);
        let _guard = match self.cache.try_refresh_guard(period) {
            Some(guard) => guard,
            None => {
                if let Some(response) = self.cache.stale_fallback(period, &window) {
                    debug!(%platform, %period, "refresh in flight, serving stale cache");
                    return Ok(Served {
                        response,
                        freshness: Freshness::Stale,
                    });
                }
                self.cache.refresh_guard(period).await
            }
        };

        // another request may have refreshed while we waited
        if let Some(response) = self.cache.get(period, &window, self.clock.now()) {
            debug!(%platform, %period, "serving from cache after concurrent refresh");
            return Ok(Served {
                response,
                freshness: Freshness::Cached,
            });
        }
        if let Some(err) = self.cache.failure_since(period, seen) {
            debug!(%platform, %period, error = %err, "reusing failure of concurrent refresh");
            return self.fallback(period, &window, err);
        }

        info!(%platform, %period, "cache expired or empty, fetching fresh data");
        match self.refresh(period, window, query).await {
            Ok(response) => Ok(Served {
                response,
                freshness: Freshness::Fetched,
            }),
            Err(err) => {
                self.cache.record_failure(period, err.clone());
                self.fallback(period, &window, err)
            }
        }
    }

    fn fallback(
        &self,
        period: Period,
        window: &TimeWindow,
        err: UpstreamError,
    ) -> Result<Served, UpstreamError> {
        match self.cache.stale_fallback(period, window) {
            Some(response) => {
                warn!(
                    platform = %self.platform(),
                    %period,
                    error = %err,
                    fetched_at = ?self.cache.fetched_at(period),
                    "refresh failed, serving stale cache"
                );
                Ok(Served {
                    response,
                    freshness: Freshness::Stale,
                })
            }
            None => Err(err),
        }
    }

    async fn refresh(
        &self,
        period: Period,
        window: TimeWindow,
        query: &UpstreamQuery,
    ) -> Result<Arc<LeaderboardResponse>, UpstreamError> {
        let platform = self.platform();
        let payload = self.source.fetch(&window, query).await?;
        let normalized = normalize(platform, &payload, &window);

        if normalized.invalid_wagers > 0 {
            match self.wager_parsing {
                WagerParsing::Lenient => warn!(
                    %platform,
                    invalid = normalized.invalid_wagers,
                    total = normalized.total_entries,
                    "coerced unusable wagers to 0"
                ),
                WagerParsing::Strict => {
                    return Err(UpstreamError::Schema(format!(
                        "{} of {} entries carry an unusable wager",
                        normalized.invalid_wagers, normalized.total_entries
                    )))
                }
            }
        }

        Ok(self
            .cache
            .put(period, window, normalized.response, self.clock.now()))
    }
}
