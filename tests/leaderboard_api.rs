//! Router-level tests: fake upstreams behind the real router, cache and clock.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use wagerboard_backend::api::{create_router, AppState, X_CACHE};
use wagerboard_backend::leaderboard::{LeaderboardService, ManualClock, TimeWindow, WagerParsing};
use wagerboard_backend::models::Platform;
use wagerboard_backend::scrapers::{LeaderboardSource, UpstreamError, UpstreamQuery};

struct FakeUpstream {
    platform: Platform,
    replies: Mutex<VecDeque<Result<Value, UpstreamError>>>,
    queries: Mutex<Vec<UpstreamQuery>>,
    calls: AtomicUsize,
}

impl FakeUpstream {
    fn new(platform: Platform, replies: Vec<Result<Value, UpstreamError>>) -> Arc<Self> {
        Arc::new(Self {
            platform,
            replies: Mutex::new(replies.into()),
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LeaderboardSource for FakeUpstream {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, _window: &TimeWindow, query: &UpstreamQuery) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Transport("no reply scripted".into())))
    }
}

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
}

fn harness(
    rainbet: Option<Arc<FakeUpstream>>,
    betbolt: Option<Arc<FakeUpstream>>,
) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 11, 16, 0, 0, 0).unwrap(),
    ));
    let service = |source: Arc<FakeUpstream>, ttl: Duration| {
        Arc::new(LeaderboardService::new(
            source,
            ttl,
            clock.clone(),
            WagerParsing::Lenient,
        ))
    };
    let state = AppState {
        rainbet: rainbet.map(|s| service(s, Duration::seconds(60))),
        betbolt: betbolt.map(|s| service(s, Duration::minutes(30))),
        clock: clock.clone(),
    };
    Harness {
        app: create_router(state),
        clock,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let cache = response
        .headers()
        .get(X_CACHE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, cache, body)
}

fn rainbet_payload() -> Value {
    json!({
        "affiliates": [
            {"id": "7", "username": "alexander", "wagered_amount": "120.50"},
            {"id": "8", "username": "bo", "wagered_amount": "999"},
            {"id": "9", "username": "charlotte", "wagered_amount": null},
        ]
    })
}

#[tokio::test]
async fn rainbet_current_leaderboard_envelope() {
    let upstream = FakeUpstream::new(Platform::Rainbet, vec![Ok(rainbet_payload())]);
    let h = harness(Some(upstream), None);

    let (status, cache, body) = get(&h.app, "/api/leaderboard/rainbet").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("MISS"));

    let board = body["leaderboard"].as_array().unwrap();
    assert_eq!(board.len(), 3);
    assert_eq!(board[0]["name"], "bo");
    assert_eq!(board[0]["wager"], 999.0);
    assert_eq!(board[1]["name"], "al***er");
    assert_eq!(board[1]["wager"], 120.5);
    assert_eq!(board[2]["wager"], 0.0);

    assert_eq!(body["prizes"].as_array().unwrap().len(), 10);
    assert_eq!(body["prizes"][0], json!({"position": 1, "reward": 220.0}));
    assert_eq!(body["startTime"], "2025-11-01T00:00:00.000Z");
    assert_eq!(body["endTime"], "2025-11-30T23:59:59.000Z");
}

#[tokio::test]
async fn betbolt_previous_is_cached_then_stale() {
    let upstream = FakeUpstream::new(
        Platform::Betbolt,
        vec![
            Ok(json!({"data": [{"username": "highroller", "wagered": 5000}]})),
            Err(UpstreamError::Status {
                status: 500,
                body: "upstream down".into(),
            }),
        ],
    );
    let h = harness(None, Some(upstream.clone()));

    let (status, cache, first) = get(&h.app, "/api/prev-leaderboard/betbolt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("MISS"));
    assert_eq!(first["startTime"], "2025-10-01T00:00:00.000Z");
    assert_eq!(first["prizes"][0]["reward"], 1000.0);

    let (_, cache, second) = get(&h.app, "/api/prev-leaderboard/betbolt").await;
    assert_eq!(cache.as_deref(), Some("HIT"));
    assert_eq!(first, second);
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);

    h.clock.advance(Duration::hours(1));
    let (status, cache, third) = get(&h.app, "/api/prev-leaderboard/betbolt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("STALE"));
    assert_eq!(first, third);
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rainbet_forwards_upstream_status() {
    let upstream = FakeUpstream::new(
        Platform::Rainbet,
        vec![Err(UpstreamError::Status {
            status: 403,
            body: "invalid key".into(),
        })],
    );
    let h = harness(Some(upstream), None);

    let (status, _, body) = get(&h.app, "/api/prev-leaderboard/rainbet").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "invalid key"}));
}

#[tokio::test]
async fn betbolt_failure_without_cache_is_500() {
    let upstream = FakeUpstream::new(
        Platform::Betbolt,
        vec![Err(UpstreamError::Status {
            status: 401,
            body: "unauthorized".into(),
        })],
    );
    let h = harness(None, Some(upstream));

    let (status, _, body) = get(&h.app, "/api/leaderboard/betbolt").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Failed to fetch betbolt leaderboard data"})
    );
}

#[tokio::test]
async fn unconfigured_platform_is_503() {
    let h = harness(None, None);

    let (status, _, body) = get(&h.app, "/api/leaderboard/rainbet").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("rainbet"));

    let (_, _, health) = get(&h.app, "/health").await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["platforms"], json!({"rainbet": false, "betbolt": false}));
}

#[tokio::test]
async fn countdown_needs_no_upstream() {
    let h = harness(None, None);

    // 16 Nov 00:00 of a 30-day month
    let (status, _, body) = get(&h.app, "/api/countdown/rainbet").await;
    assert_eq!(status, StatusCode::OK);
    let pct = body["percentageLeft"].as_f64().unwrap();
    assert!((pct - 50.0).abs() < 0.01, "got {pct}");

    h.clock
        .set(Utc.with_ymd_and_hms(2025, 11, 30, 23, 59, 59).unwrap());
    let (_, _, body) = get(&h.app, "/api/countdown/betbolt").await;
    assert_eq!(body["percentageLeft"], 0.0);
}

#[tokio::test]
async fn betbolt_query_params_reach_upstream() {
    let upstream = FakeUpstream::new(Platform::Betbolt, vec![Ok(json!({"data": []}))]);
    let h = harness(None, Some(upstream.clone()));

    let (status, _, body) = get(
        &h.app,
        "/api/leaderboard/betbolt?limit=25&offset=oops&sort_order=asc&categories=slots",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["leaderboard"], json!([]));

    let queries = upstream.queries.lock();
    assert_eq!(queries[0].limit, Some(25));
    assert_eq!(queries[0].offset, None);
    assert_eq!(queries[0].sort_order.as_deref(), Some("asc"));
    assert_eq!(queries[0].categories.as_deref(), Some("slots"));
}
