use axum::{
    extract::{Query, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::config::Config;
use crate::leaderboard::{
    current_month_range, percentage_left, Clock, LeaderboardService, Served,
};
use crate::middleware::request_logging_simple;
use crate::models::{CountdownResponse, Period, Platform};
use crate::scrapers::{BetboltClient, RainbetClient, UpstreamError, UpstreamQuery};

/// Reports whether a leaderboard came from cache, upstream, or stale fallback.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// `None` when the platform's credential is not configured.
    pub rainbet: Option<Arc<LeaderboardService>>,
    pub betbolt: Option<Arc<LeaderboardService>>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Builds one cached service per platform that has a credential configured.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let rainbet = match config.rainbet_key() {
            Some(key) => {
                let client = RainbetClient::new(
                    &config.rainbet_api_url,
                    key.to_string(),
                    config.upstream_timeout(),
                )?;
                Some(Arc::new(LeaderboardService::new(
                    Arc::new(client),
                    config.rainbet_cache_ttl(),
                    clock.clone(),
                    config.wager_parsing,
                )))
            }
            None => {
                tracing::warn!("RAINBET_API_KEY not set; Rainbet routes disabled");
                None
            }
        };

        let betbolt = match config.betbolt_bearer() {
            Some(secret) => {
                let client = BetboltClient::new(
                    &config.betbolt_api_url,
                    secret.to_string(),
                    config.upstream_timeout(),
                )?;
                Some(Arc::new(LeaderboardService::new(
                    Arc::new(client),
                    config.betbolt_cache_ttl(),
                    clock.clone(),
                    config.wager_parsing,
                )))
            }
            None => {
                tracing::warn!("BETBOLT_SECRET not set; Betbolt routes disabled");
                None
            }
        };

        Ok(Self {
            rainbet,
            betbolt,
            clock,
        })
    }

    fn service(&self, platform: Platform) -> Option<&Arc<LeaderboardService>> {
        match platform {
            Platform::Rainbet => self.rainbet.as_ref(),
            Platform::Betbolt => self.betbolt.as_ref(),
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/leaderboard/rainbet", get(rainbet_current))
        .route("/api/prev-leaderboard/rainbet", get(rainbet_previous))
        .route("/api/countdown/rainbet", get(countdown))
        .route("/api/leaderboard/betbolt", get(betbolt_current))
        .route("/api/prev-leaderboard/betbolt", get(betbolt_previous))
        .route("/api/countdown/betbolt", get(countdown))
        .with_state(state)
        .layer(middleware::from_fn(request_logging_simple))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        platforms: PlatformStatus {
            rainbet: state.rainbet.is_some(),
            betbolt: state.betbolt.is_some(),
        },
    })
}

async fn rainbet_current(State(state): State<AppState>) -> Result<Response, ApiError> {
    serve_leaderboard(&state, Platform::Rainbet, Period::Current, UpstreamQuery::default()).await
}

async fn rainbet_previous(State(state): State<AppState>) -> Result<Response, ApiError> {
    serve_leaderboard(&state, Platform::Rainbet, Period::Previous, UpstreamQuery::default()).await
}

async fn betbolt_current(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Response, ApiError> {
    serve_leaderboard(&state, Platform::Betbolt, Period::Current, params.into()).await
}

async fn betbolt_previous(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Response, ApiError> {
    serve_leaderboard(&state, Platform::Betbolt, Period::Previous, params.into()).await
}

/// Share of the current contest month still remaining
async fn countdown(State(state): State<AppState>) -> Json<CountdownResponse> {
    let now = state.clock.now();
    Json(CountdownResponse {
        percentage_left: percentage_left(&current_month_range(now), now),
    })
}

async fn serve_leaderboard(
    state: &AppState,
    platform: Platform,
    period: Period,
    query: UpstreamQuery,
) -> Result<Response, ApiError> {
    let service = state
        .service(platform)
        .ok_or(ApiError::NotConfigured(platform))?;

    let Served {
        response,
        freshness,
    } = service
        .leaderboard(period, &query)
        .await
        .map_err(|error| ApiError::Upstream {
            platform,
            period,
            error,
        })?;

    Ok((
        [(X_CACHE, HeaderValue::from_static(freshness.as_str()))],
        Json(response.as_ref().clone()),
    )
        .into_response())
}

// ===== Request/Response Types =====

/// Raw tuning parameters. Kept as strings so a bad number falls back to the
/// upstream default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub categories: Option<String>,
}

impl From<LeaderboardParams> for UpstreamQuery {
    fn from(params: LeaderboardParams) -> Self {
        UpstreamQuery {
            limit: params.limit.as_deref().and_then(coerce_count),
            offset: params.offset.as_deref().and_then(coerce_count),
            sort_by: params.sort_by.filter(|s| !s.is_empty()),
            sort_order: params.sort_order.filter(|s| !s.is_empty()),
            categories: params.categories.filter(|s| !s.is_empty()),
        }
    }
}

/// `"25"` and `"25.9"` both read as 25; negatives and junk are dropped.
fn coerce_count(raw: &str) -> Option<u32> {
    let n = raw.trim().parse::<f64>().ok()?;
    (n.is_finite() && n >= 0.0 && n <= f64::from(u32::MAX)).then(|| n as u32)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    platforms: PlatformStatus,
}

#[derive(Serialize)]
struct PlatformStatus {
    rainbet: bool,
    betbolt: bool,
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum ApiError {
    NotConfigured(Platform),
    Upstream {
        platform: Platform,
        period: Period,
        error: UpstreamError,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotConfigured(platform) => {
                tracing::warn!(%platform, "request for unconfigured platform");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("{} integration is not configured", platform),
                )
            }
            ApiError::Upstream {
                platform,
                period,
                error,
            } => {
                tracing::error!(%platform, %period, %error, "leaderboard request failed");
                match error {
                    UpstreamError::Status { status, body } if platform.forwards_upstream_status() => {
                        let code = StatusCode::from_u16(*status)
                            .ok()
                            .filter(|c| c.is_client_error() || c.is_server_error())
                            .unwrap_or(StatusCode::BAD_GATEWAY);
                        (code, body.clone())
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, generic_message(*platform, *period)),
                }
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

fn generic_message(platform: Platform, period: Period) -> String {
    match period {
        Period::Current => format!("Failed to fetch {} leaderboard data", platform),
        Period::Previous => format!("Failed to fetch previous {} leaderboard data", platform),
    }
}
