//! Betbolt referral leaderboard API
//!
//! Bearer-authenticated; participants arrive under `data` with `username`,
//! `wagered` and optional favorite-game fields. The upstream budget is tight
//! (roughly five requests an hour), so callers should sit behind the cache.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Request, Url};
use serde_json::Value;
use std::time::Duration;

use super::{
    execute_json, LeaderboardSource, UpstreamError, UpstreamQuery, DEFAULT_LIMIT, DEFAULT_OFFSET,
    DEFAULT_SORT_BY, DEFAULT_SORT_ORDER,
};
use crate::leaderboard::time_window::TimeWindow;
use crate::models::Platform;

pub const BETBOLT_API_URL: &str = "https://openapi.betbolt.com/v1/referral/leaderboard";

#[derive(Clone)]
pub struct BetboltClient {
    client: Client,
    base_url: Url,
    secret: String,
}

impl BetboltClient {
    pub fn new(base_url: &str, secret: String, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid Betbolt API URL")?;
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("wagerboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build BetboltClient")?;

        Ok(Self {
            client,
            base_url,
            secret,
        })
    }

    pub fn build_request(
        &self,
        window: &TimeWindow,
        query: &UpstreamQuery,
    ) -> Result<Request, UpstreamError> {
        let mut qp: Vec<(&str, String)> = Vec::with_capacity(7);
        qp.push(("limit", query.limit.unwrap_or(DEFAULT_LIMIT).to_string()));
        qp.push(("offset", query.offset.unwrap_or(DEFAULT_OFFSET).to_string()));
        qp.push(("start_date", window.start_iso()));
        qp.push(("end_date", window.end_iso()));
        qp.push((
            "sort_by",
            query.sort_by.as_deref().unwrap_or(DEFAULT_SORT_BY).to_string(),
        ));
        qp.push((
            "sort_order",
            query
                .sort_order
                .as_deref()
                .unwrap_or(DEFAULT_SORT_ORDER)
                .to_string(),
        ));
        if let Some(categories) = query.categories.as_deref().filter(|c| !c.is_empty()) {
            qp.push(("categories", categories.to_string()));
        }

        self.client
            .get(self.base_url.clone())
            .query(&qp)
            .bearer_auth(&self.secret)
            .build()
            .map_err(UpstreamError::from)
    }
}

#[async_trait]
impl LeaderboardSource for BetboltClient {
    fn platform(&self) -> Platform {
        Platform::Betbolt
    }

    async fn fetch(
        &self,
        window: &TimeWindow,
        query: &UpstreamQuery,
    ) -> Result<Value, UpstreamError> {
        let request = self.build_request(window, query)?;
        execute_json(&self.client, Platform::Betbolt, request).await
    }
}
