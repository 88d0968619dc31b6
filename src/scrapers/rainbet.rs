//! Rainbet affiliate summary API
//!
//! `GET {base}?start_at=YYYY-MM-DD&end_at=YYYY-MM-DD&key=<api key>`; the payload
//! lists participants under `affiliates` with `username` and `wagered_amount`.
//! The endpoint takes no paging or sorting parameters.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Request, Url};
use serde_json::Value;
use std::time::Duration;

use super::{execute_json, LeaderboardSource, UpstreamError, UpstreamQuery};
use crate::leaderboard::time_window::TimeWindow;
use crate::models::Platform;

pub const RAINBET_API_URL: &str = "https://services.rainbet.com/v1/external/affiliates";

#[derive(Clone)]
pub struct RainbetClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RainbetClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid Rainbet API URL")?;
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("wagerboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build RainbetClient")?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn build_request(&self, window: &TimeWindow) -> Result<Request, UpstreamError> {
        self.client
            .get(self.base_url.clone())
            .query(&[
                ("start_at", window.start_date()),
                ("end_at", window.end_date()),
                ("key", self.api_key.clone()),
            ])
            .build()
            .map_err(UpstreamError::from)
    }
}

#[async_trait]
impl LeaderboardSource for RainbetClient {
    fn platform(&self) -> Platform {
        Platform::Rainbet
    }

    async fn fetch(
        &self,
        window: &TimeWindow,
        _query: &UpstreamQuery,
    ) -> Result<Value, UpstreamError> {
        let request = self.build_request(window)?;
        execute_json(&self.client, Platform::Rainbet, request).await
    }
}
