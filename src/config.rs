//! Process configuration.
//!
//! Every value can come from a flag or an environment variable (a `.env` file
//! is loaded first). Upstream credentials have no defaults: a platform without
//! one is left unconfigured and its routes answer 503.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::leaderboard::WagerParsing;
use crate::scrapers::{betbolt::BETBOLT_API_URL, rainbet::RAINBET_API_URL};

#[derive(Parser, Debug, Clone)]
#[command(name = "wagerboard")]
#[command(about = "Affiliate wager leaderboards for Rainbet and Betbolt")]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: IpAddr,

    /// HTTP port
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Rainbet affiliate API key
    #[arg(long, env = "RAINBET_API_KEY", hide_env_values = true)]
    pub rainbet_api_key: Option<String>,

    /// Rainbet affiliate summary endpoint
    #[arg(long, env = "RAINBET_API_URL", default_value = RAINBET_API_URL)]
    pub rainbet_api_url: String,

    /// Seconds a Rainbet leaderboard is served without refetching
    #[arg(long, env = "RAINBET_CACHE_TTL_SECS", default_value = "60")]
    pub rainbet_cache_ttl_secs: u64,

    /// Betbolt bearer secret
    #[arg(long, env = "BETBOLT_SECRET", hide_env_values = true)]
    pub betbolt_secret: Option<String>,

    /// Betbolt referral leaderboard endpoint
    #[arg(long, env = "BETBOLT_API_URL", default_value = BETBOLT_API_URL)]
    pub betbolt_api_url: String,

    /// Seconds a Betbolt leaderboard is served without refetching
    #[arg(long, env = "BETBOLT_CACHE_TTL_SECS", default_value = "1800")]
    pub betbolt_cache_ttl_secs: u64,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "10")]
    pub upstream_timeout_secs: u64,

    /// `lenient` coerces unusable wagers to 0, `strict` rejects the payload
    #[arg(long, env = "WAGER_PARSING", default_value = "lenient")]
    pub wager_parsing: WagerParsing,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.max(1))
    }

    pub fn rainbet_cache_ttl(&self) -> chrono::Duration {
        ttl(self.rainbet_cache_ttl_secs)
    }

    pub fn betbolt_cache_ttl(&self) -> chrono::Duration {
        ttl(self.betbolt_cache_ttl_secs)
    }

    /// Trimmed credential, `None` when missing or blank.
    pub fn rainbet_key(&self) -> Option<&str> {
        non_blank(self.rainbet_api_key.as_deref())
    }

    pub fn betbolt_bearer(&self) -> Option<&str> {
        non_blank(self.betbolt_secret.as_deref())
    }
}

fn ttl(secs: u64) -> chrono::Duration {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
    chrono::Duration::seconds(secs)
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}
