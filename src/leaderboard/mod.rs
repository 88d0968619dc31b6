//! Leaderboard core: contest windows, name masking, ranking and caching.

pub mod cache;
pub mod clock;
pub mod mask;
pub mod pipeline;
pub mod service;
pub mod time_window;

pub use cache::LeaderboardCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use pipeline::{normalize, WagerParsing};
pub use service::{Freshness, LeaderboardService, Served};
pub use time_window::{current_month_range, percentage_left, previous_month_range, TimeWindow};
