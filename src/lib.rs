//! Wagerboard backend library
//!
//! Monthly affiliate wager leaderboards for Rainbet and Betbolt, served over
//! HTTP with a per-platform cache in front of each upstream.

pub mod api;
pub mod config;
pub mod leaderboard;
pub mod middleware;
pub mod models;
pub mod scrapers;
