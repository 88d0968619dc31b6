//! Normalization & Ranking
//!
//! Turns a raw upstream payload into the public [`LeaderboardResponse`]:
//! extract entries, coerce wagers, mask names, rank by wager, keep the top
//! [`TOP_N`], attach the platform's prize table and the window bounds.
//!
//! Malformed upstream shapes never fail the request. A missing entries list is
//! an empty leaderboard and an unusable wager counts as zero; the number of
//! coerced wagers is reported so callers can apply [`WagerParsing::Strict`].

use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

use super::mask::mask_value;
use super::time_window::TimeWindow;
use crate::models::{LeaderboardEntry, LeaderboardResponse, Platform};

/// Ranks kept in a response.
pub const TOP_N: usize = 10;

/// How to treat wagers that are missing, non-numeric, negative or non-finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WagerParsing {
    /// Count them as 0 and keep serving.
    #[default]
    Lenient,
    /// Reject the whole upstream payload.
    Strict,
}

impl FromStr for WagerParsing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(WagerParsing::Lenient),
            "strict" => Ok(WagerParsing::Strict),
            other => Err(format!(
                "unknown wager parsing mode '{other}' (expected 'lenient' or 'strict')"
            )),
        }
    }
}

/// Pipeline output plus data-quality counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub response: LeaderboardResponse,
    /// Entries seen upstream, before truncation.
    pub total_entries: usize,
    /// Entries whose wager had to be coerced to 0.
    pub invalid_wagers: usize,
}

pub fn normalize(platform: Platform, payload: &Value, window: &TimeWindow) -> Normalized {
    let raw_entries: &[Value] = payload
        .get(platform.entries_field())
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut invalid_wagers = 0usize;
    let mut leaderboard: Vec<LeaderboardEntry> = raw_entries
        .iter()
        .map(|raw| {
            let wager = match parse_wager(raw.get(platform.wager_field())) {
                Some(w) => w,
                None => {
                    invalid_wagers += 1;
                    0.0
                }
            };
            LeaderboardEntry {
                name: mask_value(raw.get("username")),
                wager,
                id: text_field(raw, &["id"]),
                favorite_game_id: text_field(raw, &["favorite_game_id", "favoriteGameId"]),
                favorite_game_title: text_field(
                    raw,
                    &["favorite_game_title", "favoriteGameTitle"],
                ),
            }
        })
        .collect();

    // sort_by is stable: equal wagers keep upstream order
    leaderboard.sort_by(|a, b| b.wager.partial_cmp(&a.wager).unwrap_or(Ordering::Equal));
    leaderboard.truncate(TOP_N);

    Normalized {
        response: LeaderboardResponse {
            leaderboard,
            prizes: platform.prizes(),
            start_time: window.start_iso(),
            end_time: window.end_iso(),
        },
        total_entries: raw_entries.len(),
        invalid_wagers,
    }
}

/// Usable wager, or `None` when it must be coerced.
///
/// Strings are read like a decimal literal; trailing garbage after a numeric
/// prefix is ignored (`"125.50 USD"` is 125.5).
pub fn parse_wager(raw: Option<&Value>) -> Option<f64> {
    let value = match raw? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => numeric_prefix(s)?.parse::<f64>().ok()?,
        _ => return None,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn numeric_prefix(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    // exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    Some(&s[..end])
}

fn text_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
