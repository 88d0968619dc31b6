use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Upstream partner platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Affiliate summary API, keyed by a query-string API key
    Rainbet,
    /// Referral leaderboard API, keyed by a bearer secret
    Betbolt,
}

pub const RAINBET_PRIZES: [f64; 10] = [220.0, 170.0, 120.0, 50.0, 40.0, 0.0, 0.0, 0.0, 0.0, 0.0];
pub const BETBOLT_PRIZES: [f64; 10] = [
    1000.0, 550.0, 275.0, 125.0, 50.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Rainbet => "rainbet",
            Platform::Betbolt => "betbolt",
        }
    }

    /// Fixed reward per rank, first place first.
    pub fn prizes(&self) -> Vec<PrizeSlot> {
        let table = match self {
            Platform::Rainbet => &RAINBET_PRIZES,
            Platform::Betbolt => &BETBOLT_PRIZES,
        };
        table
            .iter()
            .enumerate()
            .map(|(i, &reward)| PrizeSlot {
                position: i as u8 + 1,
                reward,
            })
            .collect()
    }

    /// Top-level payload field holding the participant list.
    pub fn entries_field(&self) -> &'static str {
        match self {
            Platform::Rainbet => "affiliates",
            Platform::Betbolt => "data",
        }
    }

    /// Per-participant field holding the wagered amount.
    pub fn wager_field(&self) -> &'static str {
        match self {
            Platform::Rainbet => "wagered_amount",
            Platform::Betbolt => "wagered",
        }
    }

    /// Whether a non-2xx upstream status is surfaced to the caller as-is.
    pub fn forwards_upstream_status(&self) -> bool {
        matches!(self, Platform::Rainbet)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contest month relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Current,
    Previous,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Current => "current",
            Period::Previous => "previous",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Masked display name. Non-text names pass through as sent; an absent
    /// name stays absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    pub wager: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_game_title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrizeSlot {
    pub position: u8,
    pub reward: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub prizes: Vec<PrizeSlot>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownResponse {
    pub percentage_left: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prize_tables_have_ten_ranked_slots() {
        for platform in [Platform::Rainbet, Platform::Betbolt] {
            let prizes = platform.prizes();
            assert_eq!(prizes.len(), 10);
            for (i, slot) in prizes.iter().enumerate() {
                assert_eq!(slot.position as usize, i + 1);
                assert!(slot.reward >= 0.0);
            }
        }
        assert_eq!(Platform::Rainbet.prizes()[0].reward, 220.0);
        assert_eq!(Platform::Betbolt.prizes()[4].reward, 50.0);
    }

    #[test]
    fn test_entry_serializes_camel_case_and_skips_absent_fields() {
        let entry = LeaderboardEntry {
            name: Some(json!("ab***ef")),
            wager: 12.5,
            id: None,
            favorite_game_id: Some("g1".to_string()),
            favorite_game_title: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"name": "ab***ef", "wager": 12.5, "favoriteGameId": "g1"})
        );
    }

    #[test]
    fn test_entry_name_passthrough_shapes() {
        let entry = |name| LeaderboardEntry {
            name,
            wager: 1.0,
            id: None,
            favorite_game_id: None,
            favorite_game_title: None,
        };
        assert_eq!(
            serde_json::to_value(entry(None)).unwrap(),
            json!({"wager": 1.0})
        );
        assert_eq!(
            serde_json::to_value(entry(Some(Value::Null))).unwrap(),
            json!({"name": null, "wager": 1.0})
        );
        assert_eq!(
            serde_json::to_value(entry(Some(json!(1234567)))).unwrap(),
            json!({"name": 1234567, "wager": 1.0})
        );
    }

    #[test]
    fn test_countdown_field_name() {
        let value = serde_json::to_value(CountdownResponse {
            percentage_left: 42.5,
        })
        .unwrap();
        assert_eq!(value, json!({"percentageLeft": 42.5}));
    }
}
