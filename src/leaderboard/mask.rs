//! Display-name redaction for public leaderboards.
//!
//! Not an access control: the upstream still knows the full name.

use serde_json::Value;

const VISIBLE_EDGE: usize = 2;
const MAX_UNMASKED_LEN: usize = 4;

/// `"abcdef"` -> `"ab***ef"`. Names of four characters or fewer are returned as-is.
pub fn mask(name: &str) -> String {
    let len = name.chars().count();
    if len <= MAX_UNMASKED_LEN {
        return name.to_string();
    }

    let head: String = name.chars().take(VISIBLE_EDGE).collect();
    let tail: String = name.chars().skip(len - VISIBLE_EDGE).collect();
    format!("{head}***{tail}")
}

/// Masks a raw upstream name field. Only strings are masked; any other value
/// is returned as sent, and an absent field stays absent.
pub fn mask_value(raw: Option<&Value>) -> Option<Value> {
    match raw? {
        Value::String(s) => Some(Value::String(mask(s))),
        other => Some(other.clone()),
    }
}
