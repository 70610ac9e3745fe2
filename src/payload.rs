//! Label payload parsing
//!
//! Product labels carry either a JSON object or a bare ISO date. Parsing
//! never fails hard: anything unrecognized simply yields `None` and the
//! frame moves on. Date strings found here are shape-checked only; calendar
//! validation happens in [`ParsedPayload::expiry_date`].

use chrono::NaiveDate;
use serde_json::Value;

/// Accepted expiry keys in priority order. Matching is case-sensitive and
/// the first key with a usable value wins.
const EXPIRY_KEYS: [&str; 3] = ["expiry", "expiryDate", "exp"];

/// Accepted product-id keys in priority order.
const PRODUCT_ID_KEYS: [&str; 2] = ["productId", "pid"];

/// Expiry candidate plus whatever product metadata the label carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPayload {
    /// Raw expiry candidate, not yet validated as a calendar date.
    pub expiry_raw: String,
    pub product_id: Option<String>,
    pub name: Option<String>,
}

impl ParsedPayload {
    /// Validate the expiry candidate as a real `YYYY-MM-DD` calendar date.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.expiry_raw, "%Y-%m-%d").ok()
    }
}

/// Extract an expiry payload from decoded label text.
///
/// Tries the structured JSON shape first, then falls back to treating the
/// whole text as a bare date. Returns `None` when neither shape applies.
pub fn parse(text: &str) -> Option<ParsedPayload> {
    if let Some(payload) = parse_structured(text) {
        return Some(payload);
    }
    if is_bare_date(text) {
        return Some(ParsedPayload {
            expiry_raw: text.to_string(),
            product_id: None,
            name: None,
        });
    }
    None
}

/// Structured attempt: a JSON object with one of the accepted expiry keys.
fn parse_structured(text: &str) -> Option<ParsedPayload> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;

    // Null and empty-string values do not claim the key; later keys still
    // get their chance.
    let expiry_raw = EXPIRY_KEYS
        .iter()
        .find_map(|key| candidate_text(object.get(*key)?))?;

    let product_id = PRODUCT_ID_KEYS
        .iter()
        .find_map(|key| string_field(object.get(*key)?));
    let name = object.get("name").and_then(string_field);

    Some(ParsedPayload {
        expiry_raw,
        product_id,
        name,
    })
}

/// Expiry candidate from a JSON value. Non-string scalars are stringified
/// and accepted here; they fail calendar validation downstream.
fn candidate_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Metadata field: non-empty strings only.
fn string_field(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Shape check for `YYYY-MM-DD`: length 10, dashes at positions 4 and 7,
/// digits everywhere else. Calendar validity is not checked here.
fn is_bare_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 10 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, &b)| {
        if i == 4 || i == 7 {
            b == b'-'
        } else {
            b.is_ascii_digit()
        }
    })
}
