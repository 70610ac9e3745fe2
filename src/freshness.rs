//! Expiry classification
//!
//! Turns a whole-day distance to expiry into a three-way freshness status.
//! The warning threshold depends on the active flight context: domestic
//! hops run the tightest margin, long-haul wide-bodies the widest. The
//! threshold is recomputed on every call so context changes apply to the
//! very next detection.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::{FlightContext, FlightType};

/// Warning threshold for domestic flights, in days.
pub const DOMESTIC_WARNING_DAYS: i64 = 5;

/// Warning threshold for international flights on narrow-body aircraft.
pub const INTERNATIONAL_WARNING_DAYS: i64 = 10;

/// Warning threshold for international flights on wide-body aircraft.
pub const WIDE_BODY_WARNING_DAYS: i64 = 14;

/// Aircraft-name tokens that mark a wide-body airframe.
const WIDE_BODY_MODELS: [&str; 4] = ["777", "787", "350", "380"];

/// Freshness status of a scanned product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freshness {
    Good,
    Warning,
    Expired,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::Good => write!(f, "good"),
            Freshness::Warning => write!(f, "warning"),
            Freshness::Expired => write!(f, "expired"),
        }
    }
}

/// Days-before-expiry at or below which a product is flagged as Warning.
pub fn warning_threshold(context: &FlightContext) -> i64 {
    match context.flight_type {
        FlightType::Domestic => DOMESTIC_WARNING_DAYS,
        FlightType::International => {
            if is_wide_body(&context.aircraft) {
                WIDE_BODY_WARNING_DAYS
            } else {
                INTERNATIONAL_WARNING_DAYS
            }
        }
    }
}

fn is_wide_body(aircraft: &str) -> bool {
    WIDE_BODY_MODELS.iter().any(|model| aircraft.contains(model))
}

/// Classify a whole-day distance to expiry.
///
/// Negative days are already past expiry. Zero through the context
/// threshold is Warning, so a product expiring today is never Good.
pub fn classify(days_until_expiry: i64, context: &FlightContext) -> Freshness {
    if days_until_expiry < 0 {
        Freshness::Expired
    } else if days_until_expiry <= warning_threshold(context) {
        Freshness::Warning
    } else {
        Freshness::Good
    }
}

/// Whole days from `today` to `expiry`. Negative once expiry has passed.
///
/// Both sides are calendar dates, so the difference is exact whole days
/// with no time-of-day drift.
pub fn days_until(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}
