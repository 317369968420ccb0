//! Cell value normalization for manifest spreadsheets
//!
//! Legacy manifests were typed by hand, so quantity cells carry units
//! ("120 litros", "3 kg") and dates come in more than one layout.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("numeral pattern is valid"));

/// Extract the first numeral from a free-text cell
///
/// Trailing unit text is ignored, not validated. Empty cells and cells
/// without any digits yield `0.0`.
pub fn extract_numeric(text: Option<&str>) -> f64 {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return 0.0;
    };

    NUMERAL
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parse a manifest date (`YYYY/MM/DD` or `YYYY-MM-DD`) as UTC midnight
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let format = if text.contains('/') { "%Y/%m/%d" } else { "%Y-%m-%d" };

    NaiveDate::parse_from_str(text, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Normalize a manifest date to an ISO-8601 timestamp with UTC offset
///
/// Unparseable input is replaced by the current instant, so the result
/// does not necessarily reflect the cell.
pub fn normalize_date(text: &str) -> String {
    match parse_date(text) {
        Some(date) => date.to_rfc3339(),
        None => {
            log::warn!("Could not parse date: '{}', using current date", text);
            Utc::now().to_rfc3339()
        }
    }
}
