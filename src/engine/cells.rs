use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::models::ListingStatus;

/// Timestamp layout of the `Last Updated` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of parsing one loosely typed cell.
///
/// `Blank` and `Recovered` both mean "no usable value", but only `Recovered`
/// is worth a diagnostic: the cell held something we could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellParse<T> {
    Value(T),
    Blank,
    Recovered(String),
}

impl<T> CellParse<T> {
    pub fn value(self) -> Option<T> {
        match self {
            CellParse::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn unwrap_or(self, fallback: T) -> T {
        self.value().unwrap_or(fallback)
    }

    /// The raw text of a cell that had to be defaulted.
    pub fn recovered(&self) -> Option<&str> {
        match self {
            CellParse::Recovered(raw) => Some(raw.as_str()),
            _ => None,
        }
    }
}

/// Parse a price or percent cell.
///
/// Currency symbols, `%`, and spaces (including NBSP) are ignored. A lone
/// comma is a decimal separator; when both `,` and `.` appear the rightmost
/// one is the decimal separator and the other is dropped as grouping.
pub fn parse_decimal(raw: Option<&str>) -> CellParse<Decimal> {
    let Some(raw) = raw else {
        return CellParse::Blank;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellParse::Blank;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$' | '£' | '%'))
        .collect();
    let normalized = normalize_separators(&cleaned);

    match Decimal::from_str(&normalized).or_else(|_| Decimal::from_scientific(&normalized)) {
        Ok(d) => CellParse::Value(d),
        Err(_) => CellParse::Recovered(raw.to_string()),
    }
}

fn normalize_separators(s: &str) -> String {
    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');
    match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) if s.matches(',').count() == 1 => s.replace(',', "."),
        (Some(_), None) => s.replace(',', ""),
        _ => s.to_string(),
    }
}

pub fn parse_status(raw: Option<&str>) -> CellParse<ListingStatus> {
    match raw.map(str::trim) {
        None | Some("") => CellParse::Blank,
        Some(s) => match ListingStatus::from_label(s) {
            Some(status) => CellParse::Value(status),
            None => CellParse::Recovered(s.to_string()),
        },
    }
}

pub fn parse_timestamp(raw: Option<&str>) -> CellParse<NaiveDateTime> {
    match raw.map(str::trim) {
        None | Some("") => CellParse::Blank,
        Some(s) => match NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
            Ok(ts) => CellParse::Value(ts),
            Err(_) => CellParse::Recovered(s.to_string()),
        },
    }
}

/// Round to cents, half away from zero.
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render a price cell with exactly two decimals.
pub fn format_price(value: Decimal) -> String {
    let mut rounded = round_price(value);
    rounded.rescale(2);
    rounded.to_string()
}

/// Render a percent cell without trailing zeros (`-2`, `12.5`).
pub fn format_percent(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
