//! Period key construction
//!
//! Keys are plain strings compared by exact equality. Sources that spell the
//! same month differently produce distinct keys; nothing here canonicalizes
//! them.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// A reporting-month label such as `2024年3月`
pub type PeriodKey = String;

/// Build the `<year>年<month>月` label. The month has no leading zero.
pub fn month_key(year: i32, month: u32) -> PeriodKey {
    format!("{}年{}月", year, month)
}

/// Period for a KPI sheet named by six digits, `YYYYMM`
pub fn from_year_month_name(name: &str) -> Option<PeriodKey> {
    if name.len() != 6 || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = name[..4].parse().ok()?;
    let month: u32 = name[4..].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(month_key(year, month))
}

/// Period for a revenue sheet: the name without the marker and the dataset
/// suffix, trimmed.
pub fn from_marked_sheet_name(name: &str, marker: &str, suffix: &str) -> PeriodKey {
    let without_marker = name.replace(marker, "");
    let trimmed = without_marker.trim();
    let stripped = if suffix.is_empty() {
        trimmed
    } else {
        trimmed.strip_suffix(suffix).unwrap_or(trimmed)
    };
    stripped.trim().to_string()
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y年%m月%d日",
    "%Y%m%d",
    "%m/%d/%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Timestamps carrying a UTC offset; the date is taken in that offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
];

/// Parse a daily-feed date cell into the month it belongs to
pub fn from_date_text(text: &str) -> Option<PeriodKey> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .or_else(|| {
                    OFFSET_FORMATS
                        .iter()
                        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
                })
                .map(|dt| dt.date_naive())
        })?;

    Some(month_key(date.year(), date.month()))
}
