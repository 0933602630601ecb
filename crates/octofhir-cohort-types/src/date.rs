//! Date recognition and parsing for free-text cells
//!
//! Recognised shapes:
//! - ISO: `2024-01-15`, `2024/01/15` (optionally followed by a time part)
//! - US/EU: `01/15/2024`, `15-01-2024`, `15.01.2024`
//! - Two-digit years: `01/15/24`, `15-01-24`
//! - Textual months: `January 15, 2024`, `Jan 15 2024`, `15 January 2024`

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

const MONTHS: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec";

/// Recognised textual shapes of a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateShape {
    Iso,
    Numeric,
    NumericShortYear,
    MonthFirst,
    DayFirst,
}

static DATE_PATTERNS: LazyLock<Vec<(DateShape, Regex)>> = LazyLock::new(|| {
    let textual_month = format!(r"(?:{MONTHS})[a-z]*\.?");
    [
        (
            DateShape::Iso,
            r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}(?:[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$"
                .to_string(),
        ),
        (DateShape::Numeric, r"^\d{1,2}[-/.]\d{1,2}[-/.]\d{4}$".to_string()),
        (DateShape::NumericShortYear, r"^\d{1,2}[-/.]\d{1,2}[-/.]\d{2}$".to_string()),
        (
            DateShape::MonthFirst,
            format!(r"(?i)^{textual_month}\s+\d{{1,2}},?\s+\d{{4}}$"),
        ),
        (
            DateShape::DayFirst,
            format!(r"(?i)^\d{{1,2}}\s+{textual_month},?\s+\d{{4}}$"),
        ),
    ]
    .into_iter()
    .filter_map(|(shape, pattern)| Regex::new(&pattern).ok().map(|re| (shape, re)))
    .collect()
});

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

// Month-first (US) is tried before day-first (EU)
const NUMERIC_FORMATS: &[&str] = &["%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%m-%d-%Y", "%d.%m.%Y"];

const SHORT_YEAR_FORMATS: &[&str] = &["%m/%d/%y", "%d/%m/%y", "%d-%m-%y", "%m-%d-%y", "%d.%m.%y"];

const MONTH_FIRST_FORMATS: &[&str] = &["%B %d, %Y", "%B %d %Y"];

const DAY_FIRST_FORMATS: &[&str] = &["%d %B %Y", "%d %B, %Y"];

fn classify(s: &str) -> Option<DateShape> {
    DATE_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(s))
        .map(|(shape, _)| *shape)
}

/// Whether the text has one of the recognised date shapes
pub fn looks_like_date(s: &str) -> bool {
    classify(s.trim()).is_some()
}

/// Parse text into a calendar date
///
/// Ambiguous numeric forms are read month-first (US) before day-first (EU);
/// a time part, if present, is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    let shape = classify(trimmed)?;
    let formats = match shape {
        DateShape::Iso => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                return Some(dt.date_naive());
            }
            if let Some(dt) = ISO_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            {
                return Some(dt.date());
            }
            ISO_DATE_FORMATS
        }
        DateShape::Numeric => NUMERIC_FORMATS,
        DateShape::NumericShortYear => SHORT_YEAR_FORMATS,
        DateShape::MonthFirst => MONTH_FIRST_FORMATS,
        DateShape::DayFirst => DAY_FIRST_FORMATS,
    };

    let candidate: Cow<'_, str> = match shape {
        DateShape::MonthFirst | DateShape::DayFirst => {
            Cow::Owned(trimmed.replace('.', "").replace("Sept", "Sep").replace("sept", "sep"))
        }
        _ => Cow::Borrowed(trimmed),
    };
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&candidate, format).ok())
}
