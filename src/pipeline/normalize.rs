//! Cell-level conversions from raw sheet text into typed values.
//!
//! Every function here is total: malformed input turns into `None` (or the
//! forward-filled value for dates) and never into an error.

use crate::constants::{PROFILE_PAGE_MARKER, SENTINEL_TOKENS};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A `day/month/year` date exactly as split out of a cell, kept as text
/// until it is turned into a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTriplet {
    pub day: String,
    pub month: String,
    pub year: String,
}

impl DateTriplet {
    pub fn new(day: impl Into<String>, month: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            month: month.into(),
            year: year.into(),
        }
    }

    /// Calendar date for the triplet, `None` when it names an impossible day.
    /// Two-digit years pivot at 50: `94` is 1994, `05` is 2005.
    pub fn to_date(&self) -> Option<NaiveDate> {
        let day: u32 = self.day.parse().ok()?;
        let month: u32 = self.month.parse().ok()?;
        let mut year: i32 = self.year.parse().ok()?;
        if self.year.len() <= 2 {
            year += if year < 50 { 2000 } else { 1900 };
        }
        NaiveDate::from_ymd_opt(year, month, day)
    }

    pub fn to_datetime(&self, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.to_date().map(|date| date.and_time(time).and_utc())
    }
}

/// Whether a cell carries data. Absent, blank and placeholder cells do not.
pub fn validate_cell(raw: Option<&str>) -> bool {
    let Some(value) = raw.map(str::trim) else {
        return false;
    };
    if value.is_empty() {
        return false;
    }
    !SENTINEL_TOKENS
        .iter()
        .any(|token| value.eq_ignore_ascii_case(token))
}

pub fn normalize_link(raw: Option<&str>) -> Option<String> {
    if validate_cell(raw) {
        raw.map(|s| s.trim().to_string())
    } else {
        None
    }
}

/// Derive the account handle from a profile link using the default
/// profile-page marker.
pub fn normalize_handle(link: Option<&str>, domain: &str) -> Option<String> {
    normalize_handle_with_markers(link, domain, &[PROFILE_PAGE_MARKER.to_string()])
}

/// Derive the account handle from a profile link.
///
/// The link must mention `domain`. The scheme/host prefix is removed, then the
/// first path segment is the handle unless it is one of `markers`
/// (e.g. `pg` in `facebook.com/pg/<handle>/about`), in which case the segment
/// after it is used. Query strings and fragments are dropped.
pub fn normalize_handle_with_markers(
    link: Option<&str>,
    domain: &str,
    markers: &[String],
) -> Option<String> {
    let link = link?.trim();
    if domain.is_empty() || !link.contains(domain) {
        return None;
    }

    let prefixes = [
        format!("https://www.{domain}/"),
        format!("https://{domain}/"),
        format!("http://www.{domain}/"),
        format!("http://{domain}/"),
        format!("www.{domain}/"),
        format!("{domain}/"),
    ];
    let path = prefixes
        .iter()
        .find_map(|prefix| link.strip_prefix(prefix.as_str()))
        .unwrap_or(link);

    let mut segments = path.split('/');
    let first = segments.next()?;
    let segment = if markers.iter().any(|m| m == first) {
        segments.next()?
    } else {
        first
    };

    let handle = segment
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();

    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}

/// Parse a count written with locale thousands separators (`1.234`, `1,234`).
///
/// Separators are removed, then the leading signed run of digits is read;
/// anything after it (`"1234 seguidores"`) is ignored. `None` when there are
/// no leading digits or the value does not fit in an `i64`.
pub fn normalize_integer(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| *c != '.' && *c != ',').collect();
    let trimmed = cleaned.trim_start();

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if end == 0 {
        return None;
    }

    let value: i64 = unsigned[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Split a `dd/mm/yyyy` cell. Blank, placeholder or malformed cells hand back
/// `last_known` so the previous date is carried forward.
pub fn normalize_date(raw: Option<&str>, last_known: Option<DateTriplet>) -> Option<DateTriplet> {
    if !validate_cell(raw) {
        return last_known;
    }
    let Some(raw) = raw else {
        return last_known;
    };

    let parts: Vec<&str> = raw.trim().split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return last_known;
    }

    // "24/12/1994 10:30" keeps only the date part of the year component
    let year = parts[2].split_whitespace().next().unwrap_or_default();
    let well_formed = [parts[0], parts[1], year]
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return last_known;
    }

    Some(DateTriplet::new(parts[0], parts[1], year))
}
