//! Publication date parsing
//!
//! Candidates are tried against a fixed list of formats first and then a
//! lenient pattern scan. Naive values without an offset are taken as UTC.
//! Nothing here ever falls back to the current time; callers decide that.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Offset-carrying formats tried after RFC 3339 and RFC 2822
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",  // 2024-03-05T10:20:30.123+0000
    "%Y-%m-%dT%H:%M:%S%z",     // 2024-03-05T10:20:30+0000
    "%Y-%m-%d %H:%M:%S%z",     // 2024-03-05 10:20:30+0000
    "%Y-%m-%d %H:%M:%S %z",    // 2024-03-05 10:20:30 +0000
    "%Y-%m-%dT%H:%M%:z",       // 2024-03-05T10:20+01:00
];

/// Date-time formats without an offset (UTC assumed)
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",    // 2024-03-05T10:20:30.123
    "%Y-%m-%dT%H:%M:%S",       // 2024-03-05T10:20:30
    "%Y-%m-%dT%H:%M",          // 2024-03-05T10:20
    "%Y-%m-%d %H:%M:%S",       // 2024-03-05 10:20:30
    "%Y-%m-%d %H:%M",          // 2024-03-05 10:20
    "%Y/%m/%d %H:%M:%S",       // 2024/03/05 10:20:30
    "%d/%m/%Y %H:%M:%S",       // 05/03/2024 10:20:30
    "%m/%d/%Y %H:%M:%S",       // 03/05/2024 10:20:30
    "%d/%m/%Y %H:%M",          // 05/03/2024 10:20
    "%m/%d/%Y %I:%M %p",       // 03/05/2024 10:20 AM
    "%B %d, %Y %I:%M %p",      // March 5, 2024 10:20 AM
    "%B %d, %Y %H:%M",         // March 5, 2024 10:20
    "%d %B %Y %H:%M",          // 5 March 2024 10:20
];

/// Date-only formats (midnight UTC)
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",                // 2024-03-05
    "%Y/%m/%d",                // 2024/03/05
    "%d/%m/%Y",                // 05/03/2024
    "%m/%d/%Y",                // 03/05/2024
    "%d.%m.%Y",                // 05.03.2024
    "%B %d, %Y",               // March 5, 2024 / Mar 5, 2024
    "%B %d %Y",                // March 5 2024
    "%d %B %Y",                // 5 March 2024
    "%A, %B %d, %Y",           // Tuesday, March 5, 2024
    "%A %d %B %Y",             // Tuesday 5 March 2024
];

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());

static YMD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})").unwrap());

static DAY_MONTH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s+([a-z]{3,9})\.?,?\s+(\d{4})\b").unwrap()
});

static MONTH_DAY_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b").unwrap()
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})[:.](\d{2})(?:[:.](\d{2}))?(?:\s*([ap])\.?m\b\.?)?").unwrap()
});

static ZONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(gmt|utc|bst|cet|cest|est|edt|cst|cdt|mst|mdt|pst|pdt|et)\b|([+-])(\d{2}):?(\d{2})\b")
        .unwrap()
});

/// Parse a date candidate: fixed formats first, then the lenient scan
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    parse_fixed(trimmed).or_else(|| parse_lenient(trimmed))
}

/// Try the fixed format list, in order
pub fn parse_fixed(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();

    if let Some(dt) = parse_epoch(s) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    None
}

/// Unix timestamps in seconds (10 digits) or milliseconds (13 digits)
fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    match s.len() {
        10 => DateTime::from_timestamp(s.parse().ok()?, 0),
        13 => DateTime::from_timestamp_millis(s.parse().ok()?),
        _ => None,
    }
}

/// Scan free text for a date, an optional time and an optional zone
///
/// Handles strings such as `"Updated 10:20 GMT, 5th March 2024"` or
/// `"Published March 5, 2024 at 3:45 p.m. ET"`.
pub fn parse_lenient(input: &str) -> Option<DateTime<Utc>> {
    let cleaned = ORDINAL_RE.replace_all(input, "$1");

    let (date, date_span) = find_date(&cleaned)?;

    // Look for the time outside the matched date so "2024.03.05" is not read as 20:24
    let rest = format!("{} {}", &cleaned[..date_span.0], &cleaned[date_span.1..]);
    let time = find_time(&rest).unwrap_or(NaiveTime::MIN);
    let offset = find_offset(&rest).or_else(|| FixedOffset::east_opt(0))?;

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn find_date(s: &str) -> Option<(NaiveDate, (usize, usize))> {
    if let Some(caps) = YMD_RE.captures(s) {
        let whole = caps.get(0)?;
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2)?.as_str().parse().ok()?;
        let day = caps.get(3)?.as_str().parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, (whole.start(), whole.end())));
        }
    }

    for caps in DAY_MONTH_YEAR_RE.captures_iter(s) {
        let whole = caps.get(0)?;
        let Some(month) = month_number(caps.get(2)?.as_str()) else {
            continue;
        };
        let day = caps.get(1)?.as_str().parse().ok()?;
        let year = caps.get(3)?.as_str().parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, (whole.start(), whole.end())));
        }
    }

    for caps in MONTH_DAY_YEAR_RE.captures_iter(s) {
        let whole = caps.get(0)?;
        let Some(month) = month_number(caps.get(1)?.as_str()) else {
            continue;
        };
        let day = caps.get(2)?.as_str().parse().ok()?;
        let year = caps.get(3)?.as_str().parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, (whole.start(), whole.end())));
        }
    }

    None
}

fn find_time(s: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(s)?;

    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    let second: u32 = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    // Convert 12-hour to 24-hour format
    match caps.get(4).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(ref p) if p == "a" && hour == 12 => hour = 0,
        Some(ref p) if p == "p" && hour < 12 => hour += 12,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn find_offset(s: &str) -> Option<FixedOffset> {
    let caps = ZONE_RE.captures(s)?;

    if let Some(abbr) = caps.get(1) {
        let hours = match abbr.as_str().to_ascii_lowercase().as_str() {
            "gmt" | "utc" => 0,
            "bst" | "cet" => 1,
            "cest" => 2,
            "est" | "et" | "cdt" => -5,
            "edt" => -4,
            "cst" | "mdt" => -6,
            "mst" | "pdt" => -7,
            "pst" => -8,
            _ => return None,
        };
        return FixedOffset::east_opt(hours * 3600);
    }

    let sign = if caps.get(2)?.as_str() == "-" { -1 } else { 1 };
    let hours: i32 = caps.get(3)?.as_str().parse().ok()?;
    let minutes: i32 = caps.get(4)?.as_str().parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
