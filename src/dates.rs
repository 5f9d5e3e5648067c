// src/dates.rs
//
// Date normalization across sources. Every upstream writes timestamps
// differently — ISO with offset, naive ISO, a "<iso> <epoch>" attribute pair,
// bare 8-digit tokens inside file names, "today 2:14pm" on fresh posts,
// freeform prose dates on the rest. Each helper returns `Option` so a bad
// date costs one item, not the batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

/// ISO-8601 / RFC3339 with offset, or a naive `YYYY-MM-DDTHH:MM:SS`
/// interpreted as UTC.
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// The dual `"<naive-iso> <epoch>"` attribute form some sites put on their
/// timestamp elements. The ISO half is authoritative; the trailing epoch is
/// ignored.
pub fn parse_stamped(s: &str) -> Option<DateTime<Utc>> {
    parse_iso(s.split_whitespace().next()?)
}

/// Compact 8-digit date token, tried as YYYYMMDD then DDMMYYYY.
pub fn parse_compact(token: &str) -> Option<NaiveDate> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(token, "%Y%m%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(token, "%d%m%Y").ok())
}

/// `"today 2:14pm"` resolved against the source's named timezone.
pub fn parse_relative_today(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let today = Utc::now().with_timezone(&tz).date_naive();
    parse_relative_on(s, tz, today)
}

fn parse_relative_on(s: &str, tz: Tz, today: NaiveDate) -> Option<DateTime<Utc>> {
    static RE_TODAY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^today\s+(\d{1,2}):(\d{2})\s*(am|pm)$").unwrap());
    let caps = RE_TODAY.captures(s.trim())?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour > 12 || minute > 59 {
        return None;
    }
    if hour == 12 {
        hour = 0;
    }
    if caps[3].eq_ignore_ascii_case("pm") {
        hour += 12;
    }
    let local = today.and_time(NaiveTime::from_hms_opt(hour, minute, 0)?);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Permissive fallback for sources whose only date signal is display text.
/// Tries the relative form, ISO, then a fixed set of prose formats;
/// date-only matches resolve to local midnight in `tz`.
pub fn parse_freeform(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    let s = RE_WS.replace_all(s.trim(), " ").into_owned();

    if let Some(dt) = parse_relative_today(&s, tz) {
        return Some(dt);
    }
    if let Some(dt) = parse_iso(&s) {
        return Some(dt);
    }

    const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%d %B %Y", "%Y-%m-%d", "%d/%m/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return midnight_in(d, tz);
        }
    }
    None
}

/// Midnight UTC for dates that carry no time or zone at all (file-name
/// tokens, bare year columns).
pub fn date_to_utc(d: NaiveDate) -> Option<DateTime<Utc>> {
    Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?))
}

fn midnight_in(d: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&d.and_hms_opt(0, 0, 0)?)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
