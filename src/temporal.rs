use crate::error::{TemporalParseError, TemporalReason};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

pub const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<hour>\d+)(?::(?P<minute>\d*))?(?P<meridiem>am|pm)?$")
        .expect("time regex must be valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthDay {
    pub month0: u32,
    pub day: u32,
}

pub fn resolve(
    date_text: &str,
    time_text: &str,
    tz: Tz,
    reference: DateTime<Utc>,
) -> Result<DateTime<Utc>, TemporalParseError> {
    let err = |reason| TemporalParseError::new(date_text, time_text, reason);
    let date = resolve_date(date_text, tz, reference).map_err(err)?;
    let time = parse_time_text(time_text).map_err(err)?;
    localize(date.and_time(time), tz).map_err(err)
}

pub fn resolve_date(
    date_text: &str,
    tz: Tz,
    reference: DateTime<Utc>,
) -> Result<NaiveDate, TemporalReason> {
    let month_day = parse_date_text(date_text)?;
    civil_date(month_day, reference_date(reference, tz))
}

pub fn parse_date_text(text: &str) -> Result<MonthDay, TemporalReason> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TemporalReason::EmptyDate);
    }

    let (_weekday, rest) = text.split_once(':').ok_or(TemporalReason::MissingColon)?;
    let mut parts = rest.split_whitespace();

    let month_token = parts.next().unwrap_or_default();
    let month0 =
        month_index(month_token).ok_or_else(|| TemporalReason::UnknownMonth(month_token.into()))?;

    let day_token = parts.next().unwrap_or_default();
    let day = day_token
        .trim_end_matches(',')
        .parse::<u32>()
        .ok()
        .filter(|d| (1..=31).contains(d))
        .ok_or_else(|| TemporalReason::InvalidDay(day_token.into()))?;

    Ok(MonthDay { month0, day })
}

pub fn month_index(token: &str) -> Option<u32> {
    let token = token.trim_end_matches(['.', ',']).to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == token).map(|i| i as u32)
}

pub fn infer_year(month0: u32, reference: NaiveDate) -> i32 {
    if month0 < reference.month0() {
        reference.year() + 1
    } else {
        reference.year()
    }
}

pub fn civil_date(month_day: MonthDay, reference: NaiveDate) -> Result<NaiveDate, TemporalReason> {
    let year = infer_year(month_day.month0, reference);
    NaiveDate::from_ymd_opt(year, month_day.month0 + 1, month_day.day).ok_or_else(|| {
        TemporalReason::InvalidDay(format!(
            "{} {} {year}",
            MONTHS[month_day.month0 as usize],
            month_day.day
        ))
    })
}

pub fn reference_date(reference: DateTime<Utc>, tz: Tz) -> NaiveDate {
    reference.with_timezone(&tz).date_naive()
}

pub fn normalize_time_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn has_meridiem(text: &str) -> bool {
    let text = normalize_time_text(text);
    text.ends_with("am") || text.ends_with("pm") || text == "noon" || text == "midnight"
}

pub fn parse_time_text(text: &str) -> Result<NaiveTime, TemporalReason> {
    let normalized = normalize_time_text(text);
    let normalized = match normalized.as_str() {
        "" => return Err(TemporalReason::EmptyTime),
        "noon" => "12pm",
        "midnight" => "12am",
        other => other,
    };

    let caps = TIME_RE
        .captures(normalized)
        .ok_or_else(|| TemporalReason::MissingMeridiem(text.trim().to_string()))?;

    let hour_text = &caps["hour"];
    let hour = hour_text
        .parse::<u32>()
        .ok()
        .filter(|h| (1..=12).contains(h))
        .ok_or_else(|| TemporalReason::HourOutOfRange(hour_text.to_string()))?;

    let minute = match caps.name("minute").map(|m| m.as_str()) {
        None => 0,
        Some(m) if m.len() == 2 => m
            .parse::<u32>()
            .ok()
            .filter(|v| *v < 60)
            .ok_or_else(|| TemporalReason::InvalidMinute(m.to_string()))?,
        Some(m) => return Err(TemporalReason::InvalidMinute(m.to_string())),
    };

    let hour = match caps.name("meridiem").map(|m| m.as_str()) {
        Some("pm") if hour != 12 => hour + 12,
        Some("am") if hour == 12 => 0,
        Some(_) => hour,
        None => return Err(TemporalReason::MissingMeridiem(text.trim().to_string())),
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| TemporalReason::HourOutOfRange(hour_text.to_string()))
}

/// Interprets a wall-clock value in `tz`. Ambiguous times take the earlier
/// offset; times inside a spring-forward gap move one hour ahead.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, TemporalReason> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(TemporalReason::NonexistentLocalTime)
}

pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}
