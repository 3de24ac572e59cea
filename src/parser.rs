use crate::config::Region;
use crate::error::{RowError, RowErrorReason, TemporalParseError, TemporalReason};
use crate::fetch::RawRow;
use crate::location::parse_location;
use crate::model::{Event, Location};
use crate::temporal::{
    end_of_day, has_meridiem, localize, normalize_time_text, parse_time_text, resolve_date,
};
use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// Cells a row must carry: date through organizer. The two link cells may
/// be missing entirely.
pub const REQUIRED_FIELDS: usize = 8;

const DATE_INDEX: usize = 0;
const NAME_INDEX: usize = 1;
const GENRES_INDEX: usize = 2;
const LOCATION_INDEX: usize = 3;
const TIME_INDEX: usize = 4;
const PRICE_INDEX: usize = 5;
const AGE_INDEX: usize = 6;
const ORGANIZER_INDEX: usize = 7;
const TICKET_LINK_INDEX: usize = 8;
const EVENT_LINK_INDEX: usize = 9;

/// En-dash, never a plain hyphen.
const DATE_RANGE_SEPARATOR: char = '\u{2013}';
const TIME_RANGE_SEPARATOR: char = '-';

const OPEN_ENDS: &[&str] = &["", "late", "close", "?", "tbd", "tba"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEvent {
    pub date_text: String,
    pub time_text: String,
    pub name: String,
    pub genre_text: String,
    pub location_text: String,
    pub price_text: String,
    pub age_text: String,
    pub organizer: String,
    pub ticket_link: Option<String>,
    pub event_link: Option<String>,
}

impl DraftEvent {
    pub fn from_row(row: &RawRow) -> Result<Self, RowErrorReason> {
        if row.len() < REQUIRED_FIELDS {
            return Err(RowErrorReason::MissingFields {
                found: row.len(),
                expected: REQUIRED_FIELDS,
            });
        }

        let cell = |index| row.cell(index).unwrap_or_default().trim().to_string();

        Ok(Self {
            date_text: cell(DATE_INDEX),
            time_text: cell(TIME_INDEX),
            name: cell(NAME_INDEX),
            genre_text: cell(GENRES_INDEX),
            location_text: cell(LOCATION_INDEX),
            price_text: cell(PRICE_INDEX),
            age_text: cell(AGE_INDEX),
            organizer: cell(ORGANIZER_INDEX),
            ticket_link: link(row.cell(TICKET_LINK_INDEX)),
            event_link: link(row.cell(EVENT_LINK_INDEX)),
        })
    }

    pub fn into_event(
        self,
        region: &Region,
        reference: DateTime<Utc>,
    ) -> Result<Event, RowErrorReason> {
        let (timestamp_start, timestamp_end) =
            resolve_timestamps(&self.date_text, &self.time_text, region.timezone, reference)?;

        let genres = split_genres(&self.genre_text);
        if genres.is_empty() {
            return Err(RowErrorReason::NoGenres);
        }

        Ok(Event {
            timestamp_start,
            timestamp_end,
            name: self.name,
            genres,
            location: region_location(&self.location_text, region),
            price: self.price_text,
            age: self.age_text,
            organizer: self.organizer,
            ticket_link: self.ticket_link,
            event_link: self.event_link,
        })
    }
}

pub fn parse_row(
    row: &RawRow,
    region: &Region,
    row_index: usize,
    reference: DateTime<Utc>,
) -> Result<Event, RowError> {
    let fail = |reason| RowError {
        region: region.id.clone(),
        row_index,
        reason,
    };
    let draft = DraftEvent::from_row(row).map_err(fail)?;
    draft.into_event(region, reference).map_err(fail)
}

#[derive(Debug, Default)]
pub struct ParsedRows {
    pub events: Vec<Event>,
    pub errors: Vec<RowError>,
}

pub fn parse_rows(rows: &[RawRow], region: &Region, reference: DateTime<Utc>) -> ParsedRows {
    let mut parsed = ParsedRows::default();
    for (row_index, row) in rows.iter().enumerate() {
        match parse_row(row, region, row_index, reference) {
            Ok(event) => parsed.events.push(event),
            Err(err) => {
                debug!(region = %region.id, row = row_index, error = %err, "skipping row");
                parsed.errors.push(err);
            }
        }
    }
    parsed
}

// Listings that name no state fall under the region's display name.
fn region_location(text: &str, region: &Region) -> Location {
    let mut location = parse_location(text);
    if location.state.is_none() {
        location.state = Some(region.name.clone());
    }
    location
}

pub fn resolve_timestamps(
    date_text: &str,
    time_text: &str,
    tz: Tz,
    reference: DateTime<Utc>,
) -> Result<(DateTime<Utc>, Option<DateTime<Utc>>), TemporalParseError> {
    let err = |reason| TemporalParseError::new(date_text, time_text, reason);

    let (start_text, end_text) = split_time_range(time_text);
    let start_time = parse_time_text(&start_text).map_err(err)?;
    let end_time = end_text
        .as_deref()
        .map(parse_time_text)
        .transpose()
        .map_err(err)?;

    match date_text.split_once(DATE_RANGE_SEPARATOR) {
        None => {
            let date = resolve_date(date_text, tz, reference).map_err(err)?;
            let start = localize(date.and_time(start_time), tz).map_err(err)?;
            let end = end_time
                .map(|time| end_not_before(start, date, time, tz))
                .transpose()
                .map_err(err)?;
            Ok((start, end))
        }
        Some((first, last)) => {
            let start_date = resolve_date(first.trim(), tz, reference).map_err(err)?;
            let mut end_date = resolve_date(last.trim(), tz, reference).map_err(err)?;
            if end_date < start_date {
                end_date = end_date
                    .checked_add_months(Months::new(12))
                    .ok_or(TemporalReason::EndBeforeStart)
                    .map_err(err)?;
            }

            let start = localize(start_date.and_time(start_time), tz).map_err(err)?;
            let end = end_not_before(start, end_date, end_time.unwrap_or_else(end_of_day), tz)
                .map_err(err)?;
            Ok((start, Some(end)))
        }
    }
}

/// Places an end time on `date`, or the following day when it would
/// otherwise precede `start` (an overnight listing such as `10pm-2am`).
fn end_not_before(
    start: DateTime<Utc>,
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
) -> Result<DateTime<Utc>, TemporalReason> {
    let end = localize(date.and_time(time), tz)?;
    if end >= start {
        return Ok(end);
    }

    let next_day = date.succ_opt().ok_or(TemporalReason::EndBeforeStart)?;
    let end = localize(next_day.and_time(time), tz)?;
    if end >= start {
        Ok(end)
    } else {
        Err(TemporalReason::EndBeforeStart)
    }
}

/// Splits `"10pm-2am"` into its start and end. Weekday labels on either
/// side (`"Fri: 10pm-Sun: 4am"`) are dropped. An open end yields no end
/// time; a start without am/pm borrows one from the end (`"9-11pm"`), the
/// opposite one when the range crosses midnight or noon (`"10-2am"`).
pub fn split_time_range(time_text: &str) -> (String, Option<String>) {
    let normalized = normalize_time_text(time_text);
    let Some((start, end)) = normalized.split_once(TIME_RANGE_SEPARATOR) else {
        return (strip_weekday(&normalized).to_string(), None);
    };

    let mut start = strip_weekday(start).to_string();
    let end = strip_weekday(end);
    if OPEN_ENDS.contains(&end) {
        return (start, None);
    }

    if !has_meridiem(&start) && has_meridiem(end) {
        let suffix = borrowed_meridiem(&start, end);
        start.push_str(suffix);
    }

    (start, Some(end.to_string()))
}

fn strip_weekday(text: &str) -> &str {
    match text.split_once(':') {
        Some((label, rest))
            if !label.is_empty() && label.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            rest
        }
        _ => text,
    }
}

fn borrowed_meridiem(start: &str, end: &str) -> &'static str {
    let (same, other) = if end.ends_with("am") || end == "midnight" {
        ("am", "pm")
    } else {
        ("pm", "am")
    };

    match (parse_time_text(&format!("{start}{same}")), parse_time_text(end)) {
        (Ok(start_time), Ok(end_time)) if start_time > end_time => other,
        _ => same,
    }
}

pub fn split_genres(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn link(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
