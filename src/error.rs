use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read region config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse region config {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("region config declares no regions")]
    NoRegions,

    #[error("region #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("region {0} is declared more than once")]
    DuplicateRegion(String),

    #[error("region {region} uses unknown timezone {timezone:?}")]
    UnknownTimezone { region: String, timezone: String },

    #[error("region {region} has unsupported source locator {locator:?}: {reason}")]
    InvalidLocator {
        region: String,
        locator: String,
        reason: String,
    },

    #[error("fetch.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid fetch header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("no region matches {0:?}")]
    NoMatchingRegion(String),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
#[error("fetch failed for region {region}: {cause}")]
pub struct FetchError {
    pub region: String,
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(region: impl Into<String>, cause: FetchCause) -> Self {
        Self {
            region: region.into(),
            cause,
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchCause {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("payload is empty")]
    EmptyPayload,

    #[error("payload is not a csv table: {0}")]
    Malformed(String),

    #[error("timed out before the run deadline")]
    Timeout,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemporalReason {
    #[error("date text is empty")]
    EmptyDate,
    #[error("time text is empty")]
    EmptyTime,
    #[error("date text has no weekday separator ':'")]
    MissingColon,
    #[error("unknown month {0:?}")]
    UnknownMonth(String),
    #[error("invalid day {0:?}")]
    InvalidDay(String),
    #[error("hour {0:?} is not between 1 and 12")]
    HourOutOfRange(String),
    #[error("minute {0:?} is not two digits")]
    InvalidMinute(String),
    #[error("time {0:?} has no am/pm suffix")]
    MissingMeridiem(String),
    #[error("local time does not exist in the region timezone")]
    NonexistentLocalTime,
    #[error("end time precedes start time")]
    EndBeforeStart,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot resolve {date_text:?} at {time_text:?}: {reason}")]
pub struct TemporalParseError {
    pub date_text: String,
    pub time_text: String,
    pub reason: TemporalReason,
}

impl TemporalParseError {
    pub fn new(date_text: &str, time_text: &str, reason: TemporalReason) -> Self {
        Self {
            date_text: date_text.to_string(),
            time_text: time_text.to_string(),
            reason,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowErrorReason {
    #[error("row has {found} cells, expected at least {expected}")]
    MissingFields { found: usize, expected: usize },
    #[error(transparent)]
    Temporal(#[from] TemporalParseError),
    #[error("row lists no genres")]
    NoGenres,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("region {region} row {row_index}: {reason}")]
pub struct RowError {
    pub region: String,
    pub row_index: usize,
    pub reason: RowErrorReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Parse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => f.write_str("fetch"),
            Stage::Parse => f.write_str("parse"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionError {
    pub region_id: String,
    pub stage: Stage,
    pub message: String,
}

impl From<FetchError> for RegionError {
    fn from(err: FetchError) -> Self {
        Self {
            message: err.cause.to_string(),
            region_id: err.region,
            stage: Stage::Fetch,
        }
    }
}
