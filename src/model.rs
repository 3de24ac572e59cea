use crate::error::RegionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub venue: String,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub timestamp_start: DateTime<Utc>,
    pub timestamp_end: Option<DateTime<Utc>>,
    pub name: String,
    pub genres: Vec<String>,
    pub location: Location,
    pub price: String,
    pub age: String,
    pub organizer: String,
    pub ticket_link: Option<String>,
    pub event_link: Option<String>,
}

impl Event {
    pub fn minimum_age(&self) -> Option<u8> {
        let age = self.age.trim();
        if age.is_empty() {
            None
        } else if age.contains("21") {
            Some(21)
        } else if age.contains("18") {
            Some(18)
        } else {
            Some(0)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EventCollection {
    regions: BTreeMap<String, Vec<Event>>,
}

impl EventCollection {
    pub fn insert(&mut self, region_id: impl Into<String>, events: Vec<Event>) {
        self.regions.insert(region_id.into(), events);
    }

    pub fn get(&self, region_id: &str) -> Option<&[Event]> {
        self.regions.get(region_id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Event])> {
        self.regions
            .iter()
            .map(|(id, events)| (id.as_str(), events.as_slice()))
    }

    pub fn total_events(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RegionReport {
    pub region_id: String,
    pub rows: usize,
    pub parsed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub events: EventCollection,
    pub errors: Vec<RegionError>,
    pub reports: Vec<RegionReport>,
}
