use crate::model::EventCollection;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CityCounts {
    pub all: BTreeMap<String, usize>,
    pub by_region: BTreeMap<String, BTreeMap<String, usize>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub events: usize,
    pub genres: BTreeMap<String, usize>,
    pub cities: CityCounts,
    pub minimum_ages: BTreeMap<u8, usize>,
}

pub fn summarize(collection: &EventCollection) -> Summary {
    Summary {
        events: collection.total_events(),
        genres: genre_counts(collection),
        cities: city_counts(collection),
        minimum_ages: age_counts(collection),
    }
}

pub fn genre_counts(collection: &EventCollection) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (_, events) in collection.iter() {
        for genre in events.iter().flat_map(|e| &e.genres) {
            *counts.entry(genre.clone()).or_insert(0) += 1;
        }
    }
    counts
}

// Listings with no age text are not counted.
pub fn age_counts(collection: &EventCollection) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for (_, events) in collection.iter() {
        for age in events.iter().filter_map(|e| e.minimum_age()) {
            *counts.entry(age).or_insert(0) += 1;
        }
    }
    counts
}

pub fn city_counts(collection: &EventCollection) -> CityCounts {
    let mut counts = CityCounts::default();
    for (region_id, events) in collection.iter() {
        let region = counts.by_region.entry(region_id.to_string()).or_default();
        for city in events.iter().filter_map(|e| e.location.city.as_deref()) {
            *region.entry(city.to_string()).or_insert(0) += 1;
            *counts.all.entry(city.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Event, Location};
    use chrono::{TimeZone, Utc};

    fn event(genres: &[&str], city: Option<&str>) -> Event {
        Event {
            timestamp_start: Utc.with_ymd_and_hms(2024, 8, 10, 4, 0, 0).unwrap(),
            timestamp_end: None,
            name: "Show".to_string(),
            genres: genres.iter().map(ToString::to_string).collect(),
            location: Location {
                venue: "Venue".to_string(),
                city: city.map(ToString::to_string),
                state: None,
            },
            price: String::new(),
            age: String::new(),
            organizer: String::new(),
            ticket_link: None,
            event_link: None,
        }
    }

    fn collection() -> EventCollection {
        let mut collection = EventCollection::default();
        collection.insert(
            "BayArea",
            vec![
                event(&["house", "techno"], Some("Oakland")),
                event(&["techno"], Some("San Francisco")),
                event(&["dubstep"], None),
            ],
        );
        let mut seattle = event(&["techno"], Some("Oakland"));
        seattle.age = "21+".to_string();
        collection.insert("Seattle", vec![seattle]);
        collection.insert("Texas", Vec::new());
        collection
    }

    #[test]
    fn genres_are_counted_across_regions() {
        let genres = genre_counts(&collection());
        assert_eq!(genres.get("techno"), Some(&3));
        assert_eq!(genres.get("house"), Some(&1));
        assert_eq!(genres.get("dubstep"), Some(&1));
        assert_eq!(genres.len(), 3);
    }

    #[test]
    fn cities_are_counted_overall_and_per_region() {
        let cities = city_counts(&collection());
        assert_eq!(cities.all.get("Oakland"), Some(&2));
        assert_eq!(cities.all.get("San Francisco"), Some(&1));
        assert_eq!(cities.by_region["BayArea"].len(), 2);
        assert_eq!(cities.by_region["Seattle"].get("Oakland"), Some(&1));
        assert!(cities.by_region["Texas"].is_empty());
    }

    #[test]
    fn summary_totals_events() {
        assert_eq!(summarize(&collection()).events, 4);
    }

    #[test]
    fn ages_are_bucketed_by_minimum() {
        let mut collection = collection();
        let mut events = vec![event(&["house"], None), event(&["house"], None)];
        events[0].age = "18+".to_string();
        events[1].age = "All Ages".to_string();
        collection.insert("Texas", events);

        let ages = age_counts(&collection);
        assert_eq!(ages, BTreeMap::from([(0, 1), (18, 1), (21, 1)]));
    }
}
