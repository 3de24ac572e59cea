use crate::model::Location;

const STATES: &[(&str, &str)] = &[
    ("AK", "Alaska"),
    ("AL", "Alabama"),
    ("AR", "Arkansas"),
    ("AS", "American Samoa"),
    ("AZ", "Arizona"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DC", "District of Columbia"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("GU", "Guam"),
    ("HI", "Hawaii"),
    ("IA", "Iowa"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("MA", "Massachusetts"),
    ("MD", "Maryland"),
    ("ME", "Maine"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MO", "Missouri"),
    ("MP", "Northern Mariana Islands"),
    ("MS", "Mississippi"),
    ("MT", "Montana"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("NE", "Nebraska"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NV", "Nevada"),
    ("NY", "New York"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VA", "Virginia"),
    ("VI", "Virgin Islands"),
    ("VT", "Vermont"),
    ("WA", "Washington"),
    ("WI", "Wisconsin"),
    ("WV", "West Virginia"),
    ("WY", "Wyoming"),
    ("AB", "Alberta"),
    ("BC", "British Columbia"),
    ("MB", "Manitoba"),
    ("NB", "New Brunswick"),
    ("NL", "Newfoundland and Labrador"),
    ("NT", "Northwest Territories"),
    ("NS", "Nova Scotia"),
    ("NU", "Nunavut"),
    ("ON", "Ontario"),
    ("PE", "Prince Edward Island"),
    ("QC", "Quebec"),
    ("SK", "Saskatchewan"),
    ("YT", "Yukon"),
];

pub fn state_name(token: &str) -> Option<&'static str> {
    let token = token.trim().trim_end_matches('.');
    STATES
        .iter()
        .find(|(abbr, name)| abbr.eq_ignore_ascii_case(token) || name.eq_ignore_ascii_case(token))
        .map(|(_, name)| *name)
}

pub fn parse_location(text: &str) -> Location {
    let text = text.trim();

    if let Some(location) = parse_parenthesized(text) {
        return location;
    }
    if let Some(location) = parse_comma_separated(text) {
        return location;
    }

    Location {
        venue: text.to_string(),
        city: None,
        state: None,
    }
}

fn parse_parenthesized(text: &str) -> Option<Location> {
    let open = text.find('(')?;
    let close = open + text[open..].find(')')?;
    let venue = text[..open].trim();
    let inner = &text[open + 1..close];

    let parts: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let (city, state) = match parts.as_slice() {
        [] => (None, None),
        [city] => (Some(*city), None),
        [.., city, state] => (Some(*city), Some(expand_state(state))),
    };

    Some(Location {
        venue: venue.to_string(),
        city: city.map(ToString::to_string),
        state,
    })
}

fn parse_comma_separated(text: &str) -> Option<Location> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [venue @ .., city, state] = parts.as_slice() else {
        return None;
    };
    if venue.is_empty() || city.is_empty() {
        return None;
    }
    let state = state_name(state)?;

    Some(Location {
        venue: venue.join(", "),
        city: Some(city.to_string()),
        state: Some(state.to_string()),
    })
}

fn expand_state(token: &str) -> String {
    state_name(token)
        .map(ToString::to_string)
        .unwrap_or_else(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(venue: &str, city: Option<&str>, state: Option<&str>) -> Location {
        Location {
            venue: venue.to_string(),
            city: city.map(ToString::to_string),
            state: state.map(ToString::to_string),
        }
    }

    #[test]
    fn venue_with_parenthesized_city() {
        assert_eq!(
            parse_location("Belmont Veterans Memorial Pier (Long Beach/Los Angeles)"),
            loc(
                "Belmont Veterans Memorial Pier",
                Some("Long Beach/Los Angeles"),
                None
            )
        );
    }

    #[test]
    fn parenthesized_city_and_state_abbreviation() {
        assert_eq!(
            parse_location("The Midway (San Francisco, CA)"),
            loc("The Midway", Some("San Francisco"), Some("California"))
        );
        assert_eq!(
            parse_location("Bar (Portland, OR)"),
            loc("Bar", Some("Portland"), Some("Oregon"))
        );
    }

    #[test]
    fn three_part_parenthesized_drops_the_neighborhood() {
        assert_eq!(
            parse_location("Warehouse (SoMa, San Francisco, CA)"),
            loc("Warehouse", Some("San Francisco"), Some("California"))
        );
    }

    #[test]
    fn unknown_state_token_is_kept_verbatim() {
        assert_eq!(
            parse_location("Club (Tijuana, BCN)"),
            loc("Club", Some("Tijuana"), Some("BCN"))
        );
    }

    #[test]
    fn comma_separated_with_recognizable_state() {
        assert_eq!(
            parse_location("Stereo Live, Houston, TX"),
            loc("Stereo Live", Some("Houston"), Some("Texas"))
        );
        assert_eq!(
            parse_location("Hall, Room B, Austin, Texas"),
            loc("Hall, Room B", Some("Austin"), Some("Texas"))
        );
    }

    #[test]
    fn unstructured_text_passes_through_as_venue() {
        assert_eq!(
            parse_location("  Secret location TBA  "),
            loc("Secret location TBA", None, None)
        );
        assert_eq!(
            parse_location("123 Main St, Suite 4, Downtown"),
            loc("123 Main St, Suite 4, Downtown", None, None)
        );
        assert_eq!(parse_location(""), loc("", None, None));
    }

    #[test]
    fn state_lookup_accepts_abbreviations_and_names() {
        assert_eq!(state_name("wa"), Some("Washington"));
        assert_eq!(state_name("British Columbia"), Some("British Columbia"));
        assert_eq!(state_name("XX"), None);
    }
}
