//! The trip catalog: every scheduled leg of the timetable.
//!
//! The format groups legs by track. A header line
//!
//! ```text
//! # 39 amsterdamcentraal utrechtcentraal
//! ```
//!
//! gives the distance and the two stations, and is followed by records of
//! four whitespace-separated tokens: departure, arrival, number of
//! transfers and travel time. A record may be spread over several lines;
//! only the first two tokens are used.

use std::io::BufRead;

use tracing::info;

use super::{InputError, Location, StationCatalog, numbered_lines, resolve_station};
use crate::domain::{Clock, Leg, Station};

/// Tokens per schedule record.
const RECORD_TOKENS: usize = 4;

/// The header currently in force while reading schedule records.
struct TrackHeader {
    origin: Station,
    destination: Station,
    distance: f64,
}

/// All legs of the timetable, in input order.
#[derive(Debug, Clone, Default)]
pub struct TripCatalog {
    legs: Vec<Leg>,
}

impl TripCatalog {
    pub fn new(legs: Vec<Leg>) -> Self {
        Self { legs }
    }

    /// Parse a trip catalog, validating stations and times.
    ///
    /// ```
    /// use longest_route::timetable::{StationCatalog, TripCatalog};
    ///
    /// let stations = StationCatalog::from_names(["A", "B"]).unwrap();
    /// let input = "# 10 A B\n08:00\n08:30\n0\n0:30\n09:00 09:30 0 0:30\n";
    /// let trips = TripCatalog::parse(input.as_bytes(), "stdin", &stations).unwrap();
    /// assert_eq!(trips.len(), 2);
    /// ```
    pub fn parse<R: BufRead>(
        reader: R,
        name: &str,
        stations: &StationCatalog,
    ) -> Result<Self, InputError> {
        let mut legs = Vec::new();
        let mut header: Option<TrackHeader> = None;
        let mut pending: Vec<String> = Vec::with_capacity(RECORD_TOKENS);
        let mut last_line = (0, String::new());

        for line in numbered_lines(reader, name) {
            let (line_no, line) = line?;
            let at = || Location::new(name, line_no);

            if line.starts_with('#') {
                if !pending.is_empty() {
                    return Err(InputError::malformed(at(), "incomplete schedule record", &line));
                }
                header = Some(parse_header(&line, stations, at)?);
                continue;
            }

            pending.extend(line.split_whitespace().map(str::to_string));
            if pending.len() > RECORD_TOKENS {
                return Err(InputError::malformed(
                    at(),
                    "unexpected schedule data (quantity)",
                    &line,
                ));
            }
            if pending.len() < RECORD_TOKENS {
                last_line = (line_no, line);
                continue;
            }

            let Some(track) = header.as_ref() else {
                return Err(InputError::malformed(at(), "schedule data before any header", &line));
            };
            let departure = Clock::parse_hhmm(&pending[0])
                .map_err(|source| InputError::Time { at: at(), source })?;
            let arrival = Clock::parse_hhmm(&pending[1])
                .map_err(|source| InputError::Time { at: at(), source })?;
            let leg = Leg::new(
                track.origin.clone(),
                track.destination.clone(),
                departure,
                arrival,
                track.distance,
            )
            .map_err(|source| InputError::Leg {
                at: at(),
                source,
                line: pending.join(" "),
            })?;

            legs.push(leg);
            pending.clear();
        }

        if !pending.is_empty() {
            let (line_no, line) = last_line;
            return Err(InputError::malformed(
                Location::new(name, line_no),
                "incomplete schedule record",
                &line,
            ));
        }

        Ok(Self { legs })
    }

    /// Parse a trip catalog and log a summary.
    pub fn read<R: BufRead>(
        reader: R,
        name: &str,
        stations: &StationCatalog,
    ) -> Result<Self, InputError> {
        let catalog = Self::parse(reader, name, stations)?;
        info!(legs = catalog.len(), source = name, "Loaded trip catalog");
        Ok(catalog)
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Leg> {
        self.legs.iter()
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

fn parse_header(
    line: &str,
    stations: &StationCatalog,
    at: impl Fn() -> Location,
) -> Result<TrackHeader, InputError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 || fields[0] != "#" {
        return Err(InputError::malformed(at(), "unexpected line in data file", line));
    }
    if !is_plain_number(fields[1]) {
        return Err(InputError::malformed(at(), "missing distance on line", line));
    }
    let distance = fields[1]
        .parse::<f64>()
        .map_err(|_| InputError::malformed(at(), "missing distance on line", line))?;

    let origin = resolve_station(stations, fields[2], &at)?;
    let destination = resolve_station(stations, fields[3], &at)?;

    Ok(TrackHeader {
        origin,
        destination,
        distance,
    })
}

/// Digits, optionally followed by a decimal point and more digits.
fn is_plain_number(s: &str) -> bool {
    let (whole, fraction) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && fraction.is_none_or(all_digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations() -> StationCatalog {
        StationCatalog::from_names(["A", "B", "C"]).unwrap()
    }

    fn parse(input: &str) -> Result<TripCatalog, InputError> {
        TripCatalog::parse(input.as_bytes(), "stdin", &stations())
    }

    #[test]
    fn parses_records_spread_over_lines() {
        let trips = parse("# 10 A B\n08:00\n08:30\n0\n0:30\n# 15.5 B C\n08:40 09:10\n0 0:30\n").unwrap();

        assert_eq!(trips.len(), 2);
        let first = &trips.legs()[0];
        assert_eq!(first.origin().as_str(), "A");
        assert_eq!(first.destination().as_str(), "B");
        assert_eq!(first.departure().to_string(), "08:00");
        assert_eq!(first.arrival().to_string(), "08:30");
        assert_eq!(first.distance(), 10.0);
        assert_eq!(trips.legs()[1].distance(), 15.5);
    }

    #[test]
    fn unknown_station_is_fatal() {
        let err = parse("# 10 A X\n").unwrap_err();
        assert_eq!(err.to_string(), "stdin:1: unknown station X");
    }

    #[test]
    fn non_numeric_distance_is_fatal() {
        let err = parse("# ten A B\n").unwrap_err();
        assert!(err.to_string().contains("missing distance"));
        assert!(parse("# -3 A B\n").is_err());
        assert!(parse("# 1e3 A B\n").is_err());
    }

    #[test]
    fn wrong_header_shape_is_fatal() {
        assert!(parse("# 10 A\n").is_err());
        assert!(parse("# 10 A B C\n").is_err());
    }

    #[test]
    fn too_many_tokens_is_fatal() {
        let err = parse("# 10 A B\n08:00 08:30 0\n0:30 extra\n").unwrap_err();
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn non_increasing_times_are_fatal() {
        let err = parse("# 10 A B\n08:30 08:30 0 0:00\n").unwrap_err();
        assert!(matches!(err, InputError::Leg { .. }));
        assert!(parse("# 10 A B\n09:00 08:30 0 0:00\n").is_err());
    }

    #[test]
    fn invalid_time_is_fatal() {
        let err = parse("# 10 A B\n8:00 08:30 0 0:30\n").unwrap_err();
        assert!(matches!(err, InputError::Time { .. }));
    }

    #[test]
    fn incomplete_record_is_fatal() {
        assert!(parse("# 10 A B\n08:00 08:30\n").is_err());
        assert!(parse("# 10 A B\n08:00 08:30\n# 5 B C\n").is_err());
    }

    #[test]
    fn record_before_header_is_fatal() {
        assert!(parse("08:00 08:30 0 0:30\n").is_err());
    }

    #[test]
    fn plain_numbers() {
        assert!(is_plain_number("39"));
        assert!(is_plain_number("39.5"));
        assert!(!is_plain_number("39."));
        assert!(!is_plain_number(".5"));
        assert!(!is_plain_number(""));
    }
}
