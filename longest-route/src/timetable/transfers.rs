//! Minimum transfer times between two specific consecutive tracks.
//!
//! Each line of the transfers file reads
//!
//! ```text
//! 00:05 amsterdamcentraal utrechtcentraal utrechtcentraal arnhem [HH:MM]
//! ```
//!
//! meaning: after riding the first track, at least five minutes must pass
//! before departing on the second. The optional trailing time restricts the
//! rule to arrivals at that exact time.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use chrono::Duration;
use tracing::info;

use super::{InputError, Location, StationCatalog, numbered_lines, open_optional, resolve_station};
use crate::domain::{Clock, Track, parse_span_hhmm};

/// The exact two-track sequence a transfer rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferKey {
    pub incoming: Track,
    pub outgoing: Track,
    /// Arrival time the rule is limited to, if any.
    pub at: Option<Clock>,
}

/// Minimum dwell times keyed by two-track sequence.
#[derive(Debug, Clone, Default)]
pub struct TransferRuleSet {
    rules: HashMap<TransferKey, Duration>,
}

impl TransferRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a rule.
    pub fn insert(&mut self, key: TransferKey, min_wait: Duration) {
        self.rules.insert(key, min_wait);
    }

    /// Parse a transfers file. Later lines override earlier ones for the same key.
    pub fn parse<R: BufRead>(
        reader: R,
        name: &str,
        stations: &StationCatalog,
    ) -> Result<Self, InputError> {
        let mut rules = Self::new();

        for line in numbered_lines(reader, name) {
            let (line_no, line) = line?;
            let at = || Location::new(name, line_no);
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() || fields[0].starts_with('#') {
                continue;
            }
            if fields.len() < 5 || fields.len() > 6 {
                return Err(InputError::malformed(at(), "unexpected line in transfers file", &line));
            }

            let min_wait =
                parse_span_hhmm(fields[0]).map_err(|source| InputError::Time { at: at(), source })?;
            let mut resolved = Vec::with_capacity(4);
            for station in &fields[1..5] {
                resolved.push(resolve_station(stations, station, at)?);
            }
            let when = fields
                .get(5)
                .map(|t| Clock::parse_hhmm(t))
                .transpose()
                .map_err(|source| InputError::Time { at: at(), source })?;

            let [s1, s2, s3, s4]: [_; 4] = resolved
                .try_into()
                .map_err(|_| InputError::malformed(at(), "unexpected line in transfers file", &line))?;
            rules.insert(
                TransferKey {
                    incoming: Track::new(s1, s2),
                    outgoing: Track::new(s3, s4),
                    at: when,
                },
                min_wait,
            );
        }

        Ok(rules)
    }

    /// Load the transfers file. A missing file means no rules.
    pub fn load(path: &Path, stations: &StationCatalog) -> Result<Self, InputError> {
        let Some(reader) = open_optional(path)? else {
            info!(path = %path.display(), "No transfer rules file, using none");
            return Ok(Self::new());
        };
        let rules = Self::parse(reader, &path.display().to_string(), stations)?;
        info!(rules = rules.len(), path = %path.display(), "Loaded transfer rules");
        Ok(rules)
    }

    /// The minimum wait named for a track sequence, optionally at a given time.
    pub fn required_wait(
        &self,
        incoming: &Track,
        outgoing: &Track,
        at: Option<Clock>,
    ) -> Option<Duration> {
        // Keys own their tracks, so the lookup key has to be built.
        let key = TransferKey {
            incoming: incoming.clone(),
            outgoing: outgoing.clone(),
            at,
        };
        self.rules.get(&key).copied()
    }

    /// Whether waiting `wait` after arriving at `arrival` satisfies both the
    /// general rule and the time-specific rule for this sequence.
    pub fn permits(&self, incoming: &Track, outgoing: &Track, arrival: Clock, wait: Duration) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        [None, Some(arrival)]
            .into_iter()
            .filter_map(|at| self.required_wait(incoming, outgoing, at))
            .all(|required| wait >= required)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Station;

    fn stations() -> StationCatalog {
        StationCatalog::from_names(["A", "B", "C"]).unwrap()
    }

    fn track(a: &str, b: &str) -> Track {
        Track::new(Station::parse(a).unwrap(), Station::parse(b).unwrap())
    }

    fn clock(s: &str) -> Clock {
        Clock::parse_hhmm(s).unwrap()
    }

    #[test]
    fn parse_general_and_timed_rules() {
        let input = "00:15 A B B C\n00:20 A B B C 08:30\n";
        let rules = TransferRuleSet::parse(input.as_bytes(), "transfers", &stations()).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules.required_wait(&track("A", "B"), &track("B", "C"), None),
            Some(Duration::minutes(15))
        );
        assert_eq!(
            rules.required_wait(&track("A", "B"), &track("B", "C"), Some(clock("08:30"))),
            Some(Duration::minutes(20))
        );
        assert_eq!(rules.required_wait(&track("B", "C"), &track("C", "A"), None), None);
    }

    #[test]
    fn permits_checks_both_rules() {
        let input = "00:15 A B B C\n00:20 A B B C 08:30\n";
        let rules = TransferRuleSet::parse(input.as_bytes(), "transfers", &stations()).unwrap();
        let (ab, bc) = (track("A", "B"), track("B", "C"));

        assert!(!rules.permits(&ab, &bc, clock("08:00"), Duration::minutes(10)));
        assert!(rules.permits(&ab, &bc, clock("08:00"), Duration::minutes(15)));
        // The timed rule only applies at 08:30.
        assert!(!rules.permits(&ab, &bc, clock("08:30"), Duration::minutes(15)));
        assert!(rules.permits(&ab, &bc, clock("08:30"), Duration::minutes(20)));
        // Unrelated sequences are unconstrained.
        assert!(rules.permits(&bc, &ab, clock("08:30"), Duration::zero()));
    }

    #[test]
    fn unknown_station_is_fatal() {
        let err = TransferRuleSet::parse("00:05 A B B X\n".as_bytes(), "transfers", &stations())
            .unwrap_err();
        assert_eq!(err.to_string(), "transfers:1: unknown station X");
    }

    #[test]
    fn short_line_is_fatal() {
        assert!(TransferRuleSet::parse("00:05 A B B\n".as_bytes(), "transfers", &stations()).is_err());
    }

    #[test]
    fn missing_file_is_empty() {
        let rules = TransferRuleSet::load(Path::new("/nonexistent/transfers"), &stations()).unwrap();
        assert!(rules.is_empty());
    }
}
