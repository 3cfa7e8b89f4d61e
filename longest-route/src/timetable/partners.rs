//! Partner tracks: pairs of tracks that share physical rails.
//!
//! A partners line `s1 s2 s3 s4 overlap` declares that track `s1 s2` and
//! track `s3 s4` overlap for `overlap` distance units. Whichever of the two
//! is travelled second contributes its distance minus the overlap.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use tracing::info;

use super::{InputError, Location, StationCatalog, numbered_lines, open_optional, resolve_station};
use crate::domain::Track;

/// A track overlapping another, with the shared distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Partner {
    pub track: Track,
    pub overlap: f64,
}

/// Overlapping track pairs, indexed by track in every direction.
#[derive(Debug, Clone, Default)]
pub struct PartnerRuleSet {
    partners: HashMap<Track, Vec<Partner>>,
}

impl PartnerRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `x` and `y` overlap.
    ///
    /// The relation is stored both ways and for both directions of travel,
    /// so `reverse(x)` partners `reverse(y)` as well.
    pub fn add(&mut self, x: Track, y: Track, overlap: f64) {
        let (rx, ry) = (x.reverse(), y.reverse());
        self.push(x.clone(), y.clone(), overlap);
        self.push(rx.clone(), ry.clone(), overlap);
        self.push(y, x, overlap);
        self.push(ry, rx, overlap);
    }

    fn push(&mut self, track: Track, partner: Track, overlap: f64) {
        self.partners.entry(track).or_default().push(Partner {
            track: partner,
            overlap,
        });
    }

    /// Parse a partners file. `#` lines are comments.
    pub fn parse<R: BufRead>(
        reader: R,
        name: &str,
        stations: &StationCatalog,
    ) -> Result<Self, InputError> {
        let mut set = Self::new();

        for line in numbered_lines(reader, name) {
            let (line_no, line) = line?;
            let at = || Location::new(name, line_no);
            if line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 5 {
                return Err(InputError::malformed(at(), "unexpected line in partners file", &line));
            }

            let overlap = fields[4]
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite() && *d >= 0.0)
                .ok_or_else(|| InputError::malformed(at(), "invalid overlap distance", &line))?;
            let s1 = resolve_station(stations, fields[0], at)?;
            let s2 = resolve_station(stations, fields[1], at)?;
            let s3 = resolve_station(stations, fields[2], at)?;
            let s4 = resolve_station(stations, fields[3], at)?;

            set.add(Track::new(s1, s2), Track::new(s3, s4), overlap);
        }

        Ok(set)
    }

    /// Load the partners file. A missing file means no overlaps.
    pub fn load(path: &Path, stations: &StationCatalog) -> Result<Self, InputError> {
        let Some(reader) = open_optional(path)? else {
            info!(path = %path.display(), "No partners file, using none");
            return Ok(Self::new());
        };
        let set = Self::parse(reader, &path.display().to_string(), stations)?;
        info!(tracks = set.len(), path = %path.display(), "Loaded partner tracks");
        Ok(set)
    }

    /// The tracks overlapping `track` in its direction of travel.
    pub fn partners_of(&self, track: &Track) -> &[Partner] {
        self.partners
            .get(track)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of directed tracks that have at least one partner.
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Station;

    fn stations() -> StationCatalog {
        StationCatalog::from_names(["A", "B", "C", "D"]).unwrap()
    }

    fn track(a: &str, b: &str) -> Track {
        Track::new(Station::parse(a).unwrap(), Station::parse(b).unwrap())
    }

    #[test]
    fn relation_is_symmetric_in_both_directions() {
        let set = PartnerRuleSet::parse("A B C D 5\n".as_bytes(), "partners", &stations()).unwrap();

        assert_eq!(set.len(), 4);
        assert_eq!(
            set.partners_of(&track("A", "B")),
            &[Partner { track: track("C", "D"), overlap: 5.0 }]
        );
        assert_eq!(set.partners_of(&track("B", "A"))[0].track, track("D", "C"));
        assert_eq!(set.partners_of(&track("C", "D"))[0].track, track("A", "B"));
        assert_eq!(set.partners_of(&track("D", "C"))[0].track, track("B", "A"));
        assert!(set.partners_of(&track("A", "C")).is_empty());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let input = "# overlapping tracks\n\nA B C D 2.5\n";
        let set = PartnerRuleSet::parse(input.as_bytes(), "partners", &stations()).unwrap();
        assert_eq!(set.partners_of(&track("A", "B"))[0].overlap, 2.5);
    }

    #[test]
    fn malformed_lines_are_fatal() {
        assert!(PartnerRuleSet::parse("A B C D\n".as_bytes(), "partners", &stations()).is_err());
        assert!(PartnerRuleSet::parse("A B C D x\n".as_bytes(), "partners", &stations()).is_err());
        let err = PartnerRuleSet::parse("A B C E 1\n".as_bytes(), "partners", &stations()).unwrap_err();
        assert_eq!(err.to_string(), "partners:1: unknown station E");
    }

    #[test]
    fn missing_file_is_empty() {
        let set = PartnerRuleSet::load(Path::new("/nonexistent/partners"), &stations()).unwrap();
        assert!(set.is_empty());
    }
}
