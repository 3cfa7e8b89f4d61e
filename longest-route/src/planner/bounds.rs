//! Best-distance bound table.
//!
//! For every route origin and start time seen, records the longest
//! distance any route has covered by each minute of the day. The search
//! prunes a branch when it falls too far below this table, and the table is
//! saved between runs so later searches start with tight bounds.
//!
//! The file holds one `origin start elapsed distance` row per minute from
//! 00:00 to 25:00 for every origin/start pair.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::BufRead;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{Clock, Station};
use crate::timetable::{InputError, Location, StationCatalog, numbered_lines, open_optional, resolve_station};

/// Last minute covered by the table.
pub const BOUND_HORIZON: Clock = Clock::from_minutes(25 * 60);

const SLOTS: usize = BOUND_HORIZON.minutes() as usize + 1;

/// Per-minute best distances for one origin/start pair.
type Slots = Vec<Option<f64>>;

/// Persisted best-achievable distance by elapsed arrival time.
#[derive(Debug, Clone, Default)]
pub struct BoundTable {
    routes: BTreeMap<(Station, Clock), Slots>,
}

impl BoundTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best distance recorded for routes from `origin` starting at `start`
    /// that arrive by `arrival`, if any.
    pub fn best(&self, origin: &Station, start: Clock, arrival: Clock) -> Option<f64> {
        // Lookup key needs an owned station; the table is keyed per route prefix.
        self.routes
            .get(&(origin.clone(), start))
            .and_then(|slots| slots.get(arrival.minutes() as usize).copied().flatten())
    }

    /// Record that a route from `origin` starting at `start` covered
    /// `distance` by `arrival`.
    ///
    /// When this improves the slot, every later slot that is missing or not
    /// larger is raised to `distance` too, stopping at the first larger one,
    /// so values never decrease over the day. Returns whether the slot
    /// improved. Arrivals past [`BOUND_HORIZON`] are ignored.
    pub fn record(&mut self, origin: &Station, start: Clock, arrival: Clock, distance: f64) -> bool {
        let slot = arrival.minutes() as usize;
        if slot >= SLOTS {
            return false;
        }

        let slots = self
            .routes
            .entry((origin.clone(), start))
            .or_insert_with(|| vec![None; SLOTS]);
        if slots[slot].is_some_and(|best| best >= distance) {
            return false;
        }

        slots[slot] = Some(distance);
        for later in &mut slots[slot + 1..] {
            match later {
                Some(best) if *best > distance => break,
                _ => *later = Some(distance),
            }
        }
        true
    }

    /// Number of origin/start pairs in the table.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Parse a bound table file.
    ///
    /// Returns an empty table when the file is in the older three-column
    /// format, which cannot be mapped onto start times.
    pub fn parse<R: BufRead>(
        reader: R,
        name: &str,
        stations: &StationCatalog,
    ) -> Result<Self, InputError> {
        let mut table = Self::new();

        for line in numbered_lines(reader, name) {
            let (line_no, line) = line?;
            let at = || Location::new(name, line_no);
            if line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.len() {
                0 => continue,
                3 => {
                    warn!(source = name, "Bound table is in the old format, discarding it");
                    return Ok(Self::new());
                }
                4 => {}
                _ => return Err(InputError::malformed(at(), "unexpected line in bound table", &line)),
            }

            let origin = resolve_station(stations, fields[0], at)?;
            let start =
                Clock::parse_hhmm(fields[1]).map_err(|source| InputError::Time { at: at(), source })?;
            let elapsed =
                Clock::parse_hhmm(fields[2]).map_err(|source| InputError::Time { at: at(), source })?;
            let distance = fields[3]
                .parse::<f64>()
                .map_err(|_| InputError::malformed(at(), "invalid distance in bound table", &line))?;

            table.load_slot(origin, start, elapsed, distance);
        }

        Ok(table)
    }

    /// Store a value read from disk as is; negative or non-finite values
    /// count as zero.
    fn load_slot(&mut self, origin: Station, start: Clock, elapsed: Clock, distance: f64) {
        let slot = elapsed.minutes() as usize;
        if slot >= SLOTS {
            return;
        }
        let distance = if distance.is_finite() && distance > 0.0 {
            distance
        } else {
            0.0
        };
        let slots = self
            .routes
            .entry((origin, start))
            .or_insert_with(|| vec![None; SLOTS]);
        slots[slot] = Some(distance);
    }

    /// Load the bound table. A missing file gives an empty table.
    pub fn load(path: &Path, stations: &StationCatalog) -> Result<Self, InputError> {
        let Some(reader) = open_optional(path)? else {
            info!(path = %path.display(), "No bound table yet, starting empty");
            return Ok(Self::new());
        };
        let table = Self::parse(reader, &path.display().to_string(), stations)?;
        info!(routes = table.len(), path = %path.display(), "Loaded bound table");
        Ok(table)
    }

    /// Render every slot of every origin/start pair, carrying the last
    /// best distance forward over gaps and dips.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for ((origin, start), slots) in &self.routes {
            let mut last = 0.0_f64;
            for (minute, value) in slots.iter().enumerate() {
                if let Some(v) = value
                    && *v > last
                {
                    last = *v;
                }
                let elapsed = Clock::from_minutes(minute as u32);
                // Writing to a String cannot fail.
                let _ = writeln!(out, "{origin} {start} {elapsed} {last}");
            }
        }
        out
    }

    /// Write the table to `path`, replacing any previous file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.render())?;
        std::fs::rename(&tmp, path)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Recorded values never decrease over the day.
        #[test]
        fn non_decreasing_in_elapsed_time(
            records in prop::collection::vec((0u32..1500, 0.0f64..500.0), 1..40),
        ) {
            let origin = Station::parse("A").unwrap();
            let start = Clock::from_minutes(360);
            let mut table = BoundTable::new();
            for (arrival, distance) in records {
                table.record(&origin, start, Clock::from_minutes(arrival), distance);
            }

            let mut last = f64::NEG_INFINITY;
            for minute in 0..SLOTS as u32 {
                if let Some(v) = table.best(&origin, start, Clock::from_minutes(minute)) {
                    prop_assert!(v >= last, "slot {} dropped from {} to {}", minute, last, v);
                    last = v;
                }
            }
        }

        /// A recorded distance is available at its arrival and every later minute.
        #[test]
        fn record_is_visible_later(arrival in 0u32..1500, distance in 0.0f64..500.0) {
            let origin = Station::parse("A").unwrap();
            let start = Clock::from_minutes(0);
            let mut table = BoundTable::new();
            table.record(&origin, start, Clock::from_minutes(arrival), distance);

            for minute in arrival..SLOTS as u32 {
                let best = table.best(&origin, start, Clock::from_minutes(minute));
                prop_assert!(best.is_some_and(|b| b >= distance));
            }
        }
    }
}
