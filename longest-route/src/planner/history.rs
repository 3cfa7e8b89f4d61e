//! Resuming a search from a previously printed route.
//!
//! The history file is the route output of an earlier run:
//! `departure arrival wait distance gap speed origin destination`, one step
//! per line. Trailing numeric annotations are allowed and ignored.

use std::io::BufRead;
use std::path::Path;

use tracing::info;

use super::route::{RouteStep, SearchState};
use crate::domain::{Clock, parse_span_hhmm};
use crate::timetable::{
    InputError, Location, StationCatalog, numbered_lines, open_required, resolve_station,
};

/// Fields a step line needs once trailing annotations are removed.
const STEP_FIELDS: usize = 8;

/// Parse a history file into a search state.
///
/// Every step's track is marked travelled in both directions and the
/// distances are summed as printed.
pub fn parse<R: BufRead>(
    reader: R,
    name: &str,
    stations: &StationCatalog,
) -> Result<SearchState, InputError> {
    let mut state = SearchState::new();

    for line in numbered_lines(reader, name) {
        let (line_no, line) = line?;
        let at = || Location::new(name, line_no);
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let mut fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < STEP_FIELDS {
            return Err(InputError::malformed(at(), "unexpected line in history", &line));
        }
        while fields.last().is_some_and(|f| is_annotation(f)) {
            fields.pop();
        }
        if fields.len() < STEP_FIELDS {
            return Err(InputError::malformed(at(), "missing stations in history", &line));
        }

        let time = |s: &str| {
            Clock::parse_hhmm(s).map_err(|source| InputError::Time { at: at(), source })
        };
        let number = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| InputError::malformed(at(), "invalid number in history", &line))
        };

        let departure = time(fields[0])?;
        let arrival = time(fields[1])?;
        let wait =
            parse_span_hhmm(fields[2]).map_err(|source| InputError::Time { at: at(), source })?;
        let distance = number(fields[3])?;
        let gap = number(fields[4])?;
        let speed = number(fields[5])?;
        let origin = resolve_station(stations, fields[fields.len() - 2], at)?;
        let destination = resolve_station(stations, fields[fields.len() - 1], at)?;

        if state.route.last().is_some_and(|last| arrival <= last.arrival) {
            return Err(InputError::malformed(at(), "arrival not after previous step", &line));
        }

        let step = RouteStep {
            origin,
            destination,
            departure,
            arrival,
            wait,
            distance,
            speed,
            gap,
        };
        state.travelled.claim(&step.track());
        state.distance += distance;
        state.route.push(step);
    }

    Ok(state)
}

/// Load a history file. The file must exist.
pub fn load(path: &Path, stations: &StationCatalog) -> Result<SearchState, InputError> {
    let reader = open_required(path)?;
    let state = parse(reader, &path.display().to_string(), stations)?;
    info!(
        steps = state.route.len(),
        distance = state.distance,
        path = %path.display(),
        "Loaded history"
    );
    Ok(state)
}

/// A trailing token such as a step number. Station names never start with a digit.
fn is_annotation(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit())
}
