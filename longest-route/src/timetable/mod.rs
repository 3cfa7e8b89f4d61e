//! Timetable inputs: stations, trips, transfer rules and partner tracks.
//!
//! Every loader reads a whitespace-separated text format line by line,
//! resolves station names against the [`StationCatalog`] and fails on the
//! first bad record. Loaders take any `BufRead` so they can be fed from
//! files, stdin or test strings; the `load` helpers open files and treat
//! optional files that do not exist as empty.

mod error;
mod partners;
mod stations;
mod transfers;
mod trips;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub use error::{InputError, Location};
pub use partners::{Partner, PartnerRuleSet};
pub use stations::StationCatalog;
pub use transfers::{TransferKey, TransferRuleSet};
pub use trips::TripCatalog;

/// Open a file that must exist.
pub(crate) fn open_required(path: &Path) -> Result<BufReader<File>, InputError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Open a file that may be absent. Absence is `Ok(None)`.
pub(crate) fn open_optional(path: &Path) -> Result<Option<BufReader<File>>, InputError> {
    match File::open(path) {
        Ok(file) => Ok(Some(BufReader::new(file))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(InputError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Iterate over the lines of a reader with 1-based line numbers.
pub(crate) fn numbered_lines<R: BufRead>(
    reader: R,
    name: &str,
) -> impl Iterator<Item = Result<(usize, String), InputError>> {
    reader.lines().enumerate().map(move |(idx, line)| {
        line.map(|l| (idx + 1, l)).map_err(|source| InputError::Read {
            name: name.to_string(),
            source,
        })
    })
}

/// Resolve a station name, reporting the location on failure.
pub(crate) fn resolve_station(
    catalog: &StationCatalog,
    name: &str,
    at: impl FnOnce() -> Location,
) -> Result<crate::domain::Station, InputError> {
    catalog
        .get(name)
        .cloned()
        .ok_or_else(|| InputError::UnknownStation {
            at: at(),
            station: name.to_string(),
        })
}
