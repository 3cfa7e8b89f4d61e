//! The station list.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use tracing::info;

use super::{InputError, Location, numbered_lines, open_required};
use crate::domain::Station;

/// The set of valid station identifiers.
///
/// Every station named by any other input is resolved through the
/// catalog, so all `Station` values in a run share their name storage.
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    stations: HashSet<Station>,
}

impl StationCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from station names.
    ///
    /// ```
    /// use longest_route::timetable::StationCatalog;
    ///
    /// let catalog = StationCatalog::from_names(["gouda", "utrecht"]).unwrap();
    /// assert!(catalog.contains("gouda"));
    /// assert!(!catalog.contains("delft"));
    /// ```
    pub fn from_names<'a>(
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, crate::domain::InvalidStation> {
        let mut catalog = Self::new();
        for name in names {
            catalog.insert(Station::parse(name)?);
        }
        Ok(catalog)
    }

    /// Read newline-delimited station identifiers. Blank lines are skipped.
    pub fn parse<R: BufRead>(reader: R, name: &str) -> Result<Self, InputError> {
        let mut catalog = Self::new();

        for line in numbered_lines(reader, name) {
            let (line_no, line) = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let station = Station::parse(trimmed).map_err(|_| {
                InputError::malformed(Location::new(name, line_no), "invalid station name", &line)
            })?;
            catalog.insert(station);
        }

        Ok(catalog)
    }

    /// Load the station list from a file. The file is required.
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let reader = open_required(path)?;
        let catalog = Self::parse(reader, &path.display().to_string())?;
        info!(stations = catalog.len(), path = %path.display(), "Loaded station list");
        Ok(catalog)
    }

    pub fn insert(&mut self, station: Station) {
        self.stations.insert(station);
    }

    /// Look up a station by name.
    pub fn get(&self, name: &str) -> Option<&Station> {
        self.stations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stations.contains(name)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
