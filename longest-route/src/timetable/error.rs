//! Input loading error types.

use std::fmt;
use std::path::PathBuf;

use crate::domain::{DomainError, TimeError};

/// Where in an input source a problem was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source: String,
    pub line: usize,
}

impl Location {
    pub fn new(source: &str, line: usize) -> Self {
        Self {
            source: source.to_string(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// Errors that make an input file unusable.
///
/// All of these are fatal: a timetable with a bad record cannot be
/// indexed safely.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// A required file could not be opened or read
    #[error("cannot read file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading from an already-open stream failed
    #[error("read error in {name}: {source}")]
    Read {
        name: String,
        source: std::io::Error,
    },

    /// A line does not have the expected shape
    #[error("{at}: {message}: {line}")]
    Malformed {
        at: Location,
        message: &'static str,
        line: String,
    },

    /// A line names a station that is not in the station list
    #[error("{at}: unknown station {station}")]
    UnknownStation { at: Location, station: String },

    /// A time field could not be parsed
    #[error("{at}: {source}")]
    Time { at: Location, source: TimeError },

    /// A schedule record failed leg validation
    #[error("{at}: {source}: {line}")]
    Leg {
        at: Location,
        source: DomainError,
        line: String,
    },
}

impl InputError {
    pub(crate) fn malformed(at: Location, message: &'static str, line: &str) -> Self {
        Self::Malformed {
            at,
            message,
            line: line.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = InputError::malformed(Location::new("stdin", 3), "unexpected line", "# x");
        assert_eq!(err.to_string(), "stdin:3: unexpected line: # x");

        let err = InputError::UnknownStation {
            at: Location::new("transfers", 12),
            station: "atlantis".into(),
        };
        assert_eq!(err.to_string(), "transfers:12: unknown station atlantis");

        let err = InputError::Io {
            path: PathBuf::from("stations"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "cannot read file stations: gone");
    }
}
