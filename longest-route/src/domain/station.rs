//! Station identifiers.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Error returned when parsing an invalid station identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station identifier {input:?}: {reason}")]
pub struct InvalidStation {
    input: String,
    reason: &'static str,
}

/// An opaque station identifier such as `utrechtcentraal`.
///
/// Identifiers are single whitespace-free tokens, because every input
/// format separates fields with whitespace. The name is shared, so
/// cloning a `Station` is cheap.
///
/// # Examples
///
/// ```
/// use longest_route::domain::Station;
///
/// let ut = Station::parse("utrechtcentraal").unwrap();
/// assert_eq!(ut.as_str(), "utrechtcentraal");
///
/// assert!(Station::parse("").is_err());
/// assert!(Station::parse("den haag").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Station(Arc<str>);

impl Station {
    /// Parse a station identifier from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStation> {
        if s.is_empty() {
            return Err(InvalidStation {
                input: s.to_string(),
                reason: "must not be empty",
            });
        }

        if s.chars().any(char::is_whitespace) {
            return Err(InvalidStation {
                input: s.to_string(),
                reason: "must not contain whitespace",
            });
        }

        Ok(Station(Arc::from(s)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Station {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station({})", self.as_str())
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
